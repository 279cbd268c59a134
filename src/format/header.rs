//! Header codec
//!
//! Serializes and parses the preamble + header that describe every column
//! and where its blocks live.
//!
//! ## Analytic size
//! Offsets and sizes are fixed-width u64 fields, so the header length depends
//! only on the column count, names and types. [`FileHeader::size_for`]
//! computes it up front; the writer uses that to place every block before the
//! header is serialized, and serializes the header exactly once.

use std::collections::HashSet;
use std::io::{ErrorKind, Read};

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{McfError, Result};
use crate::table::ColumnType;

use super::{
    BLOCK_REF_SIZE, DESCRIPTOR_FIXED_SIZE, FIXED_HEADER_SIZE, FORMAT_VERSION, MAGIC,
    MAX_COLUMNS, MAX_NAME_LEN, PREAMBLE_SIZE,
};

// =============================================================================
// Header Types
// =============================================================================

/// Location and sizes of one compressed block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockRef {
    /// Absolute byte offset from file start
    pub offset: u64,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

impl BlockRef {
    /// First byte past the block, if it fits in u64
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.compressed_size)
    }
}

/// Per-column header entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub column_type: ColumnType,
    /// Values (Int32/Float64) or string blob
    pub data: BlockRef,
    /// String end-offsets; present iff `column_type` is String
    pub offsets: Option<BlockRef>,
}

impl ColumnDescriptor {
    /// Serialized length of a descriptor with this name and type
    pub fn encoded_len(name: &str, column_type: ColumnType) -> usize {
        let refs = if column_type.has_offsets_block() { 2 } else { 1 };
        DESCRIPTOR_FIXED_SIZE + name.len() + refs * BLOCK_REF_SIZE
    }

    /// Block refs in data-region order (data first, then offsets)
    pub fn blocks(&self) -> impl Iterator<Item = &BlockRef> {
        std::iter::once(&self.data).chain(self.offsets.iter())
    }
}

/// Parsed or to-be-written file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub version: u8,
    pub row_count: u64,
    pub columns: Vec<ColumnDescriptor>,
}

impl FileHeader {
    pub fn new(row_count: u64, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            version: FORMAT_VERSION,
            row_count,
            columns,
        }
    }

    /// HEADER_SIZE for a set of column names and types, without serializing
    pub fn size_for<'a, I>(columns: I) -> Result<u32>
    where
        I: IntoIterator<Item = (&'a str, ColumnType)>,
    {
        let total = columns
            .into_iter()
            .fold(FIXED_HEADER_SIZE, |acc, (name, ty)| {
                acc + ColumnDescriptor::encoded_len(name, ty)
            });
        u32::try_from(total)
            .map_err(|_| McfError::InvalidTable(format!("header of {} bytes exceeds u32", total)))
    }

    /// HEADER_SIZE of this header
    pub fn header_size(&self) -> Result<u32> {
        Self::size_for(self.columns.iter().map(|c| (c.name.as_str(), c.column_type)))
    }

    /// Absolute offset of the first data block for a given HEADER_SIZE
    pub fn data_start(header_size: u32) -> u64 {
        PREAMBLE_SIZE + header_size as u64
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Sum of every block's compressed size
    pub fn data_region_len(&self) -> u64 {
        self.columns
            .iter()
            .flat_map(|c| c.blocks())
            .map(|b| b.compressed_size)
            .sum()
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Serialize MAGIC + HEADER_SIZE + HEADER
    pub fn encode(&self) -> Result<BytesMut> {
        self.validate_for_write()?;

        let header_size = self.header_size()?;
        let mut buf = BytesMut::with_capacity(PREAMBLE_SIZE as usize + header_size as usize);

        buf.put_slice(MAGIC);
        buf.put_u32_le(header_size);

        // Fixed fields
        buf.put_u8(self.version);
        buf.put_u8(self.columns.len() as u8);
        buf.put_u16_le(0); // Reserved
        buf.put_u64_le(self.row_count);

        // Descriptors
        for column in &self.columns {
            buf.put_u8(column.name.len() as u8);
            buf.put_slice(column.name.as_bytes());
            buf.put_u8(column.column_type.type_code());
            buf.put_u16_le(0); // Reserved
            put_block_ref(&mut buf, &column.data);
            if let Some(offsets) = &column.offsets {
                put_block_ref(&mut buf, offsets);
            }
        }

        debug_assert_eq!(buf.len() as u64, Self::data_start(header_size));
        Ok(buf)
    }

    /// Reject headers that cannot be represented on disk
    fn validate_for_write(&self) -> Result<()> {
        if self.columns.is_empty() && self.row_count != 0 {
            return Err(McfError::InvalidTable(format!(
                "{} rows but no columns",
                self.row_count
            )));
        }
        if self.columns.len() > MAX_COLUMNS {
            return Err(McfError::InvalidTable(format!(
                "{} columns, max {}",
                self.columns.len(),
                MAX_COLUMNS
            )));
        }
        for column in &self.columns {
            if column.name.len() > MAX_NAME_LEN {
                return Err(McfError::InvalidTable(format!(
                    "column name '{}' is {} bytes, max {}",
                    column.name,
                    column.name.len(),
                    MAX_NAME_LEN
                )));
            }
            if column.offsets.is_some() != column.column_type.has_offsets_block() {
                return Err(McfError::InvalidTable(format!(
                    "column '{}' of type {} has mismatched offsets block",
                    column.name, column.column_type
                )));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    /// Read and parse the preamble and header from the start of a stream
    ///
    /// Leaves the stream positioned at the first byte after the header.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut preamble = [0u8; PREAMBLE_SIZE as usize];
        read_exact_or_format(reader, &mut preamble, "preamble")?;

        if &preamble[0..4] != MAGIC {
            return Err(McfError::Format(format!(
                "Invalid magic: expected {:?}, got {:?}",
                MAGIC,
                &preamble[0..4]
            )));
        }

        let mut size_field = &preamble[4..8];
        let header_size = size_field.get_u32_le();

        // Bounded by what the stream actually holds, not the declared size
        let mut body = Vec::new();
        reader
            .by_ref()
            .take(header_size as u64)
            .read_to_end(&mut body)?;
        if body.len() < header_size as usize {
            return Err(McfError::Format(format!(
                "Header truncated: declared {} bytes, found {}",
                header_size,
                body.len()
            )));
        }

        Self::parse(&body)
    }

    /// Parse a header body of exactly HEADER_SIZE bytes
    ///
    /// The descriptors must consume the body exactly; any shortfall or
    /// leftover bytes are a format error.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let header_size = body.len();
        let mut buf = body;

        need(buf, FIXED_HEADER_SIZE, header_size, "fixed header fields")?;
        let version = buf.get_u8();
        if version != FORMAT_VERSION {
            return Err(McfError::Format(format!(
                "Unsupported format version: {} (expected {})",
                version, FORMAT_VERSION
            )));
        }
        let column_count = buf.get_u8() as usize;
        buf.advance(2); // Reserved
        let row_count = buf.get_u64_le();
        if column_count == 0 && row_count != 0 {
            return Err(McfError::Format(format!(
                "Header declares {} rows but no columns",
                row_count
            )));
        }

        tracing::trace!(version, column_count, row_count, header_size, "Parsed fixed header");

        let mut columns = Vec::with_capacity(column_count);
        let mut seen = HashSet::with_capacity(column_count);

        for index in 0..column_count {
            need(buf, 1, header_size, "column name length")?;
            let name_len = buf.get_u8() as usize;

            need(buf, name_len, header_size, "column name")?;
            let name = std::str::from_utf8(&buf[..name_len])
                .map_err(|e| {
                    McfError::Format(format!("Column {} name is not valid UTF-8: {}", index, e))
                })?
                .to_string();
            buf.advance(name_len);

            need(buf, 3, header_size, "column type code")?;
            let column_type = ColumnType::from_type_code(buf.get_u8())?;
            buf.advance(2); // Reserved

            need(buf, BLOCK_REF_SIZE, header_size, "data block reference")?;
            let data = get_block_ref(&mut buf);

            let offsets = if column_type.has_offsets_block() {
                need(buf, BLOCK_REF_SIZE, header_size, "offsets block reference")?;
                Some(get_block_ref(&mut buf))
            } else {
                None
            };

            if !seen.insert(name.clone()) {
                return Err(McfError::Format(format!("Duplicate column name '{}'", name)));
            }

            columns.push(ColumnDescriptor {
                name,
                column_type,
                data,
                offsets,
            });
        }

        if buf.has_remaining() {
            return Err(McfError::Format(format!(
                "Header declares {} bytes but descriptors end at {}",
                header_size,
                header_size - buf.remaining()
            )));
        }

        let header = Self {
            version,
            row_count,
            columns,
        };
        header.validate_block_refs(header_size as u32)?;
        Ok(header)
    }

    /// Every block must lie in the data region
    fn validate_block_refs(&self, header_size: u32) -> Result<()> {
        let data_start = Self::data_start(header_size);
        for column in &self.columns {
            for block in column.blocks() {
                if block.offset < data_start {
                    return Err(McfError::Format(format!(
                        "Column '{}' block offset {} points into the header (data starts at {})",
                        column.name, block.offset, data_start
                    )));
                }
                if block.end().is_none() {
                    return Err(McfError::Format(format!(
                        "Column '{}' block at {} with size {} overflows",
                        column.name, block.offset, block.compressed_size
                    )));
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

fn put_block_ref(buf: &mut BytesMut, block: &BlockRef) {
    buf.put_u64_le(block.offset);
    buf.put_u64_le(block.compressed_size);
    buf.put_u64_le(block.uncompressed_size);
}

/// Caller must have checked BLOCK_REF_SIZE bytes remain
fn get_block_ref(buf: &mut &[u8]) -> BlockRef {
    BlockRef {
        offset: buf.get_u64_le(),
        compressed_size: buf.get_u64_le(),
        uncompressed_size: buf.get_u64_le(),
    }
}

/// Fail with a format error if fewer than `n` header bytes remain
fn need(buf: &[u8], n: usize, header_size: usize, what: &str) -> Result<()> {
    if buf.len() < n {
        return Err(McfError::Format(format!(
            "Header overrun reading {}: need {} bytes at position {}, header is {} bytes",
            what,
            n,
            header_size - buf.len(),
            header_size
        )));
    }
    Ok(())
}

fn read_exact_or_format<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => {
            McfError::Format(format!("File too short for {} ({} bytes)", what, buf.len()))
        }
        _ => McfError::Io(e),
    })
}
