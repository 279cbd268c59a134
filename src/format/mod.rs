//! MCF Format Module
//!
//! Compact, typed, compressed, column-oriented binary tables.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Preamble (8 bytes)                                          │
//! │   Magic: "MCF1" (4) | HeaderSize: u32 (4)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Header (HeaderSize bytes)                                   │
//! │   Version: u8 | ColumnCount: u8 | Reserved (2) | Rows: u64  │
//! │   per column:                                               │
//! │     NameLen: u8 | Name | TypeCode: u8 | Reserved (2)        │
//! │     DataOffset: u64 | DataCompressed: u64 | DataRaw: u64    │
//! │     (String only)                                           │
//! │     OffsOffset: u64 | OffsCompressed: u64 | OffsRaw: u64    │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Data Region                                                 │
//! │   compressed data block, then (String) offsets block,       │
//! │   column after column in declaration order                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. Block offsets are absolute from file start.

pub mod block;
pub mod column;
pub mod header;
pub mod reader;
pub mod writer;

pub use block::{BlockCompressor, CompressedBlock};
pub use column::{EncodedColumn, StringColumnParts};
pub use header::{BlockRef, ColumnDescriptor, FileHeader};
pub use reader::McfReader;
pub use writer::McfWriter;

use crate::error::{McfError, Result};
use crate::table::ColumnType;

// =============================================================================
// Shared Constants (used by header, writer, reader)
// =============================================================================

/// Magic bytes identifying an MCF file
pub const MAGIC: &[u8; 4] = b"MCF1";

/// Current format version
pub const FORMAT_VERSION: u8 = 1;

/// Preamble size: Magic (4) + HeaderSize (4) = 8 bytes
pub const PREAMBLE_SIZE: u64 = 8;

/// Fixed header fields: Version (1) + ColumnCount (1) + Reserved (2) + RowCount (8)
pub const FIXED_HEADER_SIZE: usize = 12;

/// One block reference: Offset (8) + CompressedSize (8) + UncompressedSize (8)
pub const BLOCK_REF_SIZE: usize = 24;

/// Descriptor bytes besides the name and block refs: NameLen (1) + TypeCode (1) + Reserved (2)
pub const DESCRIPTOR_FIXED_SIZE: usize = 4;

/// Column names are length-prefixed with a u8
pub const MAX_NAME_LEN: usize = u8::MAX as usize;

/// Column count is stored as a u8
pub const MAX_COLUMNS: usize = u8::MAX as usize;

/// Width of one Int32 value on disk
pub const INT32_WIDTH: usize = 4;

/// Width of one Float64 value on disk
pub const FLOAT64_WIDTH: usize = 8;

/// Width of one string end-offset on disk
pub const STRING_OFFSET_WIDTH: usize = 4;

// =============================================================================
// Type Codes
// =============================================================================

pub const TYPE_INT32: u8 = 1;
pub const TYPE_FLOAT64: u8 = 2;
pub const TYPE_STRING: u8 = 3;

impl ColumnType {
    /// On-disk type code
    pub fn type_code(self) -> u8 {
        match self {
            ColumnType::Int32 => TYPE_INT32,
            ColumnType::Float64 => TYPE_FLOAT64,
            ColumnType::String => TYPE_STRING,
        }
    }

    /// Parse an on-disk type code
    pub fn from_type_code(code: u8) -> Result<Self> {
        match code {
            TYPE_INT32 => Ok(ColumnType::Int32),
            TYPE_FLOAT64 => Ok(ColumnType::Float64),
            TYPE_STRING => Ok(ColumnType::String),
            _ => Err(McfError::Format(format!("Unknown type code: {}", code))),
        }
    }

    /// Whether the column carries a second (offsets) block
    pub fn has_offsets_block(self) -> bool {
        matches!(self, ColumnType::String)
    }
}
