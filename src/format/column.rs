//! Column codec
//!
//! Packs typed column values into raw (uncompressed) bytes and back.
//!
//! ## Encodings
//! - Int32: `row_count × i32` little-endian
//! - Float64: `row_count × f64` little-endian IEEE-754
//! - String: two buffers
//!   - blob: every value's UTF-8 bytes concatenated in row order, no separators
//!   - offsets: `row_count × u32` little-endian, offset[i] = end of string i
//!     in the blob (string i starts at offset[i-1], or 0 for i = 0)

use bytes::{Buf, BufMut};

use crate::error::{McfError, Result};
use crate::table::{Column, ColumnData, ColumnType};

use super::{FLOAT64_WIDTH, INT32_WIDTH, STRING_OFFSET_WIDTH};

/// Raw bytes for one column, ready for compression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedColumn {
    pub name: String,
    pub column_type: ColumnType,
    /// Value bytes (Int32/Float64) or the string blob
    pub data: Vec<u8>,
    /// String end-offsets; `Some` only for String columns
    pub offsets: Option<Vec<u8>>,
}

/// Blob + offsets pair for a String column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringColumnParts {
    pub blob: Vec<u8>,
    pub offsets: Vec<u8>,
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a typed column into its raw block(s)
pub fn encode_column(column: &Column) -> Result<EncodedColumn> {
    let (data, offsets) = match &column.data {
        ColumnData::Int32(values) => (encode_int32(values), None),
        ColumnData::Float64(values) => (encode_float64(values), None),
        ColumnData::String(values) => {
            let parts = encode_strings(&column.name, values)?;
            (parts.blob, Some(parts.offsets))
        }
    };

    Ok(EncodedColumn {
        name: column.name.clone(),
        column_type: column.column_type(),
        data,
        offsets,
    })
}

pub fn encode_int32(values: &[i32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * INT32_WIDTH);
    for &v in values {
        buf.put_i32_le(v);
    }
    buf
}

pub fn encode_float64(values: &[f64]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * FLOAT64_WIDTH);
    for &v in values {
        buf.put_f64_le(v);
    }
    buf
}

/// Concatenate strings into a blob and record cumulative end offsets
///
/// Fails if the blob would outgrow what a u32 offset can address.
pub fn encode_strings<S: AsRef<str>>(column: &str, values: &[S]) -> Result<StringColumnParts> {
    let total: usize = values.iter().map(|s| s.as_ref().len()).sum();
    let mut blob = Vec::with_capacity(total);
    let mut offsets = Vec::with_capacity(values.len() * STRING_OFFSET_WIDTH);

    for (row, value) in values.iter().enumerate() {
        blob.extend_from_slice(value.as_ref().as_bytes());
        let end = u32::try_from(blob.len()).map_err(|_| {
            McfError::encoding(
                column,
                row,
                format!("string blob exceeds {} bytes", u32::MAX),
            )
        })?;
        offsets.put_u32_le(end);
    }

    Ok(StringColumnParts { blob, offsets })
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode raw block(s) into typed column data
///
/// `offsets` must be present for String columns and is ignored otherwise.
pub fn decode_column(
    column_type: ColumnType,
    data: &[u8],
    offsets: Option<&[u8]>,
    row_count: usize,
) -> Result<ColumnData> {
    match column_type {
        ColumnType::Int32 => decode_int32(data, row_count).map(ColumnData::Int32),
        ColumnType::Float64 => decode_float64(data, row_count).map(ColumnData::Float64),
        ColumnType::String => {
            let offsets = offsets.ok_or_else(|| {
                McfError::Format("String column is missing its offsets block".to_string())
            })?;
            decode_strings(data, offsets, row_count).map(ColumnData::String)
        }
    }
}

pub fn decode_int32(raw: &[u8], row_count: usize) -> Result<Vec<i32>> {
    expect_len("Int32 data block", raw, row_count, INT32_WIDTH)?;
    let mut buf = raw;
    Ok((0..row_count).map(|_| buf.get_i32_le()).collect())
}

pub fn decode_float64(raw: &[u8], row_count: usize) -> Result<Vec<f64>> {
    expect_len("Float64 data block", raw, row_count, FLOAT64_WIDTH)?;
    let mut buf = raw;
    Ok((0..row_count).map(|_| buf.get_f64_le()).collect())
}

/// Slice the blob with consecutive offset pairs
///
/// Offsets must be non-decreasing, exactly `row_count` long, and end at the
/// blob length; every slice must be valid UTF-8.
pub fn decode_strings(blob: &[u8], offsets_raw: &[u8], row_count: usize) -> Result<Vec<String>> {
    expect_len("String offsets block", offsets_raw, row_count, STRING_OFFSET_WIDTH)?;

    let mut buf = offsets_raw;
    let mut values = Vec::with_capacity(row_count);
    let mut start = 0usize;

    for row in 0..row_count {
        let end = buf.get_u32_le() as usize;
        if end < start {
            return Err(McfError::Format(format!(
                "String offsets decrease at row {}: {} < {}",
                row, end, start
            )));
        }
        if end > blob.len() {
            return Err(McfError::Format(format!(
                "String offset at row {} is {}, past blob length {}",
                row,
                end,
                blob.len()
            )));
        }

        let value = std::str::from_utf8(&blob[start..end]).map_err(|e| {
            McfError::Format(format!("String at row {} is not valid UTF-8: {}", row, e))
        })?;
        values.push(value.to_string());
        start = end;
    }

    if start != blob.len() {
        return Err(McfError::Format(format!(
            "Final string offset {} does not match blob length {}",
            start,
            blob.len()
        )));
    }

    Ok(values)
}

/// Check a fixed-width buffer holds exactly `row_count` items
fn expect_len(what: &str, raw: &[u8], row_count: usize, width: usize) -> Result<()> {
    let expected = row_count.checked_mul(width).ok_or_else(|| {
        McfError::Format(format!("{}: row count {} overflows", what, row_count))
    })?;
    if raw.len() != expected {
        return Err(McfError::Format(format!(
            "{} is {} bytes, expected {} ({} rows × {})",
            what,
            raw.len(),
            expected,
            row_count,
            width
        )));
    }
    Ok(())
}
