//! Tests for the column codec
//!
//! These tests verify:
//! - Little-endian fixed-width packing of Int32 and Float64
//! - String blob + cumulative offsets layout
//! - Offsets invariants enforced on decode

use mcf::format::column::{
    decode_column, decode_float64, decode_int32, decode_strings, encode_column, encode_float64,
    encode_int32, encode_strings,
};
use mcf::{Column, ColumnData, ColumnType, McfError};

// =============================================================================
// Helper Functions
// =============================================================================

fn offsets_bytes(offsets: &[u32]) -> Vec<u8> {
    offsets.iter().flat_map(|o| o.to_le_bytes()).collect()
}

// =============================================================================
// Fixed-Width Tests
// =============================================================================

#[test]
fn test_int32_little_endian_layout() {
    let raw = encode_int32(&[1, -1, i32::MAX]);

    assert_eq!(raw.len(), 12);
    assert_eq!(&raw[0..4], &[1, 0, 0, 0]);
    assert_eq!(&raw[4..8], &[0xFF, 0xFF, 0xFF, 0xFF]);
    assert_eq!(&raw[8..12], &[0xFF, 0xFF, 0xFF, 0x7F]);

    assert_eq!(decode_int32(&raw, 3).unwrap(), vec![1, -1, i32::MAX]);
}

#[test]
fn test_float64_ieee_layout() {
    let raw = encode_float64(&[1.5, -0.25]);

    assert_eq!(raw.len(), 16);
    assert_eq!(&raw[0..8], &1.5f64.to_le_bytes());
    assert_eq!(decode_float64(&raw, 2).unwrap(), vec![1.5, -0.25]);
}

#[test]
fn test_fixed_width_length_mismatch_is_format_error() {
    let raw = encode_int32(&[1, 2, 3]);
    assert!(matches!(decode_int32(&raw, 4), Err(McfError::Format(_))));
    assert!(matches!(decode_int32(&raw[..11], 3), Err(McfError::Format(_))));

    let raw = encode_float64(&[1.0]);
    assert!(matches!(decode_float64(&raw, 2), Err(McfError::Format(_))));
}

// =============================================================================
// String Tests
// =============================================================================

#[test]
fn test_string_blob_and_offsets() {
    let parts = encode_strings("name", &["a", "bb", "ccc"]).unwrap();

    assert_eq!(parts.blob, b"abbccc");
    assert_eq!(parts.offsets, offsets_bytes(&[1, 3, 6]));
}

#[test]
fn test_string_empty_values_at_both_ends() {
    let values = ["", "x", ""];
    let parts = encode_strings("s", &values).unwrap();

    assert_eq!(parts.blob, b"x");
    assert_eq!(parts.offsets, offsets_bytes(&[0, 1, 1]));

    let decoded = decode_strings(&parts.blob, &parts.offsets, 3).unwrap();
    assert_eq!(decoded, vec!["", "x", ""]);
}

#[test]
fn test_string_multibyte_offsets_count_bytes() {
    let parts = encode_strings("s", &["é", "日本"]).unwrap();

    assert_eq!(parts.offsets, offsets_bytes(&[2, 8]));
    assert_eq!(
        decode_strings(&parts.blob, &parts.offsets, 2).unwrap(),
        vec!["é", "日本"]
    );
}

#[test]
fn test_string_zero_rows() {
    let parts = encode_strings::<&str>("s", &[]).unwrap();
    assert!(parts.blob.is_empty());
    assert!(parts.offsets.is_empty());

    assert!(decode_strings(&[], &[], 0).unwrap().is_empty());
}

#[test]
fn test_decreasing_offsets_rejected() {
    let result = decode_strings(b"abc", &offsets_bytes(&[2, 1, 3]), 3);
    assert!(matches!(result, Err(McfError::Format(_))));
}

#[test]
fn test_final_offset_must_equal_blob_length() {
    let short = decode_strings(b"abcd", &offsets_bytes(&[1, 3]), 2);
    assert!(matches!(short, Err(McfError::Format(_))));

    let past = decode_strings(b"ab", &offsets_bytes(&[1, 3]), 2);
    assert!(matches!(past, Err(McfError::Format(_))));
}

#[test]
fn test_offsets_length_must_match_row_count() {
    let result = decode_strings(b"abc", &offsets_bytes(&[1, 3]), 3);
    assert!(matches!(result, Err(McfError::Format(_))));
}

#[test]
fn test_invalid_utf8_slice_rejected() {
    // Splitting "é" (0xC3 0xA9) in the middle
    let blob = "é".as_bytes();
    let result = decode_strings(blob, &offsets_bytes(&[1, 2]), 2);
    assert!(matches!(result, Err(McfError::Format(_))));
}

// =============================================================================
// Column-Level Tests
// =============================================================================

#[test]
fn test_encode_column_sets_offsets_only_for_strings() {
    let ints = encode_column(&Column::new("id", ColumnData::Int32(vec![1, 2]))).unwrap();
    assert_eq!(ints.column_type, ColumnType::Int32);
    assert!(ints.offsets.is_none());

    let strings = encode_column(&Column::new(
        "name",
        ColumnData::String(vec!["a".into(), "b".into()]),
    ))
    .unwrap();
    assert_eq!(strings.column_type, ColumnType::String);
    assert_eq!(strings.data, b"ab");
    assert_eq!(strings.offsets, Some(offsets_bytes(&[1, 2])));
}

#[test]
fn test_decode_column_dispatches_on_type() {
    let raw = encode_float64(&[2.5]);
    let data = decode_column(ColumnType::Float64, &raw, None, 1).unwrap();
    assert_eq!(data, ColumnData::Float64(vec![2.5]));

    let missing_offsets = decode_column(ColumnType::String, b"a", None, 1);
    assert!(matches!(missing_offsets, Err(McfError::Format(_))));
}
