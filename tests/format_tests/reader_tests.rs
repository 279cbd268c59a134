//! Tests for McfReader
//!
//! These tests verify:
//! - Full and selective reads
//! - Unrequested blocks are never read
//! - Corruption and truncation surface as errors, never silent output

use std::io::{Cursor, Read, Seek, SeekFrom};
use std::ops::Range;

use mcf::format::{McfReader, McfWriter, PREAMBLE_SIZE};
use mcf::{Column, ColumnData, McfError, Table};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// Cursor that records every byte range read through it
struct TrackingReader {
    inner: Cursor<Vec<u8>>,
    reads: Vec<Range<u64>>,
}

impl TrackingReader {
    fn new(bytes: Vec<u8>) -> Self {
        Self {
            inner: Cursor::new(bytes),
            reads: Vec::new(),
        }
    }

    fn touched(&self, range: &Range<u64>) -> bool {
        self.reads
            .iter()
            .any(|r| r.start < range.end && range.start < r.end)
    }
}

impl Read for TrackingReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let start = self.inner.position();
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.reads.push(start..start + n as u64);
        }
        Ok(n)
    }
}

impl Seek for TrackingReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.inner.seek(pos)
    }
}

fn sample_table() -> Table {
    Table::new(vec![
        Column::new("id", ColumnData::Int32(vec![1, 2, 3, 4])),
        Column::new("price", ColumnData::Float64(vec![9.5, 0.25, -1.0, 1e10])),
        Column::new(
            "label",
            ColumnData::String(vec!["alpha".into(), "".into(), "gamma".into(), "δ".into()]),
        ),
        Column::new("qty", ColumnData::Int32(vec![10, 20, 30, 40])),
    ])
    .unwrap()
}

fn encode(table: &Table) -> Vec<u8> {
    McfWriter::default().encode_table(table).unwrap().to_vec()
}

// =============================================================================
// Full Read Tests
// =============================================================================

#[test]
fn test_read_all_roundtrip() {
    let table = sample_table();
    let mut reader = McfReader::new(Cursor::new(encode(&table))).unwrap();

    assert_eq!(reader.row_count(), 4);
    assert_eq!(reader.column_names(), vec!["id", "price", "label", "qty"]);
    assert_eq!(reader.read_all().unwrap(), table);
}

#[test]
fn test_open_from_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("table.mcf");
    std::fs::write(&path, encode(&sample_table())).unwrap();

    let mut reader = McfReader::open(&path).unwrap();
    let column = reader.read_column("label").unwrap();
    assert_eq!(
        column.data,
        ColumnData::String(vec!["alpha".into(), "".into(), "gamma".into(), "δ".into()])
    );
}

// =============================================================================
// Selective Read Tests
// =============================================================================

#[test]
fn test_selective_read_returns_only_requested() {
    let mut reader = McfReader::new(Cursor::new(encode(&sample_table()))).unwrap();

    let table = reader.read_columns(&["qty", "id"]).unwrap();

    // Declaration order, not request order
    assert_eq!(table.column_names(), vec!["id", "qty"]);
    assert_eq!(table.row_count(), 4);
    assert_eq!(
        table.column("qty").unwrap().data,
        ColumnData::Int32(vec![10, 20, 30, 40])
    );
}

#[test]
fn test_selective_read_skips_other_blocks() {
    let bytes = encode(&sample_table());
    let mut reader = McfReader::new(TrackingReader::new(bytes)).unwrap();
    let header = reader.header().clone();

    reader.read_columns(&["price"]).unwrap();
    let tracker = reader.into_inner();

    for column in &header.columns {
        for block in column.blocks() {
            let range = block.offset..block.offset + block.compressed_size;
            assert_eq!(
                tracker.touched(&range),
                column.name == "price",
                "column '{}' block {:?}",
                column.name,
                range
            );
        }
    }
}

#[test]
fn test_header_only_open_reads_no_blocks() {
    let bytes = encode(&sample_table());
    let reader = McfReader::new(TrackingReader::new(bytes)).unwrap();
    let data_start = PREAMBLE_SIZE + reader.header().header_size().unwrap() as u64;

    let tracker = reader.into_inner();
    assert!(tracker.reads.iter().all(|r| r.end <= data_start));
}

#[test]
fn test_unknown_column_rejected() {
    let mut reader = McfReader::new(Cursor::new(encode(&sample_table()))).unwrap();

    let result = reader.read_columns(&["id", "missing"]);
    assert!(matches!(result, Err(McfError::ColumnNotFound(name)) if name == "missing"));
}

#[test]
fn test_duplicate_selection_read_once() {
    let mut reader = McfReader::new(Cursor::new(encode(&sample_table()))).unwrap();

    let table = reader.read_columns(&["label", "label"]).unwrap();
    assert_eq!(table.column_names(), vec!["label"]);
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_flipped_byte_in_every_block_detected() {
    let table = sample_table();
    let bytes = encode(&table);
    let header = McfReader::new(Cursor::new(bytes.clone()))
        .unwrap()
        .header()
        .clone();

    for column in &header.columns {
        for block in column.blocks() {
            let mut corrupted = bytes.clone();
            let pos = (block.offset + block.compressed_size / 2) as usize;
            corrupted[pos] ^= 0x5A;

            let mut reader = McfReader::new(Cursor::new(corrupted)).unwrap();
            match reader.read_all() {
                Err(McfError::Integrity(_)) | Err(McfError::Format(_)) => {}
                Ok(decoded) => panic!(
                    "corruption in column '{}' decoded silently: {:?}",
                    column.name, decoded
                ),
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }
    }
}

#[test]
fn test_truncated_inside_data_block() {
    let bytes = encode(&sample_table());
    let header = McfReader::new(Cursor::new(bytes.clone()))
        .unwrap()
        .header()
        .clone();
    let last = header.columns.last().unwrap().data;
    let cut = (last.offset + last.compressed_size / 2) as usize;

    let mut reader = McfReader::new(Cursor::new(bytes[..cut].to_vec())).unwrap();
    let result = reader.read_all();
    assert!(matches!(
        result,
        Err(McfError::Format(_)) | Err(McfError::Integrity(_))
    ));
}

#[test]
fn test_truncated_inside_header() {
    let bytes = encode(&sample_table());
    let result = McfReader::new(Cursor::new(bytes[..20].to_vec()));
    assert!(matches!(result, Err(McfError::Format(_))));
}

#[test]
fn test_mismatched_uncompressed_size_detected() {
    let table = Table::new(vec![Column::new("n", ColumnData::Int32(vec![7, 8]))]).unwrap();
    let mut bytes = encode(&table);

    // Descriptor: preamble(8) + fixed(12) + name_len(1) + "n"(1) + type(1) + reserved(2)
    // then offset(8), compressed(8), uncompressed(8)
    let field = 8 + 12 + 1 + 1 + 1 + 2 + 16;
    bytes[field..field + 8].copy_from_slice(&12u64.to_le_bytes());

    let mut reader = McfReader::new(Cursor::new(bytes)).unwrap();
    assert!(matches!(reader.read_all(), Err(McfError::Integrity(_))));
}
