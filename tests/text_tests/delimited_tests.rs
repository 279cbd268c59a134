//! Tests for the delimited text source and sink
//!
//! These tests verify:
//! - Header handling, quoting, line endings and blank lines
//! - Malformed input is reported with its line number
//! - The writer quotes only what needs quoting and reads back cleanly

use std::io::Cursor;

use mcf::text::{DelimitedReader, DelimitedWriter, TableSink, TableSource};
use mcf::{Column, ColumnData, McfError, Table, TextTable};

// =============================================================================
// Helper Functions
// =============================================================================

fn read(input: &str) -> mcf::Result<TextTable> {
    DelimitedReader::new(Cursor::new(input.as_bytes().to_vec()), b',').read_table()
}

fn values(table: &TextTable, index: usize) -> Vec<&str> {
    table.columns()[index]
        .values
        .iter()
        .map(String::as_str)
        .collect()
}

fn render(table: &Table, delimiter: u8) -> String {
    let mut sink = DelimitedWriter::new(Vec::new(), delimiter);
    sink.write_table(table).unwrap();
    String::from_utf8(sink.into_inner()).unwrap()
}

// =============================================================================
// Reader Tests
// =============================================================================

#[test]
fn test_read_basic() {
    let table = read("id,name\n1,alice\n2,bob\n").unwrap();

    assert_eq!(table.column_count(), 2);
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.columns()[0].name, "id");
    assert_eq!(values(&table, 0), vec!["1", "2"]);
    assert_eq!(values(&table, 1), vec!["alice", "bob"]);
}

#[test]
fn test_read_line_endings() {
    let lf = read("a,b\n1,2\n3,4\n").unwrap();
    let crlf = read("a,b\r\n1,2\r\n3,4\r\n").unwrap();
    let cr = read("a,b\r1,2\r3,4").unwrap();

    assert_eq!(lf, crlf);
    assert_eq!(lf, cr);
}

#[test]
fn test_read_skips_blank_lines() {
    let table = read("a,b\n\n1,2\n\r\n3,4\n\n").unwrap();
    assert_eq!(table.row_count(), 2);
    assert_eq!(values(&table, 1), vec!["2", "4"]);
}

#[test]
fn test_read_without_trailing_newline() {
    let table = read("a\n1\n2").unwrap();
    assert_eq!(values(&table, 0), vec!["1", "2"]);
}

#[test]
fn test_read_quoted_fields() {
    let input = "text,n\n\"hello, world\",1\n\"say \"\"hi\"\"\",2\n\"two\nlines\",3\n";
    let table = read(input).unwrap();

    assert_eq!(
        values(&table, 0),
        vec!["hello, world", "say \"hi\"", "two\nlines"]
    );
    assert_eq!(values(&table, 1), vec!["1", "2", "3"]);
}

#[test]
fn test_read_empty_fields() {
    let table = read("a,b,c\n,,\n1,,3\n").unwrap();
    assert_eq!(values(&table, 0), vec!["", "1"]);
    assert_eq!(values(&table, 1), vec!["", ""]);
    assert_eq!(values(&table, 2), vec!["", "3"]);
}

#[test]
fn test_read_quoted_lone_empty_field_is_a_row() {
    let table = read("a\n\"\"\nx\n").unwrap();
    assert_eq!(values(&table, 0), vec!["", "x"]);
}

#[test]
fn test_read_header_only() {
    let table = read("a,b\n").unwrap();
    assert_eq!(table.column_count(), 2);
    assert_eq!(table.row_count(), 0);
}

#[test]
fn test_read_empty_input() {
    let table = read("").unwrap();
    assert_eq!(table.column_count(), 0);
    assert_eq!(table.row_count(), 0);
}

#[test]
fn test_read_strips_bom() {
    let table = read("\u{feff}id\n7\n").unwrap();
    assert_eq!(table.columns()[0].name, "id");
}

#[test]
fn test_read_custom_delimiter() {
    let input = b"a;b\n1,5;2\n".to_vec();
    let table = DelimitedReader::new(Cursor::new(input), b';')
        .read_table()
        .unwrap();
    assert_eq!(values(&table, 0), vec!["1,5"]);
    assert_eq!(values(&table, 1), vec!["2"]);
}

#[test]
fn test_read_ragged_row() {
    let result = read("a,b\n1,2\n3\n");
    match result {
        Err(McfError::Text { line, .. }) => assert_eq!(line, 3),
        other => panic!("Expected Text error, got {:?}", other),
    }

    let result = read("a,b\n1,2,3\n");
    assert!(matches!(result, Err(McfError::Text { line: 2, .. })));
}

#[test]
fn test_read_unterminated_quote() {
    let result = read("a\n1\n\"open\n");
    assert!(matches!(result, Err(McfError::Text { line: 3, .. })));
}

#[test]
fn test_read_invalid_utf8() {
    let input = b"a\n\xff\n".to_vec();
    let result = DelimitedReader::new(Cursor::new(input), b',').read_table();
    assert!(matches!(result, Err(McfError::Text { line: 2, .. })));
}

#[test]
fn test_read_duplicate_header() {
    let result = read("a,a\n1,2\n");
    assert!(matches!(result, Err(McfError::InvalidTable(_))));
}

// =============================================================================
// Writer Tests
// =============================================================================

#[test]
fn test_write_typed_values() {
    let table = Table::new(vec![
        Column::new("id", ColumnData::Int32(vec![1, -2])),
        Column::new("score", ColumnData::Float64(vec![1.0, 2.5])),
        Column::new("name", ColumnData::String(vec!["a".into(), "b".into()])),
    ])
    .unwrap();

    assert_eq!(render(&table, b','), "id,score,name\n1,1.0,a\n-2,2.5,b\n");
}

#[test]
fn test_write_quotes_when_needed() {
    let table = Table::new(vec![
        Column::new(
            "text",
            ColumnData::String(vec![
                "plain".into(),
                "a,b".into(),
                "say \"hi\"".into(),
                "two\nlines".into(),
            ]),
        ),
        Column::new("n", ColumnData::Int32(vec![1, 2, 3, 4])),
    ])
    .unwrap();

    let expected = "text,n\nplain,1\n\"a,b\",2\n\"say \"\"hi\"\"\",3\n\"two\nlines\",4\n";
    assert_eq!(render(&table, b','), expected);
}

#[test]
fn test_write_lone_empty_field() {
    let table = Table::new(vec![Column::new(
        "a",
        ColumnData::String(vec!["".into(), "x".into()]),
    )])
    .unwrap();

    let text = render(&table, b',');
    assert_eq!(text, "a\n\"\"\nx\n");

    let back = read(&text).unwrap();
    assert_eq!(values(&back, 0), vec!["", "x"]);
}

#[test]
fn test_write_custom_delimiter() {
    let table = Table::new(vec![
        Column::new("a", ColumnData::String(vec!["x;y".into()])),
        Column::new("b", ColumnData::String(vec!["p,q".into()])),
    ])
    .unwrap();

    assert_eq!(render(&table, b';'), "a;b\n\"x;y\";p,q\n");
}

#[test]
fn test_write_zero_columns() {
    let table = Table::new(Vec::new()).unwrap();
    assert_eq!(render(&table, b','), "");
}

#[test]
fn test_write_then_read_back() {
    let table = Table::new(vec![
        Column::new(
            "s",
            ColumnData::String(vec!["α,β".into(), "\"".into(), "\r\n".into()]),
        ),
        Column::new("f", ColumnData::Float64(vec![1e20, -0.5, 3.0])),
    ])
    .unwrap();

    let back = read(&render(&table, b',')).unwrap();
    assert_eq!(values(&back, 0), vec!["α,β", "\"", "\r\n"]);
    assert_eq!(values(&back, 1), vec!["1e20", "-0.5", "3.0"]);
}
