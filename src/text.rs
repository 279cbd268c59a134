//! Delimited text source and sink
//!
//! The codec never parses text itself; it exchanges tables with a
//! [`TableSource`] on the way in and a [`TableSink`] on the way out. The
//! delimited (CSV-style) implementations live here.
//!
//! ## Dialect
//! - first record is the header row and fixes column order
//! - fields may be quoted with `"`; quoted fields may contain the delimiter,
//!   line breaks and doubled quotes (`""`)
//! - LF, CRLF or lone CR end a record; blank lines are skipped
//! - every record must have as many fields as the header
//!
//! The writer quotes only fields that need it and ends lines with `\n`.

use std::io::{Read, Write};
use std::mem;

use crate::error::{McfError, Result};
use crate::table::{Table, TextColumn, TextTable};

/// Produces a text table for the encoder
pub trait TableSource {
    fn read_table(&mut self) -> Result<TextTable>;
}

/// Consumes a decoded table
pub trait TableSink {
    fn write_table(&mut self, table: &Table) -> Result<()>;
}

// =============================================================================
// Reader
// =============================================================================

/// Reads a delimited text table from any byte stream
pub struct DelimitedReader<R> {
    reader: R,
    delimiter: u8,
}

impl<R: Read> DelimitedReader<R> {
    pub fn new(reader: R, delimiter: u8) -> Self {
        Self { reader, delimiter }
    }
}

impl<R: Read> TableSource for DelimitedReader<R> {
    fn read_table(&mut self) -> Result<TextTable> {
        let mut raw = Vec::new();
        self.reader.read_to_end(&mut raw)?;

        let input = String::from_utf8(raw).map_err(|e| {
            let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
            McfError::Text {
                line: line_of(valid),
                message: "invalid UTF-8".to_string(),
            }
        })?;
        let input = input.strip_prefix('\u{feff}').unwrap_or(&input);

        let mut records = parse_records(input, self.delimiter as char)?.into_iter();

        let header = match records.next() {
            Some((_, header)) => header,
            None => return TextTable::new(Vec::new()),
        };

        let mut values: Vec<Vec<String>> = vec![Vec::new(); header.len()];
        for (line, record) in records {
            if record.len() != header.len() {
                return Err(McfError::Text {
                    line,
                    message: format!(
                        "expected {} fields, found {}",
                        header.len(),
                        record.len()
                    ),
                });
            }
            for (column, field) in values.iter_mut().zip(record) {
                column.push(field);
            }
        }

        let columns = header
            .into_iter()
            .zip(values)
            .map(|(name, values)| TextColumn::new(name, values))
            .collect();

        let table = TextTable::new(columns)?;
        tracing::debug!(
            columns = table.column_count(),
            rows = table.row_count(),
            "Read delimited text"
        );
        Ok(table)
    }
}

/// Split input into records of fields, tagged with their starting line
fn parse_records(input: &str, delimiter: char) -> Result<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();

    let mut in_quotes = false;
    // Whether the current field was opened with a quote
    let mut quoted = false;
    let mut line = 1usize;
    let mut record_line = 1usize;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => {
                    if c == '\n' {
                        line += 1;
                    }
                    field.push(c);
                }
            }
            continue;
        }

        match c {
            '"' if field.is_empty() && !quoted => {
                in_quotes = true;
                quoted = true;
            }
            c if c == delimiter => {
                record.push(mem::take(&mut field));
                quoted = false;
            }
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                finish_record(&mut records, &mut record, &mut field, quoted, record_line);
                quoted = false;
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(McfError::Text {
            line: record_line,
            message: "unterminated quoted field".to_string(),
        });
    }
    if !field.is_empty() || quoted || !record.is_empty() {
        finish_record(&mut records, &mut record, &mut field, quoted, record_line);
    }

    Ok(records)
}

/// Push the pending record unless it is a blank line
fn finish_record(
    records: &mut Vec<(usize, Vec<String>)>,
    record: &mut Vec<String>,
    field: &mut String,
    quoted: bool,
    line: usize,
) {
    record.push(mem::take(field));
    let blank = record.len() == 1 && record[0].is_empty() && !quoted;
    let done = mem::take(record);
    if !blank {
        records.push((line, done));
    }
}

fn line_of(prefix: &[u8]) -> usize {
    prefix.iter().filter(|&&b| b == b'\n').count() + 1
}

// =============================================================================
// Writer
// =============================================================================

/// Writes a typed table as delimited text, stringifying every value
pub struct DelimitedWriter<W> {
    writer: W,
    delimiter: u8,
}

impl<W: Write> DelimitedWriter<W> {
    pub fn new(writer: W, delimiter: u8) -> Self {
        Self { writer, delimiter }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_record<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        let delimiter = self.delimiter as char;

        // A lone empty field would read back as a blank line
        if let [only] = fields {
            if only.as_ref().is_empty() {
                self.writer.write_all(b"\"\"\n")?;
                return Ok(());
            }
        }

        let mut line = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                line.push(delimiter);
            }
            push_field(&mut line, field.as_ref(), delimiter);
        }
        line.push('\n');

        self.writer.write_all(line.as_bytes())?;
        Ok(())
    }
}

impl<W: Write> TableSink for DelimitedWriter<W> {
    /// A table without columns produces no output
    fn write_table(&mut self, table: &Table) -> Result<()> {
        if table.column_count() == 0 {
            return Ok(());
        }

        self.write_record(&table.column_names())?;

        let mut row = Vec::with_capacity(table.column_count());
        for i in 0..table.row_count() {
            row.clear();
            for column in table.columns() {
                let value = column.data.get(i).ok_or_else(|| {
                    McfError::InvalidTable(format!("column '{}' has no row {}", column.name, i))
                })?;
                row.push(value.to_string());
            }
            self.write_record(&row)?;
        }

        self.writer.flush()?;
        tracing::debug!(
            columns = table.column_count(),
            rows = table.row_count(),
            "Wrote delimited text"
        );
        Ok(())
    }
}

/// Append a field, quoting it if it holds the delimiter, a quote or a line break
fn push_field(line: &mut String, field: &str, delimiter: char) {
    let needs_quotes = field
        .chars()
        .any(|c| c == delimiter || c == '"' || c == '\r' || c == '\n');

    if needs_quotes {
        line.push('"');
        line.push_str(&field.replace('"', "\"\""));
        line.push('"');
    } else {
        line.push_str(field);
    }
}
