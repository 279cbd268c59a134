//! File reader
//!
//! Parses the full header on open, then fetches only the blocks of the
//! columns that are asked for.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{McfError, Result};
use crate::table::{Column, Table};

use super::block::BlockCompressor;
use super::column::decode_column;
use super::header::{ColumnDescriptor, FileHeader};

/// Reader for MCF files
///
/// Every descriptor is parsed up front; column blocks are seeked and
/// inflated lazily, one column at a time.
pub struct McfReader<R> {
    /// Underlying stream; positioned arbitrarily between reads
    reader: R,
    header: FileHeader,
    /// Row count converted to an in-memory index type
    row_count: usize,
}

impl McfReader<BufReader<File>> {
    /// Open an MCF file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> McfReader<R> {
    /// Parse the header from the start of `reader`
    pub fn new(mut reader: R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header = FileHeader::read_from(&mut reader)?;

        let row_count = usize::try_from(header.row_count).map_err(|_| {
            McfError::Format(format!(
                "Row count {} not addressable on this platform",
                header.row_count
            ))
        })?;

        tracing::debug!(
            columns = header.columns.len(),
            rows = header.row_count,
            "Opened MCF stream"
        );

        Ok(Self {
            reader,
            header,
            row_count,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.header.column_names()
    }

    /// Read and decode a single column by name
    pub fn read_column(&mut self, name: &str) -> Result<Column> {
        let descriptor = self
            .header
            .column(name)
            .cloned()
            .ok_or_else(|| McfError::ColumnNotFound(name.to_string()))?;
        self.decode_descriptor(&descriptor)
    }

    /// Read every column
    pub fn read_all(&mut self) -> Result<Table> {
        self.read_table::<&str>(None)
    }

    /// Read a subset of columns
    ///
    /// Columns come back in file declaration order. Unknown names fail with
    /// `ColumnNotFound`; repeated names are read once.
    pub fn read_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Result<Table> {
        self.read_table(Some(names))
    }

    /// Read the selected columns, or all columns when `selection` is `None`
    pub fn read_table<S: AsRef<str>>(&mut self, selection: Option<&[S]>) -> Result<Table> {
        let wanted: Option<HashSet<&str>> =
            selection.map(|names| names.iter().map(|n| n.as_ref()).collect());

        if let Some(wanted) = &wanted {
            if let Some(missing) = wanted.iter().find(|n| self.header.column(n).is_none()) {
                return Err(McfError::ColumnNotFound(missing.to_string()));
            }
        }

        let descriptors: Vec<ColumnDescriptor> = self
            .header
            .columns
            .iter()
            .filter(|c| wanted.as_ref().map_or(true, |w| w.contains(c.name.as_str())))
            .cloned()
            .collect();

        let columns = descriptors
            .iter()
            .map(|d| self.decode_descriptor(d))
            .collect::<Result<Vec<_>>>()?;

        Table::new(columns)
    }

    /// Consume the reader, returning the underlying stream
    pub fn into_inner(self) -> R {
        self.reader
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Fetch, inflate and decode one column's block(s)
    fn decode_descriptor(&mut self, descriptor: &ColumnDescriptor) -> Result<Column> {
        let data = BlockCompressor::read_block(&mut self.reader, &descriptor.data)?;
        let offsets = descriptor
            .offsets
            .as_ref()
            .map(|block| BlockCompressor::read_block(&mut self.reader, block))
            .transpose()?;

        let values = decode_column(
            descriptor.column_type,
            &data,
            offsets.as_deref(),
            self.row_count,
        )
        .map_err(|e| match e {
            McfError::Format(msg) => {
                McfError::Format(format!("column '{}': {}", descriptor.name, msg))
            }
            other => other,
        })?;

        tracing::debug!(
            column = %descriptor.name,
            column_type = %descriptor.column_type,
            "Decoded column"
        );

        Ok(Column::new(descriptor.name.clone(), values))
    }
}
