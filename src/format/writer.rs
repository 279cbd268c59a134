//! File assembler
//!
//! Turns a typed table into a complete MCF byte image.
//!
//! ## Pipeline
//! 1. Encode every column to raw bytes (column codec)
//! 2. Compress each raw buffer into a block
//! 3. Compute HEADER_SIZE analytically from names and types
//! 4. Place blocks back to back starting at `8 + HEADER_SIZE`
//! 5. Serialize the header once, then append the data region
//!
//! Steps 1-2 are independent per column and may run on scoped threads; the
//! results are always assembled in column declaration order.

use std::io::Write;

use bytes::{BufMut, Bytes};

use crate::config::Config;
use crate::error::{McfError, Result};
use crate::table::{Column, ColumnType, Table, TextTable, TypeInferrer};

use super::block::{BlockCompressor, CompressedBlock};
use super::column::encode_column;
use super::header::{ColumnDescriptor, FileHeader};

/// Compressed block(s) of one column, not yet positioned
#[derive(Debug, Clone)]
struct ColumnBlocks {
    name: String,
    column_type: ColumnType,
    data: CompressedBlock,
    offsets: Option<CompressedBlock>,
}

/// Writer for MCF files
#[derive(Debug, Clone)]
pub struct McfWriter {
    config: Config,
    compressor: BlockCompressor,
}

impl McfWriter {
    /// Create a writer, validating the configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let compressor = BlockCompressor::new(config.compression_level);
        Ok(Self { config, compressor })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Infer column types from text, then encode
    pub fn encode_text(&self, text: &TextTable) -> Result<Bytes> {
        let table = TypeInferrer::new(self.config.inference).to_table(text)?;
        self.encode_table(&table)
    }

    /// Encode a typed table into a complete file image
    pub fn encode_table(&self, table: &Table) -> Result<Bytes> {
        self.assemble(table).map(|(_, image)| image)
    }

    /// Encode a table and write the image to `writer`
    ///
    /// Nothing is written unless encoding fully succeeds.
    pub fn write_table<W: Write>(&self, table: &Table, writer: &mut W) -> Result<FileHeader> {
        let (header, image) = self.assemble(table)?;
        writer.write_all(&image)?;
        writer.flush()?;
        Ok(header)
    }

    /// Build the header and the full byte image
    fn assemble(&self, table: &Table) -> Result<(FileHeader, Bytes)> {
        let blocks = if self.config.parallel_encode && table.column_count() > 1 {
            self.compress_columns_parallel(table)?
        } else {
            table
                .columns()
                .iter()
                .map(|c| compress_column(&self.compressor, c))
                .collect::<Result<Vec<_>>>()?
        };

        let header = build_header(table.row_count() as u64, &blocks)?;
        let mut image = header.encode()?;
        image.reserve(header.data_region_len() as usize);

        for column in &blocks {
            image.put_slice(&column.data.bytes);
            if let Some(offsets) = &column.offsets {
                image.put_slice(&offsets.bytes);
            }
        }

        tracing::info!(
            columns = table.column_count(),
            rows = table.row_count(),
            bytes = image.len(),
            "Encoded table"
        );

        Ok((header, image.freeze()))
    }

    /// Encode and compress columns on scoped worker threads
    fn compress_columns_parallel(&self, table: &Table) -> Result<Vec<ColumnBlocks>> {
        let compressor = self.compressor;

        crossbeam::thread::scope(|s| {
            let handles: Vec<_> = table
                .columns()
                .iter()
                .map(|column| s.spawn(move |_| compress_column(&compressor, column)))
                .collect();

            // Joining in spawn order keeps declaration order
            handles
                .into_iter()
                .map(|h| {
                    h.join()
                        .map_err(|_| McfError::Worker("column encoder panicked".to_string()))
                        .and_then(|r| r)
                })
                .collect::<Result<Vec<_>>>()
        })
        .map_err(|_| McfError::Worker("encoder scope panicked".to_string()))?
    }
}

impl Default for McfWriter {
    fn default() -> Self {
        Self {
            config: Config::default(),
            compressor: BlockCompressor::default(),
        }
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

/// Encode one column and compress its block(s)
fn compress_column(compressor: &BlockCompressor, column: &Column) -> Result<ColumnBlocks> {
    let encoded = encode_column(column)?;
    let data = compressor.compress(&encoded.data)?;
    let offsets = encoded
        .offsets
        .as_deref()
        .map(|raw| compressor.compress(raw))
        .transpose()?;

    tracing::debug!(
        column = %encoded.name,
        column_type = %encoded.column_type,
        raw = data.uncompressed_size,
        compressed = data.compressed_size(),
        "Compressed column"
    );

    Ok(ColumnBlocks {
        name: encoded.name,
        column_type: encoded.column_type,
        data,
        offsets,
    })
}

/// Place every block and build the header in a single pass
fn build_header(row_count: u64, blocks: &[ColumnBlocks]) -> Result<FileHeader> {
    let header_size =
        FileHeader::size_for(blocks.iter().map(|b| (b.name.as_str(), b.column_type)))?;
    let mut offset = FileHeader::data_start(header_size);

    let mut descriptors = Vec::with_capacity(blocks.len());
    for column in blocks {
        let data = column.data.at(offset);
        offset += data.compressed_size;

        let offsets = column.offsets.as_ref().map(|block| {
            let r = block.at(offset);
            offset += r.compressed_size;
            r
        });

        descriptors.push(ColumnDescriptor {
            name: column.name.clone(),
            column_type: column.column_type,
            data,
            offsets,
        });
    }

    Ok(FileHeader::new(row_count, descriptors))
}
