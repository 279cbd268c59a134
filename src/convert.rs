//! Conversion pipelines
//!
//! File-level entry points that wire a text source or sink to the codec.
//!
//! ## Write path
//! text file → DelimitedReader → TypeInferrer → McfWriter → output file
//!
//! ## Read path
//! MCF file → McfReader (selective) → DelimitedWriter → text file
//!
//! Each pipeline finishes all encoding or decoding in memory before the
//! output file is created, so a failed conversion leaves no output behind.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use crate::config::Config;
use crate::error::Result;
use crate::format::{FileHeader, McfReader, McfWriter};
use crate::table::{Table, TypeInferrer};
use crate::text::{DelimitedReader, DelimitedWriter, TableSink, TableSource};

/// Shape and size of a finished conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertStats {
    pub columns: usize,
    pub rows: u64,
    /// Bytes written to the output
    pub bytes: u64,
}

// =============================================================================
// Encode
// =============================================================================

/// Encode a delimited text file into an MCF file
pub fn encode_file(input: &Path, output: &Path, config: &Config) -> Result<ConvertStats> {
    tracing::info!("Encoding {} -> {}", input.display(), output.display());

    let file = File::open(input)?;
    let mut source = DelimitedReader::new(BufReader::new(file), config.delimiter);

    // Encode fully before touching the output path
    let mut image = Vec::new();
    let header = encode_source(&mut source, config, &mut image)?;

    let mut writer = BufWriter::new(File::create(output)?);
    writer.write_all(&image)?;
    writer.flush()?;

    let stats = ConvertStats {
        columns: header.columns.len(),
        rows: header.row_count,
        bytes: image.len() as u64,
    };
    tracing::info!(
        columns = stats.columns,
        rows = stats.rows,
        bytes = stats.bytes,
        "Encode complete"
    );
    Ok(stats)
}

/// Pull a table from `source`, encode it, and write the image to `writer`
pub fn encode_source<S, W>(source: &mut S, config: &Config, writer: &mut W) -> Result<FileHeader>
where
    S: TableSource,
    W: Write,
{
    let mcf = McfWriter::new(config.clone())?;
    let text = source.read_table()?;
    let table = TypeInferrer::new(config.inference).to_table(&text)?;
    mcf.write_table(&table, writer)
}

// =============================================================================
// Decode
// =============================================================================

/// Decode an MCF file (optionally only some columns) into a delimited text file
pub fn decode_file<S: AsRef<str>>(
    input: &Path,
    output: &Path,
    columns: Option<&[S]>,
    config: &Config,
) -> Result<ConvertStats> {
    tracing::info!("Decoding {} -> {}", input.display(), output.display());
    config.validate()?;

    let mut reader = McfReader::open(input)?;
    let table = reader.read_table(columns)?;

    // Render fully before touching the output path
    let mut sink = DelimitedWriter::new(Vec::new(), config.delimiter);
    sink.write_table(&table)?;
    let text = sink.into_inner();

    let mut writer = BufWriter::new(File::create(output)?);
    writer.write_all(&text)?;
    writer.flush()?;

    let stats = ConvertStats {
        columns: table.column_count(),
        rows: table.row_count() as u64,
        bytes: text.len() as u64,
    };
    tracing::info!(
        columns = stats.columns,
        rows = stats.rows,
        bytes = stats.bytes,
        "Decode complete"
    );
    Ok(stats)
}

/// Decode from any seekable stream into any sink
pub fn decode_to_sink<R, K, S>(reader: R, sink: &mut K, columns: Option<&[S]>) -> Result<Table>
where
    R: Read + Seek,
    K: TableSink,
    S: AsRef<str>,
{
    let mut mcf = McfReader::new(reader)?;
    let table = mcf.read_table(columns)?;
    sink.write_table(&table)?;
    Ok(table)
}

// =============================================================================
// Inspect
// =============================================================================

/// Parse only the header of an MCF file
pub fn inspect_file(input: &Path) -> Result<FileHeader> {
    let reader = McfReader::open(input)?;
    Ok(reader.header().clone())
}
