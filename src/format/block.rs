//! Block compressor
//!
//! Wraps raw column bytes in a deflate (zlib container) block and unwraps
//! blocks read back from a file.
//!
//! ## Integrity
//! Every block records its uncompressed size. Inflating must yield exactly
//! that many bytes; anything else is an `McfError::Integrity`. There is no
//! partial recovery.

use std::io::{Read, Seek, SeekFrom, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{McfError, Result};

use super::header::BlockRef;

/// A compressed block held in memory before it is positioned in a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedBlock {
    /// Deflated bytes exactly as they will appear in the data region
    pub bytes: Vec<u8>,
    /// Length of the raw bytes before compression
    pub uncompressed_size: u64,
}

impl CompressedBlock {
    pub fn compressed_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Reference to this block once placed at `offset`
    pub fn at(&self, offset: u64) -> BlockRef {
        BlockRef {
            offset,
            compressed_size: self.compressed_size(),
            uncompressed_size: self.uncompressed_size,
        }
    }
}

/// Deflate wrapper with a fixed compression level
#[derive(Debug, Clone, Copy)]
pub struct BlockCompressor {
    level: Compression,
}

impl BlockCompressor {
    /// Create a compressor; `level` is clamped to 0..=9
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }

    /// Compress raw bytes into a block
    pub fn compress(&self, raw: &[u8]) -> Result<CompressedBlock> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(raw.len() / 2 + 16), self.level);
        encoder.write_all(raw)?;
        let bytes = encoder.finish()?;

        Ok(CompressedBlock {
            bytes,
            uncompressed_size: raw.len() as u64,
        })
    }

    /// Inflate `compressed` and check it yields exactly `expected` bytes
    ///
    /// Reads at most one byte past `expected` so oversized output is caught
    /// without inflating the whole stream.
    pub fn inflate(compressed: &[u8], expected: u64) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(expected.min(compressed.len() as u64 * 8) as usize);
        ZlibDecoder::new(compressed)
            .take(expected.saturating_add(1))
            .read_to_end(&mut out)
            .map_err(|e| McfError::Integrity(format!("Failed to inflate block: {}", e)))?;

        let actual = out.len() as u64;
        if actual < expected {
            return Err(McfError::Integrity(format!(
                "Decompressed size mismatch: expected {} bytes, got {}",
                expected, actual
            )));
        }
        if actual > expected {
            return Err(McfError::Integrity(format!(
                "Decompressed size mismatch: expected {} bytes, got more",
                expected
            )));
        }

        Ok(out)
    }

    /// Seek to a block, read exactly its compressed bytes, and inflate them
    pub fn read_block<R: Read + Seek>(reader: &mut R, block: &BlockRef) -> Result<Vec<u8>> {
        reader.seek(SeekFrom::Start(block.offset))?;

        let mut compressed = Vec::new();
        reader
            .by_ref()
            .take(block.compressed_size)
            .read_to_end(&mut compressed)?;

        if (compressed.len() as u64) < block.compressed_size {
            return Err(McfError::Format(format!(
                "Block at offset {} truncated: expected {} bytes, found {}",
                block.offset,
                block.compressed_size,
                compressed.len()
            )));
        }

        tracing::trace!(
            offset = block.offset,
            compressed = block.compressed_size,
            uncompressed = block.uncompressed_size,
            "Read block"
        );

        Self::inflate(&compressed, block.uncompressed_size).map_err(|e| match e {
            McfError::Integrity(msg) => {
                McfError::Integrity(format!("block at offset {}: {}", block.offset, msg))
            }
            other => other,
        })
    }
}

impl Default for BlockCompressor {
    fn default() -> Self {
        Self::new(6)
    }
}
