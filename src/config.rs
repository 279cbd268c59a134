//! Configuration for MCF
//!
//! Centralized configuration with sensible defaults.

use crate::error::{McfError, Result};

/// Main configuration for encode/decode pipelines
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Compression Configuration
    // -------------------------------------------------------------------------
    /// Deflate level applied to every block (0 = store, 9 = best)
    pub compression_level: u32,

    // -------------------------------------------------------------------------
    // Encoding Configuration
    // -------------------------------------------------------------------------
    /// How a column's type is chosen from its textual values
    pub inference: InferencePolicy,

    /// Encode and compress distinct columns on scoped worker threads
    pub parallel_encode: bool,

    // -------------------------------------------------------------------------
    // Text Configuration
    // -------------------------------------------------------------------------
    /// Field delimiter used by the delimited-text source and sink
    pub delimiter: u8,
}

/// Column type inference policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferencePolicy {
    /// Commit to the type of the first value; every later value must parse
    /// under that type or the encode fails
    FirstValue,

    /// Scan every value and pick the narrowest type all of them fit
    FullScan,
}

/// Highest deflate level accepted
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

impl Default for Config {
    fn default() -> Self {
        Self {
            compression_level: 6,
            inference: InferencePolicy::FirstValue,
            parallel_encode: false,
            delimiter: b',',
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that every field is within range
    pub fn validate(&self) -> Result<()> {
        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(McfError::Config(format!(
                "compression level {} out of range 0..={}",
                self.compression_level, MAX_COMPRESSION_LEVEL
            )));
        }
        if !self.delimiter.is_ascii() || matches!(self.delimiter, b'"' | b'\r' | b'\n') {
            return Err(McfError::Config(format!(
                "delimiter {:?} is reserved",
                self.delimiter as char
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the deflate compression level (0..=9)
    pub fn compression_level(mut self, level: u32) -> Self {
        self.config.compression_level = level;
        self
    }

    /// Set the type inference policy
    pub fn inference(mut self, policy: InferencePolicy) -> Self {
        self.config.inference = policy;
        self
    }

    /// Enable or disable parallel column encoding
    pub fn parallel_encode(mut self, enabled: bool) -> Self {
        self.config.parallel_encode = enabled;
        self
    }

    /// Set the text field delimiter
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
