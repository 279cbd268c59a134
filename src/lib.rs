//! # MCF
//!
//! A compact, typed, compressed, column-oriented binary table format with:
//! - Per-column typed encoding (Int32, Float64, String)
//! - Deflate-compressed blocks with declared sizes for integrity checking
//! - A self-describing header computed in a single analytic pass
//! - Selective column reads that never touch unrequested blocks
//! - Delimited-text conversion in both directions
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Delimited Text Source/Sink                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ TextTable / Table
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      TypeInferrer                           │
//! │              (Int32 → Float64 → String probe)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  McfWriter  │          │  McfReader  │
//!   │ (assemble)  │          │ (selective) │
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │
//!          ▼                        ▼
//!   ┌─────────────────────────────────────┐
//!   │ ColumnCodec · BlockCompressor ·     │
//!   │ HeaderCodec                         │
//!   └─────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod table;
pub mod format;
pub mod text;
pub mod convert;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{McfError, Result};
pub use config::{Config, InferencePolicy};
pub use format::{FileHeader, McfReader, McfWriter};
pub use table::{Column, ColumnData, ColumnType, Table, TextColumn, TextTable, Value};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the mcf crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
