//! Table Module
//!
//! In-memory tables exchanged with the codec.
//!
//! ## Two shapes
//! - [`TextTable`]: what a text source produces; every cell is a string.
//! - [`Table`]: what the codec consumes and produces; every column is typed.
//!
//! [`infer`] turns the first into the second.

pub mod infer;

use std::collections::HashSet;
use std::fmt;

use crate::error::{McfError, Result};
use crate::format::{MAX_COLUMNS, MAX_NAME_LEN};

pub use infer::{infer_column_type, infer_type, TypeInferrer};

// =============================================================================
// Column Types
// =============================================================================

/// Semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int32,
    Float64,
    String,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Int32 => "Int32",
            ColumnType::Float64 => "Float64",
            ColumnType::String => "String",
        };
        f.pad(name)
    }
}

// =============================================================================
// Typed Table
// =============================================================================

/// Typed values of one column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int32(Vec<i32>),
    Float64(Vec<f64>),
    String(Vec<String>),
}

impl ColumnData {
    /// Empty data of the given type
    pub fn empty(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Int32 => ColumnData::Int32(Vec::new()),
            ColumnType::Float64 => ColumnData::Float64(Vec::new()),
            ColumnType::String => ColumnData::String(Vec::new()),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Int32(_) => ColumnType::Int32,
            ColumnData::Float64(_) => ColumnType::Float64,
            ColumnData::String(_) => ColumnType::String,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int32(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
            ColumnData::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the value at `row`
    pub fn get(&self, row: usize) -> Option<Value<'_>> {
        match self {
            ColumnData::Int32(v) => v.get(row).map(|&x| Value::Int32(x)),
            ColumnData::Float64(v) => v.get(row).map(|&x| Value::Float64(x)),
            ColumnData::String(v) => v.get(row).map(|s| Value::Str(s)),
        }
    }
}

/// A single borrowed cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Int32(i32),
    Float64(f64),
    Str(&'a str),
}

impl fmt::Display for Value<'_> {
    /// Floats always keep a decimal point or exponent (`1.0`, `1e20`) so the
    /// text form re-infers as Float64.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{:?}", v),
            Value::Str(s) => f.write_str(s),
        }
    }
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Ordered set of typed columns sharing one row count
///
/// ## Invariants (checked by [`Table::new`]):
/// - column names are unique and at most 255 UTF-8 bytes
/// - at most 255 columns
/// - every column holds `row_count` values
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Build a table, validating its invariants
    ///
    /// A table without columns has zero rows.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        validate_names(columns.iter().map(|c| c.name.as_str()))?;

        let row_count = columns.first().map(|c| c.len()).unwrap_or(0);
        if let Some(c) = columns.iter().find(|c| c.len() != row_count) {
            return Err(McfError::InvalidTable(format!(
                "column '{}' has {} rows, expected {}",
                c.name,
                c.len(),
                row_count
            )));
        }

        Ok(Self { columns, row_count })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

// =============================================================================
// Text Table (source side)
// =============================================================================

/// A column as read from a text source: every cell still a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextColumn {
    pub name: String,
    pub values: Vec<String>,
}

impl TextColumn {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Column-name → textual values, in header order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTable {
    columns: Vec<TextColumn>,
    row_count: usize,
}

impl TextTable {
    /// Build a text table, validating the same invariants as [`Table`]
    pub fn new(columns: Vec<TextColumn>) -> Result<Self> {
        validate_names(columns.iter().map(|c| c.name.as_str()))?;

        let row_count = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(c) = columns.iter().find(|c| c.values.len() != row_count) {
            return Err(McfError::InvalidTable(format!(
                "column '{}' has {} rows, expected {}",
                c.name,
                c.values.len(),
                row_count
            )));
        }

        Ok(Self { columns, row_count })
    }

    /// Convenience constructor from `(name, values)` pairs
    pub fn from_pairs<N, V, S>(pairs: impl IntoIterator<Item = (N, V)>) -> Result<Self>
    where
        N: Into<String>,
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = pairs
            .into_iter()
            .map(|(name, values)| {
                TextColumn::new(name, values.into_iter().map(Into::into).collect())
            })
            .collect();
        Self::new(columns)
    }

    pub fn columns(&self) -> &[TextColumn] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

/// Shared name checks for both table shapes
fn validate_names<'a>(names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    let mut count = 0usize;

    for name in names {
        count += 1;
        if name.len() > MAX_NAME_LEN {
            return Err(McfError::InvalidTable(format!(
                "column name '{}' is {} bytes, max {}",
                name,
                name.len(),
                MAX_NAME_LEN
            )));
        }
        if !seen.insert(name) {
            return Err(McfError::InvalidTable(format!(
                "duplicate column name '{}'",
                name
            )));
        }
    }

    if count > MAX_COLUMNS {
        return Err(McfError::InvalidTable(format!(
            "{} columns, max {}",
            count, MAX_COLUMNS
        )));
    }

    Ok(())
}
