//! Type inference
//!
//! Chooses a [`ColumnType`] for a textual column and commits every value to it.
//!
//! ## Probe order
//! Int32 → Float64 → String. Each probe is a plain predicate; the first one
//! that accepts the value wins and String always accepts.
//!
//! ## Policies
//! - `FirstValue`: only the first value picks the type. Later values that do
//!   not parse under it abort with `McfError::Encoding`.
//! - `FullScan`: every value is probed and the narrowest type that all of
//!   them fit is chosen. Integers that f64 cannot hold exactly keep the
//!   column as String. Never fails.

use std::num::IntErrorKind;

use crate::config::InferencePolicy;
use crate::error::{McfError, Result};

use super::{Column, ColumnData, ColumnType, Table, TextColumn, TextTable};

/// Ordered typed probes; String is the implicit fallback
const PROBES: [(ColumnType, fn(&str) -> bool); 2] = [
    (ColumnType::Int32, is_integer_like),
    (ColumnType::Float64, is_float_like),
];

/// Classify a single textual value
pub fn infer_type(value: &str) -> ColumnType {
    PROBES
        .iter()
        .find(|(_, probe)| probe(value))
        .map(|(ty, _)| *ty)
        .unwrap_or(ColumnType::String)
}

/// Classify a whole column under the given policy
///
/// A column with no values is String under either policy.
pub fn infer_column_type<S: AsRef<str>>(values: &[S], policy: InferencePolicy) -> ColumnType {
    match policy {
        InferencePolicy::FirstValue => values
            .first()
            .map(|v| infer_type(v.as_ref()))
            .unwrap_or(ColumnType::String),
        InferencePolicy::FullScan => {
            if values.is_empty() {
                ColumnType::String
            } else if values.iter().all(|v| fits_int32(v.as_ref())) {
                ColumnType::Int32
            } else if values.iter().all(|v| fits_float64(v.as_ref())) {
                ColumnType::Float64
            } else {
                ColumnType::String
            }
        }
    }
}

/// Turns text tables into typed tables
#[derive(Debug, Clone, Copy)]
pub struct TypeInferrer {
    policy: InferencePolicy,
}

impl TypeInferrer {
    pub fn new(policy: InferencePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> InferencePolicy {
        self.policy
    }

    /// Infer and commit every column, preserving column order
    pub fn to_table(&self, text: &TextTable) -> Result<Table> {
        let columns = text
            .columns()
            .iter()
            .map(|c| self.commit_column(c))
            .collect::<Result<Vec<_>>>()?;
        Table::new(columns)
    }

    /// Infer one column's type and parse every value under it
    ///
    /// Fails on the first value that cannot be represented.
    pub fn commit_column(&self, column: &TextColumn) -> Result<Column> {
        let column_type = infer_column_type(&column.values, self.policy);
        tracing::debug!(
            column = %column.name,
            %column_type,
            rows = column.values.len(),
            "Inferred column type"
        );

        let data = match column_type {
            ColumnType::Int32 => ColumnData::Int32(
                column
                    .values
                    .iter()
                    .enumerate()
                    .map(|(row, v)| parse_int32(&column.name, row, v))
                    .collect::<Result<_>>()?,
            ),
            ColumnType::Float64 => ColumnData::Float64(
                column
                    .values
                    .iter()
                    .enumerate()
                    .map(|(row, v)| parse_float64(&column.name, row, v))
                    .collect::<Result<_>>()?,
            ),
            ColumnType::String => ColumnData::String(column.values.clone()),
        };

        Ok(Column::new(column.name.clone(), data))
    }
}

impl Default for TypeInferrer {
    fn default() -> Self {
        Self::new(InferencePolicy::FirstValue)
    }
}

// =============================================================================
// Value Parsing
// =============================================================================

/// Parse a value committed to Int32
pub fn parse_int32(column: &str, row: usize, value: &str) -> Result<i32> {
    value.trim().parse::<i32>().map_err(|e| {
        let reason = match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => format!(
                "value '{}' is outside the Int32 range [{}, {}]",
                value,
                i32::MIN,
                i32::MAX
            ),
            _ => format!("value '{}' is not an Int32", value),
        };
        McfError::encoding(column, row, reason)
    })
}

/// Parse a value committed to Float64
///
/// Integer literals must convert exactly; one that would round is rejected.
pub fn parse_float64(column: &str, row: usize, value: &str) -> Result<f64> {
    if !fits_float64(value) && is_integer_like(value) {
        return Err(McfError::encoding(
            column,
            row,
            format!("integer '{}' cannot be represented exactly as Float64", value),
        ));
    }
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| McfError::encoding(column, row, format!("value '{}' is not a Float64", value)))
}

// =============================================================================
// Probes
// =============================================================================

/// Integer literal, regardless of whether it fits in 32 bits
///
/// Overflowing literals still probe as Int32 so the commit step reports them.
fn is_integer_like(value: &str) -> bool {
    match value.trim().parse::<i32>() {
        Ok(_) => true,
        Err(e) => matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow),
    }
}

fn fits_int32(value: &str) -> bool {
    value.trim().parse::<i32>().is_ok()
}

fn is_float_like(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok()
}

/// Float literal, or an integer literal that survives the trip through f64
fn fits_float64(value: &str) -> bool {
    let value = value.trim();
    match value.parse::<i128>() {
        Ok(n) => {
            // Casting back saturates, so the i128 limits themselves would compare equal
            let f = n as f64;
            f.abs() < i128::MAX as f64 && f as i128 == n
        }
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
            false
        }
        Err(_) => is_float_like(value),
    }
}
