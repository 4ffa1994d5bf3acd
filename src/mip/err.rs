//! Errors raised while building or mutating a [`DenseModel`](super::DenseModel).

use std::fmt;

/// Model construction failed. Raised before any search begins.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelBuildError {
    DuplicateColumn { name: String },
    InvalidBounds { name: String, lower: i64, upper: i64 },
    UnknownColumn { row: usize, column: usize },
    NonFiniteCoefficient { context: String, value: f64 },
}

impl fmt::Display for ModelBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelBuildError::DuplicateColumn { name } => {
                write!(f, "duplicate column name `{name}`")
            }
            ModelBuildError::InvalidBounds { name, lower, upper } => {
                write!(f, "column `{name}` has lower bound {lower} > upper bound {upper}")
            }
            ModelBuildError::UnknownColumn { row, column } => {
                write!(f, "row {row} references unknown column {column}")
            }
            ModelBuildError::NonFiniteCoefficient { context, value } => {
                write!(f, "non-finite coefficient {value} in {context}")
            }
        }
    }
}

impl std::error::Error for ModelBuildError {}

/// A mutation on a built [`DenseModel`](super::DenseModel) was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum DenseModelError {
    ColumnOutOfRange { column: usize, columns: usize },
    RowRangeOutOfBounds { start: usize, end: usize, rows: usize },
    NonFinite { value: f64 },
}

impl fmt::Display for DenseModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenseModelError::ColumnOutOfRange { column, columns } => {
                write!(f, "column {column} out of range (model has {columns})")
            }
            DenseModelError::RowRangeOutOfBounds { start, end, rows } => {
                write!(f, "row range {start}..{end} out of bounds (model has {rows})")
            }
            DenseModelError::NonFinite { value } => write!(f, "non-finite value {value}"),
        }
    }
}

impl std::error::Error for DenseModelError {}
