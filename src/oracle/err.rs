use std::fmt;

/// Failure of an oracle mutation or of its row bookkeeping.
///
/// Checkpoint and drift errors mean the base model would have been
/// corrupted; the search treats them as fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleError {
    /// The backend rejected an operation.
    Backend {
        operation: &'static str,
        message: String,
    },
    ColumnOutOfRange { column: usize, columns: usize },
    /// Deleting from `checkpoint` would remove base rows.
    CheckpointBelowBase { checkpoint: usize, base: usize },
    /// The checkpoint lies beyond the current row count.
    CheckpointAhead { checkpoint: usize, rows: usize },
    /// Row count after a deletion differs from the checkpoint.
    RowCountDrift { expected: usize, actual: usize },
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleError::Backend { operation, message } => {
                write!(f, "solver backend failed during {operation}: {message}")
            }
            OracleError::ColumnOutOfRange { column, columns } => {
                write!(f, "column {column} out of range (model has {columns})")
            }
            OracleError::CheckpointBelowBase { checkpoint, base } => write!(
                f,
                "row checkpoint {checkpoint} lies below the {base} base rows"
            ),
            OracleError::CheckpointAhead { checkpoint, rows } => write!(
                f,
                "row checkpoint {checkpoint} lies beyond the current {rows} rows"
            ),
            OracleError::RowCountDrift { expected, actual } => write!(
                f,
                "row count is {actual} after release, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for OracleError {}
