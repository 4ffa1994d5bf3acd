use crate::neighborhood::NeighborhoodKind;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateFamily { name: String },
    ZeroLengthAxis { family: String, axis: usize },
    RepeatedKind { family: String, kind: NeighborhoodKind },
    DimensionMismatch {
        kind: NeighborhoodKind,
        expected: usize,
        found: usize,
    },
    UnknownFamily { id: usize },
    KeyArity { family: String, expected: usize, found: usize },
    KeyOutOfRange {
        family: String,
        axis: usize,
        index: usize,
        len: usize,
    },
    ColumnOutOfRange { column: usize, columns: usize },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateFamily { name } => {
                write!(f, "variable family `{name}` registered twice")
            }
            RegistryError::ZeroLengthAxis { family, axis } => {
                write!(f, "family `{family}` axis {axis} has length zero")
            }
            RegistryError::RepeatedKind { family, kind } => {
                write!(f, "family `{family}` is keyed by {kind} more than once")
            }
            RegistryError::DimensionMismatch {
                kind,
                expected,
                found,
            } => write!(
                f,
                "{kind} axis has length {found}, but earlier families declared {expected}"
            ),
            RegistryError::UnknownFamily { id } => write!(f, "unknown family id {id}"),
            RegistryError::KeyArity {
                family,
                expected,
                found,
            } => write!(
                f,
                "family `{family}` expects {expected} key components, got {found}"
            ),
            RegistryError::KeyOutOfRange {
                family,
                axis,
                index,
                len,
            } => write!(
                f,
                "family `{family}` axis {axis}: index {index} out of range (len {len})"
            ),
            RegistryError::ColumnOutOfRange { column, columns } => {
                write!(f, "column {column} out of range (registry has {columns})")
            }
        }
    }
}

impl std::error::Error for RegistryError {}
