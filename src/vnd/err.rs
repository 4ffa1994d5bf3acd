use crate::mip::SolveStatus;
use crate::neighborhood::NeighborhoodKind;
use crate::oracle::OracleError;
use crate::registry::FamilyId;
use std::fmt;

/// Fatal errors of the VND controller.
#[derive(Debug, Clone, PartialEq)]
pub enum VndError {
    InvalidConfig(String),
    /// Registry and model disagree on the number of columns.
    RegistryMismatch { registry: usize, model: usize },
    /// Dimensions passed to the search disagree with the registry axes.
    DimensionMismatch {
        kind: NeighborhoodKind,
        registry: usize,
        given: usize,
    },
    UnknownFamily(FamilyId),
    UnscheduledKind(NeighborhoodKind),
    /// The initial solve returned no feasible point.
    NoInitialSolution { status: SolveStatus },
    /// A seeded incumbent does not cover the model's columns.
    SeedLength { expected: usize, found: usize },
    /// A neighborhood was explored before any incumbent existed.
    NoIncumbent,
    Oracle(OracleError),
}

impl From<OracleError> for VndError {
    fn from(e: OracleError) -> Self {
        VndError::Oracle(e)
    }
}

impl fmt::Display for VndError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VndError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            VndError::RegistryMismatch { registry, model } => write!(
                f,
                "registry maps {registry} columns but the model has {model}"
            ),
            VndError::DimensionMismatch {
                kind,
                registry,
                given,
            } => write!(
                f,
                "{kind} dimension is {given}, but the registry declares {registry}"
            ),
            VndError::UnknownFamily(id) => write!(f, "unknown variable family {}", id.index()),
            VndError::UnscheduledKind(kind) => {
                write!(f, "neighborhood kind {kind} is not in the schedule")
            }
            VndError::NoInitialSolution { status } => {
                write!(f, "initial solve found no feasible solution ({status})")
            }
            VndError::SeedLength { expected, found } => write!(
                f,
                "seed solution has {found} values, the model has {expected} columns"
            ),
            VndError::NoIncumbent => f.write_str("no incumbent to fix against"),
            VndError::Oracle(e) => write!(f, "oracle: {e}"),
        }
    }
}

impl std::error::Error for VndError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VndError::Oracle(e) => Some(e),
            _ => None,
        }
    }
}
