//! Mixed-integer programming boundary.
//!
//! The search engine never sees a concrete solver. It talks to a
//! [`MipModel`]: a model already loaded into some solver, which can be
//! solved, extended with equality rows, shrunk by a row range and have
//! its objective coefficients rewritten.
//!
//! [`DenseModel`] is a small self-contained implementation that solves
//! by enumeration. It exists for tests, benchmarks and toy instances;
//! production runs plug in a binding to a real MIP solver.

mod dense;
mod err;
mod types;

pub use dense::{DenseModel, DenseModelBuilder, Row, Sense};
pub use err::{DenseModelError, ModelBuildError};
pub use types::{
    Emphasis, MipModel, Solution, SolveParams, SolveResult, SolveStatus, SolvedPoint,
};
