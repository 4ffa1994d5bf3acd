//! Fix-and-optimize Variable Neighborhood Descent (VND).
//!
//! A matheuristic that improves a MIP solution by repeatedly freeing a
//! small slice of the model (a few vehicles, days or customers), pinning
//! every other variable of that kind to the incumbent and solving the
//! resulting sub-problem exactly. Each neighborhood kind grows its slice
//! when it stagnates. When a whole pass over the kinds fails, the search
//! shakes by solving the free model under a random objective.
//!
//! # References
//!
//! - Mladenović, N. & Hansen, P. (1997). "Variable neighborhood search",
//!   *Computers & Operations Research* 24(11), 1097-1100.
//! - Helber, S. & Sahling, F. (2010). "A fix-and-optimize approach for the
//!   multi-level capacitated lot sizing problem", *International Journal
//!   of Production Economics* 123(2), 247-256.

mod config;
mod err;
mod runner;
mod types;

pub use config::{KindSchedule, SweepConfig, VndConfig};
pub use err::VndError;
pub use runner::{VndRunner, VndSearch};
pub use types::{ExploreOutcome, KindCounters, PassOutcome, SearchState, Termination, VndResult};
