//! Search state, per-kind counters and run results.

use crate::incumbent::IncumbentRecord;
use crate::mip::{Solution, SolveStatus};
use crate::neighborhood::NeighborhoodKind;
use std::time::Duration;

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchState {
    /// No neighborhood explored yet.
    Idle,
    Searching(NeighborhoodKind),
    /// The kind just hit its stagnation threshold and grew.
    Stagnated(NeighborhoodKind),
    /// A full pass found no improvement.
    Converged,
    TimeExpired,
    Cancelled,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Termination {
    TimeExpired,
    Cancelled,
    PassLimit,
}

/// Size and stagnation bookkeeping for one neighborhood kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KindCounters {
    pub kind: NeighborhoodKind,
    /// Free groups in the next neighborhood of this kind.
    pub size: usize,
    /// Consecutive non-improving attempts since the last reset.
    pub stagnation: usize,
    pub attempts: usize,
    pub improvements: usize,
}

/// Outcome of evaluating one neighborhood.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExploreOutcome {
    /// The sub-problem beat the incumbent, which now has this objective.
    Improved { objective: f64 },
    /// The sub-problem was solved (or failed) without improving.
    NotImproved { status: SolveStatus },
    /// The deadline or cancellation stopped the search before solving.
    Skipped,
}

/// Outcome of one pass over every scheduled kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Improved,
    Converged,
    Interrupted,
}

/// Result of a VND run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VndResult {
    /// Best solution found.
    pub best: Solution,
    /// Objective of the best solution.
    pub best_objective: f64,
    /// Objective of the working solution at the end of the run.
    pub current_objective: f64,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
    /// Neighborhood sub-problems solved.
    pub subproblems: usize,
    /// Incumbent improvements after the initial solution.
    pub improvements: usize,
    pub shakes: usize,
    pub passes: usize,
    pub termination: Termination,
    /// Incumbent objective at every update, starting with the seed.
    pub history: Vec<IncumbentRecord>,
    pub counters: Vec<KindCounters>,
}
