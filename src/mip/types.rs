//! Solver boundary: solutions, solve parameters, statuses and the model trait.

use std::fmt;
use std::ops::{Index, Range};
use std::time::Duration;

/// Dense assignment of values to model columns.
///
/// The vector is indexed identically to the model's columns, so
/// `solution[j]` is the value of column `j`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    values: Vec<f64>,
}

impl Solution {
    /// Wraps a value vector.
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// All-zero solution over `columns` columns.
    pub fn zeros(columns: usize) -> Self {
        Self {
            values: vec![0.0; columns],
        }
    }

    /// Number of columns covered.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of column `column`. Panics when out of range.
    pub fn value(&self, column: usize) -> f64 {
        self.values[column]
    }

    /// Overwrites the value of one column.
    pub fn set(&mut self, column: usize, value: f64) {
        self.values[column] = value;
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

impl From<Vec<f64>> for Solution {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl Index<usize> for Solution {
    type Output = f64;

    fn index(&self, column: usize) -> &f64 {
        &self.values[column]
    }
}

/// Optimization emphasis handed to the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Emphasis {
    /// Prefer finding any feasible point quickly.
    Feasibility,
    /// Prefer closing the optimality gap.
    #[default]
    Optimality,
}

/// Parameters for a single solver call.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_matheur::mip::{Emphasis, SolveParams};
///
/// let params = SolveParams::default()
///     .with_time_limit(Duration::from_secs(5))
///     .with_optimality_gap(1e-3)
///     .with_emphasis(Emphasis::Feasibility);
/// assert_eq!(params.time_limit, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolveParams {
    /// Wall-clock limit for this call.
    pub time_limit: Duration,
    /// Relative gap at which the solver may stop.
    pub optimality_gap: f64,
    /// Feasibility-first or optimality-first search.
    pub emphasis: Emphasis,
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(60),
            optimality_gap: 1e-4,
            emphasis: Emphasis::Optimality,
        }
    }
}

impl SolveParams {
    /// Sets the solve time limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    /// Sets the relative optimality gap.
    pub fn with_optimality_gap(mut self, gap: f64) -> Self {
        self.optimality_gap = gap;
        self
    }

    /// Sets the solver emphasis.
    pub fn with_emphasis(mut self, emphasis: Emphasis) -> Self {
        self.emphasis = emphasis;
        self
    }
}

/// Coarse status of a solver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolveStatus {
    Optimal,
    FeasibleTimeout,
    Infeasible,
    NoSolution,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::FeasibleTimeout => "feasible",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::NoSolution => "no-solution",
        };
        f.write_str(s)
    }
}

/// A solution reported by the solver together with its objective.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedPoint {
    /// Objective as reported by the solver under the coefficients in
    /// place at solve time.
    pub objective: f64,
    pub solution: Solution,
}

/// Outcome of a solver call.
///
/// Backend errors are folded into [`SolveResult::NoSolution`] by the
/// oracle, so the search only ever consumes this type.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveResult {
    /// Proven optimal within the requested gap.
    Optimal(SolvedPoint),
    /// Feasible but not proven optimal (time limit or feasibility emphasis).
    FeasibleTimeout(SolvedPoint),
    /// The model has no feasible point.
    Infeasible,
    /// The solver stopped without a feasible point.
    NoSolution,
}

impl SolveResult {
    pub fn status(&self) -> SolveStatus {
        match self {
            SolveResult::Optimal(_) => SolveStatus::Optimal,
            SolveResult::FeasibleTimeout(_) => SolveStatus::FeasibleTimeout,
            SolveResult::Infeasible => SolveStatus::Infeasible,
            SolveResult::NoSolution => SolveStatus::NoSolution,
        }
    }

    /// Whether a feasible point was returned.
    pub fn is_solution_found(&self) -> bool {
        matches!(
            self,
            SolveResult::Optimal(_) | SolveResult::FeasibleTimeout(_)
        )
    }

    pub fn point(&self) -> Option<&SolvedPoint> {
        match self {
            SolveResult::Optimal(p) | SolveResult::FeasibleTimeout(p) => Some(p),
            _ => None,
        }
    }

    pub fn into_point(self) -> Option<SolvedPoint> {
        match self {
            SolveResult::Optimal(p) | SolveResult::FeasibleTimeout(p) => Some(p),
            _ => None,
        }
    }
}

/// A MIP loaded into an external solver.
///
/// This is the only boundary the search engine depends on. Implementors
/// wrap a commercial or open-source solver; the engine appends and
/// deletes rows, rewrites objective coefficients and calls [`solve`].
/// Every mutation must be visible to the next `solve` call.
///
/// Rows `0..k` present when the model is handed to the engine are base
/// rows and are never deleted by it.
///
/// [`solve`]: MipModel::solve
pub trait MipModel {
    /// Backend error type.
    type Error: fmt::Display;

    /// Number of columns (variables).
    fn num_columns(&self) -> usize;

    /// Number of rows (constraints), including temporary ones.
    fn num_rows(&self) -> usize;

    /// Whether column `column` is integer-restricted.
    fn is_integer(&self, column: usize) -> bool;

    /// Current objective coefficient of `column`.
    fn objective_coefficient(&self, column: usize) -> f64;

    /// Overwrites the objective coefficient of `column`.
    fn set_objective_coefficient(&mut self, column: usize, value: f64) -> Result<(), Self::Error>;

    /// Constant term of the objective.
    fn objective_offset(&self) -> f64 {
        0.0
    }

    /// Appends the row `x[column] == value`.
    fn add_equality_row(&mut self, column: usize, value: f64) -> Result<(), Self::Error>;

    /// Deletes the contiguous row range `rows`.
    fn delete_rows(&mut self, rows: Range<usize>) -> Result<(), Self::Error>;

    /// Optimizes the model (minimization).
    fn solve(&mut self, params: &SolveParams) -> Result<SolveResult, Self::Error>;

    /// Hands the solver a starting point. Backends without MIP starts
    /// may ignore it.
    fn set_warm_start(&mut self, _solution: &Solution) -> Result<(), Self::Error> {
        Ok(())
    }
}
