//! Solver oracle: the engine's single handle on the MIP model.
//!
//! [`SolverOracle`] wraps a [`MipModel`] and adds the bookkeeping the
//! search relies on:
//!
//! - the number of base rows is recorded once, and no deletion may ever
//!   reach below it
//! - backend errors from `solve` are folded into
//!   [`SolveResult::NoSolution`]
//! - objective perturbations return a snapshot of the exact original
//!   coefficients
//!
//! Temporary mutations are normally made through [`FixingScope`] and
//! [`PerturbationScope`], which undo them on every exit path.

mod err;
mod scope;

pub use err::OracleError;
pub use scope::{FixingScope, PerturbationScope};

use crate::mip::{MipModel, Solution, SolveParams, SolveResult};
use std::collections::BTreeMap;
use tracing::{trace, warn};

/// Column to objective coefficient.
pub type CoefficientMap = BTreeMap<usize, f64>;

/// Row count recorded before a fixing round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RowCheckpoint(usize);

impl RowCheckpoint {
    pub fn new(rows: usize) -> Self {
        Self(rows)
    }

    pub fn rows(self) -> usize {
        self.0
    }
}

/// Original objective coefficients of the columns touched by a
/// perturbation.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveSnapshot {
    original: Vec<(usize, f64)>,
}

impl ObjectiveSnapshot {
    pub fn columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.original.iter().map(|&(j, _)| j)
    }

    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }
}

/// Adapter between the search and a [`MipModel`].
#[derive(Debug)]
pub struct SolverOracle<M: MipModel> {
    model: M,
    base_rows: usize,
    solves: usize,
}

impl<M: MipModel> SolverOracle<M> {
    /// Takes ownership of a freshly built model. Every row present now
    /// is a base row.
    pub fn new(model: M) -> Self {
        let base_rows = model.num_rows();
        Self {
            model,
            base_rows,
            solves: 0,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    pub fn base_rows(&self) -> usize {
        self.base_rows
    }

    pub fn num_rows(&self) -> usize {
        self.model.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.model.num_columns()
    }

    /// Solver calls issued so far.
    pub fn solves(&self) -> usize {
        self.solves
    }

    pub fn checkpoint(&self) -> RowCheckpoint {
        RowCheckpoint(self.model.num_rows())
    }

    /// Appends `x[column] == value`.
    pub fn fix(&mut self, column: usize, value: f64) -> Result<(), OracleError> {
        self.check_column(column)?;
        self.model
            .add_equality_row(column, value)
            .map_err(|e| backend("add_equality_row", e))
    }

    /// Deletes every row appended since `checkpoint` and returns how many
    /// were removed. A checkpoint equal to the current row count is a
    /// no-op.
    pub fn unfix_all_since(&mut self, checkpoint: RowCheckpoint) -> Result<usize, OracleError> {
        let rows = self.model.num_rows();
        if checkpoint.0 < self.base_rows {
            return Err(OracleError::CheckpointBelowBase {
                checkpoint: checkpoint.0,
                base: self.base_rows,
            });
        }
        if checkpoint.0 > rows {
            return Err(OracleError::CheckpointAhead {
                checkpoint: checkpoint.0,
                rows,
            });
        }
        if checkpoint.0 == rows {
            return Ok(0);
        }

        self.model
            .delete_rows(checkpoint.0..rows)
            .map_err(|e| backend("delete_rows", e))?;

        let after = self.model.num_rows();
        if after != checkpoint.0 {
            return Err(OracleError::RowCountDrift {
                expected: checkpoint.0,
                actual: after,
            });
        }
        trace!(removed = rows - checkpoint.0, rows = after, "fixing rows released");
        Ok(rows - checkpoint.0)
    }

    /// Opens a scope whose fixing rows are released on drop.
    pub fn begin_fixing(&mut self) -> FixingScope<'_, M> {
        FixingScope::new(self)
    }

    /// Solves the model in its current state. Backend failures and
    /// malformed solution vectors become [`SolveResult::NoSolution`].
    pub fn solve(&mut self, params: &SolveParams) -> SolveResult {
        self.solves += 1;
        match self.model.solve(params) {
            Ok(result) => match result.point() {
                Some(p) if p.solution.len() != self.model.num_columns() => {
                    warn!(
                        len = p.solution.len(),
                        columns = self.model.num_columns(),
                        "solver returned a solution of the wrong length"
                    );
                    SolveResult::NoSolution
                }
                _ => result,
            },
            Err(e) => {
                warn!(error = %e, "solver call failed");
                SolveResult::NoSolution
            }
        }
    }

    /// Passes a starting point to the solver. Failures are logged only.
    pub fn warm_start(&mut self, solution: &Solution) {
        if let Err(e) = self.model.set_warm_start(solution) {
            warn!(error = %e, "warm start rejected");
        }
    }

    /// Objective of `solution` under the coefficients currently in the
    /// model.
    pub fn evaluate(&self, solution: &Solution) -> f64 {
        debug_assert_eq!(solution.len(), self.model.num_columns());
        self.model.objective_offset()
            + solution
                .values()
                .iter()
                .enumerate()
                .map(|(j, &v)| self.model.objective_coefficient(j) * v)
                .sum::<f64>()
    }

    /// Overwrites the given coefficients and returns the originals.
    ///
    /// If the backend rejects one of the writes, the coefficients already
    /// written are restored before the error is returned.
    pub fn perturb_objective(
        &mut self,
        coefficients: &CoefficientMap,
    ) -> Result<ObjectiveSnapshot, OracleError> {
        for &column in coefficients.keys() {
            self.check_column(column)?;
        }
        let snapshot = ObjectiveSnapshot {
            original: coefficients
                .keys()
                .map(|&j| (j, self.model.objective_coefficient(j)))
                .collect(),
        };

        for (written, (&column, &value)) in coefficients.iter().enumerate() {
            if let Err(e) = self.model.set_objective_coefficient(column, value) {
                let partial = ObjectiveSnapshot {
                    original: snapshot.original[..written].to_vec(),
                };
                self.restore_objective(&partial)?;
                return Err(backend("set_objective_coefficient", e));
            }
        }
        Ok(snapshot)
    }

    /// Writes back the coefficients recorded in `snapshot`.
    pub fn restore_objective(&mut self, snapshot: &ObjectiveSnapshot) -> Result<(), OracleError> {
        for &(column, value) in &snapshot.original {
            self.model
                .set_objective_coefficient(column, value)
                .map_err(|e| backend("set_objective_coefficient", e))?;
        }
        Ok(())
    }

    /// Perturbs the objective inside a scope that restores it on drop.
    pub fn perturbed(
        &mut self,
        coefficients: &CoefficientMap,
    ) -> Result<PerturbationScope<'_, M>, OracleError> {
        let snapshot = self.perturb_objective(coefficients)?;
        Ok(PerturbationScope::new(self, snapshot))
    }

    fn check_column(&self, column: usize) -> Result<(), OracleError> {
        let columns = self.model.num_columns();
        if column >= columns {
            return Err(OracleError::ColumnOutOfRange { column, columns });
        }
        Ok(())
    }
}

fn backend<E: std::fmt::Display>(operation: &'static str, e: E) -> OracleError {
    OracleError::Backend {
        operation,
        message: e.to_string(),
    }
}
