//! Guards that undo temporary model mutations on every exit path.

use super::err::OracleError;
use super::{ObjectiveSnapshot, RowCheckpoint, SolverOracle};
use crate::mip::{MipModel, Solution, SolveParams, SolveResult};
use tracing::warn;

/// Temporary fixing rows on top of the base model.
///
/// Rows appended through the scope are deleted when it is released or
/// dropped. Prefer [`release`](Self::release), which reports invariant
/// violations; a violation found while dropping panics unless the
/// thread is already unwinding.
pub struct FixingScope<'a, M: MipModel> {
    oracle: &'a mut SolverOracle<M>,
    checkpoint: RowCheckpoint,
    fixed: usize,
    released: bool,
}

impl<'a, M: MipModel> FixingScope<'a, M> {
    pub(super) fn new(oracle: &'a mut SolverOracle<M>) -> Self {
        let checkpoint = oracle.checkpoint();
        Self {
            oracle,
            checkpoint,
            fixed: 0,
            released: false,
        }
    }

    /// Pins `column` to `value` for the lifetime of the scope.
    pub fn fix(&mut self, column: usize, value: f64) -> Result<(), OracleError> {
        self.oracle.fix(column, value)?;
        self.fixed += 1;
        Ok(())
    }

    /// Number of rows appended so far.
    pub fn fixed_count(&self) -> usize {
        self.fixed
    }

    pub fn checkpoint(&self) -> RowCheckpoint {
        self.checkpoint
    }

    pub fn oracle(&self) -> &SolverOracle<M> {
        &*self.oracle
    }

    pub fn warm_start(&mut self, solution: &Solution) {
        self.oracle.warm_start(solution);
    }

    pub fn solve(&mut self, params: &SolveParams) -> SolveResult {
        self.oracle.solve(params)
    }

    /// Deletes every row appended since the scope opened and returns how
    /// many were removed.
    pub fn release(mut self) -> Result<usize, OracleError> {
        self.released = true;
        self.oracle.unfix_all_since(self.checkpoint)
    }
}

impl<M: MipModel> Drop for FixingScope<'_, M> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.oracle.unfix_all_since(self.checkpoint) {
            if std::thread::panicking() {
                warn!(error = %e, "fixing rows could not be released while unwinding");
            } else {
                panic!("fixing rows could not be released: {e}");
            }
        }
    }
}

/// Perturbed objective coefficients, restored bit-exactly on release or
/// drop.
pub struct PerturbationScope<'a, M: MipModel> {
    oracle: &'a mut SolverOracle<M>,
    snapshot: ObjectiveSnapshot,
    restored: bool,
}

impl<'a, M: MipModel> PerturbationScope<'a, M> {
    pub(super) fn new(oracle: &'a mut SolverOracle<M>, snapshot: ObjectiveSnapshot) -> Self {
        Self {
            oracle,
            snapshot,
            restored: false,
        }
    }

    pub fn solve(&mut self, params: &SolveParams) -> SolveResult {
        self.oracle.solve(params)
    }

    pub fn snapshot(&self) -> &ObjectiveSnapshot {
        &self.snapshot
    }

    /// Writes the original coefficients back.
    pub fn restore(mut self) -> Result<(), OracleError> {
        self.restored = true;
        self.oracle.restore_objective(&self.snapshot)
    }
}

impl<M: MipModel> Drop for PerturbationScope<'_, M> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = self.oracle.restore_objective(&self.snapshot) {
            if std::thread::panicking() {
                warn!(error = %e, "objective could not be restored while unwinding");
            } else {
                panic!("objective could not be restored: {e}");
            }
        }
    }
}
