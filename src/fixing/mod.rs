//! Fixing engine.
//!
//! Turns a neighborhood into temporary equality rows: every fixable
//! column outside the neighborhood's free groups is pinned to its value
//! in the baseline solution. Fixable families without an axis of the
//! neighborhood's kind are pinned whole. The baseline is always the
//! incumbent. Integer columns are rounded before pinning so solver
//! tolerances in the incumbent cannot make the sub-problem infeasible.

use crate::mip::{MipModel, Solution};
use crate::neighborhood::Neighborhood;
use crate::oracle::{FixingScope, OracleError, SolverOracle};
use crate::registry::VariableRegistry;
use tracing::trace;

/// Applies neighborhood fixings inside a [`FixingScope`].
pub struct FixingEngine;

impl FixingEngine {
    /// Columns that `neighborhood` pins, ascending.
    pub fn fixed_columns(registry: &VariableRegistry, neighborhood: &Neighborhood) -> Vec<usize> {
        let mut free: Vec<usize> = neighborhood
            .free_groups()
            .flat_map(|g| registry.columns_of(g))
            .collect();
        free.sort_unstable();
        registry
            .fixable_columns()
            .filter(|j| free.binary_search(j).is_err())
            .collect()
    }

    /// Pins everything outside `neighborhood` to `baseline`.
    ///
    /// The returned scope owns the new rows. If a fix fails midway, the
    /// rows added so far are released before the error is returned.
    pub fn fix_outside<'o, M: MipModel>(
        oracle: &'o mut SolverOracle<M>,
        registry: &VariableRegistry,
        neighborhood: &Neighborhood,
        baseline: &Solution,
    ) -> Result<FixingScope<'o, M>, OracleError> {
        let columns = Self::fixed_columns(registry, neighborhood);
        let mut scope = oracle.begin_fixing();
        for column in columns {
            let value = baseline.value(column);
            let value = if scope.oracle().model().is_integer(column) {
                value.round()
            } else {
                value
            };
            scope.fix(column, value)?;
        }
        trace!(
            kind = %neighborhood.kind(),
            free = neighborhood.size(),
            fixed = scope.fixed_count(),
            "neighborhood fixed"
        );
        Ok(scope)
    }
}
