//! Shaking: randomized objective perturbation.
//!
//! When every neighborhood kind has stagnated, the controller rewrites
//! the objective coefficients of selected families with small random
//! positive values and solves the model with nothing fixed. The random
//! objective steers the solver toward a structurally different plan.
//! The true coefficients are restored before the result is evaluated,
//! and the result becomes the new *current* solution whatever its true
//! cost.

mod config;

pub use config::ShakingConfig;

use crate::mip::{MipModel, Solution, SolveParams, SolveStatus};
use crate::oracle::{CoefficientMap, OracleError, SolverOracle};
use crate::registry::VariableRegistry;
use rand::Rng;
use tracing::debug;

/// Result of one shake.
#[derive(Debug, Clone, PartialEq)]
pub struct ShakeOutcome {
    pub solution: Solution,
    /// Objective under the true coefficients.
    pub objective: f64,
    pub status: SolveStatus,
}

/// Performs shakes according to a [`ShakingConfig`].
#[derive(Debug, Clone)]
pub struct ShakingController {
    config: ShakingConfig,
}

impl ShakingController {
    pub fn new(config: ShakingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ShakingConfig {
        &self.config
    }

    /// Draws one random coefficient per perturbed column.
    pub fn coefficients<R: Rng>(&self, registry: &VariableRegistry, rng: &mut R) -> CoefficientMap {
        let (low, high) = self.config.coefficient_range;
        let columns: Vec<usize> = if self.config.families.is_empty() {
            registry.fixable_columns().collect()
        } else {
            self.config
                .families
                .iter()
                .flat_map(|&f| registry.family(f).columns())
                .collect()
        };
        columns
            .into_iter()
            .map(|j| (j, rng.random_range(low..high)))
            .collect()
    }

    /// Solves the fully free model under a random objective.
    ///
    /// Returns `None` when the solver finds nothing. The model's
    /// objective is restored before this returns on every path.
    pub fn shake<M: MipModel, R: Rng>(
        &self,
        oracle: &mut SolverOracle<M>,
        registry: &VariableRegistry,
        params: &SolveParams,
        rng: &mut R,
    ) -> Result<Option<ShakeOutcome>, OracleError> {
        let coefficients = self.coefficients(registry, rng);
        let mut scope = oracle.perturbed(&coefficients)?;
        let result = scope.solve(params);
        scope.restore()?;

        let status = result.status();
        let Some(point) = result.into_point() else {
            debug!(%status, "shake found no solution");
            return Ok(None);
        };
        let objective = oracle.evaluate(&point.solution);
        debug!(
            perturbed = coefficients.len(),
            perturbed_objective = point.objective,
            objective,
            "shake solved"
        );
        Ok(Some(ShakeOutcome {
            solution: point.solution,
            objective,
            status,
        }))
    }
}
