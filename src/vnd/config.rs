//! Fix-and-optimize VND configuration.

use crate::mip::Emphasis;
use crate::neighborhood::NeighborhoodKind;
use crate::shaking::ShakingConfig;
use std::time::Duration;

/// Per-kind neighborhood size schedule.
///
/// A kind starts at `initial_size` free groups. After
/// `stagnation_threshold` consecutive non-improving attempts its size
/// grows by one; past the kind's dimension it wraps back to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KindSchedule {
    pub kind: NeighborhoodKind,
    pub initial_size: usize,
    pub stagnation_threshold: usize,
}

impl KindSchedule {
    pub fn new(kind: NeighborhoodKind) -> Self {
        Self {
            kind,
            initial_size: 1,
            stagnation_threshold: 1,
        }
    }

    /// Sets the starting neighborhood size.
    pub fn with_initial_size(mut self, size: usize) -> Self {
        self.initial_size = size;
        self
    }

    /// Sets the non-improving attempts before the size grows.
    pub fn with_stagnation_threshold(mut self, threshold: usize) -> Self {
        self.stagnation_threshold = threshold;
        self
    }
}

/// Deterministic sweep run once before random sampling starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SweepConfig {
    pub kind: NeighborhoodKind,
    pub block_size: usize,
}

/// Configuration for the fix-and-optimize VND.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_matheur::neighborhood::NeighborhoodKind;
/// use u_matheur::vnd::{KindSchedule, VndConfig};
///
/// let config = VndConfig::default()
///     .with_time_budget(Duration::from_secs(600))
///     .with_subproblem_time_limit(Duration::from_secs(20))
///     .with_schedule(vec![
///         KindSchedule::new(NeighborhoodKind::Vehicles).with_stagnation_threshold(5),
///         KindSchedule::new(NeighborhoodKind::Days),
///     ])
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VndConfig {
    /// Wall-clock budget for the whole run, initial solve included.
    pub time_budget: Duration,
    /// Limit for the initial feasible solve.
    pub initial_time_limit: Duration,
    /// Limit for each neighborhood or shaking solve.
    pub subproblem_time_limit: Duration,
    /// Relative optimality gap passed to every solve.
    pub optimality_gap: f64,
    pub initial_emphasis: Emphasis,
    pub subproblem_emphasis: Emphasis,
    /// Neighborhood kinds in visiting order.
    pub schedule: Vec<KindSchedule>,
    /// Optional coverage sweep before the first pass.
    pub sweep: Option<SweepConfig>,
    /// Shaking on convergence; `None` keeps descending without it.
    pub shaking: Option<ShakingConfig>,
    /// Margin a candidate must beat the incumbent by.
    pub improvement_epsilon: f64,
    /// Stop after this many VND passes.
    pub max_passes: Option<usize>,
    /// Random seed (None for a random one).
    pub seed: Option<u64>,
}

impl Default for VndConfig {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_secs(300),
            initial_time_limit: Duration::from_secs(60),
            subproblem_time_limit: Duration::from_secs(10),
            optimality_gap: 1e-4,
            initial_emphasis: Emphasis::Feasibility,
            subproblem_emphasis: Emphasis::Optimality,
            schedule: NeighborhoodKind::ALL
                .into_iter()
                .map(KindSchedule::new)
                .collect(),
            sweep: Some(SweepConfig {
                kind: NeighborhoodKind::Customers,
                block_size: 2,
            }),
            shaking: Some(ShakingConfig::default()),
            improvement_epsilon: 1e-9,
            max_passes: None,
            seed: None,
        }
    }
}

impl VndConfig {
    /// Sets the wall-clock budget for the whole run.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    /// Sets the time limit of the initial solve.
    pub fn with_initial_time_limit(mut self, limit: Duration) -> Self {
        self.initial_time_limit = limit;
        self
    }

    /// Sets the time limit of each sub-problem and shake.
    pub fn with_subproblem_time_limit(mut self, limit: Duration) -> Self {
        self.subproblem_time_limit = limit;
        self
    }

    /// Sets the relative optimality gap passed to every solve.
    pub fn with_optimality_gap(mut self, gap: f64) -> Self {
        self.optimality_gap = gap;
        self
    }

    /// Sets the solver emphasis for the initial solve and the sub-problems.
    pub fn with_emphasis(mut self, initial: Emphasis, subproblem: Emphasis) -> Self {
        self.initial_emphasis = initial;
        self.subproblem_emphasis = subproblem;
        self
    }

    /// Sets the neighborhood kinds in visiting order.
    pub fn with_schedule(mut self, schedule: Vec<KindSchedule>) -> Self {
        self.schedule = schedule;
        self
    }

    /// Sets the opening sweep (None to skip it).
    pub fn with_sweep(mut self, sweep: Option<SweepConfig>) -> Self {
        self.sweep = sweep;
        self
    }

    /// Sets the shaking configuration (None to disable shaking).
    pub fn with_shaking(mut self, shaking: Option<ShakingConfig>) -> Self {
        self.shaking = shaking;
        self
    }

    /// Sets the margin a candidate must beat the incumbent by.
    pub fn with_improvement_epsilon(mut self, epsilon: f64) -> Self {
        self.improvement_epsilon = epsilon;
        self
    }

    /// Sets the maximum number of VND passes.
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = Some(passes);
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.time_budget.is_zero() {
            return Err("time_budget must be positive".into());
        }
        if self.initial_time_limit.is_zero() {
            return Err("initial_time_limit must be positive".into());
        }
        if self.subproblem_time_limit.is_zero() {
            return Err("subproblem_time_limit must be positive".into());
        }
        if !self.optimality_gap.is_finite() || self.optimality_gap < 0.0 {
            return Err(format!(
                "optimality_gap must be a non-negative number, got {}",
                self.optimality_gap
            ));
        }
        if self.schedule.is_empty() {
            return Err("schedule must name at least one neighborhood kind".into());
        }
        for (i, s) in self.schedule.iter().enumerate() {
            if self.schedule[..i].iter().any(|o| o.kind == s.kind) {
                return Err(format!("neighborhood kind {} scheduled twice", s.kind));
            }
            if s.initial_size == 0 {
                return Err(format!("{}: initial_size must be positive", s.kind));
            }
            if s.stagnation_threshold == 0 {
                return Err(format!("{}: stagnation_threshold must be positive", s.kind));
            }
        }
        if let Some(sweep) = &self.sweep {
            if sweep.block_size == 0 {
                return Err("sweep block_size must be positive".into());
            }
        }
        if let Some(shaking) = &self.shaking {
            shaking.validate()?;
        }
        if !self.improvement_epsilon.is_finite() || self.improvement_epsilon < 0.0 {
            return Err("improvement_epsilon must be a non-negative number".into());
        }
        if self.max_passes == Some(0) {
            return Err("max_passes must be positive when set".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VndConfig::default();
        assert_eq!(config.schedule.len(), 3);
        assert_eq!(config.schedule[0].kind, NeighborhoodKind::Vehicles);
        assert_eq!(config.initial_emphasis, Emphasis::Feasibility);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = VndConfig::default()
            .with_time_budget(Duration::from_secs(5))
            .with_initial_time_limit(Duration::from_secs(2))
            .with_subproblem_time_limit(Duration::from_millis(500))
            .with_optimality_gap(0.01)
            .with_emphasis(Emphasis::Optimality, Emphasis::Feasibility)
            .with_sweep(None)
            .with_shaking(None)
            .with_improvement_epsilon(1e-6)
            .with_max_passes(3)
            .with_seed(9);

        assert_eq!(config.time_budget, Duration::from_secs(5));
        assert_eq!(config.subproblem_time_limit, Duration::from_millis(500));
        assert_eq!(config.subproblem_emphasis, Emphasis::Feasibility);
        assert!(config.sweep.is_none());
        assert!(config.shaking.is_none());
        assert_eq!(config.max_passes, Some(3));
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn test_validate_rejects_duplicate_kind() {
        let config = VndConfig::default().with_schedule(vec![
            KindSchedule::new(NeighborhoodKind::Days),
            KindSchedule::new(NeighborhoodKind::Days),
        ]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(VndConfig::default()
            .with_time_budget(Duration::ZERO)
            .validate()
            .is_err());
        assert!(VndConfig::default()
            .with_schedule(vec![
                KindSchedule::new(NeighborhoodKind::Days).with_stagnation_threshold(0)
            ])
            .validate()
            .is_err());
        assert!(VndConfig::default()
            .with_schedule(vec![])
            .validate()
            .is_err());
        assert!(VndConfig::default().with_max_passes(0).validate().is_err());
        assert!(VndConfig::default()
            .with_sweep(Some(SweepConfig {
                kind: NeighborhoodKind::Customers,
                block_size: 0
            }))
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_checks_shaking() {
        let config = VndConfig::default()
            .with_shaking(Some(ShakingConfig::default().with_coefficient_range(1.0, 0.5)));
        assert!(config.validate().is_err());
    }
}
