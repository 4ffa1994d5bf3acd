//! Fix-and-optimize VND execution engine.
//!
//! # Algorithm
//!
//! 1. Solve the full model with feasibility emphasis to obtain an
//!    initial incumbent x*
//! 2. Optionally sweep one kind in contiguous blocks, solving each block
//!    as a neighborhood
//! 3. While the global deadline has not passed:
//!    a. For each scheduled kind k: sample a neighborhood N of the
//!    current size of k, pin every fixable variable outside N to x*, solve,
//!    release the pins
//!    b. **Accept**: if the sub-problem's true objective is strictly
//!    below f(x*), replace x* and reset k's stagnation counter;
//!    otherwise increment it, and grow k's size once the counter reaches
//!    its threshold
//!    c. If no kind improved during the pass (**converged**), shake:
//!    solve the free model under a random objective and adopt the result
//!    as the current solution
//! 4. Return x*

use super::config::{SweepConfig, VndConfig};
use super::err::VndError;
use super::types::{
    ExploreOutcome, KindCounters, PassOutcome, SearchState, Termination, VndResult,
};
use crate::fixing::FixingEngine;
use crate::incumbent::IncumbentTracker;
use crate::mip::{MipModel, Solution, SolveParams};
use crate::neighborhood::{Dimensions, Neighborhood, NeighborhoodGenerator, NeighborhoodKind};
use crate::oracle::SolverOracle;
use crate::registry::VariableRegistry;
use crate::shaking::ShakingController;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A fix-and-optimize VND in progress.
///
/// Owns the model (through a [`SolverOracle`]) and both the current and
/// the best solution for the run's lifetime. The step methods
/// ([`initialize`](Self::initialize), [`explore`](Self::explore),
/// [`shake`](Self::shake), ...) are public so callers can drive the
/// search themselves; [`run`](Self::run) chains them.
pub struct VndSearch<'r, M: MipModel> {
    oracle: SolverOracle<M>,
    registry: &'r VariableRegistry,
    generator: NeighborhoodGenerator,
    config: VndConfig,
    shaking: Option<ShakingController>,
    rng: StdRng,
    counters: Vec<KindCounters>,
    tracker: IncumbentTracker,
    /// Last accepted or shaken solution. Fixing always starts from the
    /// incumbent, so this is reported but never used as a baseline.
    current: Option<(Solution, f64)>,
    started: Instant,
    deadline: Option<Instant>,
    cancel: Option<Arc<AtomicBool>>,
    state: SearchState,
    subproblems: usize,
    shakes: usize,
    passes: usize,
}

impl<'r, M: MipModel> VndSearch<'r, M> {
    /// Validates the configuration against the model and registry and
    /// starts the clock.
    pub fn new(
        model: M,
        registry: &'r VariableRegistry,
        dims: Dimensions,
        config: VndConfig,
    ) -> Result<Self, VndError> {
        config.validate().map_err(VndError::InvalidConfig)?;

        if registry.num_columns() != model.num_columns() {
            return Err(VndError::RegistryMismatch {
                registry: registry.num_columns(),
                model: model.num_columns(),
            });
        }
        for kind in NeighborhoodKind::ALL {
            if let Some(declared) = registry.dimension(kind) {
                if declared != dims.of(kind) {
                    return Err(VndError::DimensionMismatch {
                        kind,
                        registry: declared,
                        given: dims.of(kind),
                    });
                }
            }
        }
        let families = registry.families().count();
        if let Some(shaking) = &config.shaking {
            if let Some(&bad) = shaking.families.iter().find(|f| f.index() >= families) {
                return Err(VndError::UnknownFamily(bad));
            }
        }

        let seed = config.seed.unwrap_or_else(rand::random);
        debug!(seed, "vnd rng seeded");

        let counters = config
            .schedule
            .iter()
            .map(|s| KindCounters {
                kind: s.kind,
                size: s.initial_size,
                stagnation: 0,
                attempts: 0,
                improvements: 0,
            })
            .collect();

        let started = Instant::now();
        Ok(Self {
            oracle: SolverOracle::new(model),
            registry,
            generator: NeighborhoodGenerator::new(dims),
            shaking: config.shaking.clone().map(ShakingController::new),
            rng: StdRng::seed_from_u64(seed),
            counters,
            tracker: IncumbentTracker::new(config.improvement_epsilon),
            current: None,
            started,
            deadline: started.checked_add(config.time_budget),
            cancel: None,
            state: SearchState::Idle,
            subproblems: 0,
            shakes: 0,
            passes: 0,
            config,
        })
    }

    /// Installs a flag that stops the search at the next check.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn counters(&self, kind: NeighborhoodKind) -> Option<&KindCounters> {
        self.counters.iter().find(|c| c.kind == kind)
    }

    pub fn incumbent(&self) -> Option<&Solution> {
        self.tracker.best()
    }

    pub fn incumbent_objective(&self) -> Option<f64> {
        self.tracker.objective()
    }

    /// The working solution: the last accepted sub-problem or shake.
    pub fn current(&self) -> Option<&Solution> {
        self.current.as_ref().map(|(s, _)| s)
    }

    pub fn current_objective(&self) -> Option<f64> {
        self.current.as_ref().map(|&(_, o)| o)
    }

    pub fn oracle(&self) -> &SolverOracle<M> {
        &self.oracle
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Solves the full model for a first feasible solution and installs
    /// it as incumbent and current solution.
    pub fn initialize(&mut self) -> Result<f64, VndError> {
        let limit = self.clip_to_deadline(self.config.initial_time_limit);
        let params = SolveParams {
            time_limit: limit,
            optimality_gap: self.config.optimality_gap,
            emphasis: self.config.initial_emphasis,
        };
        let result = self.oracle.solve(&params);
        let status = result.status();
        let Some(point) = result.into_point() else {
            return Err(VndError::NoInitialSolution { status });
        };
        let objective = self.oracle.evaluate(&point.solution);
        info!(
            objective,
            %status,
            elapsed_ms = self.elapsed().as_millis() as u64,
            "initial solution"
        );
        self.install(point.solution, objective);
        Ok(objective)
    }

    /// Installs an externally constructed solution as incumbent and
    /// current solution. Its objective is evaluated on the model.
    pub fn seed_incumbent(&mut self, solution: Solution) -> Result<f64, VndError> {
        let expected = self.oracle.num_columns();
        if solution.len() != expected {
            return Err(VndError::SeedLength {
                expected,
                found: solution.len(),
            });
        }
        let objective = self.oracle.evaluate(&solution);
        info!(objective, "seeded incumbent");
        self.install(solution, objective);
        Ok(objective)
    }

    fn install(&mut self, solution: Solution, objective: f64) {
        let elapsed = self.elapsed();
        self.current = Some((solution.clone(), objective));
        self.tracker.seed(solution, objective, elapsed);
    }

    /// Pins everything outside `neighborhood` to the incumbent, solves
    /// and accepts the result if it strictly improves the incumbent.
    ///
    /// Does not touch the per-kind counters.
    pub fn explore_neighborhood(
        &mut self,
        neighborhood: &Neighborhood,
    ) -> Result<ExploreOutcome, VndError> {
        if self.should_stop() {
            return Ok(ExploreOutcome::Skipped);
        }
        let params = self.subproblem_params();

        let Some(baseline) = self.tracker.best() else {
            return Err(VndError::NoIncumbent);
        };
        let mut scope =
            FixingEngine::fix_outside(&mut self.oracle, self.registry, neighborhood, baseline)?;
        scope.warm_start(baseline);
        let result = scope.solve(&params);
        let fixed = scope.fixed_count();
        scope.release()?;
        self.subproblems += 1;

        let status = result.status();
        let Some(point) = result.into_point() else {
            debug!(
                kind = %neighborhood.kind(),
                size = neighborhood.size(),
                fixed,
                %status,
                "sub-problem without solution"
            );
            return Ok(ExploreOutcome::NotImproved { status });
        };

        let objective = self.oracle.evaluate(&point.solution);
        debug!(
            kind = %neighborhood.kind(),
            size = neighborhood.size(),
            fixed,
            %status,
            objective,
            "sub-problem solved"
        );
        if !self.tracker.is_improvement(objective) {
            return Ok(ExploreOutcome::NotImproved { status });
        }

        let elapsed = self.elapsed();
        self.current = Some((point.solution.clone(), objective));
        self.tracker.offer(point.solution, objective, elapsed);
        info!(
            objective,
            kind = %neighborhood.kind(),
            size = neighborhood.size(),
            elapsed_ms = elapsed.as_millis() as u64,
            "incumbent improved"
        );
        Ok(ExploreOutcome::Improved { objective })
    }

    /// Samples a neighborhood of `kind` at its current size, explores it
    /// and updates the kind's counters.
    pub fn explore(&mut self, kind: NeighborhoodKind) -> Result<ExploreOutcome, VndError> {
        let i = self
            .counters
            .iter()
            .position(|c| c.kind == kind)
            .ok_or(VndError::UnscheduledKind(kind))?;
        let neighborhood = self
            .generator
            .sample(kind, self.counters[i].size, &mut self.rng);

        self.state = SearchState::Searching(kind);
        let outcome = self.explore_neighborhood(&neighborhood)?;

        let threshold = self.config.schedule[i].stagnation_threshold;
        let dimension = self.generator.dimensions().of(kind);
        let c = &mut self.counters[i];
        match outcome {
            ExploreOutcome::Skipped => {}
            ExploreOutcome::Improved { .. } => {
                c.attempts += 1;
                c.improvements += 1;
                c.stagnation = 0;
            }
            ExploreOutcome::NotImproved { .. } => {
                c.attempts += 1;
                c.stagnation += 1;
                if c.stagnation >= threshold {
                    c.stagnation = 0;
                    c.size += 1;
                    if c.size > dimension {
                        c.size = 1;
                    }
                    debug!(%kind, size = c.size, "neighborhood size adapted");
                    self.state = SearchState::Stagnated(kind);
                }
            }
        }
        Ok(outcome)
    }

    /// Visits every contiguous block of the sweep kind once.
    pub fn sweep(&mut self, sweep: SweepConfig) -> Result<(), VndError> {
        let blocks: Vec<Neighborhood> = self
            .generator
            .sweep(sweep.kind, sweep.block_size)
            .collect();
        debug!(kind = %sweep.kind, blocks = blocks.len(), "sweep started");
        for block in &blocks {
            self.state = SearchState::Searching(sweep.kind);
            if self.explore_neighborhood(block)? == ExploreOutcome::Skipped {
                break;
            }
        }
        Ok(())
    }

    /// One pass over every scheduled kind.
    pub fn run_pass(&mut self) -> Result<PassOutcome, VndError> {
        let mut improved = false;
        for i in 0..self.counters.len() {
            let kind = self.counters[i].kind;
            match self.explore(kind)? {
                ExploreOutcome::Skipped => return Ok(PassOutcome::Interrupted),
                ExploreOutcome::Improved { .. } => improved = true,
                ExploreOutcome::NotImproved { .. } => {}
            }
        }
        self.passes += 1;
        if improved {
            Ok(PassOutcome::Improved)
        } else {
            self.state = SearchState::Converged;
            Ok(PassOutcome::Converged)
        }
    }

    /// Solves the free model under a random objective and adopts the
    /// result as the current solution. The incumbent only changes if
    /// the result's true objective beats it.
    ///
    /// Returns the new current objective, or `None` when shaking is
    /// disabled, the search must stop or the solver found nothing.
    pub fn shake(&mut self) -> Result<Option<f64>, VndError> {
        if self.should_stop() {
            return Ok(None);
        }
        let Some(controller) = &self.shaking else {
            return Ok(None);
        };
        let params = self.subproblem_params();
        let outcome = controller.shake(&mut self.oracle, self.registry, &params, &mut self.rng)?;
        self.shakes += 1;

        let Some(outcome) = outcome else {
            return Ok(None);
        };
        let elapsed = self.elapsed();
        if self.tracker.is_improvement(outcome.objective) {
            self.tracker
                .offer(outcome.solution.clone(), outcome.objective, elapsed);
            info!(
                objective = outcome.objective,
                elapsed_ms = elapsed.as_millis() as u64,
                "incumbent improved by shaking"
            );
        } else {
            info!(
                objective = outcome.objective,
                incumbent = self.tracker.objective(),
                elapsed_ms = elapsed.as_millis() as u64,
                "shaking moved the current solution"
            );
        }
        self.current = Some((outcome.solution, outcome.objective));
        Ok(Some(outcome.objective))
    }

    /// Runs the full search and drops the model.
    pub fn run(self) -> Result<VndResult, VndError> {
        self.run_with_model().map(|(result, _)| result)
    }

    /// Runs the full search and hands the model back, with every
    /// temporary row removed and the true objective in place.
    pub fn run_with_model(mut self) -> Result<(VndResult, M), VndError> {
        if self.tracker.best().is_none() {
            self.initialize()?;
        }
        if let Some(sweep) = self.config.sweep {
            self.sweep(sweep)?;
        }

        let termination = loop {
            if self.should_stop() {
                break self.stop_reason();
            }
            match self.run_pass()? {
                PassOutcome::Interrupted => break self.stop_reason(),
                PassOutcome::Converged => {
                    self.shake()?;
                }
                PassOutcome::Improved => {}
            }
            if self.config.max_passes.is_some_and(|m| self.passes >= m) {
                break Termination::PassLimit;
            }
        };

        self.finish(termination)
    }

    fn finish(self, termination: Termination) -> Result<(VndResult, M), VndError> {
        let elapsed = self.elapsed();
        let improvements = self.tracker.improvements();
        let (best, history) = self.tracker.into_parts();
        let Some((best, best_objective)) = best else {
            return Err(VndError::NoIncumbent);
        };
        let current_objective = self.current.map_or(best_objective, |(_, o)| o);

        info!(
            objective = best_objective,
            elapsed_ms = elapsed.as_millis() as u64,
            subproblems = self.subproblems,
            improvements,
            shakes = self.shakes,
            passes = self.passes,
            ?termination,
            "search finished"
        );

        let result = VndResult {
            best,
            best_objective,
            current_objective,
            elapsed,
            subproblems: self.subproblems,
            improvements,
            shakes: self.shakes,
            passes: self.passes,
            termination,
            history,
            counters: self.counters,
        };
        Ok((result, self.oracle.into_model()))
    }

    fn stop_reason(&self) -> Termination {
        match self.state {
            SearchState::Cancelled => Termination::Cancelled,
            _ => Termination::TimeExpired,
        }
    }

    /// Checks cancellation and the deadline, recording the state.
    fn should_stop(&mut self) -> bool {
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            self.state = SearchState::Cancelled;
            return true;
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            self.state = SearchState::TimeExpired;
            return true;
        }
        false
    }

    fn clip_to_deadline(&self, limit: Duration) -> Duration {
        match self.deadline {
            Some(d) => limit.min(d.saturating_duration_since(Instant::now())),
            None => limit,
        }
    }

    fn subproblem_params(&self) -> SolveParams {
        SolveParams {
            time_limit: self.clip_to_deadline(self.config.subproblem_time_limit),
            optimality_gap: self.config.optimality_gap,
            emphasis: self.config.subproblem_emphasis,
        }
    }
}

/// Convenience entry point mirroring the other runners.
pub struct VndRunner;

impl VndRunner {
    /// Runs fix-and-optimize VND on `model`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use u_matheur::mip::{DenseModel, Sense};
    /// use u_matheur::neighborhood::{Dimensions, NeighborhoodKind};
    /// use u_matheur::registry::{Axis, VariableRegistry};
    /// use u_matheur::vnd::{KindSchedule, VndConfig, VndRunner};
    ///
    /// // x[day][customer]: visit each customer on exactly one day.
    /// let mut reg = VariableRegistry::new();
    /// let x = reg.register("x", &[Axis::days(2), Axis::customers(2)], true).unwrap();
    /// let mut b = DenseModel::builder();
    /// for d in 0..2 {
    ///     for c in 0..2 {
    ///         b.binary(format!("x{d}{c}"), (1 + d + 2 * c) as f64);
    ///     }
    /// }
    /// for c in 0..2 {
    ///     b.row(vec![(reg.index_of(x, &[0, c]), 1.0), (reg.index_of(x, &[1, c]), 1.0)], Sense::Eq, 1.0);
    /// }
    /// let model = b.build().unwrap();
    ///
    /// let config = VndConfig::default()
    ///     .with_schedule(vec![KindSchedule::new(NeighborhoodKind::Days)])
    ///     .with_time_budget(Duration::from_secs(5))
    ///     .with_max_passes(3)
    ///     .with_seed(1);
    /// let result = VndRunner::run(model, &reg, Dimensions::new(2, 0, 2), &config).unwrap();
    /// assert_eq!(result.best_objective, 4.0);
    /// ```
    pub fn run<M: MipModel>(
        model: M,
        registry: &VariableRegistry,
        dims: Dimensions,
        config: &VndConfig,
    ) -> Result<VndResult, VndError> {
        Self::run_with_cancel(model, registry, dims, config, None)
    }

    /// Runs VND with an optional cancellation flag.
    pub fn run_with_cancel<M: MipModel>(
        model: M,
        registry: &VariableRegistry,
        dims: Dimensions,
        config: &VndConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<VndResult, VndError> {
        let mut search = VndSearch::new(model, registry, dims, config.clone())?;
        if let Some(flag) = cancel {
            search = search.with_cancel(flag);
        }
        search.run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mip::{Emphasis, SolveResult, SolveStatus, SolvedPoint};
    use crate::registry::{Axis, FamilyId};
    use crate::test_support::assignment;
    use crate::vnd::KindSchedule;
    use std::collections::VecDeque;
    use std::convert::Infallible;
    use std::ops::Range;

    /// Replays queued solve results and records the row count seen by
    /// every solve.
    struct ScriptedModel {
        costs: Vec<f64>,
        rows: usize,
        script: VecDeque<SolveResult>,
        rows_at_solve: Vec<usize>,
    }

    impl MipModel for ScriptedModel {
        type Error = Infallible;
        fn num_columns(&self) -> usize {
            self.costs.len()
        }
        fn num_rows(&self) -> usize {
            self.rows
        }
        fn is_integer(&self, _column: usize) -> bool {
            true
        }
        fn objective_coefficient(&self, column: usize) -> f64 {
            self.costs[column]
        }
        fn set_objective_coefficient(&mut self, column: usize, value: f64) -> Result<(), Infallible> {
            self.costs[column] = value;
            Ok(())
        }
        fn add_equality_row(&mut self, _column: usize, _value: f64) -> Result<(), Infallible> {
            self.rows += 1;
            Ok(())
        }
        fn delete_rows(&mut self, rows: Range<usize>) -> Result<(), Infallible> {
            self.rows -= rows.len();
            Ok(())
        }
        fn solve(&mut self, _params: &SolveParams) -> Result<SolveResult, Infallible> {
            self.rows_at_solve.push(self.rows);
            Ok(self.script.pop_front().unwrap_or(SolveResult::NoSolution))
        }
    }

    /// `x[vehicle 3][day 5][customer 10]` plus one non-fixable cost
    /// column carrying the whole objective.
    fn scripted(objectives: &[f64]) -> (ScriptedModel, VariableRegistry, Dimensions) {
        let mut reg = VariableRegistry::new();
        reg.register(
            "x",
            &[Axis::vehicles(3), Axis::days(5), Axis::customers(10)],
            true,
        )
        .unwrap();
        reg.register("cost", &[Axis::plain(1)], false).unwrap();
        let n = reg.num_columns();

        let mut costs = vec![0.0; n];
        costs[n - 1] = 1.0;
        let script = objectives
            .iter()
            .map(|&obj| {
                let mut s = Solution::zeros(n);
                s.set(n - 1, obj);
                SolveResult::Optimal(SolvedPoint {
                    objective: obj,
                    solution: s,
                })
            })
            .collect();
        let model = ScriptedModel {
            costs,
            rows: 7,
            script,
            rows_at_solve: Vec::new(),
        };
        (model, reg, Dimensions::new(5, 3, 10))
    }

    fn vehicles_only(threshold: usize, size: usize) -> VndConfig {
        VndConfig::default()
            .with_schedule(vec![KindSchedule::new(NeighborhoodKind::Vehicles)
                .with_initial_size(size)
                .with_stagnation_threshold(threshold)])
            .with_sweep(None)
            .with_time_budget(Duration::from_secs(60))
            .with_seed(42)
    }

    #[test]
    fn test_improvement_then_rejection() {
        let (model, reg, dims) = scripted(&[1000.0, 950.0, 960.0]);
        let mut search = VndSearch::new(model, &reg, dims, vehicles_only(5, 1)).unwrap();

        assert_eq!(search.initialize().unwrap(), 1000.0);

        let out = search.explore(NeighborhoodKind::Vehicles).unwrap();
        assert_eq!(out, ExploreOutcome::Improved { objective: 950.0 });
        assert_eq!(search.incumbent_objective(), Some(950.0));
        assert_eq!(
            search.counters(NeighborhoodKind::Vehicles).unwrap().stagnation,
            0
        );

        let out = search.explore(NeighborhoodKind::Vehicles).unwrap();
        assert_eq!(
            out,
            ExploreOutcome::NotImproved {
                status: SolveStatus::Optimal
            }
        );
        assert_eq!(search.incumbent_objective(), Some(950.0));
        let c = search.counters(NeighborhoodKind::Vehicles).unwrap();
        assert_eq!(c.stagnation, 1);
        assert_eq!(c.attempts, 2);
        assert_eq!(c.improvements, 1);

        // Two vehicles pinned: 2 * 5 * 10 rows on top of the 7 base rows.
        assert_eq!(search.oracle().model().rows_at_solve, vec![7, 107, 107]);
        assert_eq!(search.oracle().num_rows(), 7);
    }

    #[test]
    fn test_full_size_neighborhood_fixes_nothing() {
        let (model, reg, dims) = scripted(&[1000.0, 990.0]);
        let mut search = VndSearch::new(model, &reg, dims, vehicles_only(1, 3)).unwrap();
        search.initialize().unwrap();
        search.explore(NeighborhoodKind::Vehicles).unwrap();
        assert_eq!(search.oracle().model().rows_at_solve, vec![7, 7]);
        assert_eq!(search.oracle().num_rows(), 7);
    }

    #[test]
    fn test_size_grows_and_wraps() {
        let (model, reg, dims) = scripted(&[1000.0]);
        let mut search = VndSearch::new(model, &reg, dims, vehicles_only(2, 1)).unwrap();
        search.initialize().unwrap();

        let mut sizes = Vec::new();
        for _ in 0..8 {
            search.explore(NeighborhoodKind::Vehicles).unwrap();
            sizes.push(search.counters(NeighborhoodKind::Vehicles).unwrap().size);
        }
        // Threshold 2 over a dimension of 3: 1,1 -> 2,2 -> 3,3 -> 1,1.
        assert_eq!(sizes, vec![1, 2, 2, 3, 3, 1, 1, 2]);
    }

    #[test]
    fn test_stagnation_sets_state() {
        let (model, reg, dims) = scripted(&[1000.0]);
        let mut search = VndSearch::new(model, &reg, dims, vehicles_only(1, 1)).unwrap();
        search.initialize().unwrap();
        search.explore(NeighborhoodKind::Vehicles).unwrap();
        assert_eq!(
            search.state(),
            SearchState::Stagnated(NeighborhoodKind::Vehicles)
        );
        assert_eq!(search.counters(NeighborhoodKind::Vehicles).unwrap().size, 2);
    }

    #[test]
    fn test_pass_without_improvement_converges() {
        let (model, reg, dims) = scripted(&[1000.0, 1000.0]);
        let mut search = VndSearch::new(model, &reg, dims, vehicles_only(5, 1)).unwrap();
        search.initialize().unwrap();
        assert_eq!(search.run_pass().unwrap(), PassOutcome::Converged);
        assert_eq!(search.state(), SearchState::Converged);
    }

    #[test]
    fn test_no_initial_solution_is_fatal() {
        let (model, reg, dims) = scripted(&[]);
        let mut search = VndSearch::new(model, &reg, dims, vehicles_only(1, 1)).unwrap();
        assert_eq!(
            search.initialize().unwrap_err(),
            VndError::NoInitialSolution {
                status: SolveStatus::NoSolution
            }
        );
    }

    #[test]
    fn test_explore_requires_incumbent() {
        let (model, reg, dims) = scripted(&[]);
        let mut search = VndSearch::new(model, &reg, dims, vehicles_only(1, 1)).unwrap();
        assert_eq!(
            search.explore(NeighborhoodKind::Vehicles).unwrap_err(),
            VndError::NoIncumbent
        );
    }

    #[test]
    fn test_unscheduled_kind_rejected() {
        let (model, reg, dims) = scripted(&[1000.0]);
        let mut search = VndSearch::new(model, &reg, dims, vehicles_only(1, 1)).unwrap();
        search.initialize().unwrap();
        assert_eq!(
            search.explore(NeighborhoodKind::Days).unwrap_err(),
            VndError::UnscheduledKind(NeighborhoodKind::Days)
        );
    }

    #[test]
    fn test_new_rejects_mismatches() {
        let (model, reg, _) = scripted(&[]);
        let err = VndSearch::new(model, &reg, Dimensions::new(5, 4, 10), vehicles_only(1, 1))
            .err()
            .unwrap();
        assert!(matches!(err, VndError::DimensionMismatch { given: 4, .. }));

        // Only vehicles are scheduled, but the sweep walks customers.
        let (model, reg, _) = scripted(&[]);
        let config = vehicles_only(1, 1).with_sweep(Some(SweepConfig {
            kind: NeighborhoodKind::Customers,
            block_size: 2,
        }));
        let err = VndSearch::new(model, &reg, Dimensions::new(5, 3, 9), config)
            .err()
            .unwrap();
        assert_eq!(
            err,
            VndError::DimensionMismatch {
                kind: NeighborhoodKind::Customers,
                registry: 10,
                given: 9
            }
        );

        let (mut model, reg, dims) = scripted(&[]);
        model.costs.push(0.0);
        let err = VndSearch::new(model, &reg, dims, vehicles_only(1, 1)).err().unwrap();
        assert!(matches!(err, VndError::RegistryMismatch { .. }));

        let (model, reg, dims) = scripted(&[]);
        let config = vehicles_only(1, 1).with_shaking(Some(
            crate::shaking::ShakingConfig::default()
                .with_families(vec![reg.family_id("x").unwrap(), unknown_family()]),
        ));
        let err = VndSearch::new(model, &reg, dims, config).err().unwrap();
        assert!(matches!(err, VndError::UnknownFamily(_)));

        let (model, reg, dims) = scripted(&[]);
        let err = VndSearch::new(model, &reg, dims, vehicles_only(0, 1)).err().unwrap();
        assert!(matches!(err, VndError::InvalidConfig(_)));
    }

    fn unknown_family() -> FamilyId {
        let mut reg = VariableRegistry::new();
        for i in 0..5 {
            reg.register(format!("f{i}"), &[Axis::plain(1)], false).unwrap();
        }
        reg.family_id("f4").unwrap()
    }

    #[test]
    fn test_seed_incumbent() {
        let (model, reg, dims) = scripted(&[]);
        let n = reg.num_columns();
        let mut search = VndSearch::new(model, &reg, dims, vehicles_only(1, 1)).unwrap();
        let mut s = Solution::zeros(n);
        s.set(n - 1, 123.0);
        assert_eq!(search.seed_incumbent(s).unwrap(), 123.0);
        assert_eq!(search.current_objective(), Some(123.0));
        assert!(matches!(
            search.seed_incumbent(Solution::zeros(3)),
            Err(VndError::SeedLength { found: 3, .. })
        ));
    }

    #[test]
    fn test_cancel_stops_before_solving() {
        let (model, reg, dims) = scripted(&[1000.0, 900.0]);
        let flag = Arc::new(AtomicBool::new(false));
        let mut search = VndSearch::new(model, &reg, dims, vehicles_only(1, 1))
            .unwrap()
            .with_cancel(flag.clone());
        search.initialize().unwrap();
        flag.store(true, Ordering::Relaxed);
        assert_eq!(
            search.explore(NeighborhoodKind::Vehicles).unwrap(),
            ExploreOutcome::Skipped
        );
        assert_eq!(search.state(), SearchState::Cancelled);
        let (result, model) = search.run_with_model().unwrap();
        assert_eq!(result.termination, Termination::Cancelled);
        assert_eq!(result.best_objective, 1000.0);
        assert_eq!(model.rows_at_solve.len(), 1);
    }

    #[test]
    fn test_run_improves_assignment() {
        let inst = assignment(2, 2, 3, 2);
        let config = VndConfig::default()
            .with_emphasis(Emphasis::Feasibility, Emphasis::Optimality)
            .with_time_budget(Duration::from_secs(30))
            .with_max_passes(6)
            .with_seed(7);
        let search = VndSearch::new(inst.model, &inst.registry, inst.dims, config).unwrap();
        let (result, model) = search.run_with_model().unwrap();

        assert_eq!(result.termination, Termination::PassLimit);
        assert!(model.is_feasible(&result.best));
        assert_eq!(model.num_rows(), 3 + 4);
        for w in result.history.windows(2) {
            assert!(w[1].objective < w[0].objective);
        }
        assert_eq!(result.best_objective, result.history.last().unwrap().objective);
        assert!(result.best_objective <= result.history[0].objective);
    }

    #[test]
    fn test_shake_adopts_current() {
        let inst = assignment(2, 2, 3, 2);
        let mut search = VndSearch::new(
            inst.model,
            &inst.registry,
            inst.dims,
            VndConfig::default().with_seed(3),
        )
        .unwrap();
        search.initialize().unwrap();
        let incumbent = search.incumbent_objective().unwrap();
        let current = search.shake().unwrap().expect("free model is feasible");
        assert_eq!(search.current_objective(), Some(current));
        let shaken = search.current().unwrap();
        assert_eq!(search.oracle().evaluate(shaken), current);
        assert!(search.oracle().model().is_feasible(shaken));
        assert!(search.incumbent_objective().unwrap() <= incumbent);
        assert_eq!(search.incumbent_objective().unwrap(), incumbent.min(current));
    }
}
