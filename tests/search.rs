//! End-to-end runs of the fix-and-optimize VND on small assignment
//! models solved by `DenseModel`.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use u_matheur::mip::{DenseModel, MipModel, Sense};
use u_matheur::neighborhood::{Dimensions, NeighborhoodKind};
use u_matheur::registry::{Axis, VariableRegistry};
use u_matheur::vnd::{KindSchedule, Termination, VndConfig, VndRunner, VndSearch};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

struct Instance {
    model: DenseModel,
    registry: VariableRegistry,
    dims: Dimensions,
}

/// Binary `x[v][d][c]` plus a plain `open[v]` column per vehicle with a
/// fixed charge. Each customer is served once; a vehicle serves at most
/// two customers a day and only when open.
fn instance(vehicles: usize, days: usize, customers: usize) -> Instance {
    let mut registry = VariableRegistry::new();
    let x = registry
        .register(
            "x",
            &[
                Axis::vehicles(vehicles),
                Axis::days(days),
                Axis::customers(customers),
            ],
            true,
        )
        .unwrap();
    let open = registry
        .register("open", &[Axis::vehicles(vehicles)], true)
        .unwrap();

    let mut b = DenseModel::builder();
    for v in 0..vehicles {
        for d in 0..days {
            for c in 0..customers {
                b.binary(
                    format!("x_{v}_{d}_{c}"),
                    1.0 + ((2 * v + 3 * d + 5 * c) % 7) as f64,
                );
            }
        }
    }
    for v in 0..vehicles {
        b.binary(format!("open_{v}"), 2.0 + v as f64);
    }
    for c in 0..customers {
        let terms = (0..vehicles)
            .flat_map(|v| (0..days).map(move |d| (v, d)))
            .map(|(v, d)| (registry.index_of(x, &[v, d, c]), 1.0))
            .collect();
        b.row(terms, Sense::Eq, 1.0);
    }
    for v in 0..vehicles {
        for d in 0..days {
            let mut terms: Vec<(usize, f64)> = (0..customers)
                .map(|c| (registry.index_of(x, &[v, d, c]), 1.0))
                .collect();
            terms.push((registry.index_of(open, &[v]), -2.0));
            b.row(terms, Sense::Le, 0.0);
        }
    }

    Instance {
        model: b.build().unwrap(),
        registry,
        dims: Dimensions::new(days, vehicles, customers),
    }
}

fn config(seed: u64) -> VndConfig {
    VndConfig::default()
        .with_time_budget(Duration::from_secs(20))
        .with_subproblem_time_limit(Duration::from_secs(5))
        .with_max_passes(5)
        .with_seed(seed)
}

#[test]
fn incumbent_history_is_strictly_decreasing() {
    init_tracing();
    let inst = instance(2, 2, 3);
    let result = VndRunner::run(inst.model, &inst.registry, inst.dims, &config(1)).unwrap();

    assert!(!result.history.is_empty());
    for w in result.history.windows(2) {
        assert!(w[1].objective < w[0].objective);
        assert!(w[1].elapsed >= w[0].elapsed);
    }
    assert_eq!(result.best_objective, result.history.last().unwrap().objective);
    assert_eq!(result.improvements, result.history.len() - 1);
}

#[test]
fn model_is_restored_after_run() {
    init_tracing();
    let inst = instance(2, 2, 3);
    let rows = inst.model.num_rows();
    let costs: Vec<f64> = (0..inst.model.num_columns())
        .map(|j| inst.model.objective_coefficient(j))
        .collect();

    let search = VndSearch::new(inst.model, &inst.registry, inst.dims, config(2)).unwrap();
    let (result, model) = search.run_with_model().unwrap();

    assert_eq!(model.num_rows(), rows);
    let after: Vec<f64> = (0..model.num_columns())
        .map(|j| model.objective_coefficient(j))
        .collect();
    assert_eq!(costs, after);
    assert!(model.is_feasible(&result.best));
    let objective: f64 = costs
        .iter()
        .zip(result.best.values())
        .map(|(c, x)| c * x)
        .sum();
    assert!((objective - result.best_objective).abs() < 1e-9);
}

#[test]
fn run_stops_within_budget() {
    init_tracing();
    let inst = instance(2, 2, 3);
    let budget = Duration::from_millis(300);
    let limit = Duration::from_millis(200);
    let config = VndConfig::default()
        .with_time_budget(budget)
        .with_subproblem_time_limit(limit)
        .with_seed(3);
    let result = VndRunner::run(inst.model, &inst.registry, inst.dims, &config).unwrap();

    assert_eq!(result.termination, Termination::TimeExpired);
    assert!(result.elapsed <= budget + limit + Duration::from_secs(1));
}

#[test]
fn seeded_runs_are_reproducible() {
    init_tracing();
    let run = || {
        let inst = instance(2, 2, 3);
        let config = config(99).with_schedule(vec![
            KindSchedule::new(NeighborhoodKind::Vehicles),
            KindSchedule::new(NeighborhoodKind::Days),
        ]);
        VndRunner::run(inst.model, &inst.registry, inst.dims, &config).unwrap()
    };
    let a = run();
    let b = run();
    assert_eq!(a.best, b.best);
    assert_eq!(a.best_objective, b.best_objective);
    assert_eq!(a.counters, b.counters);
}

#[test]
fn preset_cancel_returns_initial_solution() {
    init_tracing();
    let inst = instance(2, 2, 3);
    let flag = Arc::new(AtomicBool::new(true));
    let result =
        VndRunner::run_with_cancel(inst.model, &inst.registry, inst.dims, &config(4), Some(flag))
            .unwrap();

    assert_eq!(result.termination, Termination::Cancelled);
    assert_eq!(result.subproblems, 0);
    assert_eq!(result.history.len(), 1);
}

#[test]
fn seeded_incumbent_skips_initial_solve() {
    init_tracing();
    let inst = instance(1, 1, 2);
    // Both customers on the only vehicle and day, vehicle open.
    let seed = u_matheur::mip::Solution::new(vec![1.0, 1.0, 1.0]);
    let mut search = VndSearch::new(inst.model, &inst.registry, inst.dims, config(5)).unwrap();
    let objective = search.seed_incumbent(seed).unwrap();
    let result = search.run().unwrap();
    assert_eq!(result.history[0].objective, objective);
    assert!(result.best_objective <= objective);
}
