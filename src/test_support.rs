//! Small assignment instances shared by unit tests.

use crate::mip::{DenseModel, Sense};
use crate::neighborhood::Dimensions;
use crate::registry::{Axis, FamilyId, VariableRegistry};

/// Binary `x[vehicle][day][customer]`: every customer is served exactly
/// once, every vehicle serves at most `capacity` customers per day.
pub(crate) struct Assignment {
    pub model: DenseModel,
    pub registry: VariableRegistry,
    pub dims: Dimensions,
    pub x: FamilyId,
}

pub(crate) fn cost(v: usize, d: usize, c: usize) -> f64 {
    1.0 + ((3 * v + 5 * d + 7 * c) % 10) as f64
}

pub(crate) fn assignment(vehicles: usize, days: usize, customers: usize, capacity: usize) -> Assignment {
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

    let mut b = DenseModel::builder();
    for v in 0..vehicles {
        for d in 0..days {
            for c in 0..customers {
                let j = b.binary(format!("x_{v}_{d}_{c}"), cost(v, d, c));
                assert_eq!(j, registry.index_of(x, &[v, d, c]));
            }
        }
    }
    for c in 0..customers {
        let mut terms = Vec::new();
        for v in 0..vehicles {
            for d in 0..days {
                terms.push((registry.index_of(x, &[v, d, c]), 1.0));
            }
        }
        b.row(terms, Sense::Eq, 1.0);
    }
    for v in 0..vehicles {
        for d in 0..days {
            let terms = (0..customers)
                .map(|c| (registry.index_of(x, &[v, d, c]), 1.0))
                .collect();
            b.row(terms, Sense::Le, capacity as f64);
        }
    }

    Assignment {
        model: b.build().unwrap(),
        dims: Dimensions::new(days, vehicles, customers),
        registry,
        x,
    }
}
