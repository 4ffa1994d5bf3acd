//! Neighborhood structures and their generator.
//!
//! A neighborhood frees a handful of variable groups of one kind (some
//! vehicles, some days or some customers) while everything else of that
//! kind stays pinned to the incumbent. Neighborhoods are expressed in
//! group indices only; the [`VariableRegistry`](crate::registry::VariableRegistry)
//! turns them into columns.

use crate::registry::{VariableGroup, VariableRegistry};
use rand::Rng;
use std::fmt;

/// The dimension along which a neighborhood frees variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NeighborhoodKind {
    Vehicles,
    Days,
    Customers,
}

impl NeighborhoodKind {
    /// Every kind, in the default visiting order.
    pub const ALL: [NeighborhoodKind; 3] = [
        NeighborhoodKind::Vehicles,
        NeighborhoodKind::Days,
        NeighborhoodKind::Customers,
    ];
}

impl fmt::Display for NeighborhoodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NeighborhoodKind::Vehicles => "vehicles",
            NeighborhoodKind::Days => "days",
            NeighborhoodKind::Customers => "customers",
        };
        f.write_str(s)
    }
}

/// Problem dimensions per neighborhood kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimensions {
    pub days: usize,
    pub vehicles: usize,
    pub customers: usize,
}

impl Dimensions {
    pub fn new(days: usize, vehicles: usize, customers: usize) -> Self {
        Self {
            days,
            vehicles,
            customers,
        }
    }

    /// Reads the axis lengths declared in a registry. Kinds no family
    /// is keyed by have dimension zero.
    pub fn from_registry(registry: &VariableRegistry) -> Self {
        Self {
            days: registry.dimension(NeighborhoodKind::Days).unwrap_or(0),
            vehicles: registry.dimension(NeighborhoodKind::Vehicles).unwrap_or(0),
            customers: registry.dimension(NeighborhoodKind::Customers).unwrap_or(0),
        }
    }

    pub fn of(&self, kind: NeighborhoodKind) -> usize {
        match kind {
            NeighborhoodKind::Vehicles => self.vehicles,
            NeighborhoodKind::Days => self.days,
            NeighborhoodKind::Customers => self.customers,
        }
    }
}

/// A set of free group indices of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighborhood {
    kind: NeighborhoodKind,
    members: Vec<usize>,
    dimension: usize,
}

impl Neighborhood {
    /// Builds a neighborhood from explicit members. Members are sorted
    /// and deduplicated.
    ///
    /// # Panics
    ///
    /// Panics if a member is not below `dimension`.
    pub fn new(kind: NeighborhoodKind, mut members: Vec<usize>, dimension: usize) -> Self {
        members.sort_unstable();
        members.dedup();
        if let Some(&last) = members.last() {
            assert!(
                last < dimension,
                "{kind} neighborhood member {last} out of range (dimension {dimension})"
            );
        }
        Self {
            kind,
            members,
            dimension,
        }
    }

    /// The neighborhood freeing every group of `kind`.
    pub fn full(kind: NeighborhoodKind, dimension: usize) -> Self {
        Self {
            kind,
            members: (0..dimension).collect(),
            dimension,
        }
    }

    pub fn kind(&self) -> NeighborhoodKind {
        self.kind
    }

    /// Free group indices, ascending.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Whether nothing of this kind gets fixed.
    pub fn is_full(&self) -> bool {
        self.members.len() >= self.dimension
    }

    pub fn contains(&self, index: usize) -> bool {
        self.members.binary_search(&index).is_ok()
    }

    /// The free groups, ascending.
    pub fn free_groups(&self) -> impl Iterator<Item = VariableGroup> + '_ {
        self.members.iter().map(move |&index| VariableGroup {
            kind: self.kind,
            index,
        })
    }
}

/// Samples and sweeps neighborhoods over fixed problem dimensions.
#[derive(Debug, Clone)]
pub struct NeighborhoodGenerator {
    dims: Dimensions,
}

impl NeighborhoodGenerator {
    pub fn new(dims: Dimensions) -> Self {
        Self { dims }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Picks `size` distinct indices of `kind` uniformly without
    /// replacement. A size of zero is treated as one; a size at or above
    /// the dimension yields the full neighborhood.
    pub fn sample<R: Rng>(&self, kind: NeighborhoodKind, size: usize, rng: &mut R) -> Neighborhood {
        let dimension = self.dims.of(kind);
        let size = size.max(1);
        if size >= dimension {
            return Neighborhood::full(kind, dimension);
        }
        let members = rand::seq::index::sample(rng, dimension, size).into_vec();
        Neighborhood::new(kind, members, dimension)
    }

    /// Contiguous blocks of `block` indices covering `[0, dimension)`,
    /// each exactly once. The last block may be shorter.
    pub fn sweep(&self, kind: NeighborhoodKind, block: usize) -> Sweep {
        Sweep {
            kind,
            dimension: self.dims.of(kind),
            block: block.max(1),
            next: 0,
        }
    }
}

/// Iterator returned by [`NeighborhoodGenerator::sweep`].
#[derive(Debug, Clone)]
pub struct Sweep {
    kind: NeighborhoodKind,
    dimension: usize,
    block: usize,
    next: usize,
}

impl Iterator for Sweep {
    type Item = Neighborhood;

    fn next(&mut self) -> Option<Neighborhood> {
        if self.next >= self.dimension {
            return None;
        }
        let end = (self.next + self.block).min(self.dimension);
        let members = (self.next..end).collect();
        self.next = end;
        Some(Neighborhood {
            kind: self.kind,
            members,
            dimension: self.dimension,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.dimension.saturating_sub(self.next).div_ceil(self.block);
        (left, Some(left))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generator() -> NeighborhoodGenerator {
        NeighborhoodGenerator::new(Dimensions::new(5, 3, 10))
    }

    #[test]
    fn test_sample_distinct_members() {
        let mut rng = StdRng::seed_from_u64(7);
        let nb = generator().sample(NeighborhoodKind::Customers, 4, &mut rng);
        assert_eq!(nb.size(), 4);
        assert_eq!(nb.dimension(), 10);
        assert!(!nb.is_full());
        assert!(nb.members().windows(2).all(|w| w[0] < w[1]));
        let free: Vec<usize> = nb.free_groups().map(|g| g.index).collect();
        assert_eq!(free, nb.members());
    }

    #[test]
    fn test_sample_oversized_is_full() {
        let mut rng = StdRng::seed_from_u64(7);
        let nb = generator().sample(NeighborhoodKind::Vehicles, 3, &mut rng);
        assert!(nb.is_full());
        assert_eq!(nb.members(), &[0, 1, 2]);
        assert_eq!(nb.free_groups().count(), 3);

        let nb = generator().sample(NeighborhoodKind::Days, 99, &mut rng);
        assert!(nb.is_full());
        assert_eq!(nb.size(), 5);
    }

    #[test]
    fn test_sample_zero_size_clamped() {
        let mut rng = StdRng::seed_from_u64(1);
        let nb = generator().sample(NeighborhoodKind::Days, 0, &mut rng);
        assert_eq!(nb.size(), 1);
    }

    #[test]
    fn test_sample_reproducible_with_seed() {
        let g = generator();
        let a = g.sample(NeighborhoodKind::Customers, 3, &mut StdRng::seed_from_u64(42));
        let b = g.sample(NeighborhoodKind::Customers, 3, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_sweep_covers_each_index_once() {
        let blocks: Vec<Neighborhood> = generator().sweep(NeighborhoodKind::Customers, 4).collect();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].members(), &[0, 1, 2, 3]);
        assert_eq!(blocks[1].members(), &[4, 5, 6, 7]);
        assert_eq!(blocks[2].members(), &[8, 9]);
        let all: Vec<usize> = blocks.iter().flat_map(|b| b.members().to_vec()).collect();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_sweep_size_hint() {
        let sweep = generator().sweep(NeighborhoodKind::Days, 2);
        assert_eq!(sweep.size_hint(), (3, Some(3)));
        assert_eq!(sweep.count(), 3);
    }

    #[test]
    fn test_neighborhood_new_dedups() {
        let nb = Neighborhood::new(NeighborhoodKind::Days, vec![3, 1, 3], 5);
        assert_eq!(nb.members(), &[1, 3]);
        assert!(nb.contains(3));
        assert!(!nb.contains(2));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_neighborhood_member_out_of_range() {
        Neighborhood::new(NeighborhoodKind::Days, vec![5], 5);
    }

    proptest! {
        #[test]
        fn prop_sample_within_bounds(dim in 1usize..40, size in 0usize..50, seed in any::<u64>()) {
            let g = NeighborhoodGenerator::new(Dimensions::new(dim, 1, 1));
            let nb = g.sample(NeighborhoodKind::Days, size, &mut StdRng::seed_from_u64(seed));
            prop_assert_eq!(nb.size(), size.max(1).min(dim));
            prop_assert!(nb.members().iter().all(|&m| m < dim));
            prop_assert!(nb.free_groups().all(|g| g.kind == NeighborhoodKind::Days && nb.contains(g.index)));
        }
    }
}
