//! Variable registry: semantic variable identities to column indices.
//!
//! A formulation registers each variable family (for example
//! `x[vehicle][day][customer]`) together with its axes. The registry
//! lays families out contiguously in registration order, row-major
//! within a family, and is the only place where column arithmetic
//! happens. Lookups outside the declared ranges panic instead of
//! silently landing on a neighboring variable.
//!
//! # Examples
//!
//! ```
//! use u_matheur::registry::{Axis, VariableRegistry, VariableGroup};
//! use u_matheur::neighborhood::NeighborhoodKind;
//!
//! let mut reg = VariableRegistry::new();
//! let x = reg
//!     .register("x", &[Axis::vehicles(2), Axis::days(3)], true)
//!     .unwrap();
//! assert_eq!(reg.num_columns(), 6);
//! assert_eq!(reg.index_of(x, &[1, 2]), 5);
//! assert_eq!(reg.locate(5), (x, vec![1, 2]));
//!
//! let vehicle_1 = VariableGroup { kind: NeighborhoodKind::Vehicles, index: 1 };
//! assert_eq!(reg.columns_of(vehicle_1), vec![3, 4, 5]);
//! ```

mod err;

pub use err::RegistryError;

use crate::neighborhood::NeighborhoodKind;
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

/// Handle of a registered variable family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FamilyId(usize);

impl FamilyId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One axis of a variable family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// Indexed by a neighborhood dimension; groups of that kind select
    /// along this axis.
    Keyed { kind: NeighborhoodKind, len: usize },
    /// Any other index (trip number, load level, ...).
    Plain { len: usize },
}

impl Axis {
    pub fn vehicles(len: usize) -> Self {
        Axis::Keyed {
            kind: NeighborhoodKind::Vehicles,
            len,
        }
    }

    pub fn days(len: usize) -> Self {
        Axis::Keyed {
            kind: NeighborhoodKind::Days,
            len,
        }
    }

    pub fn customers(len: usize) -> Self {
        Axis::Keyed {
            kind: NeighborhoodKind::Customers,
            len,
        }
    }

    pub fn plain(len: usize) -> Self {
        Axis::Plain { len }
    }

    pub fn len(&self) -> usize {
        match *self {
            Axis::Keyed { len, .. } | Axis::Plain { len } => len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> Option<NeighborhoodKind> {
        match *self {
            Axis::Keyed { kind, .. } => Some(kind),
            Axis::Plain { .. } => None,
        }
    }
}

/// A registered variable family and its column range.
#[derive(Debug, Clone)]
pub struct VariableFamily {
    name: String,
    axes: Vec<Axis>,
    strides: Vec<usize>,
    offset: usize,
    size: usize,
    fixable: bool,
}

impl VariableFamily {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Whether the fixing engine may pin this family's variables.
    pub fn is_fixable(&self) -> bool {
        self.fixable
    }

    pub fn columns(&self) -> Range<usize> {
        self.offset..self.offset + self.size
    }

    fn axis_of(&self, kind: NeighborhoodKind) -> Option<usize> {
        self.axes.iter().position(|a| a.kind() == Some(kind))
    }
}

/// A semantic group of variables: everything indexed by one vehicle,
/// one day or one customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableGroup {
    pub kind: NeighborhoodKind,
    pub index: usize,
}

/// Bijective map between `(family, key)` and column indices.
#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    families: Vec<VariableFamily>,
    by_name: HashMap<String, FamilyId>,
    dims: BTreeMap<NeighborhoodKind, usize>,
    columns: usize,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a family and appends its columns after every family
    /// registered so far.
    ///
    /// All families keyed by the same kind must agree on its length.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        axes: &[Axis],
        fixable: bool,
    ) -> Result<FamilyId, RegistryError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::DuplicateFamily { name });
        }

        let mut seen = Vec::with_capacity(axes.len());
        for (i, axis) in axes.iter().enumerate() {
            if axis.is_empty() {
                return Err(RegistryError::ZeroLengthAxis {
                    family: name,
                    axis: i,
                });
            }
            let Some(kind) = axis.kind() else {
                continue;
            };
            if seen.contains(&kind) {
                return Err(RegistryError::RepeatedKind { family: name, kind });
            }
            seen.push(kind);
            if let Some(&expected) = self.dims.get(&kind) {
                if expected != axis.len() {
                    return Err(RegistryError::DimensionMismatch {
                        kind,
                        expected,
                        found: axis.len(),
                    });
                }
            }
        }

        let mut strides = vec![1; axes.len()];
        for i in (0..axes.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * axes[i + 1].len();
        }
        let size = axes.iter().map(Axis::len).product();

        for axis in axes {
            if let Some(kind) = axis.kind() {
                self.dims.insert(kind, axis.len());
            }
        }

        let id = FamilyId(self.families.len());
        self.families.push(VariableFamily {
            name: name.clone(),
            axes: axes.to_vec(),
            strides,
            offset: self.columns,
            size,
            fixable,
        });
        self.by_name.insert(name, id);
        self.columns += size;
        Ok(id)
    }

    pub fn num_columns(&self) -> usize {
        self.columns
    }

    /// Length of the axis keyed by `kind`, if any family declares one.
    pub fn dimension(&self, kind: NeighborhoodKind) -> Option<usize> {
        self.dims.get(&kind).copied()
    }

    pub fn family(&self, id: FamilyId) -> &VariableFamily {
        &self.families[id.0]
    }

    pub fn family_id(&self, name: &str) -> Option<FamilyId> {
        self.by_name.get(name).copied()
    }

    pub fn families(&self) -> impl Iterator<Item = (FamilyId, &VariableFamily)> {
        self.families
            .iter()
            .enumerate()
            .map(|(i, f)| (FamilyId(i), f))
    }

    /// Column of `family[key]`.
    ///
    /// # Panics
    ///
    /// Panics on an unknown family, a key of the wrong arity or any key
    /// component outside its axis.
    pub fn index_of(&self, family: FamilyId, key: &[usize]) -> usize {
        match self.try_index_of(family, key) {
            Ok(column) => column,
            Err(e) => panic!("variable registry lookup failed: {e}"),
        }
    }

    /// Checked variant of [`index_of`](Self::index_of).
    pub fn try_index_of(&self, family: FamilyId, key: &[usize]) -> Result<usize, RegistryError> {
        let fam = self
            .families
            .get(family.0)
            .ok_or(RegistryError::UnknownFamily { id: family.0 })?;
        if key.len() != fam.axes.len() {
            return Err(RegistryError::KeyArity {
                family: fam.name.clone(),
                expected: fam.axes.len(),
                found: key.len(),
            });
        }
        let mut column = fam.offset;
        for (axis, ((&k, a), &stride)) in key.iter().zip(&fam.axes).zip(&fam.strides).enumerate() {
            if k >= a.len() {
                return Err(RegistryError::KeyOutOfRange {
                    family: fam.name.clone(),
                    axis,
                    index: k,
                    len: a.len(),
                });
            }
            column += k * stride;
        }
        Ok(column)
    }

    /// Inverse of [`index_of`](Self::index_of).
    ///
    /// # Panics
    ///
    /// Panics if `column` is not below [`num_columns`](Self::num_columns).
    pub fn locate(&self, column: usize) -> (FamilyId, Vec<usize>) {
        match self.try_locate(column) {
            Ok(found) => found,
            Err(e) => panic!("variable registry lookup failed: {e}"),
        }
    }

    pub fn try_locate(&self, column: usize) -> Result<(FamilyId, Vec<usize>), RegistryError> {
        if column >= self.columns {
            return Err(RegistryError::ColumnOutOfRange {
                column,
                columns: self.columns,
            });
        }
        let i = self
            .families
            .partition_point(|f| f.offset + f.size <= column);
        let fam = &self.families[i];
        let mut rest = column - fam.offset;
        let key = fam
            .strides
            .iter()
            .map(|&stride| {
                let k = rest / stride;
                rest %= stride;
                k
            })
            .collect();
        Ok((FamilyId(i), key))
    }

    /// Every column of every fixable family whose `group.kind` axis
    /// equals `group.index`, ascending.
    ///
    /// # Panics
    ///
    /// Panics if `group.index` is outside the kind's dimension.
    pub fn columns_of(&self, group: VariableGroup) -> Vec<usize> {
        let Some(dimension) = self.dimension(group.kind) else {
            return Vec::new();
        };
        assert!(
            group.index < dimension,
            "{} group {} out of range (dimension {dimension})",
            group.kind,
            group.index
        );

        let mut columns = Vec::new();
        for fam in self.families.iter().filter(|f| f.fixable) {
            let Some(p) = fam.axis_of(group.kind) else {
                continue;
            };
            let inner = fam.strides[p];
            let block = inner * fam.axes[p].len();
            let outer = fam.size / block;
            for o in 0..outer {
                let start = fam.offset + o * block + group.index * inner;
                columns.extend(start..start + inner);
            }
        }
        columns
    }

    /// Every fixable column, regardless of kind.
    pub fn fixable_columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.families
            .iter()
            .filter(|f| f.fixable)
            .flat_map(|f| f.columns())
    }
}
