//! In-memory integer model solved by exhaustive enumeration.

use super::err::{DenseModelError, ModelBuildError};
use super::types::{Emphasis, MipModel, Solution, SolveParams, SolveResult, SolvedPoint};
use std::collections::HashSet;
use std::ops::Range;
use std::time::Instant;

const FEASIBILITY_TOL: f64 = 1e-9;

/// Leaves visited between two deadline checks.
const DEADLINE_CHECK_INTERVAL: u64 = 1024;

/// Row sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

/// A linear row `sum(a_j * x_j) <sense> rhs`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Row {
    pub terms: Vec<(usize, f64)>,
    pub sense: Sense,
    pub rhs: f64,
}

impl Row {
    fn activity(&self, x: &[i64]) -> f64 {
        self.terms.iter().map(|&(j, a)| a * x[j] as f64).sum()
    }

    fn is_satisfied(&self, x: &[i64]) -> bool {
        let lhs = self.activity(x);
        match self.sense {
            Sense::Le => lhs <= self.rhs + FEASIBILITY_TOL,
            Sense::Ge => lhs >= self.rhs - FEASIBILITY_TOL,
            Sense::Eq => (lhs - self.rhs).abs() <= FEASIBILITY_TOL,
        }
    }
}

#[derive(Debug, Clone)]
struct ColumnDef {
    name: String,
    lower: i64,
    upper: i64,
    cost: f64,
}

/// Builder for [`DenseModel`]. Validation happens in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct DenseModelBuilder {
    columns: Vec<ColumnDef>,
    rows: Vec<Row>,
    offset: f64,
}

impl DenseModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bounded integer column and returns its index.
    pub fn column(&mut self, name: impl Into<String>, lower: i64, upper: i64, cost: f64) -> usize {
        self.columns.push(ColumnDef {
            name: name.into(),
            lower,
            upper,
            cost,
        });
        self.columns.len() - 1
    }

    /// Adds a 0/1 column and returns its index.
    pub fn binary(&mut self, name: impl Into<String>, cost: f64) -> usize {
        self.column(name, 0, 1, cost)
    }

    /// Adds a row and returns its index.
    pub fn row(&mut self, terms: Vec<(usize, f64)>, sense: Sense, rhs: f64) -> usize {
        self.rows.push(Row { terms, sense, rhs });
        self.rows.len() - 1
    }

    /// Sets the constant objective term.
    pub fn set_offset(&mut self, offset: f64) -> &mut Self {
        self.offset = offset;
        self
    }

    pub fn build(self) -> Result<DenseModel, ModelBuildError> {
        let mut seen = HashSet::with_capacity(self.columns.len());
        for c in &self.columns {
            if !seen.insert(c.name.as_str()) {
                return Err(ModelBuildError::DuplicateColumn {
                    name: c.name.clone(),
                });
            }
            if c.lower > c.upper {
                return Err(ModelBuildError::InvalidBounds {
                    name: c.name.clone(),
                    lower: c.lower,
                    upper: c.upper,
                });
            }
            if !c.cost.is_finite() {
                return Err(ModelBuildError::NonFiniteCoefficient {
                    context: format!("objective of `{}`", c.name),
                    value: c.cost,
                });
            }
        }
        if !self.offset.is_finite() {
            return Err(ModelBuildError::NonFiniteCoefficient {
                context: "objective offset".into(),
                value: self.offset,
            });
        }
        for (i, row) in self.rows.iter().enumerate() {
            for &(column, a) in &row.terms {
                if column >= self.columns.len() {
                    return Err(ModelBuildError::UnknownColumn { row: i, column });
                }
                if !a.is_finite() {
                    return Err(ModelBuildError::NonFiniteCoefficient {
                        context: format!("row {i}"),
                        value: a,
                    });
                }
            }
            if !row.rhs.is_finite() {
                return Err(ModelBuildError::NonFiniteCoefficient {
                    context: format!("right-hand side of row {i}"),
                    value: row.rhs,
                });
            }
        }

        let n = self.columns.len();
        let mut model = DenseModel {
            names: Vec::with_capacity(n),
            lower: Vec::with_capacity(n),
            upper: Vec::with_capacity(n),
            objective: Vec::with_capacity(n),
            offset: self.offset,
            rows: self.rows,
            warm_start: None,
        };
        for c in self.columns {
            model.names.push(c.name);
            model.lower.push(c.lower);
            model.upper.push(c.upper);
            model.objective.push(c.cost);
        }
        Ok(model)
    }
}

/// Best point of one enumeration branch.
struct Branch {
    best: Option<(f64, Vec<i64>)>,
    timed_out: bool,
}

/// A small in-memory integer model that solves itself by enumeration.
///
/// Every column is a bounded integer. Rows with a single term (which
/// includes every fixing row) tighten the column domain before the
/// enumeration starts, so a heavily fixed model solves quickly even if
/// the free model would not.
///
/// # Limitations
///
/// - Exhaustive: only practical for a few dozen free binaries
/// - Ignores the optimality gap (results are exact or time-limited)
/// - With [`Emphasis::Feasibility`] it stops at the first feasible point
///
/// # Examples
///
/// ```
/// use u_matheur::mip::{DenseModel, MipModel, Sense, SolveParams, SolveStatus};
///
/// let mut b = DenseModel::builder();
/// let x = b.binary("x", 3.0);
/// let y = b.binary("y", 2.0);
/// b.row(vec![(x, 1.0), (y, 1.0)], Sense::Ge, 1.0);
/// let mut model = b.build().unwrap();
///
/// let result = model.solve(&SolveParams::default()).unwrap();
/// assert_eq!(result.status(), SolveStatus::Optimal);
/// assert_eq!(result.point().unwrap().objective, 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct DenseModel {
    names: Vec<String>,
    lower: Vec<i64>,
    upper: Vec<i64>,
    objective: Vec<f64>,
    offset: f64,
    rows: Vec<Row>,
    warm_start: Option<Vec<i64>>,
}

impl DenseModel {
    pub fn builder() -> DenseModelBuilder {
        DenseModelBuilder::new()
    }

    pub fn column_name(&self, column: usize) -> &str {
        &self.names[column]
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Checks integrality, bounds and every row for `solution`.
    pub fn is_feasible(&self, solution: &Solution) -> bool {
        if solution.len() != self.names.len() {
            return false;
        }
        let mut x = Vec::with_capacity(solution.len());
        for (j, &v) in solution.values().iter().enumerate() {
            let r = v.round();
            if (v - r).abs() > FEASIBILITY_TOL {
                return false;
            }
            let r = r as i64;
            if r < self.lower[j] || r > self.upper[j] {
                return false;
            }
            x.push(r);
        }
        self.rows.iter().all(|row| row.is_satisfied(&x))
    }

    fn objective_of(&self, x: &[i64]) -> f64 {
        self.offset
            + self
                .objective
                .iter()
                .zip(x)
                .map(|(c, &v)| c * v as f64)
                .sum::<f64>()
    }

    fn point(&self, objective: f64, x: Vec<i64>) -> SolvedPoint {
        SolvedPoint {
            objective,
            solution: Solution::new(x.into_iter().map(|v| v as f64).collect()),
        }
    }

    /// Column domains after applying every single-term row, or `None`
    /// when some domain becomes empty.
    fn tightened_domains(&self) -> Option<Vec<(i64, i64)>> {
        let mut domains: Vec<(i64, i64)> = self
            .lower
            .iter()
            .zip(&self.upper)
            .map(|(&l, &u)| (l, u))
            .collect();

        for row in &self.rows {
            let [(column, a)] = row.terms.as_slice() else {
                continue;
            };
            let (column, a) = (*column, *a);
            if a == 0.0 {
                if !row.is_satisfied(&vec![0; domains.len()]) {
                    return None;
                }
                continue;
            }
            let bound = row.rhs / a;
            let (upper_side, lower_side) = match (row.sense, a > 0.0) {
                (Sense::Eq, _) => (true, true),
                (Sense::Le, true) | (Sense::Ge, false) => (true, false),
                (Sense::Ge, true) | (Sense::Le, false) => (false, true),
            };
            let (lo, hi) = &mut domains[column];
            if upper_side {
                *hi = (*hi).min((bound + FEASIBILITY_TOL).floor() as i64);
            }
            if lower_side {
                *lo = (*lo).max((bound - FEASIBILITY_TOL).ceil() as i64);
            }
            if *lo > *hi {
                return None;
            }
        }
        Some(domains)
    }

    fn enumerate(
        &self,
        domains: &[(i64, i64)],
        deadline: Option<Instant>,
        stop_at_first: bool,
        mut best: Option<(f64, Vec<i64>)>,
    ) -> Branch {
        let mut x: Vec<i64> = domains.iter().map(|d| d.0).collect();
        let mut visited: u64 = 0;

        loop {
            if self.rows.iter().all(|r| r.is_satisfied(&x)) {
                let obj = self.objective_of(&x);
                if best.as_ref().is_none_or(|(b, _)| obj < *b) {
                    best = Some((obj, x.clone()));
                }
                if stop_at_first {
                    return Branch {
                        best,
                        timed_out: false,
                    };
                }
            }

            visited += 1;
            if visited % DEADLINE_CHECK_INTERVAL == 0
                && deadline.is_some_and(|d| Instant::now() >= d)
            {
                return Branch {
                    best,
                    timed_out: true,
                };
            }

            // Odometer step; wrapping past the last column ends the search.
            let mut j = 0;
            loop {
                if j == x.len() {
                    return Branch {
                        best,
                        timed_out: false,
                    };
                }
                if x[j] < domains[j].1 {
                    x[j] += 1;
                    break;
                }
                x[j] = domains[j].0;
                j += 1;
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn search(
        &self,
        domains: &[(i64, i64)],
        deadline: Option<Instant>,
        stop_at_first: bool,
        start: Option<(f64, Vec<i64>)>,
    ) -> Branch {
        self.enumerate(domains, deadline, stop_at_first, start)
    }

    #[cfg(feature = "parallel")]
    fn search(
        &self,
        domains: &[(i64, i64)],
        deadline: Option<Instant>,
        stop_at_first: bool,
        start: Option<(f64, Vec<i64>)>,
    ) -> Branch {
        use rayon::prelude::*;

        let Some(&(lo, hi)) = domains.first() else {
            return self.enumerate(domains, deadline, stop_at_first, start);
        };

        let branches: Vec<Branch> = (lo..=hi)
            .into_par_iter()
            .map(|v| {
                let mut sub = domains.to_vec();
                sub[0] = (v, v);
                self.enumerate(&sub, deadline, stop_at_first, None)
            })
            .collect();

        let mut merged = Branch {
            best: start,
            timed_out: false,
        };
        for branch in branches {
            merged.timed_out |= branch.timed_out;
            if let Some((obj, x)) = branch.best {
                if merged.best.as_ref().is_none_or(|(m, _)| obj < *m) {
                    merged.best = Some((obj, x));
                }
                if stop_at_first {
                    break;
                }
            }
        }
        merged
    }

    fn check_column(&self, column: usize) -> Result<(), DenseModelError> {
        if column >= self.names.len() {
            return Err(DenseModelError::ColumnOutOfRange {
                column,
                columns: self.names.len(),
            });
        }
        Ok(())
    }
}

impl MipModel for DenseModel {
    type Error = DenseModelError;

    fn num_columns(&self) -> usize {
        self.names.len()
    }

    fn num_rows(&self) -> usize {
        self.rows.len()
    }

    fn is_integer(&self, _column: usize) -> bool {
        true
    }

    fn objective_coefficient(&self, column: usize) -> f64 {
        self.objective[column]
    }

    fn set_objective_coefficient(&mut self, column: usize, value: f64) -> Result<(), Self::Error> {
        self.check_column(column)?;
        if !value.is_finite() {
            return Err(DenseModelError::NonFinite { value });
        }
        self.objective[column] = value;
        Ok(())
    }

    fn objective_offset(&self) -> f64 {
        self.offset
    }

    fn add_equality_row(&mut self, column: usize, value: f64) -> Result<(), Self::Error> {
        self.check_column(column)?;
        if !value.is_finite() {
            return Err(DenseModelError::NonFinite { value });
        }
        self.rows.push(Row {
            terms: vec![(column, 1.0)],
            sense: Sense::Eq,
            rhs: value,
        });
        Ok(())
    }

    fn delete_rows(&mut self, rows: Range<usize>) -> Result<(), Self::Error> {
        if rows.start > rows.end || rows.end > self.rows.len() {
            return Err(DenseModelError::RowRangeOutOfBounds {
                start: rows.start,
                end: rows.end,
                rows: self.rows.len(),
            });
        }
        self.rows.drain(rows);
        Ok(())
    }

    fn solve(&mut self, params: &SolveParams) -> Result<SolveResult, Self::Error> {
        let deadline = Instant::now().checked_add(params.time_limit);
        let Some(domains) = self.tightened_domains() else {
            return Ok(SolveResult::Infeasible);
        };
        let stop_at_first = params.emphasis == Emphasis::Feasibility;

        let start = self
            .warm_start
            .as_ref()
            .filter(|x| {
                x.iter()
                    .zip(&domains)
                    .all(|(v, (lo, hi))| lo <= v && v <= hi)
                    && self.rows.iter().all(|r| r.is_satisfied(x))
            })
            .map(|x| (self.objective_of(x), x.clone()));

        if stop_at_first {
            if let Some((obj, x)) = start {
                return Ok(SolveResult::FeasibleTimeout(self.point(obj, x)));
            }
        }

        let branch = self.search(&domains, deadline, stop_at_first, start);
        let result = match branch.best {
            Some((obj, x)) if !branch.timed_out && !stop_at_first => {
                SolveResult::Optimal(self.point(obj, x))
            }
            Some((obj, x)) => SolveResult::FeasibleTimeout(self.point(obj, x)),
            None if branch.timed_out => SolveResult::NoSolution,
            None => SolveResult::Infeasible,
        };
        Ok(result)
    }

    fn set_warm_start(&mut self, solution: &Solution) -> Result<(), Self::Error> {
        if solution.len() != self.names.len() {
            return Err(DenseModelError::ColumnOutOfRange {
                column: solution.len(),
                columns: self.names.len(),
            });
        }
        self.warm_start = Some(solution.values().iter().map(|v| v.round() as i64).collect());
        Ok(())
    }
}
