//! Incumbent tracker: best solution found so far.

use crate::mip::Solution;
use std::time::Duration;

/// One incumbent update.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IncumbentRecord {
    /// Time since the run started.
    pub elapsed: Duration,
    pub objective: f64,
}

/// Holds the best solution and only replaces it on strict improvement
/// (minimization).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_matheur::incumbent::IncumbentTracker;
/// use u_matheur::mip::Solution;
///
/// let mut t = IncumbentTracker::new(1e-9);
/// t.seed(Solution::zeros(2), 1000.0, Duration::ZERO);
/// assert!(t.offer(Solution::zeros(2), 950.0, Duration::from_secs(1)));
/// assert!(!t.offer(Solution::zeros(2), 960.0, Duration::from_secs(2)));
/// assert_eq!(t.objective(), Some(950.0));
/// ```
#[derive(Debug, Clone)]
pub struct IncumbentTracker {
    best: Option<(Solution, f64)>,
    epsilon: f64,
    improvements: usize,
    history: Vec<IncumbentRecord>,
}

impl IncumbentTracker {
    /// `epsilon` is the margin by which a candidate must beat the
    /// incumbent to count as an improvement.
    pub fn new(epsilon: f64) -> Self {
        Self {
            best: None,
            epsilon,
            improvements: 0,
            history: Vec::new(),
        }
    }

    /// Installs the starting incumbent unconditionally.
    pub fn seed(&mut self, solution: Solution, objective: f64, elapsed: Duration) {
        self.best = Some((solution, objective));
        self.history.push(IncumbentRecord { elapsed, objective });
    }

    /// Whether `objective` would replace the incumbent. Always true while
    /// there is none.
    pub fn is_improvement(&self, objective: f64) -> bool {
        match &self.best {
            Some((_, best)) => objective < best - self.epsilon,
            None => true,
        }
    }

    /// Replaces the incumbent if `objective` is strictly better.
    pub fn offer(&mut self, solution: Solution, objective: f64, elapsed: Duration) -> bool {
        if !self.is_improvement(objective) {
            return false;
        }
        if self.best.is_some() {
            self.improvements += 1;
        }
        self.best = Some((solution, objective));
        self.history.push(IncumbentRecord { elapsed, objective });
        true
    }

    pub fn best(&self) -> Option<&Solution> {
        self.best.as_ref().map(|(s, _)| s)
    }

    pub fn objective(&self) -> Option<f64> {
        self.best.as_ref().map(|&(_, o)| o)
    }

    /// Accepted improvements, not counting the seed.
    pub fn improvements(&self) -> usize {
        self.improvements
    }

    pub fn history(&self) -> &[IncumbentRecord] {
        &self.history
    }

    pub fn into_parts(self) -> (Option<(Solution, f64)>, Vec<IncumbentRecord>) {
        (self.best, self.history)
    }
}
