//! Shaking configuration.

use crate::registry::FamilyId;

/// Which columns receive random objective coefficients during a shake,
/// and from which range those coefficients are drawn.
///
/// # Examples
///
/// ```
/// use u_matheur::shaking::ShakingConfig;
///
/// let config = ShakingConfig::default().with_coefficient_range(0.01, 0.5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShakingConfig {
    /// Families whose columns are perturbed. Empty means every fixable
    /// family.
    pub families: Vec<FamilyId>,
    /// Half-open range `[low, high)` of the random coefficients.
    pub coefficient_range: (f64, f64),
}

impl Default for ShakingConfig {
    fn default() -> Self {
        Self {
            families: Vec::new(),
            coefficient_range: (0.001, 1.0),
        }
    }
}

impl ShakingConfig {
    /// Sets the families whose coefficients are perturbed.
    pub fn with_families(mut self, families: Vec<FamilyId>) -> Self {
        self.families = families;
        self
    }

    /// Sets the range random coefficients are drawn from.
    pub fn with_coefficient_range(mut self, low: f64, high: f64) -> Self {
        self.coefficient_range = (low, high);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        let (low, high) = self.coefficient_range;
        if !low.is_finite() || !high.is_finite() {
            return Err("coefficient_range must be finite".into());
        }
        if low <= 0.0 {
            return Err(format!("coefficient_range low must be positive, got {low}"));
        }
        if low >= high {
            return Err(format!(
                "coefficient_range must satisfy low < high, got [{low}, {high})"
            ));
        }
        Ok(())
    }
}
