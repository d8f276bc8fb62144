// Regression domain models
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionResult {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub sample_count: usize,
}

impl RegressionResult {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Two-line label rendered next to the fit, e.g. `y = 2.00x + 0.00` / `R² = 1.00`.
    pub fn equation_label(&self) -> String {
        format!(
            "y = {:.2}x + {:.2}\nR² = {:.2}",
            self.slope, self.intercept, self.r_squared
        )
    }
}

/// Evenly spaced points along the fitted line, for overlay rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitLine {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}
