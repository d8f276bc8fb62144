// Validity filtering - Mask readings outside plausible physical ranges
use crate::domain::dataset::Dataset;
use std::collections::BTreeMap;

/// Inclusive plausible range for one variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidityRule {
    pub lower: f64,
    pub upper: f64,
}

impl ValidityRule {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn admits(&self, value: f64) -> bool {
        (self.lower..=self.upper).contains(&value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidityFilter {
    rules: BTreeMap<String, ValidityRule>,
}

impl ValidityFilter {
    pub fn new(rules: BTreeMap<String, ValidityRule>) -> Self {
        Self { rules }
    }

    pub fn rule(&self, variable: &str) -> Option<&ValidityRule> {
        self.rules.get(variable)
    }

    /// Replaces every out-of-range reading with the missing marker. Variables
    /// without a rule are untouched; applying the filter twice changes nothing.
    pub fn apply(&self, mut dataset: Dataset) -> Dataset {
        for (variable, rule) in &self.rules {
            let Some(index) = dataset.schema().index_of(variable) else {
                tracing::debug!("No column for validity rule on '{}'", variable);
                continue;
            };
            let Some(column) = dataset.column_mut(index) else {
                continue;
            };

            let mut masked = 0;
            for reading in column.iter_mut() {
                if reading.is_some_and(|v| !rule.admits(v)) {
                    *reading = None;
                    masked += 1;
                }
            }

            if masked > 0 {
                tracing::debug!(
                    "Masked {} readings of '{}' outside [{}, {}]",
                    masked,
                    variable,
                    rule.lower,
                    rule.upper
                );
            }
        }

        dataset
    }
}
