//! Emission factors converting waste mass into CO2-equivalent mass.

use anyhow::{Context, Result, bail};
use std::collections::HashMap;

use crate::ledger::Category;

/// Multiplier used for categories without a configured factor.
pub const DEFAULT_FACTOR: f64 = 1.0;

/// Built-in factors in kg CO2e per kg of waste, keyed by CSV header label.
static DEFAULT_FACTORS: &[(&str, f64)] = &[
    ("의료폐기물", 2.5),
    ("지정폐기물", 1.8),
    ("산업폐수", 0.5),
];

/// Category to emission-factor mapping, fixed once the process has started.
#[derive(Debug, Clone)]
pub struct EmissionFactorTable {
    factors: HashMap<Category, f64>,
}

impl Default for EmissionFactorTable {
    fn default() -> Self {
        let factors = DEFAULT_FACTORS
            .iter()
            .map(|(label, factor)| (Category::from_label(label), *factor))
            .collect();
        Self { factors }
    }
}

impl EmissionFactorTable {
    /// Loads the built-in table overlaid with factors from a JSON file.
    ///
    /// The file holds a plain object of header label to factor:
    /// ```json
    /// {
    ///   "의료폐기물": 2.7,
    ///   "일반폐기물": 0.9
    /// }
    /// ```
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read emission factors from '{path}'"))?;
        let overrides: HashMap<String, f64> = serde_json::from_str(&content)
            .with_context(|| format!("emission factor file '{path}' is not a JSON object of numbers"))?;
        Self::default().with_overrides(overrides)
    }

    /// Replaces or adds factors. Every factor must be finite and positive.
    pub fn with_overrides(mut self, overrides: HashMap<String, f64>) -> Result<Self> {
        for (label, factor) in overrides {
            if !factor.is_finite() || factor <= 0.0 {
                bail!("emission factor for '{label}' must be positive, got {factor}");
            }
            self.factors.insert(Category::from_label(&label), factor);
        }
        Ok(self)
    }

    /// Factor for `category`, or [`DEFAULT_FACTOR`] when none is configured.
    pub fn factor(&self, category: &Category) -> f64 {
        self.factors
            .get(category)
            .copied()
            .unwrap_or(DEFAULT_FACTOR)
    }
}
