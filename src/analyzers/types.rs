//! Data types produced by the aggregation pipeline.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::ops::Index;

use crate::ledger::Category;

/// Number of slots in a [`MonthlySeries`].
pub const MONTHS: usize = 12;

/// Per-month totals for one category, January first. Always 12 slots.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlySeries([f64; MONTHS]);

impl MonthlySeries {
    pub fn zeroed() -> Self {
        Self::default()
    }

    /// Adds `value` to the slot for `month_index` (0 = January).
    pub(crate) fn add(&mut self, month_index: usize, value: f64) {
        if let Some(slot) = self.0.get_mut(month_index) {
            *slot += value;
        }
    }

    pub fn values(&self) -> &[f64; MONTHS] {
        &self.0
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }
}

impl Index<usize> for MonthlySeries {
    type Output = f64;

    fn index(&self, month_index: usize) -> &f64 {
        &self.0[month_index]
    }
}

/// Headline figures for the dashboard summary cards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Sum of every slot of the summarized series, kg CO2e.
    pub total_waste: f64,
    /// `total_waste` in metric tons CO2e.
    pub total_carbon: f64,
}

impl Summary {
    pub fn from_series<'a>(series: impl IntoIterator<Item = &'a MonthlySeries>) -> Self {
        let total_waste: f64 = series.into_iter().map(MonthlySeries::total).sum();
        Self {
            total_waste,
            total_carbon: total_waste / 1000.0,
        }
    }
}

/// Yearly report: one monthly series per tracked category.
///
/// Serializes as `{ "year": 2025, "medical": [..], "designated": [..], ... }`
/// with categories in tracking order.
#[derive(Debug, Clone, PartialEq)]
pub struct WasteReport {
    pub year: i32,
    pub series: Vec<(Category, MonthlySeries)>,
}

impl WasteReport {
    /// Report with an all-zero series for each tracked category.
    pub fn zeroed(year: i32) -> Self {
        Self {
            year,
            series: Category::TRACKED
                .iter()
                .map(|c| (c.clone(), MonthlySeries::zeroed()))
                .collect(),
        }
    }

    pub fn get(&self, category: &Category) -> Option<&MonthlySeries> {
        self.series
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, s)| s)
    }

    pub fn summary(&self) -> Summary {
        Summary::from_series(self.series.iter().map(|(_, s)| s))
    }
}

impl Serialize for WasteReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.series.len() + 1))?;
        map.serialize_entry("year", &self.year)?;
        for (category, series) in &self.series {
            map.serialize_entry(category.key(), series)?;
        }
        map.end()
    }
}
