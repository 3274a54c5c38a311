//! Record types stored in the waste ledger.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::factors::EmissionFactorTable;

/// Identifier assigned by the store on insert.
pub type RecordId = u64;

static MONTH_ABBREVIATIONS: &[&str] = &[
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// A calendar month of a given year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "PeriodFields")]
pub struct Period {
    year: i32,
    month: u32,
}

#[derive(Deserialize)]
struct PeriodFields {
    year: i32,
    month: u32,
}

impl TryFrom<PeriodFields> for Period {
    type Error = String;

    fn try_from(fields: PeriodFields) -> Result<Self, Self::Error> {
        Period::new(fields.year, fields.month)
            .ok_or_else(|| format!("month {} is outside 1..=12", fields.month))
    }
}

impl Period {
    /// Returns `None` unless `month` is in `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Zero-based slot in a monthly series (January = 0).
    pub fn month_index(&self) -> usize {
        (self.month - 1) as usize
    }

    /// First and last period of `year`, inclusive.
    pub(crate) fn year_bounds(year: i32) -> (Self, Self) {
        (Self { year, month: 1 }, Self { year, month: 12 })
    }

    /// Resolves a period label from a ledger CSV.
    ///
    /// Accepts `Jan-25` style labels (two-digit years are taken as 20xx),
    /// full dates (`2025-01-31`) and year-months (`2025-01`).
    pub fn parse_label(label: &str) -> Option<Self> {
        let label = label.trim().trim_matches('"').trim();

        if let Ok(date) = NaiveDate::parse_from_str(label, "%Y-%m-%d") {
            return Self::new(date.year(), date.month());
        }
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{label}-01"), "%Y-%m-%d") {
            return Self::new(date.year(), date.month());
        }

        let (month, year) = label.split_once(|c: char| c == '-' || c == ' ')?;
        let month = month_from_abbreviation(month)?;
        let year = year.trim();
        let value: i32 = year.parse().ok()?;
        let year = if year.len() <= 2 { 2000 + value } else { value };

        Self::new(year, month)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

fn month_from_abbreviation(name: &str) -> Option<u32> {
    let prefix = name.trim().get(..3)?.to_ascii_lowercase();
    MONTH_ABBREVIATIONS
        .iter()
        .position(|m| *m == prefix)
        .map(|i| i as u32 + 1)
}

/// Waste category of a ledger entry.
///
/// Labels outside the known set are kept verbatim as [`Category::Other`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Category {
    Medical,
    Designated,
    IndustrialWastewater,
    Other(String),
}

impl Category {
    /// Categories shown on the dashboard and written to reports.
    pub const TRACKED: [Category; 3] = [
        Category::Medical,
        Category::Designated,
        Category::IndustrialWastewater,
    ];

    /// Maps a CSV header label (Korean or English) to a category.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().trim_matches('"').trim();
        match label.to_lowercase().as_str() {
            "의료폐기물" | "medical" => Category::Medical,
            "지정폐기물" | "designated" => Category::Designated,
            "산업폐수" | "폐수" | "industrial" | "industrial-wastewater" => {
                Category::IndustrialWastewater
            }
            _ => Category::Other(label.to_string()),
        }
    }

    /// Key used for this category in JSON output.
    pub fn key(&self) -> &str {
        match self {
            Category::Medical => "medical",
            Category::Designated => "designated",
            Category::IndustrialWastewater => "industrial",
            Category::Other(label) => label,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Category::from_label(&label)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.key().to_string()
    }
}

/// One observation of waste generated in a period.
///
/// `derived_emission` is fixed at construction from the quantity and the
/// category's emission factor; there are no setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteEntry {
    period: Period,
    category: Category,
    quantity: f64,
    derived_emission: f64,
}

impl WasteEntry {
    pub fn new(
        period: Period,
        category: Category,
        quantity: f64,
        factors: &EmissionFactorTable,
    ) -> Self {
        let derived_emission = quantity * factors.factor(&category);
        Self {
            period,
            category,
            quantity,
            derived_emission,
        }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    /// Waste mass in kilograms.
    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    /// Emissions in kilograms of CO2-equivalent.
    pub fn derived_emission(&self) -> f64 {
        self.derived_emission
    }
}

/// A [`WasteEntry`] together with the id the store assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub entry: WasteEntry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month_abbreviation_label() {
        assert_eq!(Period::parse_label("Jan-25"), Period::new(2025, 1));
        assert_eq!(Period::parse_label("dec-24"), Period::new(2024, 12));
        assert_eq!(Period::parse_label(" Sept 2023 "), Period::new(2023, 9));
    }

    #[test]
    fn test_parse_full_date_and_year_month() {
        assert_eq!(Period::parse_label("2025-03-17"), Period::new(2025, 3));
        assert_eq!(Period::parse_label("2025-11"), Period::new(2025, 11));
    }

    #[test]
    fn test_parse_unrecognized_label() {
        assert_eq!(Period::parse_label("Total"), None);
        assert_eq!(Period::parse_label("Foo-25"), None);
        assert_eq!(Period::parse_label("합계"), None);
        assert_eq!(Period::parse_label(""), None);
    }

    #[test]
    fn test_period_month_index_and_display() {
        let period = Period::new(2025, 4).unwrap();
        assert_eq!(period.month_index(), 3);
        assert_eq!(period.to_string(), "2025-04");
        assert!(Period::new(2025, 13).is_none());
        assert!(Period::new(2025, 0).is_none());
    }

    #[test]
    fn test_period_json_rejects_bad_month() {
        let ok: Period = serde_json::from_str(r#"{"year":2025,"month":12}"#).unwrap();
        assert_eq!(ok, Period::new(2025, 12).unwrap());

        assert!(serde_json::from_str::<Period>(r#"{"year":2025,"month":0}"#).is_err());
        assert!(serde_json::from_str::<Period>(r#"{"year":2025,"month":13}"#).is_err());
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(Category::from_label("의료폐기물"), Category::Medical);
        assert_eq!(Category::from_label("Designated"), Category::Designated);
        assert_eq!(Category::from_label("산업폐수"), Category::IndustrialWastewater);
        assert_eq!(
            Category::from_label(" 일반폐기물 "),
            Category::Other("일반폐기물".to_string())
        );
    }

    #[test]
    fn test_category_key_round_trips_through_json() {
        let json = serde_json::to_string(&Category::IndustrialWastewater).unwrap();
        assert_eq!(json, "\"industrial\"");
        let back: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Category::IndustrialWastewater);
    }

    #[test]
    fn test_entry_derives_emission() {
        let factors = EmissionFactorTable::default();
        let period = Period::new(2025, 1).unwrap();

        let medical = WasteEntry::new(period, Category::Medical, 100.0, &factors);
        assert_eq!(medical.derived_emission(), 250.0);

        let unknown = WasteEntry::new(period, Category::from_label("plastic"), 40.0, &factors);
        assert_eq!(unknown.derived_emission(), 40.0);
    }
}
