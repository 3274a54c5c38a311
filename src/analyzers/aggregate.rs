use crate::analyzers::types::{MonthlySeries, Summary, WasteReport};
use crate::error::StoreError;
use crate::ledger::{Category, LedgerRecord, LedgerStore};

/// Sums each record's derived emission into the slot of its month.
pub fn bucket_by_month(records: &[LedgerRecord]) -> MonthlySeries {
    let mut series = MonthlySeries::zeroed();
    for record in records {
        series.add(
            record.entry.period().month_index(),
            record.entry.derived_emission(),
        );
    }
    series
}

/// Read-side queries over a [`LedgerStore`].
///
/// Records of the same category and month are summed. A year bound limits
/// the query to that calendar year; without one every year lands in the same
/// 12 slots.
pub struct Aggregator<'a> {
    store: &'a dyn LedgerStore,
}

impl<'a> Aggregator<'a> {
    pub fn new(store: &'a dyn LedgerStore) -> Self {
        Self { store }
    }

    pub async fn monthly_series(
        &self,
        category: &Category,
        year: Option<i32>,
    ) -> Result<MonthlySeries, StoreError> {
        let records = self.store.query_by_category(category, year).await?;
        Ok(bucket_by_month(&records))
    }

    /// Total emissions across `categories`, in kilograms and tons.
    pub async fn summary(
        &self,
        categories: &[Category],
        year: Option<i32>,
    ) -> Result<Summary, StoreError> {
        let mut series = Vec::with_capacity(categories.len());
        for category in categories {
            series.push(self.monthly_series(category, year).await?);
        }
        Ok(Summary::from_series(&series))
    }

    /// Monthly series of every tracked category for `year`.
    #[tracing::instrument(skip(self))]
    pub async fn export_report(&self, year: i32) -> Result<WasteReport, StoreError> {
        let mut series = Vec::with_capacity(Category::TRACKED.len());
        for category in Category::TRACKED {
            let values = self.monthly_series(&category, Some(year)).await?;
            series.push((category, values));
        }
        Ok(WasteReport { year, series })
    }
}
