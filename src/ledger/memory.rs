use async_trait::async_trait;
use tokio::sync::RwLock;

use super::state::LedgerState;
use super::{Category, LedgerRecord, LedgerStore, RecordId, WasteEntry};
use crate::error::StoreError;

/// In-process ledger; contents end with the process.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn clear(&self) -> Result<(), StoreError> {
        self.state.write().await.clear();
        Ok(())
    }

    async fn insert(&self, entry: WasteEntry) -> Result<RecordId, StoreError> {
        Ok(self.state.write().await.insert(entry))
    }

    async fn query_by_category(
        &self,
        category: &Category,
        year: Option<i32>,
    ) -> Result<Vec<LedgerRecord>, StoreError> {
        Ok(self.state.read().await.query_by_category(category, year))
    }

    async fn all(&self) -> Result<Vec<LedgerRecord>, StoreError> {
        Ok(self.state.read().await.all())
    }

    async fn replace_all(&self, entries: Vec<WasteEntry>) -> Result<Vec<RecordId>, StoreError> {
        Ok(self.state.write().await.replace(entries))
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.state.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::EmissionFactorTable;
    use crate::ledger::Period;

    fn entry(month: u32, category: Category, quantity: f64) -> WasteEntry {
        WasteEntry::new(
            Period::new(2025, month).unwrap(),
            category,
            quantity,
            &EmissionFactorTable::default(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_query() {
        let store = MemoryLedger::new();
        store.insert(entry(1, Category::Medical, 10.0)).await.unwrap();
        store.insert(entry(2, Category::Designated, 20.0)).await.unwrap();

        let medical = store.query_by_category(&Category::Medical, None).await.unwrap();
        assert_eq!(medical.len(), 1);
        assert_eq!(medical[0].entry.derived_emission(), 25.0);
        assert_eq!(store.all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let store = MemoryLedger::new();
        store.insert(entry(1, Category::Medical, 10.0)).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_replace_all_swaps_contents() {
        let store = MemoryLedger::new();
        store.insert(entry(1, Category::Medical, 10.0)).await.unwrap();

        let ids = store
            .replace_all(vec![entry(3, Category::Designated, 5.0)])
            .await
            .unwrap();

        assert_eq!(ids.len(), 1);
        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].entry.category(), &Category::Designated);
    }
}
