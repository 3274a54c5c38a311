//! Local waste ledger.
//!
//! [`LedgerStore`] is the async trait the importer writes through and the
//! aggregator reads from. [`MemoryLedger`] keeps records in process;
//! [`FileLedger`] additionally persists them as a JSON snapshot.

mod file;
mod memory;
mod state;
mod types;

pub use file::FileLedger;
pub use memory::MemoryLedger;
pub use types::{Category, LedgerRecord, Period, RecordId, WasteEntry};

use async_trait::async_trait;

use crate::error::StoreError;

/// Keyed record storage with lookup by category and by (category, period).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Removes every record. Ids already handed out stay retired.
    async fn clear(&self) -> Result<(), StoreError>;

    /// Stores `entry` under a fresh id. Quantities are not validated here.
    async fn insert(&self, entry: WasteEntry) -> Result<RecordId, StoreError>;

    /// Records of `category`, limited to periods in `year` when given.
    async fn query_by_category(
        &self,
        category: &Category,
        year: Option<i32>,
    ) -> Result<Vec<LedgerRecord>, StoreError>;

    async fn all(&self) -> Result<Vec<LedgerRecord>, StoreError>;

    /// Clears the store and inserts `entries` as one transaction.
    ///
    /// Readers observe either the previous contents or the new ones.
    async fn replace_all(&self, entries: Vec<WasteEntry>) -> Result<Vec<RecordId>, StoreError>;

    async fn len(&self) -> Result<usize, StoreError>;
}
