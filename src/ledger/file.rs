use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::state::{LedgerState, Snapshot};
use super::{Category, LedgerRecord, LedgerStore, RecordId, WasteEntry};
use crate::error::StoreError;

/// Ledger persisted as a JSON snapshot file.
///
/// The snapshot is rewritten after every mutation. A failed write rolls the
/// in-memory state back, so memory and disk never disagree.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    state: RwLock<LedgerState>,
}

impl FileLedger {
    /// Opens the snapshot at `path`, starting empty if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Fails if the parent directory cannot be created, the file cannot be
    /// read, or its contents are not a ledger snapshot.
    #[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Open {
                    path: path.clone(),
                    source,
                })?;
        }

        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: Snapshot =
                    serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                        path: path.clone(),
                        source,
                    })?;
                LedgerState::from_snapshot(snapshot)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => LedgerState::default(),
            Err(source) => {
                return Err(StoreError::Open {
                    path: path.clone(),
                    source,
                });
            }
        };

        info!(records = state.len(), "Ledger store opened");

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    async fn persist(&self, state: &LedgerState) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(&state.snapshot())?;
        let tmp = self.path.with_extension("tmp");

        tokio::fs::write(&tmp, body)
            .await
            .map_err(|source| StoreError::Persist {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| StoreError::Persist {
                path: self.path.clone(),
                source,
            })?;

        debug!(records = state.len(), "Ledger snapshot written");
        Ok(())
    }

    /// Applies `op` and persists, restoring the previous state if the write
    /// fails. Clones the whole state, so single inserts avoid it.
    async fn mutate<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send,
        F: FnOnce(&mut LedgerState) -> T + Send,
    {
        let mut state = self.state.write().await;
        let previous = state.clone();
        let out = op(&mut *state);

        if let Err(e) = self.persist(&state).await {
            *state = previous;
            return Err(e);
        }
        Ok(out)
    }
}

#[async_trait]
impl LedgerStore for FileLedger {
    async fn clear(&self) -> Result<(), StoreError> {
        self.mutate(|state| state.clear()).await
    }

    /// Each insert rewrites the whole snapshot; bulk loads should go through
    /// `replace_all`.
    async fn insert(&self, entry: WasteEntry) -> Result<RecordId, StoreError> {
        let mut state = self.state.write().await;
        let id = state.insert(entry);

        if let Err(e) = self.persist(&state).await {
            state.remove(id);
            return Err(e);
        }
        Ok(id)
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
        self.mutate(|state| state.replace(entries)).await
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
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn entry(month: u32, quantity: f64) -> WasteEntry {
        WasteEntry::new(
            Period::new(2025, month).unwrap(),
            Category::Medical,
            quantity,
            &EmissionFactorTable::default(),
        )
    }

    #[tokio::test]
    async fn test_open_missing_file_starts_empty() {
        let path = temp_path("waste_ledger_test_missing.json");
        let _ = fs::remove_file(&path);

        let store = FileLedger::open(&path).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let path = temp_path("waste_ledger_test_reopen.json");
        let _ = fs::remove_file(&path);

        {
            let store = FileLedger::open(&path).await.unwrap();
            store.replace_all(vec![entry(1, 10.0), entry(2, 20.0)]).await.unwrap();
        }

        let store = FileLedger::open(&path).await.unwrap();
        let records = store
            .query_by_category(&Category::Medical, Some(2025))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);

        // ids keep counting from the persisted counter
        assert_eq!(store.insert(entry(3, 30.0)).await.unwrap(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_open_snapshot_with_invalid_month_fails() {
        let path = temp_path("waste_ledger_test_bad_month.json");
        fs::write(
            &path,
            r#"{"next_id":2,"records":[{"id":1,"period":{"year":2025,"month":0},"category":"medical","quantity":10.0,"derived_emission":25.0}]}"#,
        )
        .unwrap();

        let err = FileLedger::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_failed_insert_is_rolled_back() {
        let dir = temp_path("waste_ledger_test_insert_rollback");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("ledger.json");

        let store = FileLedger::open(&path).await.unwrap();
        store.insert(entry(1, 10.0)).await.unwrap();

        // a directory where the temp file goes makes the write fail
        fs::create_dir_all(path.with_extension("tmp")).unwrap();
        let err = store.insert(entry(2, 20.0)).await.unwrap_err();
        assert!(matches!(err, StoreError::Persist { .. }));

        assert_eq!(store.len().await.unwrap(), 1);
        let records = store
            .query_by_category(&Category::Medical, Some(2025))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entry.quantity(), 10.0);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_open_corrupt_snapshot_fails() {
        let path = temp_path("waste_ledger_test_corrupt.json");
        fs::write(&path, "not a snapshot").unwrap();

        let err = FileLedger::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));

        fs::remove_file(&path).unwrap();
    }
}
