//! Error types callers need to tell apart.
//!
//! Everything else in the pipeline travels as `anyhow::Error`.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by a [`LedgerStore`](crate::ledger::LedgerStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open ledger store at {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ledger snapshot at {} is corrupt", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode ledger snapshot")]
    Encode(#[from] serde_json::Error),
    #[error("failed to persist ledger store to {}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures that stop a CSV import before the store is touched.
#[derive(Debug, PartialEq, Error)]
pub enum ImportError {
    #[error("CSV has {found} line(s), expected at least a title and a header")]
    TooShort { found: usize },
    #[error("CSV header has no category columns")]
    NoCategories,
    #[error("CSV source returned HTTP {0}")]
    HttpStatus(reqwest::StatusCode),
}
