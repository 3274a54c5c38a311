//! CSV import into a [`LedgerStore`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::factors::EmissionFactorTable;
use crate::fetch::{HttpClient, fetch_text};
use crate::ledger::{Category, LedgerStore};
use crate::parser::parse_csv;

/// Where the ledger CSV comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum CsvSource {
    Http(String),
    File(PathBuf),
}

impl CsvSource {
    /// Treats anything starting with `http` as a URL, everything else as a path.
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http") {
            CsvSource::Http(source.to_string())
        } else {
            CsvSource::File(PathBuf::from(source))
        }
    }

    /// Loads the CSV text.
    pub async fn load<C: HttpClient + ?Sized>(&self, client: &C) -> Result<String> {
        match self {
            CsvSource::Http(url) => fetch_text(client, url).await,
            CsvSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read CSV file '{}'", path.display())),
        }
    }
}

impl fmt::Display for CsvSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsvSource::Http(url) => f.write_str(url),
            CsvSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Outcome of a successful import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub records: usize,
    pub categories: Vec<Category>,
    /// Total imported quantity per category key, in kilograms.
    pub quantities: BTreeMap<String, f64>,
    pub skipped_rows: usize,
    pub skipped_cells: usize,
}

/// Replaces a store's contents with the records of a ledger CSV.
pub struct Importer<'a, C: ?Sized> {
    client: &'a C,
    factors: &'a EmissionFactorTable,
}

impl<'a, C: HttpClient + ?Sized> Importer<'a, C> {
    pub fn new(client: &'a C, factors: &'a EmissionFactorTable) -> Self {
        Self { client, factors }
    }

    /// Fetches and parses `source`, then swaps it into `store` in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Fetch and parse failures return before the store is touched, leaving
    /// its previous contents in place.
    #[tracing::instrument(skip_all, fields(source = %source))]
    pub async fn run(&self, source: &CsvSource, store: &dyn LedgerStore) -> Result<ImportSummary> {
        let text = source.load(self.client).await?;
        let parsed = parse_csv(&text, self.factors)
            .with_context(|| format!("failed to parse ledger CSV from {source}"))?;

        let mut quantities = BTreeMap::new();
        for entry in &parsed.entries {
            *quantities
                .entry(entry.category().key().to_string())
                .or_insert(0.0) += entry.quantity();
        }

        let ids = store
            .replace_all(parsed.entries)
            .await
            .context("failed to store imported records")?;

        let summary = ImportSummary {
            records: ids.len(),
            categories: parsed.categories,
            quantities,
            skipped_rows: parsed.skipped_rows,
            skipped_cells: parsed.skipped_cells,
        };

        info!(
            records = summary.records,
            skipped_rows = summary.skipped_rows,
            skipped_cells = summary.skipped_cells,
            "CSV import complete"
        );

        Ok(summary)
    }
}
