//! Application context for the waste dashboard.
//!
//! A [`Dashboard`] is built once at start-up. It owns the ledger store and
//! the emission-factor table, runs the CSV import, and keeps the
//! [`ChartBoard`] handed to the rendering layer.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{error, info};

use crate::analyzers::{Aggregator, MonthlySeries, Summary, WasteReport};
use crate::error::StoreError;
use crate::factors::EmissionFactorTable;
use crate::fetch::HttpClient;
use crate::importer::{CsvSource, ImportSummary, Importer};
use crate::ledger::{Category, FileLedger, LedgerStore, MemoryLedger};

/// Start-up settings for a [`Dashboard`].
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub source: CsvSource,
    /// Snapshot file for the ledger; `None` keeps records in memory only.
    pub store_path: Option<PathBuf>,
    pub factors: EmissionFactorTable,
    pub year: i32,
}

/// What the charts display: a monthly series per tracked category plus the
/// two summary figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBoard {
    #[serde(flatten)]
    pub series: WasteReport,
    #[serde(flatten)]
    pub summary: Summary,
}

impl ChartBoard {
    /// All-zero charts, shown whenever the data cannot be trusted.
    pub fn zeroed(year: i32) -> Self {
        Self {
            series: WasteReport::zeroed(year),
            summary: Summary::default(),
        }
    }

    fn from_report(series: WasteReport) -> Self {
        let summary = series.summary();
        Self { series, summary }
    }

    pub fn year(&self) -> i32 {
        self.series.year
    }

    pub fn get(&self, category: &Category) -> Option<&MonthlySeries> {
        self.series.get(category)
    }
}

pub struct Dashboard {
    store: Arc<dyn LedgerStore>,
    factors: EmissionFactorTable,
    board: ChartBoard,
    last_import: Option<ImportSummary>,
}

impl Dashboard {
    /// Opens the store named in `config`, imports the CSV and fills the
    /// charts for `config.year`.
    ///
    /// # Errors
    ///
    /// Only a store that cannot be opened is fatal. A failed import is
    /// logged and leaves all-zero charts.
    pub async fn initialize<C: HttpClient + ?Sized>(
        config: DashboardConfig,
        client: &C,
    ) -> Result<Self> {
        let store: Arc<dyn LedgerStore> = match &config.store_path {
            Some(path) => Arc::new(
                FileLedger::open(path)
                    .await
                    .context("failed to open ledger store")?,
            ),
            None => Arc::new(MemoryLedger::new()),
        };

        Ok(Self::with_store(config, store, client).await)
    }

    /// Like [`Dashboard::initialize`], over an already open store.
    #[tracing::instrument(skip_all, fields(source = %config.source, year = config.year))]
    pub async fn with_store<C: HttpClient + ?Sized>(
        config: DashboardConfig,
        store: Arc<dyn LedgerStore>,
        client: &C,
    ) -> Self {
        let mut dashboard = Self {
            store,
            factors: config.factors,
            board: ChartBoard::zeroed(config.year),
            last_import: None,
        };

        let imported = Importer::new(client, &dashboard.factors)
            .run(&config.source, dashboard.store.as_ref())
            .await;

        match imported {
            Ok(summary) => {
                dashboard.last_import = Some(summary);
                if let Err(e) = dashboard.load_year(config.year).await {
                    error!(error = %e, "Failed to load chart data");
                    dashboard.reset_charts(config.year);
                }
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "CSV import failed, showing empty charts");
                dashboard.reset_charts(config.year);
            }
        }

        dashboard
    }

    /// Recomputes the charts for `year`.
    pub async fn load_year(&mut self, year: i32) -> Result<&ChartBoard, StoreError> {
        let report = Aggregator::new(self.store.as_ref())
            .export_report(year)
            .await?;
        self.board = ChartBoard::from_report(report);

        info!(
            year,
            total_waste = self.board.summary.total_waste,
            total_carbon = self.board.summary.total_carbon,
            "Charts updated"
        );
        Ok(&self.board)
    }

    pub fn reset_charts(&mut self, year: i32) {
        self.board = ChartBoard::zeroed(year);
    }

    pub async fn report(&self, year: i32) -> Result<WasteReport, StoreError> {
        Aggregator::new(self.store.as_ref()).export_report(year).await
    }

    pub fn board(&self) -> &ChartBoard {
        &self.board
    }

    pub fn store(&self) -> &dyn LedgerStore {
        self.store.as_ref()
    }

    /// Summary of the start-up import, if it succeeded.
    pub fn last_import(&self) -> Option<&ImportSummary> {
        self.last_import.as_ref()
    }
}
