use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use waste_ledger::analyzers::Aggregator;
use waste_ledger::dashboard::{Dashboard, DashboardConfig};
use waste_ledger::factors::EmissionFactorTable;
use waste_ledger::fetch::HttpClient;
use waste_ledger::importer::{CsvSource, Importer};
use waste_ledger::ledger::{Category, FileLedger, LedgerStore, MemoryLedger};
use waste_ledger::output::write_report;
use waste_ledger::parser::parse_csv;

const FIXTURE: &str = include_str!("fixtures/waste.csv");

fn fixture_source() -> CsvSource {
    CsvSource::File(PathBuf::from(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/waste.csv"
    )))
}

/// Answers every request with the same status and body.
struct StaticClient {
    status: u16,
    body: &'static str,
}

#[async_trait]
impl HttpClient for StaticClient {
    async fn execute(&self, _req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let resp = http::Response::builder()
            .status(self.status)
            .body(self.body)
            .unwrap();
        Ok(reqwest::Response::from(resp))
    }
}

async fn import_fixture(store: &dyn LedgerStore, factors: &EmissionFactorTable) {
    let client = StaticClient {
        status: 200,
        body: FIXTURE,
    };
    Importer::new(&client, factors)
        .run(&fixture_source(), store)
        .await
        .expect("fixture import failed");
}

#[tokio::test]
async fn test_full_pipeline() {
    let factors = EmissionFactorTable::default();
    let store = MemoryLedger::new();
    import_fixture(&store, &factors).await;

    let aggregator = Aggregator::new(&store);
    let medical = aggregator
        .monthly_series(&Category::Medical, Some(2025))
        .await
        .unwrap();
    let designated = aggregator
        .monthly_series(&Category::Designated, Some(2025))
        .await
        .unwrap();
    let industrial = aggregator
        .monthly_series(&Category::IndustrialWastewater, Some(2025))
        .await
        .unwrap();

    assert_eq!(medical[0], 250.0);
    assert_eq!(designated[0], 90.0);
    assert_eq!(industrial[0], 100.0);

    // quoted thousands separator
    assert_eq!(medical[4], 2625.0);
    // "abc" cell produced no record, the rest of the row did
    assert_eq!(designated[2], 0.0);
    assert_eq!(medical[2], 275.0);
    assert_eq!(industrial[2], 100.0);

    let report = aggregator.export_report(2025).await.unwrap();
    assert_eq!(report.get(&Category::Medical).unwrap()[0], 250.0);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["year"], 2025);
    assert_eq!(json["medical"][0], 250.0);
}

#[tokio::test]
async fn test_stored_quantities_match_parsed_quantities() {
    let factors = EmissionFactorTable::default();
    let parsed = parse_csv(FIXTURE, &factors).unwrap();

    let store = MemoryLedger::new();
    import_fixture(&store, &factors).await;

    let mut parsed_totals: BTreeMap<String, f64> = BTreeMap::new();
    for entry in &parsed.entries {
        *parsed_totals.entry(entry.category().key().to_string()).or_default() += entry.quantity();
    }

    for category in &parsed.categories {
        let stored: f64 = store
            .query_by_category(category, None)
            .await
            .unwrap()
            .iter()
            .map(|r| r.entry.quantity())
            .sum();
        assert_eq!(stored, parsed_totals[category.key()]);
    }

    assert_eq!(parsed_totals["medical"], 2275.0);
    assert_eq!(parsed_totals["designated"], 550.0);
}

#[tokio::test]
async fn test_every_record_carries_its_emission() {
    let factors = EmissionFactorTable::default();
    let store = MemoryLedger::new();
    import_fixture(&store, &factors).await;

    for record in store.all().await.unwrap() {
        let entry = &record.entry;
        assert_eq!(
            entry.derived_emission(),
            entry.quantity() * factors.factor(entry.category())
        );
    }
}

#[tokio::test]
async fn test_reimport_is_idempotent() {
    let factors = EmissionFactorTable::default();
    let store = MemoryLedger::new();

    import_fixture(&store, &factors).await;
    let first: Vec<_> = store.all().await.unwrap().into_iter().map(|r| r.entry).collect();

    import_fixture(&store, &factors).await;
    let second: Vec<_> = store.all().await.unwrap().into_iter().map(|r| r.entry).collect();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_http_404_leaves_zeroed_charts() {
    let client = StaticClient {
        status: 404,
        body: "Not Found",
    };
    let config = DashboardConfig {
        source: CsvSource::parse("http://localhost/backend/data/waste.csv"),
        store_path: None,
        factors: EmissionFactorTable::default(),
        year: 2025,
    };

    let dashboard = Dashboard::initialize(config, &client)
        .await
        .expect("initialization must survive a failed import");

    let board = dashboard.board();
    for category in Category::TRACKED {
        let series = board.get(&category).unwrap();
        assert_eq!(series.values().len(), 12);
        assert!(series.is_zero());
    }
    assert_eq!(board.summary.total_waste, 0.0);
}

#[tokio::test]
async fn test_file_store_and_report() {
    let dir = std::env::temp_dir().join("waste_ledger_integration");
    let _ = std::fs::remove_dir_all(&dir);
    let store_path = dir.join("ledger.json");

    let factors = EmissionFactorTable::default();
    {
        let store = FileLedger::open(&store_path).await.unwrap();
        import_fixture(&store, &factors).await;
    }

    let store: Arc<dyn LedgerStore> = Arc::new(FileLedger::open(&store_path).await.unwrap());
    assert_eq!(store.len().await.unwrap(), 35);

    let report = Aggregator::new(store.as_ref()).export_report(2025).await.unwrap();
    let path = write_report(&report, &dir, false).unwrap();
    assert!(path.ends_with("waste-report-2025.json"));

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["medical"][0], 250.0);

    std::fs::remove_dir_all(&dir).unwrap();
}
