//! Parser for monthly waste ledger CSVs.
//!
//! Layout: a title line (ignored), a header line (`period, category, ...`),
//! one data line per month, and a trailing totals line (ignored).

use anyhow::Result;
use tracing::debug;

use crate::error::ImportError;
use crate::factors::EmissionFactorTable;
use crate::ledger::{Category, Period, WasteEntry};

/// Entries parsed from one CSV, with counts of what was dropped.
#[derive(Debug, Default)]
pub struct ParsedLedger {
    pub categories: Vec<Category>,
    pub entries: Vec<WasteEntry>,
    pub skipped_rows: usize,
    pub skipped_cells: usize,
}

/// Parses ledger CSV text into entries with derived emissions.
///
/// The text is split on line breaks first and every line is read as its
/// own CSV record, so a stray quote cannot swallow the lines after it.
/// Malformed rows and cells are skipped, never fatal.
///
/// # Errors
///
/// Returns an error if the text has fewer than two non-blank lines or the
/// header has no category columns.
pub fn parse_csv(text: &str, factors: &EmissionFactorTable) -> Result<ParsedLedger> {
    let text = text.trim_start_matches('\u{feff}');
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All);

    let records: Vec<csv::StringRecord> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| read_line(&builder, line))
        .collect();

    if records.len() < 2 {
        return Err(ImportError::TooShort {
            found: records.len(),
        }
        .into());
    }

    // (column, category) for every non-empty header after the period column
    let columns: Vec<(usize, Category)> = records[1]
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, label)| !label.is_empty())
        .map(|(i, label)| (i, Category::from_label(label)))
        .collect();

    if columns.is_empty() {
        return Err(ImportError::NoCategories.into());
    }

    let mut parsed = ParsedLedger {
        categories: columns.iter().map(|(_, c)| c.clone()).collect(),
        ..Default::default()
    };

    let data_rows = records.get(2..records.len() - 1).unwrap_or(&[]);
    for row in data_rows {
        if row.len() < 2 {
            parsed.skipped_rows += 1;
            continue;
        }

        let Some(period) = Period::parse_label(&row[0]) else {
            debug!(label = &row[0], "Skipping row with unrecognized period");
            parsed.skipped_rows += 1;
            continue;
        };

        for (column, category) in &columns {
            match row.get(*column).and_then(parse_quantity) {
                Some(quantity) => parsed.entries.push(WasteEntry::new(
                    period,
                    category.clone(),
                    quantity,
                    factors,
                )),
                None => {
                    debug!(%period, %category, cell = ?row.get(*column), "Skipping cell");
                    parsed.skipped_cells += 1;
                }
            }
        }
    }

    Ok(parsed)
}

/// Reads one line as a CSV record, falling back to a plain comma split when
/// the reader rejects it.
fn read_line(builder: &csv::ReaderBuilder, line: &str) -> csv::StringRecord {
    match builder.from_reader(line.as_bytes()).records().next() {
        Some(Ok(record)) => record,
        _ => line.split(',').map(str::trim).collect(),
    }
}

/// Reads a quantity cell, ignoring quotes and thousands separators.
///
/// Only finite, non-negative values are accepted.
fn parse_quantity(cell: &str) -> Option<f64> {
    let cleaned: String = cell.chars().filter(|c| *c != '"' && *c != ',').collect();
    let value: f64 = cleaned.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}
