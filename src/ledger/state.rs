use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::types::{Category, LedgerRecord, Period, RecordId, WasteEntry};

/// Records plus the secondary indexes over them.
///
/// Ids keep counting up across `clear`, so an id is never handed out twice.
#[derive(Debug, Clone)]
pub(crate) struct LedgerState {
    next_id: RecordId,
    records: BTreeMap<RecordId, WasteEntry>,
    by_category: HashMap<Category, BTreeSet<RecordId>>,
    by_category_period: BTreeMap<(Category, Period), BTreeSet<RecordId>>,
}

/// On-disk form of a [`LedgerState`]. Indexes are rebuilt on load.
///
/// Deserializing checks every record: ids are unique, quantities and
/// emissions are finite and non-negative, and all records of a category
/// share one positive emission factor.
#[derive(Debug, Serialize, Deserialize)]
#[serde(try_from = "SnapshotFields")]
pub(crate) struct Snapshot {
    next_id: RecordId,
    records: Vec<LedgerRecord>,
}

#[derive(Deserialize)]
struct SnapshotFields {
    next_id: RecordId,
    records: Vec<LedgerRecord>,
}

/// Relative tolerance when comparing factors recovered from stored records.
const FACTOR_TOLERANCE: f64 = 1e-9;

impl TryFrom<SnapshotFields> for Snapshot {
    type Error = String;

    fn try_from(fields: SnapshotFields) -> Result<Self, Self::Error> {
        let mut ids = BTreeSet::new();
        let mut factors: HashMap<&Category, f64> = HashMap::new();

        for record in &fields.records {
            let id = record.id;
            if !ids.insert(id) {
                return Err(format!("record id {id} appears more than once"));
            }

            let quantity = record.entry.quantity();
            let emission = record.entry.derived_emission();
            if !quantity.is_finite() || quantity < 0.0 {
                return Err(format!("record {id} has invalid quantity {quantity}"));
            }
            if !emission.is_finite() || emission < 0.0 {
                return Err(format!("record {id} has invalid emission {emission}"));
            }

            if quantity == 0.0 {
                if emission != 0.0 {
                    return Err(format!("record {id} has emission {emission} for zero waste"));
                }
                continue;
            }

            let factor = emission / quantity;
            if factor <= 0.0 {
                return Err(format!("record {id} has no emission for {quantity} kg"));
            }
            let category = record.entry.category();
            match factors.get(category) {
                Some(known) if (known - factor).abs() > known * FACTOR_TOLERANCE => {
                    return Err(format!(
                        "record {id} emission does not match the other {category} records"
                    ));
                }
                Some(_) => {}
                None => {
                    factors.insert(category, factor);
                }
            }
        }

        Ok(Snapshot {
            next_id: fields.next_id,
            records: fields.records,
        })
    }
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            next_id: 1,
            records: BTreeMap::new(),
            by_category: HashMap::new(),
            by_category_period: BTreeMap::new(),
        }
    }
}

impl LedgerState {
    pub(crate) fn clear(&mut self) {
        self.records.clear();
        self.by_category.clear();
        self.by_category_period.clear();
    }

    pub(crate) fn insert(&mut self, entry: WasteEntry) -> RecordId {
        let id = self.next_id;
        self.next_id += 1;
        self.index(id, &entry);
        self.records.insert(id, entry);
        id
    }

    /// Drops record `id` and its index entries. The id stays retired.
    pub(crate) fn remove(&mut self, id: RecordId) -> Option<WasteEntry> {
        let entry = self.records.remove(&id)?;
        let category = entry.category().clone();

        if let Some(ids) = self.by_category.get_mut(&category) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_category.remove(&category);
            }
        }
        let key = (category, entry.period());
        if let Some(ids) = self.by_category_period.get_mut(&key) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_category_period.remove(&key);
            }
        }
        Some(entry)
    }

    pub(crate) fn replace(&mut self, entries: Vec<WasteEntry>) -> Vec<RecordId> {
        self.clear();
        entries.into_iter().map(|e| self.insert(e)).collect()
    }

    pub(crate) fn query_by_category(
        &self,
        category: &Category,
        year: Option<i32>,
    ) -> Vec<LedgerRecord> {
        match year {
            Some(year) => {
                let (first, last) = Period::year_bounds(year);
                let range = (category.clone(), first)..=(category.clone(), last);
                self.by_category_period
                    .range(range)
                    .flat_map(|(_, ids)| ids.iter())
                    .filter_map(|id| self.record(*id))
                    .collect()
            }
            None => self
                .by_category
                .get(category)
                .into_iter()
                .flatten()
                .filter_map(|id| self.record(*id))
                .collect(),
        }
    }

    pub(crate) fn all(&self) -> Vec<LedgerRecord> {
        self.records
            .iter()
            .map(|(id, entry)| LedgerRecord {
                id: *id,
                entry: entry.clone(),
            })
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            next_id: self.next_id,
            records: self.all(),
        }
    }

    pub(crate) fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut state = Self::default();
        let highest = snapshot.records.iter().map(|r| r.id).max().unwrap_or(0);
        state.next_id = snapshot.next_id.max(highest + 1);

        for record in snapshot.records {
            state.index(record.id, &record.entry);
            state.records.insert(record.id, record.entry);
        }
        state
    }

    fn index(&mut self, id: RecordId, entry: &WasteEntry) {
        self.by_category
            .entry(entry.category().clone())
            .or_default()
            .insert(id);
        self.by_category_period
            .entry((entry.category().clone(), entry.period()))
            .or_default()
            .insert(id);
    }

    fn record(&self, id: RecordId) -> Option<LedgerRecord> {
        self.records.get(&id).map(|entry| LedgerRecord {
            id,
            entry: entry.clone(),
        })
    }
}
