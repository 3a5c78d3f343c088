use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use pricebook_parser::{round_price, ImportBatch, PriceRecord};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::{PriceRepository, RepositoryError};
use crate::types::ImportStatistics;

/// Process-local store with the same conflict and atomicity rules as the
/// Postgres repository. The lock is held for a whole import, which is the
/// unit of isolation here.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: BTreeMap<i64, PriceRecord>,
    closed: bool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = PriceRecord>) -> Self {
        let mut rows = BTreeMap::new();
        for record in records {
            rows.entry(record.id).or_insert_with(|| stored(&record));
        }
        Self {
            state: Mutex::new(MemoryState {
                rows,
                closed: false,
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Prices are kept at the scale the Postgres column stores them at.
fn stored(record: &PriceRecord) -> PriceRecord {
    PriceRecord {
        price: round_price(record.price),
        ..record.clone()
    }
}

fn statistics<'a>(
    rows: impl Iterator<Item = &'a PriceRecord>,
) -> Result<ImportStatistics, RepositoryError> {
    let mut total_items = 0_i64;
    let mut categories = BTreeSet::new();
    let mut total_price = Decimal::ZERO;

    for row in rows {
        total_items += 1;
        categories.insert(row.category.as_str());
        total_price = total_price
            .checked_add(row.price)
            .ok_or(RepositoryError::PriceOverflow)?;
    }

    Ok(ImportStatistics {
        total_items,
        total_categories: categories.len() as i64,
        total_price,
    })
}

#[async_trait]
impl PriceRepository for MemoryRepository {
    async fn import_batch(&self, batch: &ImportBatch) -> Result<ImportStatistics, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(RepositoryError::Closed);
        }

        let mut pending: BTreeMap<i64, PriceRecord> = BTreeMap::new();
        for record in batch {
            if !state.rows.contains_key(&record.id) {
                pending.entry(record.id).or_insert_with(|| stored(record));
            }
        }

        // Nothing is applied unless the resulting totals can be reported.
        let totals = statistics(state.rows.values().chain(pending.values()))?;
        state.rows.append(&mut pending);
        Ok(totals)
    }

    async fn export_all(&self) -> Result<Vec<PriceRecord>, RepositoryError> {
        let state = self.state.lock().await;
        if state.closed {
            return Err(RepositoryError::Closed);
        }
        Ok(state.rows.values().cloned().collect())
    }

    async fn close(&self) {
        self.state.lock().await.closed = true;
    }
}
