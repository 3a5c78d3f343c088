//! Storage capability for price records.

mod memory;
mod postgres;

use async_trait::async_trait;
use pricebook_parser::{ImportBatch, PriceRecord};
use thiserror::Error;

use crate::types::ImportStatistics;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("repository is closed")]
    Closed,

    #[error("price total exceeds the representable range")]
    PriceOverflow,
}

#[async_trait]
pub trait PriceRepository: Send + Sync {
    /// Inserts every record whose id is not yet stored, leaving existing
    /// rows untouched, then returns store-wide statistics. Either the whole
    /// batch becomes visible or none of it does.
    async fn import_batch(&self, batch: &ImportBatch) -> Result<ImportStatistics, RepositoryError>;

    /// Every stored record, ordered by id ascending.
    async fn export_all(&self) -> Result<Vec<PriceRecord>, RepositoryError>;

    async fn close(&self);
}
