use async_trait::async_trait;
use pricebook_parser::{ImportBatch, PriceRecord};
use sqlx::Row;
use tracing::info;

use super::{PriceRepository, RepositoryError};
use crate::db::DbPool;
use crate::types::ImportStatistics;

const INSERT_PRICE: &str = r#"
    INSERT INTO prices (id, product_name, category, price, created_at)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (id) DO NOTHING
"#;

const SELECT_STATISTICS: &str = r#"
    SELECT
        COUNT(*) AS total_items,
        COUNT(DISTINCT category) AS total_categories,
        COALESCE(SUM(price), 0) AS total_price
    FROM prices
"#;

const SELECT_ALL: &str = r#"
    SELECT id, created_at, product_name, category, price
    FROM prices
    ORDER BY id ASC
"#;

#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: DbPool,
}

impl PostgresRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl PriceRepository for PostgresRepository {
    async fn import_batch(&self, batch: &ImportBatch) -> Result<ImportStatistics, RepositoryError> {
        // Dropping `tx` without committing rolls every insert back.
        let mut tx = self.pool.begin().await?;

        let mut inserted = 0u64;
        for record in batch {
            let result = sqlx::query(INSERT_PRICE)
                .bind(record.id)
                .bind(&record.product_name)
                .bind(&record.category)
                .bind(record.price)
                .bind(record.created_at)
                .execute(&mut *tx)
                .await?;
            inserted += result.rows_affected();
        }

        let row = sqlx::query(SELECT_STATISTICS).fetch_one(&mut *tx).await?;
        let statistics = ImportStatistics {
            total_items: row.try_get("total_items")?,
            total_categories: row.try_get("total_categories")?,
            total_price: row.try_get("total_price")?,
        };

        tx.commit().await?;

        info!(
            batch_size = batch.len(),
            inserted,
            skipped = batch.len() as u64 - inserted,
            total_items = statistics.total_items,
            "price import committed"
        );
        Ok(statistics)
    }

    async fn export_all(&self) -> Result<Vec<PriceRecord>, RepositoryError> {
        let rows = sqlx::query(SELECT_ALL).fetch_all(&self.pool).await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(PriceRecord {
                id: row.try_get("id")?,
                product_name: row.try_get("product_name")?,
                category: row.try_get("category")?,
                price: row.try_get("price")?,
                created_at: row.try_get("created_at")?,
            });
        }

        Ok(records)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
