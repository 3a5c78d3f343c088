use rust_decimal::Decimal;
use serde::Serialize;

/// Store-wide aggregates taken after an import commits.
///
/// These describe everything in the store, not only the rows that the
/// import added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportStatistics {
    pub total_items: i64,
    pub total_categories: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}
