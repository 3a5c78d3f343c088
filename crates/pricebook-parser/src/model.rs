use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::RowError;

/// Number of fields every imported row must carry:
/// `id, product_name, category, price, created_at`.
pub const IMPORT_FIELD_COUNT: usize = 5;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Export column order. Note this differs from the import order.
pub const EXPORT_HEADER: [&str; 5] = ["id", "created_at", "product_name", "category", "price"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRecord {
    pub id: i64,
    pub product_name: String,
    pub category: String,
    pub price: Decimal,
    pub created_at: NaiveDate,
}

impl PriceRecord {
    /// Row in [`EXPORT_HEADER`] order.
    pub fn export_fields(&self) -> [String; 5] {
        [
            self.id.to_string(),
            self.created_at.format(DATE_FORMAT).to_string(),
            self.product_name.clone(),
            self.category.clone(),
            format_price(&self.price),
        ]
    }
}

/// Decimal places kept by the store (`NUMERIC(14,2)`).
pub const PRICE_SCALE: u32 = 2;

/// Exclusive upper bound of a stored price: twelve integer digits.
pub const PRICE_LIMIT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Rounds to the stored scale, half away from zero.
pub fn round_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Fixed two-decimal rendering used on output.
pub fn format_price(price: &Decimal) -> String {
    let rounded = round_price(*price);
    format!("{rounded:.2}")
}

/// Records parsed from one archive, in payload order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportBatch {
    records: Vec<PriceRecord>,
}

impl ImportBatch {
    pub fn new(records: Vec<PriceRecord>) -> Self {
        Self { records }
    }

    /// Drains parsed rows, stopping at the first rejected row.
    pub fn from_rows<I>(rows: I) -> Result<Self, RowError>
    where
        I: IntoIterator<Item = Result<PriceRecord, RowError>>,
    {
        let records = rows.into_iter().collect::<Result<Vec<_>, _>>()?;
        Ok(Self { records })
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PriceRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a ImportBatch {
    type Item = &'a PriceRecord;
    type IntoIter = std::slice::Iter<'a, PriceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
