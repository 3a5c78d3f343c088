pub mod archive;
pub mod errors;
pub mod model;
mod records;

pub use archive::{extract, package, package_to_vec, TextEntry, DEFAULT_ENTRY_NAME, TEXT_EXTENSION};
pub use errors::{ArchiveError, RowError};
pub use model::{
    format_price, round_price, ImportBatch, PriceRecord, DATE_FORMAT, EXPORT_HEADER,
    IMPORT_FIELD_COUNT, PRICE_LIMIT, PRICE_SCALE,
};
pub use records::{parse_row, ExportWriter, RecordReader};

#[cfg(test)]
mod tests;
