use std::io::{self, Read, Write};
use std::str::FromStr;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Terminator, WriterBuilder};
use rust_decimal::Decimal;

use crate::errors::RowError;
use crate::model::{
    round_price, PriceRecord, DATE_FORMAT, EXPORT_HEADER, IMPORT_FIELD_COUNT, PRICE_LIMIT,
};

/// Lazily turns an import payload into records.
///
/// The first row is a header and is dropped without inspection. Rows are
/// only read as the iterator is advanced, so a caller that stops at the
/// first error never touches the rest of the payload.
pub struct RecordReader<R: Read> {
    rows: StringRecordsIntoIter<R>,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R) -> Result<Self, RowError> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        if csv_reader.headers()?.is_empty() {
            return Err(RowError::MissingHeader);
        }

        Ok(Self {
            rows: csv_reader.into_records(),
        })
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<PriceRecord, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(err) => return Some(Err(err.into())),
        };
        Some(parse_row(&row))
    }
}

/// Validates one data row in import column order.
pub fn parse_row(row: &StringRecord) -> Result<PriceRecord, RowError> {
    let line = row.position().map(|pos| pos.line()).unwrap_or_default();

    if row.len() != IMPORT_FIELD_COUNT {
        return Err(RowError::MalformedRow {
            line,
            expected: IMPORT_FIELD_COUNT,
            actual: row.len(),
        });
    }

    let id = row[0].parse::<i64>().map_err(|_| RowError::InvalidId {
        line,
        value: row[0].to_string(),
    })?;
    let product_name = required_text(&row[1], "product_name", line)?;
    let category = required_text(&row[2], "category", line)?;
    let price = parse_price(&row[3], line)?;
    let created_at = parse_date(&row[4], line)?;

    Ok(PriceRecord {
        id,
        product_name,
        category,
        price,
        created_at,
    })
}

fn required_text(value: &str, field: &'static str, line: u64) -> Result<String, RowError> {
    if value.is_empty() {
        return Err(RowError::EmptyField { line, field });
    }
    Ok(value.to_string())
}

fn parse_price(value: &str, line: u64) -> Result<Decimal, RowError> {
    let invalid = || RowError::InvalidPrice {
        line,
        value: value.to_string(),
    };

    // rust_decimal accepts `_` digit separators; plain numerals only.
    if value.contains('_') {
        return Err(invalid());
    }
    let price = Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| invalid())?;

    if price < Decimal::ZERO {
        return Err(RowError::NegativePrice {
            line,
            value: value.to_string(),
        });
    }
    if round_price(price) >= PRICE_LIMIT {
        return Err(invalid());
    }
    Ok(price)
}

fn parse_date(value: &str, line: u64) -> Result<NaiveDate, RowError> {
    let invalid = || RowError::InvalidDate {
        line,
        value: value.to_string(),
    };

    // chrono tolerates unpadded fields; the literal must be exactly YYYY-MM-DD.
    if !is_calendar_literal(value) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())
}

fn is_calendar_literal(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(idx, byte)| match idx {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}

/// Writes records in export column order behind a fixed header row.
pub struct ExportWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl<W: Write> ExportWriter<W> {
    pub fn new(writer: W) -> Result<Self, csv::Error> {
        let mut inner = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(writer);
        inner.write_record(EXPORT_HEADER)?;
        Ok(Self { inner })
    }

    pub fn write(&mut self, record: &PriceRecord) -> Result<(), csv::Error> {
        self.inner.write_record(record.export_fields())
    }

    /// Flushes buffered rows and hands back the underlying writer.
    pub fn finish(mut self) -> Result<W, csv::Error> {
        self.inner.flush()?;
        self.inner
            .into_inner()
            .map_err(|err| csv::Error::from(io::Error::other(err.to_string())))
    }
}
