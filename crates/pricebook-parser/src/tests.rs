use std::fs;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::errors::{ArchiveError, RowError};
use crate::model::{format_price, ImportBatch, PriceRecord, PRICE_LIMIT};
use crate::{extract, package_to_vec, ExportWriter, RecordReader, DEFAULT_ENTRY_NAME};

fn fixture(path: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

fn parse_batch(content: &str) -> Result<ImportBatch, RowError> {
    let reader = RecordReader::new(content.as_bytes())?;
    ImportBatch::from_rows(reader)
}

fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid test date")
}

fn decimal(value: &str) -> Decimal {
    Decimal::from_str(value).expect("valid test decimal")
}

fn zip_with_entries(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        zip.start_file(*name, FileOptions::default())
            .expect("start entry");
        zip.write_all(contents).expect("write entry");
    }
    zip.finish().expect("finish zip").into_inner()
}

#[test]
fn parses_valid_fixture() {
    let batch = parse_batch(&fixture("prices_valid.csv")).expect("valid fixture parse failed");

    assert_eq!(batch.len(), 2);
    assert_eq!(
        batch.records()[0],
        PriceRecord {
            id: 1,
            product_name: "Widget".into(),
            category: "Tools".into(),
            price: decimal("9.5"),
            created_at: date("2024-01-01"),
        }
    );
    assert_eq!(batch.records()[1].id, 2);
    assert_eq!(batch.records()[1].price, decimal("19.99"));
}

#[test]
fn parses_quoted_fields_crlf_and_scientific_prices() {
    let batch = parse_batch(&fixture("prices_quoted_crlf.csv")).expect("crlf fixture parse failed");

    assert_eq!(batch.len(), 3);
    assert_eq!(batch.records()[0].product_name, "Chair, oak");
    assert_eq!(batch.records()[1].price, Decimal::from(100));
    assert_eq!(batch.records()[2].price, Decimal::ZERO);
    assert_eq!(batch.records()[2].created_at, date("2023-12-02"));
}

#[test]
fn short_row_aborts_the_batch() {
    let err = parse_batch(&fixture("prices_short_row.csv")).expect_err("short row must fail");

    match err {
        RowError::MalformedRow {
            line,
            expected,
            actual,
        } => {
            assert_eq!(line, 3);
            assert_eq!(expected, 5);
            assert_eq!(actual, 4);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn reader_yields_rows_lazily_up_to_the_bad_row() {
    let content = fixture("prices_short_row.csv");
    let mut reader = RecordReader::new(content.as_bytes()).expect("header");

    assert!(matches!(reader.next(), Some(Ok(ref record)) if record.id == 1));
    assert!(matches!(reader.next(), Some(Err(RowError::MalformedRow { .. }))));
    assert!(matches!(reader.next(), Some(Ok(ref record)) if record.id == 3));
    assert!(reader.next().is_none());
}

#[test]
fn extra_field_is_malformed() {
    let content = "id,product_name,category,price,created_at\n1,Widget,Tools,9.5,2024-01-01,extra\n";
    let err = parse_batch(content).expect_err("six fields must fail");
    assert!(matches!(
        err,
        RowError::MalformedRow {
            line: 2,
            expected: 5,
            actual: 6
        }
    ));
}

#[test]
fn header_is_not_validated() {
    let content = "whatever,goes\n7,Bolt,Hardware,0.10,2022-02-28\n";
    let batch = parse_batch(content).expect("header contents are ignored");
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.records()[0].id, 7);
}

#[test]
fn header_only_payload_is_an_empty_batch() {
    let batch = parse_batch("id,product_name,category,price,created_at\n").expect("header only");
    assert!(batch.is_empty());
}

#[test]
fn empty_payload_is_missing_header() {
    assert!(matches!(
        RecordReader::new("".as_bytes()),
        Err(RowError::MissingHeader)
    ));
}

#[test]
fn rejects_non_integer_id() {
    let content = "h\nabc,Widget,Tools,9.5,2024-01-01\n";
    let err = parse_batch(content).expect_err("bad id");
    assert!(matches!(err, RowError::InvalidId { line: 2, ref value } if value == "abc"));

    let content = "h\n1.5,Widget,Tools,9.5,2024-01-01\n";
    assert!(matches!(
        parse_batch(content),
        Err(RowError::InvalidId { .. })
    ));
}

#[test]
fn rejects_bad_prices() {
    for value in ["cheap", "", "NaN", "inf", "9.5.1", "1_000"] {
        let content = format!("h\n1,Widget,Tools,{value},2024-01-01\n");
        assert!(
            matches!(parse_batch(&content), Err(RowError::InvalidPrice { .. })),
            "price {value:?} should be rejected"
        );
    }
}

#[test]
fn rejects_prices_beyond_twelve_integer_digits() {
    for value in [
        "1000000000000",
        "999999999999.995",
        "1e12",
        "79228162514264337593543950335",
    ] {
        let content = format!("h\n1,Widget,Tools,{value},2024-01-01\n");
        assert!(
            matches!(parse_batch(&content), Err(RowError::InvalidPrice { line: 2, .. })),
            "price {value:?} should be rejected"
        );
    }

    let batch = parse_batch("h\n1,Widget,Tools,999999999999.99,2024-01-01\n").expect("largest price");
    assert_eq!(batch.records()[0].price, decimal("999999999999.99"));
    assert_eq!(PRICE_LIMIT, Decimal::from(1_000_000_000_000_i64));
}

#[test]
fn rejects_negative_price() {
    let content = "h\n1,Widget,Tools,-0.01,2024-01-01\n";
    let err = parse_batch(content).expect_err("negative price");
    assert!(matches!(err, RowError::NegativePrice { line: 2, .. }));
    assert_eq!(err.line(), Some(2));
}

#[test]
fn rejects_dates_outside_the_fixed_format() {
    for value in ["2024/01/01", "2024-1-01", "24-01-01", "2024-02-30", "2024-01-01T00:00:00"] {
        let content = format!("h\n1,Widget,Tools,9.5,{value}\n");
        assert!(
            matches!(parse_batch(&content), Err(RowError::InvalidDate { .. })),
            "date {value:?} should be rejected"
        );
    }
}

#[test]
fn rejects_empty_text_fields() {
    let content = "h\n1,,Tools,9.5,2024-01-01\n";
    assert!(matches!(
        parse_batch(content),
        Err(RowError::EmptyField {
            field: "product_name",
            ..
        })
    ));

    let content = "h\n1,Widget,,9.5,2024-01-01\n";
    assert!(matches!(
        parse_batch(content),
        Err(RowError::EmptyField {
            field: "category",
            ..
        })
    ));
}

#[test]
fn formats_prices_with_two_decimals() {
    assert_eq!(format_price(&decimal("9.5")), "9.50");
    assert_eq!(format_price(&decimal("19.99")), "19.99");
    assert_eq!(format_price(&Decimal::ZERO), "0.00");
    assert_eq!(format_price(&decimal("1.005")), "1.01");
    assert_eq!(format_price(&Decimal::from(100)), "100.00");
}

#[test]
fn export_writer_uses_export_column_order() {
    let records = [
        PriceRecord {
            id: 1,
            product_name: "Widget".into(),
            category: "Tools".into(),
            price: decimal("9.5"),
            created_at: date("2024-01-01"),
        },
        PriceRecord {
            id: 2,
            product_name: "Gadget".into(),
            category: "Tools".into(),
            price: decimal("19.99"),
            created_at: date("2024-01-02"),
        },
    ];

    let mut writer = ExportWriter::new(Vec::new()).expect("header");
    for record in &records {
        writer.write(record).expect("row");
    }
    let bytes = writer.finish().expect("finish");

    assert_eq!(
        String::from_utf8(bytes).expect("utf8"),
        "id,created_at,product_name,category,price\n1,2024-01-01,Widget,Tools,9.50\n2,2024-01-02,Gadget,Tools,19.99\n"
    );
}

#[test]
fn archive_round_trip_preserves_payload() {
    let payload = fixture("prices_valid.csv");
    let archive = package_to_vec(DEFAULT_ENTRY_NAME, payload.as_bytes()).expect("package");
    let entry = extract(Cursor::new(archive)).expect("extract");

    assert_eq!(entry.name, "data.csv");
    assert_eq!(entry.text, payload);
}

#[test]
fn packaging_is_deterministic() {
    let payload = fixture("prices_valid.csv");
    let first = package_to_vec(DEFAULT_ENTRY_NAME, payload.as_bytes()).expect("first");
    let second = package_to_vec(DEFAULT_ENTRY_NAME, payload.as_bytes()).expect("second");
    assert_eq!(first, second);
}

#[test]
fn first_csv_entry_in_stored_order_wins() {
    let archive = zip_with_entries(&[
        ("README.txt", b"not data"),
        ("z_first.csv", b"h\n1,A,B,1,2024-01-01\n"),
        ("a_second.csv", b"h\n2,A,B,1,2024-01-01\n"),
    ]);
    let entry = extract(Cursor::new(archive)).expect("extract");
    assert_eq!(entry.name, "z_first.csv");
}

#[test]
fn archive_without_csv_entry_is_rejected() {
    let archive = zip_with_entries(&[("data.txt", b"id\n"), ("DATA.CSV", b"id\n")]);
    let err = extract(Cursor::new(archive)).expect_err("no csv entry");
    assert!(matches!(err, ArchiveError::NoTextEntry { extension: ".csv" }));
}

#[test]
fn garbage_bytes_are_a_corrupt_archive() {
    let err = extract(Cursor::new(b"definitely not a zip".to_vec())).expect_err("corrupt");
    assert!(matches!(err, ArchiveError::Corrupt(_)));
}

#[test]
fn non_utf8_entry_is_rejected() {
    let archive = zip_with_entries(&[("data.csv", &[0xff, 0xfe, 0x00, 0x41])]);
    let err = extract(Cursor::new(archive)).expect_err("invalid utf8");
    assert!(matches!(err, ArchiveError::InvalidEncoding { ref name } if name == "data.csv"));
}
