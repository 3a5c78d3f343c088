use std::io::{Read, Seek, SeekFrom};

use pricebook_parser::{package, ExportWriter, PriceRecord, DEFAULT_ENTRY_NAME};
use tokio::task;
use tracing::{info, instrument};

use crate::error::{PipelineError, Result};
use crate::repository::PriceRepository;
use crate::scratch::Scratch;

/// File name offered to clients downloading an export.
pub const EXPORT_ARCHIVE_NAME: &str = "data.zip";

/// Download path: every stored record, ordered by id, serialized as
/// `data.csv` inside a single-entry zip archive.
#[instrument(skip_all)]
pub async fn export_archive<R>(repo: &R) -> Result<Vec<u8>>
where
    R: PriceRepository + ?Sized,
{
    let records = repo.export_all().await?;
    let record_count = records.len();

    let archive = task::spawn_blocking(move || materialize(&records)).await??;
    info!(
        records = record_count,
        archive_bytes = archive.len(),
        "export archive built"
    );
    Ok(archive)
}

fn materialize(records: &[PriceRecord]) -> Result<Vec<u8>> {
    let scratch = Scratch::new("pricebook-export-").map_err(PipelineError::Resource)?;

    let csv_file = scratch
        .create(DEFAULT_ENTRY_NAME)
        .map_err(PipelineError::Resource)?;
    let mut writer = ExportWriter::new(csv_file)?;
    for record in records {
        writer.write(record)?;
    }
    let mut csv_file = writer.finish()?;
    csv_file
        .seek(SeekFrom::Start(0))
        .map_err(PipelineError::Resource)?;

    let zip_file = scratch
        .create(EXPORT_ARCHIVE_NAME)
        .map_err(PipelineError::Resource)?;
    let mut zip_file =
        package(zip_file, DEFAULT_ENTRY_NAME, csv_file).map_err(PipelineError::Packaging)?;

    let mut bytes = Vec::new();
    zip_file
        .seek(SeekFrom::Start(0))
        .map_err(PipelineError::Resource)?;
    zip_file
        .read_to_end(&mut bytes)
        .map_err(PipelineError::Resource)?;

    Ok(bytes)
}
