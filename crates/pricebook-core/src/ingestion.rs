use std::io::{Seek, SeekFrom, Write};

use pricebook_parser::{extract, ImportBatch, RecordReader};
use tokio::task;
use tracing::{debug, info, instrument, Span};

use crate::error::{PipelineError, Result};
use crate::repository::PriceRepository;
use crate::scratch::Scratch;
use crate::types::ImportStatistics;

const UPLOAD_FILE_NAME: &str = "upload.zip";

/// Upload path: extract the text payload from `archive`, validate every
/// row, and persist the batch in one transaction.
///
/// Nothing reaches the store unless the whole payload parses.
#[instrument(skip_all, fields(archive_bytes = archive.len(), fingerprint = tracing::field::Empty))]
pub async fn import_archive<R>(repo: &R, archive: Vec<u8>) -> Result<ImportStatistics>
where
    R: PriceRepository + ?Sized,
{
    let fingerprint = blake3::hash(&archive).to_hex();
    Span::current().record("fingerprint", fingerprint.as_str());

    let batch = task::spawn_blocking(move || parse_archive(&archive)).await??;
    info!(records = batch.len(), "archive validated");

    let statistics = repo.import_batch(&batch).await?;
    info!(
        total_items = statistics.total_items,
        total_categories = statistics.total_categories,
        total_price = %statistics.total_price,
        "import finished"
    );
    Ok(statistics)
}

fn parse_archive(archive: &[u8]) -> Result<ImportBatch> {
    let scratch = Scratch::new("pricebook-upload-").map_err(PipelineError::Resource)?;

    let mut staged = scratch
        .create(UPLOAD_FILE_NAME)
        .map_err(PipelineError::Resource)?;
    staged.write_all(archive).map_err(PipelineError::Resource)?;
    staged
        .seek(SeekFrom::Start(0))
        .map_err(PipelineError::Resource)?;

    let entry = extract(staged).map_err(PipelineError::Archive)?;
    debug!(entry = %entry.name, bytes = entry.text.len(), "extracted text payload");

    let rows = RecordReader::new(entry.text.as_bytes())?;
    Ok(ImportBatch::from_rows(rows)?)
}
