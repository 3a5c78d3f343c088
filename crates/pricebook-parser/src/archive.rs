use std::io::{self, Cursor, Read, Seek, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::errors::ArchiveError;

/// Entry names ending in this suffix are treated as the text payload.
pub const TEXT_EXTENSION: &str = ".csv";

pub const DEFAULT_ENTRY_NAME: &str = "data.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
    pub name: String,
    pub text: String,
}

/// Returns the first file entry, in stored order, whose name ends in
/// [`TEXT_EXTENSION`].
pub fn extract<R: Read + Seek>(reader: R) -> Result<TextEntry, ArchiveError> {
    let mut archive = ZipArchive::new(reader).map_err(ArchiveError::Corrupt)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(ArchiveError::Corrupt)?;
        if entry.is_dir() || !entry.name().ends_with(TEXT_EXTENSION) {
            continue;
        }

        let name = entry.name().to_string();
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        let text =
            String::from_utf8(bytes).map_err(|_| ArchiveError::InvalidEncoding { name: name.clone() })?;
        return Ok(TextEntry { name, text });
    }

    Err(ArchiveError::NoTextEntry {
        extension: TEXT_EXTENSION,
    })
}

/// Writes a single-entry archive holding `payload` under `entry_name`.
///
/// Timestamps and permissions are pinned so identical payloads yield
/// identical archives.
pub fn package<W, R>(writer: W, entry_name: &str, mut payload: R) -> Result<W, ArchiveError>
where
    W: Write + Seek,
    R: Read,
{
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    zip.start_file(entry_name, options)?;
    io::copy(&mut payload, &mut zip)?;
    Ok(zip.finish()?)
}

pub fn package_to_vec(entry_name: &str, payload: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    let cursor = package(Cursor::new(Vec::new()), entry_name, payload)?;
    Ok(cursor.into_inner())
}
