use thiserror::Error;
use zip::result::ZipError;

/// Reasons a single row of the uploaded text payload is rejected.
///
/// `line` is the 1-based line of the offending row in the text payload.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("payload is empty; expected a header row")]
    MissingHeader,

    #[error("line {line}: invalid record length {actual}, expected {expected}")]
    MalformedRow {
        line: u64,
        expected: usize,
        actual: usize,
    },

    #[error("line {line}: invalid id '{value}'")]
    InvalidId { line: u64, value: String },

    #[error("line {line}: {field} must not be empty")]
    EmptyField { line: u64, field: &'static str },

    #[error("line {line}: invalid price '{value}'")]
    InvalidPrice { line: u64, value: String },

    #[error("line {line}: price '{value}' is negative")]
    NegativePrice { line: u64, value: String },

    #[error("line {line}: invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { line: u64, value: String },

    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },
}

impl RowError {
    pub fn line(&self) -> Option<u64> {
        match self {
            RowError::MalformedRow { line, .. }
            | RowError::InvalidId { line, .. }
            | RowError::EmptyField { line, .. }
            | RowError::InvalidPrice { line, .. }
            | RowError::NegativePrice { line, .. }
            | RowError::InvalidDate { line, .. } => Some(*line),
            RowError::MissingHeader => None,
            RowError::Csv { source } => source.position().map(|pos| pos.line()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive is corrupt or unreadable: {0}")]
    Corrupt(#[source] ZipError),

    #[error("no {extension} file found in archive")]
    NoTextEntry { extension: &'static str },

    #[error("archive entry '{name}' is not valid UTF-8")]
    InvalidEncoding { name: String },

    #[error("ZIP operation failed: {0}")]
    Zip(#[from] ZipError),

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),
}
