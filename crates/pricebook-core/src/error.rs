use pricebook_parser::{ArchiveError, RowError};
use thiserror::Error;

use crate::repository::RepositoryError;

/// Who is at fault for a failed import or export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    ClientFault,
    ServerFault,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Archive(#[source] ArchiveError),

    #[error("{0}")]
    Row(#[from] RowError),

    #[error("database operation failed: {0}")]
    Persistence(#[from] RepositoryError),

    #[error("failed to write export rows: {0}")]
    Serialize(#[from] csv::Error),

    #[error("failed to package export archive: {0}")]
    Packaging(#[source] ArchiveError),

    #[error("temporary storage error: {0}")]
    Resource(#[source] std::io::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PipelineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PipelineError::Archive(_) | PipelineError::Row(_) => ErrorClass::ClientFault,
            PipelineError::Persistence(_)
            | PipelineError::Serialize(_)
            | PipelineError::Packaging(_)
            | PipelineError::Resource(_)
            | PipelineError::Task(_) => ErrorClass::ServerFault,
        }
    }

    pub fn is_client_fault(&self) -> bool {
        self.class() == ErrorClass::ClientFault
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
