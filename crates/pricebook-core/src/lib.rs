pub mod config;
pub mod db;
pub mod error;
pub mod ingestion;
pub mod outputs;
pub mod repository;
pub mod scratch;
pub mod types;

pub use config::DatabaseConfig;
pub use error::{ErrorClass, PipelineError};
pub use ingestion::import_archive;
pub use outputs::{export_archive, EXPORT_ARCHIVE_NAME};
pub use repository::{MemoryRepository, PostgresRepository, PriceRepository, RepositoryError};
pub use types::ImportStatistics;
