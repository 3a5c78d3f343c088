mod routes;
mod state;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pricebook_core::config::PgSslMode;
use pricebook_core::{
    db, export_archive, import_archive, DatabaseConfig, PostgresRepository, PriceRepository,
};
use state::AppState;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Price catalog import/export service", long_about = None)]
struct Cli {
    #[command(flatten)]
    database: DatabaseArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API server
    Serve(ServeArgs),
    /// Create the prices table if it is missing
    Migrate,
    /// Import a zip archive from disk and print the resulting statistics
    Import(ImportArgs),
    /// Write every stored price to a zip archive on disk
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct DatabaseArgs {
    #[arg(long, env = "PG_HOST", default_value = "localhost", global = true)]
    pg_host: String,

    #[arg(long, env = "PG_PORT", default_value_t = 5432, global = true)]
    pg_port: u16,

    #[arg(long, env = "PG_USER", default_value = "postgres", global = true)]
    pg_user: String,

    #[arg(long, env = "PG_PASSWORD", hide_env_values = true, global = true)]
    pg_password: Option<String>,

    #[arg(long, env = "PG_DBNAME", default_value = "postgres", global = true)]
    pg_dbname: String,

    /// disable, allow, prefer, require, verify-ca or verify-full
    #[arg(long, env = "PG_SSLMODE", default_value = "prefer", global = true)]
    pg_sslmode: String,

    #[arg(long, env = "PG_MAX_CONNECTIONS", default_value_t = 10, global = true)]
    pg_max_connections: u32,
}

impl DatabaseArgs {
    fn to_config(&self) -> Result<DatabaseConfig> {
        let ssl_mode = self
            .pg_sslmode
            .parse::<PgSslMode>()
            .with_context(|| format!("invalid PG_SSLMODE '{}'", self.pg_sslmode))?;

        Ok(DatabaseConfig {
            host: self.pg_host.clone(),
            port: self.pg_port,
            user: self.pg_user.clone(),
            password: self.pg_password.clone(),
            dbname: self.pg_dbname.clone(),
            ssl_mode,
            max_connections: self.pg_max_connections,
            acquire_timeout: Duration::from_secs(10),
        })
    }
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 32 * 1024 * 1024)]
    max_upload_bytes: usize,

    /// Skip creating the prices table on startup
    #[arg(long)]
    skip_migrations: bool,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Zip archive containing a single .csv file
    archive: PathBuf,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Destination for the generated archive
    #[arg(default_value = pricebook_core::EXPORT_ARCHIVE_NAME)]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();
    let config = cli.database.to_config()?;

    match cli.command {
        Command::Serve(args) => serve(&config, args).await,
        Command::Migrate => {
            let pool = db::connect(&config).await?;
            db::run_migrations(&pool).await?;
            info!("Database migrations applied");
            pool.close().await;
            Ok(())
        }
        Command::Import(args) => {
            let archive = tokio::fs::read(&args.archive)
                .await
                .with_context(|| format!("failed to read {}", args.archive.display()))?;
            let repository = PostgresRepository::new(db::connect(&config).await?);

            let result = import_archive(&repository, archive).await;
            repository.close().await;
            let statistics = result?;

            println!("{}", serde_json::to_string_pretty(&statistics)?);
            Ok(())
        }
        Command::Export(args) => {
            let repository = PostgresRepository::new(db::connect(&config).await?);

            let result = export_archive(&repository).await;
            repository.close().await;
            let archive = result?;

            tokio::fs::write(&args.output, &archive)
                .await
                .with_context(|| format!("failed to write {}", args.output.display()))?;
            info!(path = %args.output.display(), bytes = archive.len(), "export written");
            Ok(())
        }
    }
}

async fn serve(config: &DatabaseConfig, args: ServeArgs) -> Result<()> {
    let pool = db::connect(config).await?;
    if args.skip_migrations {
        warn!("Skipping migrations at user request");
    } else {
        db::run_migrations(&pool).await?;
    }

    let repository: Arc<dyn PriceRepository> = Arc::new(PostgresRepository::new(pool));
    let router = routes::router(AppState::new(repository.clone()), args.max_upload_bytes);

    let listener = TcpListener::bind((std::net::Ipv4Addr::UNSPECIFIED, args.port))
        .await
        .with_context(|| format!("failed to bind port {}", args.port))?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped; closing database pool");
    repository.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
    }
}
