use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use dazzign_shared::error::DazzignError;
use sea_orm::{DatabaseConnection, SqlxSqliteConnector};
use sea_orm_migration::MigratorTrait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::ConnectOptions;
use tracing::debug;

use crate::migration::Migrator;

const SLOW_QUERY_MS: u64 = 500;

#[derive(Debug)]
pub enum DBError {
    SqlxError(sqlx::Error),
    SeaOrm(sea_orm::DbErr),
    IoError(std::io::Error),
}

impl From<sqlx::Error> for DBError {
    fn from(err: sqlx::Error) -> Self {
        DBError::SqlxError(err)
    }
}

impl From<sea_orm::DbErr> for DBError {
    fn from(err: sea_orm::DbErr) -> Self {
        DBError::SeaOrm(err)
    }
}

impl From<std::io::Error> for DBError {
    fn from(err: std::io::Error) -> Self {
        DBError::IoError(err)
    }
}

impl From<DBError> for DazzignError {
    fn from(err: DBError) -> Self {
        match err {
            DBError::IoError(err) => DazzignError::IOError(err.to_string()),
            DBError::SqlxError(err) => DazzignError::Persistence(err.to_string()),
            DBError::SeaOrm(err) => DazzignError::Persistence(err.to_string()),
        }
    }
}

/// Open (creating if needed) the database at `db_path` and bring the schema up to date.
pub async fn new(db_path: &PathBuf) -> Result<DatabaseConnection, DBError> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    start_db(Some(db_path)).await
}

/// Start the database, `None` gives you an in-memory one.
pub async fn start_db(db_path: Option<&PathBuf>) -> Result<DatabaseConnection, DBError> {
    let db_url = match db_path {
        Some(path) => format!("sqlite://{}?mode=rwc", path.display()),
        None => "sqlite::memory:".to_string(),
    };
    debug!("Opening Database: {db_url}");

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .log_statements(log::LevelFilter::Trace)
        .log_slow_statements(
            log::LevelFilter::Warn,
            Duration::from_millis(SLOW_QUERY_MS),
        );

    let pool_options = match db_path {
        // every connection to :memory: is its own database, so hold exactly one open forever
        None => SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None),
        Some(_) => SqlitePoolOptions::new(),
    };

    let pool = pool_options.connect_with(options).await?;
    let conn = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);

    Migrator::up(&conn, None).await?;
    debug!("Database migrations complete");

    Ok(conn)
}
