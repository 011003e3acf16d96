use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::services::clock::SystemClock;
use crate::error::AppError;
use crate::state::AppState;
use crate::infra::repositories::{
    postgres_event_repo::PostgresEventRepo, postgres_notification_repo::PostgresNotificationRepo,
    postgres_rsvp_repo::PostgresRsvpRepo,
    sqlite_event_repo::SqliteEventRepo, sqlite_notification_repo::SqliteNotificationRepo,
    sqlite_rsvp_repo::SqliteRsvpRepo,
};

pub fn is_postgres_url(database_url: &str) -> bool {
    database_url.starts_with("postgres://") || database_url.starts_with("postgresql://")
}

pub async fn bootstrap_state(config: &Config) -> Result<AppState, AppError> {
    let database_url = &config.database_url;

    if is_postgres_url(database_url) {
        info!("Initializing PostgreSQL connection...");
        let pool = connect_postgres(database_url).await?;

        Ok(AppState::new(
            config.clone(),
            Arc::new(PostgresEventRepo::new(pool.clone())),
            Arc::new(PostgresRsvpRepo::new(pool.clone())),
            Arc::new(PostgresNotificationRepo::new(pool)),
            Arc::new(SystemClock),
        ))
    } else {
        info!("Initializing SQLite connection with WAL Mode...");
        let pool = connect_sqlite(database_url).await?;

        Ok(AppState::new(
            config.clone(),
            Arc::new(SqliteEventRepo::new(pool.clone())),
            Arc::new(SqliteRsvpRepo::new(pool.clone())),
            Arc::new(SqliteNotificationRepo::new(pool)),
            Arc::new(SystemClock),
        ))
    }
}

pub async fn connect_postgres(database_url: &str) -> Result<PgPool, AppError> {
    let opts: PgConnectOptions = database_url.parse()
        .map_err(|e| AppError::InternalWithMsg(format!("Invalid Postgres URL: {}", e)))?;
    let opts = opts.log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect_with(opts)
        .await?;

    sqlx::migrate!("./migrations/postgres")
        .run(&pool)
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to run Postgres migrations: {}", e)))?;

    Ok(pool)
}

pub async fn connect_sqlite(database_url: &str) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true)
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;

    sqlx::migrate!("./migrations/sqlite")
        .run(&pool)
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to run SQLite migrations: {}", e)))?;

    Ok(pool)
}
