//! Database connection and pool management.
//!
//! Builds a SeaORM pool (Postgres in production, SQLite for tests and local runs),
//! retrying transient connection failures with exponential backoff.

use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::AppConfig;

const MAX_CONNECT_ATTEMPTS: u32 = 5;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {source}")]
    ConnectionFailed {
        #[from]
        source: sea_orm::DbErr,
    },
    #[error("Database connection timeout after {timeout_ms}ms")]
    ConnectionTimeout { timeout_ms: u64 },
    #[error("Invalid database configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Initializes a database connection pool with the given configuration.
///
/// Connection attempts are retried up to five times, doubling the delay from 100ms.
///
/// ```no_run
/// use tourcrm::{config::AppConfig, db::init_pool};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = AppConfig::default();
///     let db = init_pool(&config).await?;
///     Ok(())
/// }
/// ```
pub async fn init_pool(cfg: &AppConfig) -> Result<DatabaseConnection> {
    if cfg.database_url.is_empty() {
        return Err(DatabaseError::InvalidConfiguration {
            message: "Database URL cannot be empty".to_string(),
        }
        .into());
    }

    let mut opt = ConnectOptions::new(&cfg.database_url);
    opt.max_connections(cfg.db_max_connections)
        .acquire_timeout(Duration::from_millis(cfg.db_acquire_timeout_ms))
        .idle_timeout(Duration::from_secs(600)) // 10 minutes
        .max_lifetime(Duration::from_secs(1800)) // 30 minutes
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let mut retry_delay = Duration::from_millis(100);

    for attempt in 1..=MAX_CONNECT_ATTEMPTS {
        match Database::connect(opt.clone()).await {
            Ok(conn) => {
                log::info!("Connected to database (attempt {})", attempt);
                return Ok(conn);
            }
            Err(e) => {
                if attempt == MAX_CONNECT_ATTEMPTS {
                    log::error!(
                        "Failed to connect to database after {} attempts: {}",
                        MAX_CONNECT_ATTEMPTS,
                        e
                    );
                    return Err(DatabaseError::ConnectionFailed { source: e }.into());
                }

                log::warn!(
                    "Database connection attempt {} failed: {}, retrying in {:?}",
                    attempt,
                    e,
                    retry_delay
                );

                sleep(retry_delay).await;
                retry_delay *= 2;
            }
        }
    }

    Err(DatabaseError::ConnectionTimeout {
        timeout_ms: cfg.db_acquire_timeout_ms,
    }
    .into())
}

/// Applies all pending schema migrations.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .context("Failed to apply database migrations")?;
    log::info!("Database migrations applied");
    Ok(())
}

/// Verifies that the pool can still reach the database. A connection that was
/// never established reports an error.
pub async fn health_check(db: &DatabaseConnection) -> Result<()> {
    db.ping().await.context("Database health check failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_database_url() {
        let config = AppConfig {
            database_url: String::new(),
            ..AppConfig::default()
        };

        let result = init_pool(&config).await;

        assert!(matches!(
            result.unwrap_err().downcast::<DatabaseError>(),
            Ok(DatabaseError::InvalidConfiguration { .. })
        ));
    }

    #[tokio::test]
    async fn test_health_check_and_migrations_on_sqlite() {
        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 1,
            ..AppConfig::default()
        };

        let db = init_pool(&config).await.expect("sqlite pool");
        run_migrations(&db).await.expect("migrations apply");
        health_check(&db).await.expect("healthy");
    }

    #[tokio::test]
    async fn test_health_check_fails_without_connection() {
        let err = health_check(&DatabaseConnection::default())
            .await
            .expect_err("disconnected pool is unhealthy");

        assert!(err.to_string().contains("Database health check failed"));
    }

    #[tokio::test]
    async fn test_migrations_store_six_decimal_exchange_rates() {
        use crate::models::exchange_rate;
        use chrono::{NaiveDate, Utc};
        use rust_decimal_macros::dec;
        use sea_orm::{ActiveModelTrait, EntityTrait, Set};
        use uuid::Uuid;

        let db = testing::migrated_sqlite().await;
        assert!(Migrator::get_pending_migrations(&db).await.unwrap().is_empty());

        let tenant_id = testing::insert_tenant(&db, "Aegean").await;
        let id = Uuid::new_v4();
        exchange_rate::ActiveModel {
            id: Set(id),
            tenant_id: Set(tenant_id),
            from_currency: Set("TRY".to_string()),
            to_currency: Set("EUR".to_string()),
            rate: Set(dec!(0.028512)),
            effective_date: Set(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        }
        .insert(&db)
        .await
        .unwrap();

        let stored = exchange_rate::Entity::find_by_id(id).one(&db).await.unwrap().unwrap();
        assert_eq!(stored.rate.round_dp(6), dec!(0.028512));
    }
}
