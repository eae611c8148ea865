//! # Data Retention
//!
//! Background task that periodically purges expired idempotency responses and old
//! audit entries, and archives leads that were marked LOST long ago. Each purge is an
//! independent bulk statement, so a failure in one does not block the others.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, histogram};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, sea_query::Expr};
use tokio::time::{Duration as TokioDuration, Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::config::RetentionConfig;
use crate::models::lead::{self, Entity as Lead, LeadStatus};
use crate::models::{audit_log, idempotency_key};

/// Rows touched by one retention pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeStats {
    pub idempotency_keys_deleted: u64,
    pub audit_logs_deleted: u64,
    pub leads_archived: u64,
}

/// Cut-off instants for one pass, computed from a single `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutoffs {
    pub idempotency_keys: DateTime<Utc>,
    pub audit_logs: DateTime<Utc>,
    pub lost_leads: DateTime<Utc>,
}

impl Cutoffs {
    pub fn at(now: DateTime<Utc>, config: &RetentionConfig) -> Self {
        Self {
            idempotency_keys: now - hours(config.idempotency_ttl_hours),
            audit_logs: now - hours(config.audit_log_retention_days.saturating_mul(24)),
            lost_leads: now - hours(config.lost_lead_archive_days.saturating_mul(24)),
        }
    }
}

/// Retention windows are capped at a century.
const MAX_WINDOW_HOURS: u64 = 100 * 365 * 24;

fn hours(value: u64) -> Duration {
    Duration::hours(value.min(MAX_WINDOW_HOURS) as i64)
}

pub struct RetentionJob {
    config: RetentionConfig,
    db: Arc<DatabaseConnection>,
}

impl RetentionJob {
    pub fn new(config: RetentionConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Runs until `shutdown` is cancelled.
    #[instrument(skip_all)]
    pub async fn run(self, shutdown: CancellationToken) {
        info!(tick_seconds = self.config.tick_seconds, "Starting retention job");
        let tick_interval = TokioDuration::from_secs(self.config.tick_seconds);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Retention job shutdown requested");
                    break;
                }
                _ = sleep(tick_interval) => {
                    let tick_started = Instant::now();
                    let stats = self.tick(Utc::now()).await;
                    debug!(?stats, "Retention pass finished");
                    histogram!("retention_tick_duration_ms")
                        .record(tick_started.elapsed().as_secs_f64() * 1_000.0);
                }
            }
        }

        info!("Retention job stopped");
    }

    /// One pass with cut-offs relative to `now`. Failures are logged per purge.
    pub async fn tick(&self, now: DateTime<Utc>) -> PurgeStats {
        let cutoffs = Cutoffs::at(now, &self.config);
        let db = self.db.as_ref();

        PurgeStats {
            idempotency_keys_deleted: report(
                "idempotency_keys",
                purge_idempotency_keys(db, cutoffs.idempotency_keys).await,
            ),
            audit_logs_deleted: report(
                "audit_logs",
                purge_audit_logs(db, cutoffs.audit_logs).await,
            ),
            leads_archived: report(
                "lost_leads",
                archive_lost_leads(db, cutoffs.lost_leads, now).await,
            ),
        }
    }
}

fn report(target: &'static str, result: Result<u64, DbErr>) -> u64 {
    match result {
        Ok(rows) => {
            if rows > 0 {
                info!(target_table = target, rows, "Retention purge applied");
            }
            counter!("retention_rows_total", "target" => target).increment(rows);
            rows
        }
        Err(err) => {
            error!(target_table = target, error = ?err, "Retention purge failed");
            counter!("retention_failures_total", "target" => target).increment(1);
            0
        }
    }
}

pub async fn purge_idempotency_keys(
    db: &DatabaseConnection,
    older_than: DateTime<Utc>,
) -> Result<u64, DbErr> {
    let result = idempotency_key::Entity::delete_many()
        .filter(idempotency_key::Column::CreatedAt.lt(older_than))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn purge_audit_logs(
    db: &DatabaseConnection,
    older_than: DateTime<Utc>,
) -> Result<u64, DbErr> {
    let result = audit_log::Entity::delete_many()
        .filter(audit_log::Column::CreatedAt.lt(older_than))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Deactivates LOST leads whose last update is older than `older_than`.
pub async fn archive_lost_leads(
    db: &DatabaseConnection,
    older_than: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<u64, DbErr> {
    let result = Lead::update_many()
        .col_expr(lead::Column::IsActive, Expr::value(false))
        .col_expr(lead::Column::UpdatedAt, Expr::value(now))
        .filter(lead::Column::Status.eq(LeadStatus::Lost))
        .filter(lead::Column::IsActive.eq(true))
        .filter(lead::Column::UpdatedAt.lt(older_than))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cutoffs_from_config() {
        let now = Utc.with_ymd_and_hms(2026, 6, 30, 12, 0, 0).unwrap();
        let config = RetentionConfig {
            tick_seconds: 60,
            idempotency_ttl_hours: 24,
            audit_log_retention_days: 30,
            lost_lead_archive_days: 90,
        };

        let cutoffs = Cutoffs::at(now, &config);

        assert_eq!(cutoffs.idempotency_keys, now - Duration::hours(24));
        assert_eq!(cutoffs.audit_logs, Utc.with_ymd_and_hms(2026, 5, 31, 12, 0, 0).unwrap());
        assert_eq!(cutoffs.lost_leads, Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_tick_on_empty_database() {
        let db = crate::db::testing::migrated_sqlite().await;
        let job = RetentionJob::new(RetentionConfig::default(), Arc::new(db));

        assert_eq!(job.tick(Utc::now()).await, PurgeStats::default());
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let db = crate::db::testing::migrated_sqlite().await;
        let job = RetentionJob::new(RetentionConfig::default(), Arc::new(db));
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        tokio::time::timeout(TokioDuration::from_secs(1), job.run(shutdown))
            .await
            .unwrap();
    }
}
