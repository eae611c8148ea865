//! # Audit Log Repository
//!
//! Append-only audit entries plus the day-grouped timeline view.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::Page;
use crate::error::RepositoryError;
use crate::models::audit_log::{self, Entity as AuditLog, Model as AuditLogModel};

/// Entry to append to the audit log
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub tenant_id: Uuid,
    pub user_id: Option<Uuid>,
    pub entity_type: &'static str,
    pub entity_id: Uuid,
    pub action: &'static str,
    pub changes: Option<serde_json::Value>,
}

/// Appends an entry. Takes any connection so callers can write inside their
/// own transaction.
pub async fn record<C: ConnectionTrait>(
    db: &C,
    entry: NewAuditEntry,
) -> Result<AuditLogModel, sea_orm::DbErr> {
    let model = audit_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(entry.tenant_id),
        user_id: Set(entry.user_id),
        entity_type: Set(entry.entity_type.to_string()),
        entity_id: Set(entry.entity_id),
        action: Set(entry.action.to_string()),
        changes: Set(entry.changes),
        created_at: Set(Utc::now().into()),
    };

    let saved = model.insert(db).await?;
    tracing::debug!(
        entity_type = entry.entity_type,
        entity_id = %entry.entity_id,
        action = entry.action,
        "Audit entry recorded"
    );
    Ok(saved)
}

/// Timeline filter. Both fields unset means the whole tenant.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
}

/// Audit entries of one calendar day (UTC), newest first.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TimelineDay {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub entries: Vec<AuditLogModel>,
}

/// Groups entries by UTC calendar day. Days and the entries within a day are ordered
/// newest first regardless of input order.
pub fn build_timeline(mut entries: Vec<AuditLogModel>) -> Vec<TimelineDay> {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut days: Vec<TimelineDay> = Vec::new();
    for entry in entries {
        let date = entry.created_at.naive_utc().date();
        match days.last_mut() {
            Some(day) if day.date == date => day.entries.push(entry),
            _ => days.push(TimelineDay {
                date,
                entries: vec![entry],
            }),
        }
    }
    days
}

pub struct AuditLogRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> AuditLogRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// One page of entries (newest first) grouped into days, plus the total count.
    pub async fn timeline(
        &self,
        tenant_id: Uuid,
        filter: &AuditFilter,
        page: Page,
    ) -> Result<(Vec<TimelineDay>, u64), RepositoryError> {
        let mut query = AuditLog::find().filter(audit_log::Column::TenantId.eq(tenant_id));
        if let Some(entity_type) = &filter.entity_type {
            query = query.filter(audit_log::Column::EntityType.eq(entity_type.as_str()));
        }
        if let Some(entity_id) = filter.entity_id {
            query = query.filter(audit_log::Column::EntityId.eq(entity_id));
        }

        let total = query.clone().count(self.db).await?;
        let entries = query
            .order_by_desc(audit_log::Column::CreatedAt)
            .order_by_asc(audit_log::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(self.db)
            .await?;

        Ok((build_timeline(entries), total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, TimeZone};
    use serde_json::json;

    fn entry_at(timestamp: DateTime<FixedOffset>, action: &str) -> AuditLogModel {
        AuditLogModel {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            user_id: None,
            entity_type: "booking".to_string(),
            entity_id: Uuid::nil(),
            action: action.to_string(),
            changes: Some(json!({})),
            created_at: timestamp,
        }
    }

    fn utc(day: u32, hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 6, day, hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_timeline_groups_by_day_newest_first() {
        let entries = vec![
            entry_at(utc(1, 9), "created"),
            entry_at(utc(2, 8), "payment_recorded"),
            entry_at(utc(1, 17), "updated"),
            entry_at(utc(2, 18), "cancelled"),
        ];

        let timeline = build_timeline(entries);

        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].date, NaiveDate::from_ymd_opt(2026, 6, 2).unwrap());
        let day_two: Vec<_> = timeline[0].entries.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(day_two, ["cancelled", "payment_recorded"]);
        let day_one: Vec<_> = timeline[1].entries.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(day_one, ["updated", "created"]);
    }

    #[test]
    fn test_timeline_uses_utc_day() {
        // 01:00 at +03:00 falls on the previous UTC day
        let istanbul = FixedOffset::east_opt(3 * 3600).unwrap();
        let late = istanbul.with_ymd_and_hms(2026, 6, 2, 1, 0, 0).unwrap();
        let timeline = build_timeline(vec![entry_at(late, "created")]);

        assert_eq!(timeline[0].date, NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
    }

    #[test]
    fn test_empty_timeline() {
        assert!(build_timeline(Vec::new()).is_empty());
    }
}
