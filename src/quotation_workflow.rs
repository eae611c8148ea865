//! # Quotation Workflow
//!
//! Status transitions of a quotation: DRAFT → SENT → ACCEPTED | REJECTED.
//!
//! Every transition is a conditional `UPDATE ... WHERE status = <expected>` so two
//! concurrent requests cannot both win. Acceptance additionally turns the quotation
//! into a booking inside the same transaction: the booking code is allocated, the
//! configured exchange rate is frozen, and the JSON line items become booking item
//! rows. Any failure rolls everything back and the quotation stays SENT.

use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait, UpdateMany, sea_query::Expr,
};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::RateLockConfig;
use crate::error::{RepositoryError, is_unique_violation};
use crate::models::booking::{self, BookingStatus, Entity as Booking, Model as BookingModel};
use crate::models::booking_item::{self, Entity as BookingItem};
use crate::models::client::{self, Entity as Client};
use crate::models::quotation::{
    self, Entity as Quotation, Model as QuotationModel, QuotationStatus,
};
use crate::pricing::round_money;
use crate::repositories::audit_log::{self, NewAuditEntry};
use crate::repositories::exchange_rate::latest_on_or_before;
use crate::repositories::optional_text;
use crate::repositories::quotation::parse_items;

const BOOKING_CODE_PREFIX: &str = "BK";

/// Result of a successful acceptance
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AcceptedQuotation {
    pub quotation: QuotationModel,
    pub booking: BookingModel,
}

fn sequence_of(code: &str, year: i32) -> Option<u32> {
    code.strip_prefix(&format!("{BOOKING_CODE_PREFIX}-{year}-"))?
        .parse()
        .ok()
}

/// Next `BK-<year>-<NNNN>` code given the codes already issued. Codes from other
/// years or in another shape are ignored.
pub fn next_booking_code<'c>(year: i32, existing: impl IntoIterator<Item = &'c str>) -> String {
    let last = existing
        .into_iter()
        .filter_map(|code| sequence_of(code, year))
        .max()
        .unwrap_or(0);
    format!("{BOOKING_CODE_PREFIX}-{year}-{:04}", last + 1)
}

fn transition(
    tenant_id: Uuid,
    id: Uuid,
    from: QuotationStatus,
    to: QuotationStatus,
) -> UpdateMany<Quotation> {
    Quotation::update_many()
        .col_expr(quotation::Column::Status, Expr::value(to))
        .col_expr(quotation::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(quotation::Column::Id.eq(id))
        .filter(quotation::Column::TenantId.eq(tenant_id))
        .filter(quotation::Column::Status.eq(from))
}

/// Loads the quotation after a conditional update. Zero affected rows means it is
/// either missing (404) or not in the `expected` state (409).
async fn claimed(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    id: Uuid,
    rows_affected: u64,
    expected: QuotationStatus,
) -> Result<QuotationModel, RepositoryError> {
    let quotation = Quotation::find_by_id(id)
        .filter(quotation::Column::TenantId.eq(tenant_id))
        .one(txn)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Quotation not found"))?;

    if rows_affected == 0 {
        return Err(RepositoryError::conflict(
            format!("Quotation must be {} for this operation", expected.as_str()),
            Some(json!({ "status": quotation.status.as_str(), "expected": expected.as_str() })),
        ));
    }
    Ok(quotation)
}

pub struct QuotationWorkflow<'a> {
    db: &'a DatabaseConnection,
    rate_lock: &'a RateLockConfig,
}

impl<'a> QuotationWorkflow<'a> {
    pub fn new(db: &'a DatabaseConnection, rate_lock: &'a RateLockConfig) -> Self {
        Self { db, rate_lock }
    }

    /// DRAFT → SENT. The quotation needs a client with an e-mail address.
    pub async fn send(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<QuotationModel, RepositoryError> {
        let txn = self.db.begin().await?;

        let current = Quotation::find_by_id(id)
            .filter(quotation::Column::TenantId.eq(tenant_id))
            .one(&txn)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Quotation not found"))?;
        if current.status == QuotationStatus::Draft {
            let client = match current.client_id {
                Some(client_id) => Client::find_by_id(client_id)
                    .filter(client::Column::TenantId.eq(tenant_id))
                    .one(&txn)
                    .await?,
                None => None,
            };
            let Some(client) = client else {
                return Err(RepositoryError::validation_with_details(
                    "Quotation has no client to send to",
                    json!({ "field": "client_id" }),
                ));
            };
            if client.email.is_none() {
                return Err(RepositoryError::validation_with_details(
                    "Client has no e-mail address",
                    json!({ "client_id": client.id }),
                ));
            }
        }

        let result = transition(tenant_id, id, QuotationStatus::Draft, QuotationStatus::Sent)
            .col_expr(quotation::Column::SentAt, Expr::value(Utc::now()))
            .exec(&txn)
            .await?;
        let quotation = claimed(&txn, tenant_id, id, result.rows_affected, QuotationStatus::Draft)
            .await?;

        audit_log::record(
            &txn,
            NewAuditEntry {
                tenant_id,
                user_id,
                entity_type: "quotation",
                entity_id: id,
                action: "sent",
                changes: Some(json!({ "from": "DRAFT", "to": "SENT" })),
            },
        )
        .await?;
        txn.commit().await?;

        tracing::info!(quotation_id = %id, "Quotation sent");
        metrics::counter!("quotation_transitions_total", "to" => "SENT").increment(1);
        Ok(quotation)
    }

    /// SENT → REJECTED with an optional reason.
    pub async fn reject(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        user_id: Option<Uuid>,
        reason: Option<String>,
    ) -> Result<QuotationModel, RepositoryError> {
        let reason = optional_text(reason);
        let txn = self.db.begin().await?;

        let result = transition(tenant_id, id, QuotationStatus::Sent, QuotationStatus::Rejected)
            .col_expr(quotation::Column::RejectedAt, Expr::value(Utc::now()))
            .col_expr(quotation::Column::RejectionReason, Expr::value(reason.clone()))
            .exec(&txn)
            .await?;
        let quotation = claimed(&txn, tenant_id, id, result.rows_affected, QuotationStatus::Sent)
            .await?;

        audit_log::record(
            &txn,
            NewAuditEntry {
                tenant_id,
                user_id,
                entity_type: "quotation",
                entity_id: id,
                action: "rejected",
                changes: Some(json!({ "from": "SENT", "to": "REJECTED", "reason": reason })),
            },
        )
        .await?;
        txn.commit().await?;

        tracing::info!(quotation_id = %id, "Quotation rejected");
        metrics::counter!("quotation_transitions_total", "to" => "REJECTED").increment(1);
        Ok(quotation)
    }

    /// SENT → ACCEPTED, creating the booking as of `on` (the acceptance date).
    pub async fn accept(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        user_id: Option<Uuid>,
        on: NaiveDate,
    ) -> Result<AcceptedQuotation, RepositoryError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let result = transition(tenant_id, id, QuotationStatus::Sent, QuotationStatus::Accepted)
            .col_expr(quotation::Column::AcceptedAt, Expr::value(now))
            .exec(&txn)
            .await?;
        let quotation = claimed(&txn, tenant_id, id, result.rows_affected, QuotationStatus::Sent)
            .await?;

        let client = match quotation.client_id {
            Some(client_id) => Client::find_by_id(client_id)
                .filter(client::Column::TenantId.eq(tenant_id))
                .one(&txn)
                .await?,
            None => None,
        }
        .ok_or_else(|| {
            RepositoryError::validation_with_details(
                "Quotation has no client",
                json!({ "field": "client_id" }),
            )
        })?;

        let from = self.rate_lock.from_currency.as_str();
        let to = self.rate_lock.to_currency.as_str();
        let rate = latest_on_or_before(&txn, tenant_id, from, to, on)
            .await?
            .ok_or_else(|| {
                RepositoryError::validation_with_details(
                    "No exchange rate available to lock for this booking",
                    json!({
                        "from_currency": from,
                        "to_currency": to,
                        "on_or_before": on.to_string(),
                    }),
                )
            })?;

        let items = parse_items(&quotation.items)?;

        let year = on.year();
        let year_prefix = format!("{BOOKING_CODE_PREFIX}-{year}-");
        let issued: Vec<String> = Booking::find()
            .select_only()
            .column(booking::Column::BookingCode)
            .filter(booking::Column::TenantId.eq(tenant_id))
            .filter(booking::Column::BookingCode.starts_with(year_prefix))
            .into_tuple()
            .all(&txn)
            .await?;
        let booking_code = next_booking_code(year, issued.iter().map(String::as_str));

        let booking = booking::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            booking_code: Set(booking_code.clone()),
            quotation_id: Set(Some(quotation.id)),
            client_id: Set(client.id),
            status: Set(BookingStatus::Confirmed),
            start_date: Set(quotation.travel_start),
            end_date: Set(quotation.travel_end),
            total_price: Set(quotation.total_price),
            currency: Set(quotation.currency.clone()),
            locked_exchange_rate: Set(rate.rate),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                RepositoryError::conflict(
                    "Booking code was taken by a concurrent acceptance, retry",
                    Some(json!({ "booking_code": booking_code })),
                )
            } else {
                RepositoryError::database_error(err)
            }
        })?;

        if !items.is_empty() {
            let rows = items.iter().map(|item| booking_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                tenant_id: Set(tenant_id),
                booking_id: Set(booking.id),
                service_type: Set(item.service_type.clone()),
                service_offering_id: Set(item.service_offering_id),
                description: Set(item.description.clone()),
                service_date: Set(item.service_date),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                total_price: Set(round_money(item.line_total(), 2)),
                currency: Set(quotation.currency.clone()),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            });
            BookingItem::insert_many(rows).exec_without_returning(&txn).await?;
        }

        audit_log::record(
            &txn,
            NewAuditEntry {
                tenant_id,
                user_id,
                entity_type: "quotation",
                entity_id: quotation.id,
                action: "accepted",
                changes: Some(json!({
                    "from": "SENT",
                    "to": "ACCEPTED",
                    "booking_id": booking.id,
                })),
            },
        )
        .await?;
        audit_log::record(
            &txn,
            NewAuditEntry {
                tenant_id,
                user_id,
                entity_type: "booking",
                entity_id: booking.id,
                action: "created",
                changes: Some(json!({
                    "booking_code": booking.booking_code,
                    "quotation_id": quotation.id,
                    "locked_exchange_rate": rate.rate.to_string(),
                    "items": items.len(),
                })),
            },
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            quotation_id = %quotation.id,
            booking_code = %booking.booking_code,
            locked_exchange_rate = %rate.rate,
            "Quotation accepted"
        );
        metrics::counter!("quotation_transitions_total", "to" => "ACCEPTED").increment(1);

        Ok(AcceptedQuotation { quotation, booking })
    }
}
