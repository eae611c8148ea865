//! # Booking Repository
//!
//! Bookings are only created by quotation acceptance; this repository covers reads,
//! the payment summary and cancellation.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait, sea_query::Expr,
};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::Page;
use super::audit_log::{self, NewAuditEntry};
use crate::error::RepositoryError;
use crate::models::booking::{self, BookingStatus, Entity as Booking, Model as BookingModel};
use crate::models::booking_item::{self, Entity as BookingItem, Model as BookingItemModel};
use crate::models::payment_client::{self, Entity as PaymentClient, PaymentStatus};
use crate::pricing::round_money;

/// Booking with its line items and what the client has paid so far.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: BookingModel,
    pub items: Vec<BookingItemModel>,
    /// Sum of COMPLETED client payments
    #[schema(value_type = String, example = "500.00")]
    pub paid_total: Decimal,
    /// `total_price - paid_total`; negative when overpaid
    #[schema(value_type = String, example = "851.00")]
    pub balance: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub client_id: Option<Uuid>,
}

pub struct BookingRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> BookingRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &BookingFilter,
        page: Page,
    ) -> Result<(Vec<BookingModel>, u64), RepositoryError> {
        let mut query = Booking::find().filter(booking::Column::TenantId.eq(tenant_id));
        if let Some(status) = filter.status {
            query = query.filter(booking::Column::Status.eq(status));
        }
        if let Some(client_id) = filter.client_id {
            query = query.filter(booking::Column::ClientId.eq(client_id));
        }

        let total = query.clone().count(self.db).await?;
        let bookings = query
            .order_by_desc(booking::Column::BookingCode)
            .limit(page.limit)
            .offset(page.offset)
            .all(self.db)
            .await?;

        Ok((bookings, total))
    }

    pub async fn find(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<BookingModel>, RepositoryError> {
        Ok(Booking::find_by_id(id)
            .filter(booking::Column::TenantId.eq(tenant_id))
            .one(self.db)
            .await?)
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<BookingModel, RepositoryError> {
        self.find(tenant_id, id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Booking not found"))
    }

    pub async fn get_detail(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<BookingDetail, RepositoryError> {
        let booking = self.get(tenant_id, id).await?;

        let items = BookingItem::find()
            .filter(booking_item::Column::TenantId.eq(tenant_id))
            .filter(booking_item::Column::BookingId.eq(id))
            .order_by_asc(booking_item::Column::ServiceDate)
            .order_by_asc(booking_item::Column::Description)
            .all(self.db)
            .await?;

        let payments = PaymentClient::find()
            .filter(payment_client::Column::TenantId.eq(tenant_id))
            .filter(payment_client::Column::BookingId.eq(id))
            .filter(payment_client::Column::Status.eq(PaymentStatus::Completed))
            .all(self.db)
            .await?;

        let paid_total = round_money(payments.iter().map(|p| p.amount).sum(), 2);
        let balance = round_money(booking.total_price - paid_total, 2);

        Ok(BookingDetail {
            booking,
            items,
            paid_total,
            balance,
        })
    }

    /// Cancels a CONFIRMED booking. Any other status is a conflict.
    pub async fn cancel(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<BookingModel, RepositoryError> {
        let txn = self.db.begin().await?;

        let result = Booking::update_many()
            .col_expr(
                booking::Column::Status,
                Expr::value(BookingStatus::Cancelled),
            )
            .col_expr(booking::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(booking::Column::Id.eq(id))
            .filter(booking::Column::TenantId.eq(tenant_id))
            .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
            .exec(&txn)
            .await?;

        let booking = Booking::find_by_id(id)
            .filter(booking::Column::TenantId.eq(tenant_id))
            .one(&txn)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Booking not found"))?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::conflict(
                "Only CONFIRMED bookings can be cancelled",
                Some(json!({ "booking_code": booking.booking_code, "status": booking.status })),
            ));
        }

        audit_log::record(
            &txn,
            NewAuditEntry {
                tenant_id,
                user_id,
                entity_type: "booking",
                entity_id: id,
                action: "cancelled",
                changes: Some(json!({ "from": "CONFIRMED", "to": "CANCELLED" })),
            },
        )
        .await?;

        txn.commit().await?;

        tracing::info!(booking_code = %booking.booking_code, "Booking cancelled");
        metrics::counter!("bookings_cancelled_total").increment(1);

        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{insert_tenant, migrated_sqlite};
    use crate::models::client;
    use rust_decimal_macros::dec;
    use sea_orm::{ActiveModelTrait, Set};

    async fn seed_booking(db: &DatabaseConnection, tenant_id: Uuid) -> BookingModel {
        let now = Utc::now();
        let client = client::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set("Mehmet Kaya".to_string()),
            email: Set(None),
            phone: Set(None),
            nationality: Set(None),
            notes: Set(None),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(db)
        .await
        .unwrap();

        booking::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            booking_code: Set("BK-2026-0001".to_string()),
            quotation_id: Set(None),
            client_id: Set(client.id),
            status: Set(BookingStatus::Confirmed),
            start_date: Set(None),
            end_date: Set(None),
            total_price: Set(dec!(1000.00)),
            currency: Set("EUR".to_string()),
            locked_exchange_rate: Set(dec!(0.0285)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_cancel_once_then_conflict() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;
        let booking = seed_booking(&db, tenant_id).await;
        let repo = BookingRepository::new(&db);

        let cancelled = repo.cancel(tenant_id, booking.id, None).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let err = repo.cancel(tenant_id, booking.id, None).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_cancel_other_tenant_is_not_found() {
        let db = migrated_sqlite().await;
        let owner = insert_tenant(&db, "Aegean").await;
        let stranger = insert_tenant(&db, "Lycian").await;
        let booking = seed_booking(&db, owner).await;

        let err = BookingRepository::new(&db)
            .cancel(stranger, booking.id, None)
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_detail_without_payments_has_full_balance() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;
        let booking = seed_booking(&db, tenant_id).await;

        let detail = BookingRepository::new(&db)
            .get_detail(tenant_id, booking.id)
            .await
            .unwrap();

        assert!(detail.items.is_empty());
        assert!(detail.paid_total.is_zero());
        assert_eq!(detail.balance.round_dp(2), dec!(1000.00));
    }
}
