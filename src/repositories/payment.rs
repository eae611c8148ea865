//! # Payment Repository
//!
//! Client payments (money in, always against a booking) and vendor payments (money
//! out, optionally tied to a booking). Both are recorded with an audit entry and,
//! when the request carried one, its idempotency key in the same transaction.

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::audit_log::{self, NewAuditEntry};
use super::{Page, normalize_currency, optional_text, positive};
use crate::error::RepositoryError;
use crate::idempotency::PendingKey;
use crate::models::booking::{self, BookingStatus, Entity as Booking};
use crate::models::payment_client::{
    self, Entity as PaymentClient, Model as PaymentClientModel, PaymentMethod, PaymentStatus,
};
use crate::models::payment_vendor::{self, Entity as PaymentVendor, Model as PaymentVendorModel};
use crate::models::vendor::{self, Entity as Vendor};
use crate::pricing::round_money;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateClientPaymentRequest {
    pub booking_id: Uuid,
    #[schema(value_type = String, example = "500.00")]
    pub amount: Decimal,
    /// Defaults to the booking currency
    pub currency: Option<String>,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    /// Defaults to now
    #[schema(value_type = Option<String>)]
    pub paid_at: Option<DateTime<Utc>>,
    /// Defaults to COMPLETED
    pub status: Option<PaymentStatus>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateVendorPaymentRequest {
    pub vendor_id: Uuid,
    pub booking_id: Option<Uuid>,
    #[schema(value_type = String, example = "320.00")]
    pub amount: Decimal,
    #[schema(example = "TRY")]
    pub currency: String,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    #[schema(value_type = Option<String>)]
    pub paid_at: Option<DateTime<Utc>>,
    pub status: Option<PaymentStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub booking_id: Option<Uuid>,
    /// Only meaningful for vendor payments
    pub vendor_id: Option<Uuid>,
}

pub struct PaymentRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PaymentRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_client_payments(
        &self,
        tenant_id: Uuid,
        filter: &PaymentFilter,
        page: Page,
    ) -> Result<(Vec<PaymentClientModel>, u64), RepositoryError> {
        let mut query =
            PaymentClient::find().filter(payment_client::Column::TenantId.eq(tenant_id));
        if let Some(booking_id) = filter.booking_id {
            query = query.filter(payment_client::Column::BookingId.eq(booking_id));
        }

        let total = query.clone().count(self.db).await?;
        let payments = query
            .order_by_desc(payment_client::Column::PaidAt)
            .order_by_asc(payment_client::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(self.db)
            .await?;

        Ok((payments, total))
    }

    pub async fn create_client_payment(
        &self,
        tenant_id: Uuid,
        user_id: Option<Uuid>,
        request: CreateClientPaymentRequest,
        idempotency: Option<PendingKey>,
    ) -> Result<PaymentClientModel, RepositoryError> {
        let amount = positive("amount", round_money(request.amount, 2))?;
        let txn = self.db.begin().await?;

        let booking = Booking::find_by_id(request.booking_id)
            .filter(booking::Column::TenantId.eq(tenant_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                RepositoryError::validation_with_details(
                    "booking_id does not reference a booking of this tenant",
                    json!({ "field": "booking_id", "value": request.booking_id }),
                )
            })?;
        if booking.status == BookingStatus::Cancelled {
            return Err(RepositoryError::conflict(
                "Cannot record a payment against a cancelled booking",
                Some(json!({ "booking_code": booking.booking_code })),
            ));
        }

        let currency = match request.currency.as_deref() {
            Some(code) => normalize_currency("currency", code)?,
            None => booking.currency.clone(),
        };
        let now = Utc::now();
        let payment = payment_client::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            booking_id: Set(booking.id),
            amount: Set(amount),
            currency: Set(currency.clone()),
            method: Set(request.method),
            reference: Set(optional_text(request.reference)),
            paid_at: Set(request.paid_at.unwrap_or(now).into()),
            status: Set(request.status.unwrap_or_default()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        audit_log::record(
            &txn,
            NewAuditEntry {
                tenant_id,
                user_id,
                entity_type: "booking",
                entity_id: booking.id,
                action: "payment_recorded",
                changes: Some(json!({
                    "payment_id": payment.id,
                    "amount": amount.to_string(),
                    "currency": currency,
                    "status": payment.status,
                })),
            },
        )
        .await?;

        if let Some(key) = idempotency {
            key.record(&txn, StatusCode::CREATED, &payment).await?;
        }

        txn.commit().await?;

        tracing::info!(
            booking_code = %booking.booking_code,
            payment_id = %payment.id,
            "Client payment recorded"
        );
        metrics::counter!("payments_recorded_total", "direction" => "client").increment(1);

        Ok(payment)
    }

    pub async fn list_vendor_payments(
        &self,
        tenant_id: Uuid,
        filter: &PaymentFilter,
        page: Page,
    ) -> Result<(Vec<PaymentVendorModel>, u64), RepositoryError> {
        let mut query =
            PaymentVendor::find().filter(payment_vendor::Column::TenantId.eq(tenant_id));
        if let Some(vendor_id) = filter.vendor_id {
            query = query.filter(payment_vendor::Column::VendorId.eq(vendor_id));
        }
        if let Some(booking_id) = filter.booking_id {
            query = query.filter(payment_vendor::Column::BookingId.eq(booking_id));
        }

        let total = query.clone().count(self.db).await?;
        let payments = query
            .order_by_desc(payment_vendor::Column::PaidAt)
            .order_by_asc(payment_vendor::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(self.db)
            .await?;

        Ok((payments, total))
    }

    pub async fn create_vendor_payment(
        &self,
        tenant_id: Uuid,
        user_id: Option<Uuid>,
        request: CreateVendorPaymentRequest,
        idempotency: Option<PendingKey>,
    ) -> Result<PaymentVendorModel, RepositoryError> {
        let amount = positive("amount", round_money(request.amount, 2))?;
        let currency = normalize_currency("currency", &request.currency)?;
        let txn = self.db.begin().await?;

        let vendor_exists = Vendor::find_by_id(request.vendor_id)
            .filter(vendor::Column::TenantId.eq(tenant_id))
            .one(&txn)
            .await?
            .is_some();
        if !vendor_exists {
            return Err(RepositoryError::validation_with_details(
                "vendor_id does not reference a vendor of this tenant",
                json!({ "field": "vendor_id", "value": request.vendor_id }),
            ));
        }

        if let Some(booking_id) = request.booking_id {
            let booking_exists = Booking::find_by_id(booking_id)
                .filter(booking::Column::TenantId.eq(tenant_id))
                .one(&txn)
                .await?
                .is_some();
            if !booking_exists {
                return Err(RepositoryError::validation_with_details(
                    "booking_id does not reference a booking of this tenant",
                    json!({ "field": "booking_id", "value": booking_id }),
                ));
            }
        }

        let now = Utc::now();
        let payment = payment_vendor::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            vendor_id: Set(request.vendor_id),
            booking_id: Set(request.booking_id),
            amount: Set(amount),
            currency: Set(currency.clone()),
            method: Set(request.method),
            reference: Set(optional_text(request.reference)),
            paid_at: Set(request.paid_at.unwrap_or(now).into()),
            status: Set(request.status.unwrap_or_default()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        audit_log::record(
            &txn,
            NewAuditEntry {
                tenant_id,
                user_id,
                entity_type: "vendor",
                entity_id: request.vendor_id,
                action: "payment_recorded",
                changes: Some(json!({
                    "payment_id": payment.id,
                    "booking_id": request.booking_id,
                    "amount": amount.to_string(),
                    "currency": currency,
                })),
            },
        )
        .await?;

        if let Some(key) = idempotency {
            key.record(&txn, StatusCode::CREATED, &payment).await?;
        }

        txn.commit().await?;

        tracing::info!(
            vendor_id = %request.vendor_id,
            payment_id = %payment.id,
            "Vendor payment recorded"
        );
        metrics::counter!("payments_recorded_total", "direction" => "vendor").increment(1);

        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{insert_tenant, migrated_sqlite};
    use crate::models::vendor::VendorType;
    use crate::repositories::IdempotencyKeyRepository;
    use crate::repositories::idempotency_key::{StoredResponse, store_in};
    use crate::repositories::vendor::{CreateVendorRequest, VendorRepository};
    use rust_decimal_macros::dec;

    async fn insert_vendor(db: &DatabaseConnection, tenant_id: Uuid) -> Uuid {
        VendorRepository::new(db)
            .create(
                tenant_id,
                CreateVendorRequest {
                    name: "Kapadokya Transfer".to_string(),
                    vendor_type: VendorType::Transport,
                    email: None,
                    phone: None,
                    city: Some("Nevsehir".to_string()),
                },
            )
            .await
            .unwrap()
            .id
    }

    fn pending(tenant_id: Uuid, key: &str) -> PendingKey {
        PendingKey {
            tenant_id,
            key: key.to_string(),
            path: "/api/v1/payments/vendor".to_string(),
            hash: "f".repeat(64),
        }
    }

    fn vendor_payment(vendor_id: Uuid, amount: Decimal) -> CreateVendorPaymentRequest {
        CreateVendorPaymentRequest {
            vendor_id,
            booking_id: None,
            amount,
            currency: "try".to_string(),
            method: PaymentMethod::BankTransfer,
            reference: Some("  ".to_string()),
            paid_at: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_vendor_payment_defaults() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;
        let vendor = VendorRepository::new(&db)
            .create(
                tenant_id,
                CreateVendorRequest {
                    name: "Kapadokya Transfer".to_string(),
                    vendor_type: VendorType::Transport,
                    email: None,
                    phone: None,
                    city: Some("Nevsehir".to_string()),
                },
            )
            .await
            .unwrap();
        let repo = PaymentRepository::new(&db);

        let payment = repo
            .create_vendor_payment(tenant_id, None, vendor_payment(vendor.id, dec!(320.004)), None)
            .await
            .unwrap();

        assert_eq!(payment.currency, "TRY");
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.amount.round_dp(2), dec!(320.00));
        assert!(payment.reference.is_none());

        let filter = PaymentFilter {
            vendor_id: Some(vendor.id),
            ..PaymentFilter::default()
        };
        let (listed, total) = repo
            .list_vendor_payments(tenant_id, &filter, Page::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(listed[0].id, payment.id);
    }

    #[tokio::test]
    async fn test_payment_references_must_belong_to_tenant() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;
        let repo = PaymentRepository::new(&db);

        let err = repo
            .create_vendor_payment(tenant_id, None, vendor_payment(Uuid::new_v4(), dec!(10)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Validation { .. }));

        let err = repo
            .create_client_payment(
                tenant_id,
                None,
                CreateClientPaymentRequest {
                    booking_id: Uuid::new_v4(),
                    amount: dec!(10),
                    currency: None,
                    method: PaymentMethod::Cash,
                    reference: None,
                    paid_at: None,
                    status: None,
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;

        let err = PaymentRepository::new(&db)
            .create_vendor_payment(tenant_id, None, vendor_payment(Uuid::new_v4(), dec!(0)), None)
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_idempotency_key_stored_with_payment() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;
        let vendor_id = insert_vendor(&db, tenant_id).await;

        let payment = PaymentRepository::new(&db)
            .create_vendor_payment(
                tenant_id,
                None,
                vendor_payment(vendor_id, dec!(75)),
                Some(pending(tenant_id, "fuel-advance")),
            )
            .await
            .unwrap();

        let stored = IdempotencyKeyRepository::new(&db)
            .find(tenant_id, "fuel-advance")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.response_status, 201);
        assert_eq!(stored.response_body["id"], payment.id.to_string());
    }

    #[tokio::test]
    async fn test_key_claimed_concurrently_rolls_back_payment() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;
        let vendor_id = insert_vendor(&db, tenant_id).await;
        store_in(
            &db,
            tenant_id,
            StoredResponse {
                key: "fuel-advance".to_string(),
                request_path: "/api/v1/payments/vendor".to_string(),
                request_hash: "f".repeat(64),
                response_status: 201,
                response_body: json!({ "id": "first" }),
            },
        )
        .await
        .unwrap();
        let repo = PaymentRepository::new(&db);

        let err = repo
            .create_vendor_payment(
                tenant_id,
                None,
                vendor_payment(vendor_id, dec!(75)),
                Some(pending(tenant_id, "fuel-advance")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));

        let (_, total) = repo
            .list_vendor_payments(tenant_id, &PaymentFilter::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(total, 0);
    }
}
