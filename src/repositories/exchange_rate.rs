//! # Exchange Rate Repository
//!
//! Dated conversion rates per currency pair. Quotation acceptance freezes the latest
//! rate effective on or before the acceptance date into the booking.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Page, at_most, normalize_currency, positive};
use crate::error::{RepositoryError, is_unique_violation};
use crate::models::exchange_rate::{self, Entity as ExchangeRate, Model as ExchangeRateModel};
use crate::pricing::round_money;

const RATE_DECIMALS: u32 = 6;

/// Largest rate a `DECIMAL(16, 6)` column holds.
fn max_rate() -> Decimal {
    Decimal::new(9_999_999_999_999_999, RATE_DECIMALS)
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateExchangeRateRequest {
    #[schema(example = "TRY")]
    pub from_currency: String,
    #[schema(example = "EUR")]
    pub to_currency: String,
    /// Units of `to_currency` per unit of `from_currency`
    #[schema(value_type = String, example = "0.028500")]
    pub rate: Decimal,
    #[schema(value_type = String, format = Date, example = "2026-06-01")]
    pub effective_date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct ExchangeRateFilter {
    pub from_currency: Option<String>,
    pub to_currency: Option<String>,
}

pub struct ExchangeRateRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ExchangeRateRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists rates newest effective date first.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &ExchangeRateFilter,
        page: Page,
    ) -> Result<(Vec<ExchangeRateModel>, u64), RepositoryError> {
        let mut query = ExchangeRate::find().filter(exchange_rate::Column::TenantId.eq(tenant_id));
        if let Some(from) = &filter.from_currency {
            let from = normalize_currency("from_currency", from)?;
            query = query.filter(exchange_rate::Column::FromCurrency.eq(from));
        }
        if let Some(to) = &filter.to_currency {
            let to = normalize_currency("to_currency", to)?;
            query = query.filter(exchange_rate::Column::ToCurrency.eq(to));
        }

        let total = query.clone().count(self.db).await?;
        let rates = query
            .order_by_desc(exchange_rate::Column::EffectiveDate)
            .order_by_asc(exchange_rate::Column::FromCurrency)
            .order_by_asc(exchange_rate::Column::ToCurrency)
            .limit(page.limit)
            .offset(page.offset)
            .all(self.db)
            .await?;

        Ok((rates, total))
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        request: CreateExchangeRateRequest,
    ) -> Result<ExchangeRateModel, RepositoryError> {
        let from_currency = normalize_currency("from_currency", &request.from_currency)?;
        let to_currency = normalize_currency("to_currency", &request.to_currency)?;
        if from_currency == to_currency {
            return Err(RepositoryError::validation_with_details(
                "from_currency and to_currency must differ",
                json!({ "from_currency": from_currency, "to_currency": to_currency }),
            ));
        }
        let rate = positive("rate", round_money(request.rate, RATE_DECIMALS))?;
        let rate = at_most("rate", rate, max_rate())?;

        let now = Utc::now();
        let model = exchange_rate::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            from_currency: Set(from_currency.clone()),
            to_currency: Set(to_currency.clone()),
            rate: Set(rate),
            effective_date: Set(request.effective_date),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        model.insert(self.db).await.map_err(|err| {
            if is_unique_violation(&err) {
                RepositoryError::conflict(
                    "An exchange rate for this pair and date already exists",
                    Some(json!({
                        "from_currency": from_currency,
                        "to_currency": to_currency,
                        "effective_date": request.effective_date.to_string(),
                    })),
                )
            } else {
                RepositoryError::database_error(err)
            }
        })
    }
}

/// Latest rate for the pair with `effective_date <= on`. Usable inside a transaction.
pub async fn latest_on_or_before<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    from_currency: &str,
    to_currency: &str,
    on: NaiveDate,
) -> Result<Option<ExchangeRateModel>, sea_orm::DbErr> {
    ExchangeRate::find()
        .filter(exchange_rate::Column::TenantId.eq(tenant_id))
        .filter(exchange_rate::Column::FromCurrency.eq(from_currency))
        .filter(exchange_rate::Column::ToCurrency.eq(to_currency))
        .filter(exchange_rate::Column::EffectiveDate.lte(on))
        .order_by_desc(exchange_rate::Column::EffectiveDate)
        .one(db)
        .await
}
