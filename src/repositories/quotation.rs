//! # Quotation Repository
//!
//! Creation, editing and reads of quotations. Status transitions live in
//! [`crate::quotation_workflow`].

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ClientRepository, Page, at_most, max_amount, normalize_currency, required_text};
use crate::error::RepositoryError;
use crate::models::quotation::{
    self, Entity as Quotation, Model as QuotationModel, QuotationItem, QuotationStatus,
};
use crate::pricing::round_money;

const DEFAULT_CURRENCY: &str = "EUR";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateQuotationRequest {
    pub client_id: Option<Uuid>,
    #[schema(example = "Cappadocia 4 nights")]
    pub title: String,
    /// Defaults to EUR
    pub currency: Option<String>,
    #[serde(default)]
    pub items: Vec<QuotationItem>,
    #[schema(value_type = Option<String>, format = Date)]
    pub travel_start: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub travel_end: Option<NaiveDate>,
}

/// Partial update of a DRAFT quotation; `items` replaces the whole list when present
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateQuotationRequest {
    pub client_id: Option<Uuid>,
    pub title: Option<String>,
    pub currency: Option<String>,
    pub items: Option<Vec<QuotationItem>>,
    #[schema(value_type = Option<String>, format = Date)]
    pub travel_start: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub travel_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct QuotationFilter {
    pub status: Option<QuotationStatus>,
    pub client_id: Option<Uuid>,
}

/// Checks every line and returns the cleaned items with their rounded total.
pub fn validate_items(
    items: Vec<QuotationItem>,
) -> Result<(Vec<QuotationItem>, Decimal), RepositoryError> {
    let mut cleaned = Vec::with_capacity(items.len());
    let mut total = Decimal::ZERO;

    for (index, mut item) in items.into_iter().enumerate() {
        let reject = |message: &str| {
            RepositoryError::validation_with_details(
                format!("items[{index}]: {message}"),
                json!({ "field": format!("items[{index}]") }),
            )
        };

        item.description = item.description.trim().to_string();
        item.service_type = item.service_type.trim().to_ascii_uppercase();
        if item.description.is_empty() {
            return Err(reject("description cannot be empty"));
        }
        if item.service_type.is_empty() {
            return Err(reject("service_type cannot be empty"));
        }
        if item.quantity < 1 {
            return Err(reject("quantity must be at least 1"));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(reject("unit_price must not be negative"));
        }
        if item.unit_price > max_amount() {
            return Err(reject(&format!("unit_price cannot exceed {}", max_amount())));
        }

        total += item.line_total();
        cleaned.push(item);
    }

    let total = at_most("total_price", round_money(total, 2), max_amount())?;
    Ok((cleaned, total))
}

/// Decodes the stored `items` column. A payload that no longer decodes is reported
/// as a validation failure of the quotation.
pub fn parse_items(items: &serde_json::Value) -> Result<Vec<QuotationItem>, RepositoryError> {
    serde_json::from_value(items.clone()).map_err(|err| {
        RepositoryError::validation_with_details(
            "Quotation items are malformed",
            json!({ "reason": err.to_string() }),
        )
    })
}

fn validate_travel_dates(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), RepositoryError> {
    if let (Some(start), Some(end)) = (start, end)
        && start > end
    {
        return Err(RepositoryError::validation_with_details(
            "travel_start must be on or before travel_end",
            json!({ "travel_start": start.to_string(), "travel_end": end.to_string() }),
        ));
    }
    Ok(())
}

fn items_json(items: &[QuotationItem]) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(items).map_err(|err| {
        RepositoryError::validation_with_details(
            "Quotation items could not be encoded",
            json!({ "reason": err.to_string() }),
        )
    })
}

pub struct QuotationRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> QuotationRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &QuotationFilter,
        page: Page,
    ) -> Result<(Vec<QuotationModel>, u64), RepositoryError> {
        let mut query = Quotation::find().filter(quotation::Column::TenantId.eq(tenant_id));
        if let Some(status) = filter.status {
            query = query.filter(quotation::Column::Status.eq(status));
        }
        if let Some(client_id) = filter.client_id {
            query = query.filter(quotation::Column::ClientId.eq(client_id));
        }

        let total = query.clone().count(self.db).await?;
        let quotations = query
            .order_by_desc(quotation::Column::CreatedAt)
            .order_by_asc(quotation::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(self.db)
            .await?;

        Ok((quotations, total))
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<QuotationModel, RepositoryError> {
        Quotation::find_by_id(id)
            .filter(quotation::Column::TenantId.eq(tenant_id))
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Quotation not found"))
    }

    /// Creates a DRAFT quotation with the total computed from its items.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        request: CreateQuotationRequest,
    ) -> Result<QuotationModel, RepositoryError> {
        if let Some(client_id) = request.client_id {
            self.ensure_client(tenant_id, client_id).await?;
        }
        validate_travel_dates(request.travel_start, request.travel_end)?;
        let currency = request.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);
        let currency = normalize_currency("currency", currency)?;
        let (items, total) = validate_items(request.items)?;

        let now = Utc::now();
        let model = quotation::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            client_id: Set(request.client_id),
            title: Set(required_text("title", &request.title)?),
            status: Set(QuotationStatus::Draft),
            currency: Set(currency),
            items: Set(items_json(&items)?),
            total_price: Set(total),
            travel_start: Set(request.travel_start),
            travel_end: Set(request.travel_end),
            sent_at: Set(None),
            accepted_at: Set(None),
            rejected_at: Set(None),
            rejection_reason: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        Ok(model.insert(self.db).await?)
    }

    /// Edits a quotation that is still a DRAFT.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        request: UpdateQuotationRequest,
    ) -> Result<QuotationModel, RepositoryError> {
        let existing = self.get(tenant_id, id).await?;
        if existing.status != QuotationStatus::Draft {
            return Err(RepositoryError::conflict(
                "Only DRAFT quotations can be edited",
                Some(json!({ "status": existing.status.as_str() })),
            ));
        }

        let travel_start = request.travel_start.or(existing.travel_start);
        let travel_end = request.travel_end.or(existing.travel_end);
        validate_travel_dates(travel_start, travel_end)?;

        let mut model = existing.into_active_model();
        if let Some(client_id) = request.client_id {
            self.ensure_client(tenant_id, client_id).await?;
            model.client_id = Set(Some(client_id));
        }
        if let Some(title) = request.title {
            model.title = Set(required_text("title", &title)?);
        }
        if let Some(currency) = request.currency {
            model.currency = Set(normalize_currency("currency", &currency)?);
        }
        if let Some(items) = request.items {
            let (items, total) = validate_items(items)?;
            model.items = Set(items_json(&items)?);
            model.total_price = Set(total);
        }
        model.travel_start = Set(travel_start);
        model.travel_end = Set(travel_end);
        model.updated_at = Set(Utc::now().into());

        Ok(model.update(self.db).await?)
    }

    async fn ensure_client(&self, tenant_id: Uuid, client_id: Uuid) -> Result<(), RepositoryError> {
        match ClientRepository::new(self.db).find(tenant_id, client_id).await? {
            Some(_) => Ok(()),
            None => Err(RepositoryError::validation_with_details(
                "client_id does not reference a client of this tenant",
                json!({ "field": "client_id", "value": client_id }),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(quantity: i32, unit_price: Decimal) -> QuotationItem {
        QuotationItem {
            service_type: "hotel_room".to_string(),
            service_offering_id: None,
            description: "Cave room, BB".to_string(),
            service_date: None,
            quantity,
            unit_price,
        }
    }

    #[test]
    fn test_validate_items_totals_lines() {
        let (items, total) =
            validate_items(vec![item(3, dec!(120.00)), item(2, dec!(45.50))]).unwrap();

        assert_eq!(total, dec!(451.00));
        assert_eq!(items[0].service_type, "HOTEL_ROOM");
    }

    #[test]
    fn test_validate_items_rejects_bad_lines() {
        assert!(validate_items(vec![item(0, dec!(10))]).is_err());
        assert!(validate_items(vec![item(1, dec!(-1))]).is_err());

        let mut blank = item(1, dec!(10));
        blank.description = "   ".to_string();
        assert!(validate_items(vec![blank]).is_err());
    }

    #[test]
    fn test_validate_items_bounds_prices_and_total() {
        assert!(validate_items(vec![item(1, dec!(1000000000000))]).is_err());
        assert!(validate_items(vec![item(i32::MAX, dec!(999999999999.99))]).is_err());
        assert!(validate_items(vec![item(1, dec!(999999999999.99))]).is_ok());
    }

    #[test]
    fn test_empty_items_total_zero() {
        let (items, total) = validate_items(Vec::new()).unwrap();
        assert!(items.is_empty());
        assert!(total.is_zero());
    }

    #[test]
    fn test_parse_items_reports_malformed_json() {
        let err = parse_items(&json!([{ "description": "no quantity" }])).unwrap_err();
        assert!(matches!(err, RepositoryError::Validation { .. }));

        let parsed = parse_items(&json!([{
            "service_type": "TRANSFER",
            "service_offering_id": null,
            "description": "Airport pickup",
            "service_date": "2026-06-01",
            "quantity": 1,
            "unit_price": "60.00"
        }]))
        .unwrap();
        assert_eq!(parsed[0].line_total(), dec!(60.00));
    }

    #[test]
    fn test_travel_dates_order() {
        let start = NaiveDate::from_ymd_opt(2026, 6, 10);
        let end = NaiveDate::from_ymd_opt(2026, 6, 1);
        assert!(validate_travel_dates(start, end).is_err());
        assert!(validate_travel_dates(end, start).is_ok());
        assert!(validate_travel_dates(start, None).is_ok());
    }
}
