//! # Manual Quote Repository
//!
//! Day-by-day itineraries with free-form expense lines. Every structural edit runs in
//! a transaction that ends by recomputing the PAX pricing table from the stored
//! expenses and writing it back onto the quote.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    ClientRepository, Page, at_most, non_negative, normalize_currency, required_text,
};
use crate::error::RepositoryError;
use crate::models::manual_quote::{
    self, Entity as ManualQuote, Model as ManualQuoteModel, TransportPricing,
};
use crate::models::manual_quote_day::{self, Entity as ManualQuoteDay, Model as DayModel};
use crate::models::manual_quote_expense::{
    self, Entity as ManualQuoteExpense, ExpenseCategory, Model as ExpenseModel,
};
use crate::pricing::{ExpenseLine, PricingSettings, build_pricing_table, round_money};

const DEFAULT_CURRENCY: &str = "EUR";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateManualQuoteRequest {
    pub client_id: Option<Uuid>,
    #[schema(example = "Istanbul & Cappadocia, 7 days")]
    pub title: String,
    pub currency: Option<String>,
    #[schema(value_type = Option<String>, example = "15")]
    pub markup_percent: Option<Decimal>,
    #[schema(value_type = Option<String>, example = "10")]
    pub tax_percent: Option<Decimal>,
    pub transport_pricing: Option<TransportPricing>,
}

/// Quote-level settings; every field is optional
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateManualQuoteRequest {
    pub client_id: Option<Uuid>,
    pub title: Option<String>,
    pub currency: Option<String>,
    #[schema(value_type = Option<String>)]
    pub markup_percent: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub tax_percent: Option<Decimal>,
    pub transport_pricing: Option<TransportPricing>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddDayRequest {
    #[schema(example = "Arrival in Istanbul")]
    pub title: String,
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddExpenseRequest {
    pub category: ExpenseCategory,
    #[schema(example = "Hot air balloon flight")]
    pub description: String,
    #[schema(value_type = String, example = "180.00")]
    pub price: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateExpenseRequest {
    pub category: Option<ExpenseCategory>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ManualQuoteDayDetail {
    #[serde(flatten)]
    pub day: DayModel,
    pub expenses: Vec<ExpenseModel>,
}

/// Quote with its itinerary. The pricing table is the stored `pricing_table`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ManualQuoteDetail {
    #[serde(flatten)]
    pub quote: ManualQuoteModel,
    pub days: Vec<ManualQuoteDayDetail>,
}

/// Largest percentage a `DECIMAL(7, 2)` column holds.
fn max_percent() -> Decimal {
    Decimal::new(9_999_999, 2)
}

fn percent(field: &str, value: Decimal) -> Result<Decimal, RepositoryError> {
    at_most(field, round_money(non_negative(field, value)?, 2), max_percent())
}

fn expense_price(value: Decimal) -> Result<Decimal, RepositoryError> {
    non_negative("price", round_money(value, 2))
}

fn settings_of(quote: &ManualQuoteModel) -> PricingSettings {
    PricingSettings {
        markup_percent: quote.markup_percent,
        tax_percent: quote.tax_percent,
        transport_pricing: quote.transport_pricing,
    }
}

/// Recomputes the pricing table from the stored expenses and persists it.
async fn refresh_pricing<C: ConnectionTrait>(
    db: &C,
    quote: ManualQuoteModel,
) -> Result<ManualQuoteModel, RepositoryError> {
    let expenses = ManualQuoteExpense::find()
        .filter(manual_quote_expense::Column::ManualQuoteId.eq(quote.id))
        .all(db)
        .await?;
    let lines: Vec<ExpenseLine> = expenses.iter().map(ExpenseLine::from).collect();
    let table = build_pricing_table(&lines, &settings_of(&quote));

    let quote_id = quote.id;
    let mut model = quote.into_active_model();
    model.pricing_table = Set(Some(json!(table)));
    model.updated_at = Set(Utc::now().into());
    let updated = model.update(db).await?;

    tracing::debug!(manual_quote_id = %quote_id, lines = lines.len(), "Pricing table refreshed");
    Ok(updated)
}

pub struct ManualQuoteRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ManualQuoteRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        include_inactive: bool,
        page: Page,
    ) -> Result<(Vec<ManualQuoteModel>, u64), RepositoryError> {
        let mut query = ManualQuote::find().filter(manual_quote::Column::TenantId.eq(tenant_id));
        if !include_inactive {
            query = query.filter(manual_quote::Column::IsActive.eq(true));
        }

        let total = query.clone().count(self.db).await?;
        let quotes = query
            .order_by_desc(manual_quote::Column::UpdatedAt)
            .order_by_asc(manual_quote::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(self.db)
            .await?;

        Ok((quotes, total))
    }

    pub async fn get_detail(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<ManualQuoteDetail, RepositoryError> {
        let quote = ManualQuote::find_by_id(id)
            .filter(manual_quote::Column::TenantId.eq(tenant_id))
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Manual quote not found"))?;

        let days = quote
            .find_related(ManualQuoteDay)
            .order_by_asc(manual_quote_day::Column::DayNumber)
            .all(self.db)
            .await?;
        let expenses = ManualQuoteExpense::find()
            .filter(manual_quote_expense::Column::ManualQuoteId.eq(id))
            .order_by_asc(manual_quote_expense::Column::CreatedAt)
            .order_by_asc(manual_quote_expense::Column::Id)
            .all(self.db)
            .await?;

        let days = days
            .into_iter()
            .map(|day| {
                let own = expenses
                    .iter()
                    .filter(|expense| expense.manual_quote_day_id == day.id)
                    .cloned()
                    .collect();
                ManualQuoteDayDetail { day, expenses: own }
            })
            .collect();

        Ok(ManualQuoteDetail { quote, days })
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        request: CreateManualQuoteRequest,
    ) -> Result<ManualQuoteModel, RepositoryError> {
        if let Some(client_id) = request.client_id {
            self.ensure_client(tenant_id, client_id).await?;
        }
        let currency = request.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);
        let currency = normalize_currency("currency", currency)?;
        let markup = percent("markup_percent", request.markup_percent.unwrap_or_default())?;
        let tax = percent("tax_percent", request.tax_percent.unwrap_or_default())?;

        let now = Utc::now();
        let model = manual_quote::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            client_id: Set(request.client_id),
            title: Set(required_text("title", &request.title)?),
            currency: Set(currency),
            markup_percent: Set(markup),
            tax_percent: Set(tax),
            transport_pricing: Set(request.transport_pricing.unwrap_or_default()),
            pricing_table: Set(None),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let txn = self.db.begin().await?;
        let quote = model.insert(&txn).await?;
        let quote = refresh_pricing(&txn, quote).await?;
        txn.commit().await?;

        Ok(quote)
    }

    pub async fn update_settings(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        request: UpdateManualQuoteRequest,
    ) -> Result<ManualQuoteModel, RepositoryError> {
        if let Some(client_id) = request.client_id {
            self.ensure_client(tenant_id, client_id).await?;
        }

        let txn = self.db.begin().await?;
        let quote = active_quote(&txn, tenant_id, id).await?;

        let mut model = quote.into_active_model();
        if let Some(client_id) = request.client_id {
            model.client_id = Set(Some(client_id));
        }
        if let Some(title) = request.title {
            model.title = Set(required_text("title", &title)?);
        }
        if let Some(currency) = request.currency {
            model.currency = Set(normalize_currency("currency", &currency)?);
        }
        if let Some(markup) = request.markup_percent {
            model.markup_percent = Set(percent("markup_percent", markup)?);
        }
        if let Some(tax) = request.tax_percent {
            model.tax_percent = Set(percent("tax_percent", tax)?);
        }
        if let Some(mode) = request.transport_pricing {
            model.transport_pricing = Set(mode);
        }

        let quote = model.update(&txn).await?;
        let quote = refresh_pricing(&txn, quote).await?;
        txn.commit().await?;

        Ok(quote)
    }

    /// Appends a day after the current last day.
    pub async fn add_day(
        &self,
        tenant_id: Uuid,
        quote_id: Uuid,
        request: AddDayRequest,
    ) -> Result<DayModel, RepositoryError> {
        let title = required_text("title", &request.title)?;
        let txn = self.db.begin().await?;
        let quote = active_quote(&txn, tenant_id, quote_id).await?;

        let last = ManualQuoteDay::find()
            .filter(manual_quote_day::Column::ManualQuoteId.eq(quote_id))
            .order_by_desc(manual_quote_day::Column::DayNumber)
            .one(&txn)
            .await?;
        let day_number = last.map_or(1, |day| day.day_number + 1);

        let now = Utc::now();
        let day = manual_quote_day::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            manual_quote_id: Set(quote_id),
            day_number: Set(day_number),
            date: Set(request.date),
            title: Set(title),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        refresh_pricing(&txn, quote).await?;
        txn.commit().await?;

        Ok(day)
    }

    /// Removes a day with its expenses and closes the gap in day numbering.
    pub async fn delete_day(
        &self,
        tenant_id: Uuid,
        quote_id: Uuid,
        day_id: Uuid,
    ) -> Result<ManualQuoteModel, RepositoryError> {
        let txn = self.db.begin().await?;
        let quote = active_quote(&txn, tenant_id, quote_id).await?;
        let day = quote_day(&txn, quote_id, day_id).await?;

        ManualQuoteExpense::delete_many()
            .filter(manual_quote_expense::Column::ManualQuoteDayId.eq(day.id))
            .exec(&txn)
            .await?;
        let removed_number = day.day_number;
        day.delete(&txn).await?;

        let later_days = ManualQuoteDay::find()
            .filter(manual_quote_day::Column::ManualQuoteId.eq(quote_id))
            .filter(manual_quote_day::Column::DayNumber.gt(removed_number))
            .order_by_asc(manual_quote_day::Column::DayNumber)
            .all(&txn)
            .await?;
        for later in later_days {
            let number = later.day_number;
            let mut model = later.into_active_model();
            model.day_number = Set(number - 1);
            model.updated_at = Set(Utc::now().into());
            model.update(&txn).await?;
        }

        let quote = refresh_pricing(&txn, quote).await?;
        txn.commit().await?;

        Ok(quote)
    }

    pub async fn add_expense(
        &self,
        tenant_id: Uuid,
        quote_id: Uuid,
        day_id: Uuid,
        request: AddExpenseRequest,
    ) -> Result<ExpenseModel, RepositoryError> {
        let description = required_text("description", &request.description)?;
        let price = expense_price(request.price)?;

        let txn = self.db.begin().await?;
        let quote = active_quote(&txn, tenant_id, quote_id).await?;
        let day = quote_day(&txn, quote_id, day_id).await?;

        let now = Utc::now();
        let expense = manual_quote_expense::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            manual_quote_id: Set(quote_id),
            manual_quote_day_id: Set(day.id),
            category: Set(request.category),
            description: Set(description),
            price: Set(price),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        refresh_pricing(&txn, quote).await?;
        txn.commit().await?;

        Ok(expense)
    }

    pub async fn update_expense(
        &self,
        tenant_id: Uuid,
        quote_id: Uuid,
        expense_id: Uuid,
        request: UpdateExpenseRequest,
    ) -> Result<ExpenseModel, RepositoryError> {
        let txn = self.db.begin().await?;
        let quote = active_quote(&txn, tenant_id, quote_id).await?;
        let expense = quote_expense(&txn, quote_id, expense_id).await?;

        let mut model = expense.into_active_model();
        if let Some(category) = request.category {
            model.category = Set(category);
        }
        if let Some(description) = request.description {
            model.description = Set(required_text("description", &description)?);
        }
        if let Some(value) = request.price {
            model.price = Set(expense_price(value)?);
        }
        model.updated_at = Set(Utc::now().into());
        let expense = model.update(&txn).await?;

        refresh_pricing(&txn, quote).await?;
        txn.commit().await?;

        Ok(expense)
    }

    pub async fn delete_expense(
        &self,
        tenant_id: Uuid,
        quote_id: Uuid,
        expense_id: Uuid,
    ) -> Result<ManualQuoteModel, RepositoryError> {
        let txn = self.db.begin().await?;
        let quote = active_quote(&txn, tenant_id, quote_id).await?;
        quote_expense(&txn, quote_id, expense_id)
            .await?
            .delete(&txn)
            .await?;

        let quote = refresh_pricing(&txn, quote).await?;
        txn.commit().await?;

        Ok(quote)
    }

    pub async fn deactivate(&self, tenant_id: Uuid, id: Uuid) -> Result<(), RepositoryError> {
        let quote = ManualQuote::find_by_id(id)
            .filter(manual_quote::Column::TenantId.eq(tenant_id))
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Manual quote not found"))?;

        let mut model = quote.into_active_model();
        model.is_active = Set(false);
        model.updated_at = Set(Utc::now().into());
        model.update(self.db).await?;
        Ok(())
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

async fn active_quote(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    id: Uuid,
) -> Result<ManualQuoteModel, RepositoryError> {
    let quote = ManualQuote::find_by_id(id)
        .filter(manual_quote::Column::TenantId.eq(tenant_id))
        .one(txn)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Manual quote not found"))?;
    if !quote.is_active {
        return Err(RepositoryError::conflict(
            "Manual quote is deactivated",
            Some(json!({ "id": id })),
        ));
    }
    Ok(quote)
}

async fn quote_day(
    txn: &DatabaseTransaction,
    quote_id: Uuid,
    day_id: Uuid,
) -> Result<DayModel, RepositoryError> {
    ManualQuoteDay::find_by_id(day_id)
        .filter(manual_quote_day::Column::ManualQuoteId.eq(quote_id))
        .one(txn)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Manual quote day not found"))
}

async fn quote_expense(
    txn: &DatabaseTransaction,
    quote_id: Uuid,
    expense_id: Uuid,
) -> Result<ExpenseModel, RepositoryError> {
    ManualQuoteExpense::find_by_id(expense_id)
        .filter(manual_quote_expense::Column::ManualQuoteId.eq(quote_id))
        .one(txn)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Manual quote expense not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{insert_tenant, migrated_sqlite};
    use crate::pricing::PaxPrice;
    use rust_decimal_macros::dec;

    fn stored_table(quote: &ManualQuoteModel) -> Vec<PaxPrice> {
        serde_json::from_value(quote.pricing_table.clone().unwrap()).unwrap()
    }

    fn new_quote(markup: Decimal) -> CreateManualQuoteRequest {
        CreateManualQuoteRequest {
            client_id: None,
            title: "Cappadocia weekend".to_string(),
            currency: None,
            markup_percent: Some(markup),
            tax_percent: None,
            transport_pricing: Some(TransportPricing::PerVehicle),
        }
    }

    #[tokio::test]
    async fn test_new_quote_has_zero_table() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;

        let quote = ManualQuoteRepository::new(&db)
            .create(tenant_id, new_quote(dec!(10)))
            .await
            .unwrap();

        let table = stored_table(&quote);
        assert_eq!(table.len(), 5);
        assert!(table.iter().all(|row| row.sell_total.is_zero()));
        assert_eq!(quote.currency, "EUR");
    }

    #[tokio::test]
    async fn test_expense_edits_refresh_table() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;
        let repo = ManualQuoteRepository::new(&db);
        let quote = repo.create(tenant_id, new_quote(dec!(0))).await.unwrap();

        let day = repo
            .add_day(
                tenant_id,
                quote.id,
                AddDayRequest {
                    title: "Goreme".to_string(),
                    date: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(day.day_number, 1);

        let van = repo
            .add_expense(
                tenant_id,
                quote.id,
                day.id,
                AddExpenseRequest {
                    category: ExpenseCategory::Transportation,
                    description: "Minivan".to_string(),
                    price: dec!(100),
                },
            )
            .await
            .unwrap();
        repo.add_expense(
            tenant_id,
            quote.id,
            day.id,
            AddExpenseRequest {
                category: ExpenseCategory::Meal,
                description: "Dinner".to_string(),
                price: dec!(20),
            },
        )
        .await
        .unwrap();

        let detail = repo.get_detail(tenant_id, quote.id).await.unwrap();
        let table = stored_table(&detail.quote);
        // vehicle fixed at 100, dinner 20 per head
        assert_eq!(table[0].sell_total.round_dp(2), dec!(140.00));
        assert_eq!(table[4].sell_total.round_dp(2), dec!(300.00));
        assert_eq!(detail.days[0].expenses.len(), 2);

        repo.delete_expense(tenant_id, quote.id, van.id).await.unwrap();
        let detail = repo.get_detail(tenant_id, quote.id).await.unwrap();
        assert_eq!(stored_table(&detail.quote)[0].sell_total.round_dp(2), dec!(40.00));
    }

    #[tokio::test]
    async fn test_delete_day_renumbers() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;
        let repo = ManualQuoteRepository::new(&db);
        let quote = repo.create(tenant_id, new_quote(dec!(0))).await.unwrap();

        let mut ids = Vec::new();
        for title in ["Istanbul", "Cappadocia", "Ephesus"] {
            let day = repo
                .add_day(
                    tenant_id,
                    quote.id,
                    AddDayRequest {
                        title: title.to_string(),
                        date: None,
                    },
                )
                .await
                .unwrap();
            ids.push(day.id);
        }

        repo.delete_day(tenant_id, quote.id, ids[0]).await.unwrap();

        let detail = repo.get_detail(tenant_id, quote.id).await.unwrap();
        let days: Vec<_> = detail
            .days
            .iter()
            .map(|d| (d.day.title.as_str(), d.day.day_number))
            .collect();
        assert_eq!(days, [("Cappadocia", 1), ("Ephesus", 2)]);
    }

    #[tokio::test]
    async fn test_negative_inputs_rejected() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;
        let repo = ManualQuoteRepository::new(&db);

        let err = repo.create(tenant_id, new_quote(dec!(-1))).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Validation { .. }));

        let quote = repo.create(tenant_id, new_quote(dec!(5))).await.unwrap();
        let day = repo
            .add_day(
                tenant_id,
                quote.id,
                AddDayRequest {
                    title: "Day".to_string(),
                    date: None,
                },
            )
            .await
            .unwrap();
        let err = repo
            .add_expense(
                tenant_id,
                quote.id,
                day.id,
                AddExpenseRequest {
                    category: ExpenseCategory::Other,
                    description: "Refund".to_string(),
                    price: dec!(-5),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_deactivated_quote_rejects_edits() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;
        let repo = ManualQuoteRepository::new(&db);
        let quote = repo.create(tenant_id, new_quote(dec!(0))).await.unwrap();

        repo.deactivate(tenant_id, quote.id).await.unwrap();

        let err = repo
            .update_settings(
                tenant_id,
                quote.id,
                UpdateManualQuoteRequest {
                    tax_percent: Some(dec!(18)),
                    ..UpdateManualQuoteRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));

        let (active, _) = repo.list(tenant_id, false, Page::default()).await.unwrap();
        assert!(active.is_empty());
    }
}
