//! # Rate Repository
//!
//! Kind-specific writes for the five seasonal rate tables. Every create and update
//! runs the overlap check and the write in one transaction; reads and deactivation
//! go through the generic helpers in [`crate::rates`].

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, IntoActiveModel, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ServiceOfferingRepository, non_negative, normalize_currency, optional_text};
use crate::error::RepositoryError;
use crate::models::hotel_room_rate::BoardType;
use crate::models::{activity_rate, guide_rate, hotel_room_rate, transfer_rate, vehicle_rate};
use crate::rates::{
    OverlapScope, RateFilter, RateKind, SeasonRange, deactivate_rate, ensure_no_overlap,
    get_rate, list_rates,
};

const DEFAULT_CURRENCY: &str = "EUR";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HotelRoomRateRequest {
    pub service_offering_id: Uuid,
    pub board_type: BoardType,
    #[schema(value_type = String, format = Date, example = "2026-05-01")]
    pub season_from: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2026-09-30")]
    pub season_to: NaiveDate,
    #[schema(value_type = String, example = "95.00")]
    pub price_single: Decimal,
    #[schema(value_type = String, example = "120.00")]
    pub price_double: Decimal,
    #[schema(value_type = Option<String>)]
    pub price_triple: Option<Decimal>,
    /// Defaults to EUR
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferRateRequest {
    pub service_offering_id: Uuid,
    #[schema(value_type = String, format = Date)]
    pub season_from: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub season_to: NaiveDate,
    #[schema(value_type = String, example = "80.00")]
    pub price_per_vehicle: Decimal,
    #[schema(example = 14)]
    pub vehicle_capacity: i32,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VehicleRateRequest {
    pub service_offering_id: Uuid,
    #[schema(value_type = String, format = Date)]
    pub season_from: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub season_to: NaiveDate,
    #[schema(value_type = String, example = "150.00")]
    pub daily_rate: Decimal,
    #[schema(value_type = Option<String>)]
    pub half_day_rate: Option<Decimal>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GuideRateRequest {
    pub service_offering_id: Uuid,
    #[schema(value_type = String, format = Date)]
    pub season_from: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub season_to: NaiveDate,
    #[schema(value_type = String, example = "110.00")]
    pub daily_rate: Decimal,
    #[schema(example = "en")]
    pub language: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityRateRequest {
    pub service_offering_id: Uuid,
    #[schema(value_type = String, format = Date)]
    pub season_from: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub season_to: NaiveDate,
    #[schema(value_type = String, example = "45.00")]
    pub adult_price: Decimal,
    #[schema(value_type = Option<String>)]
    pub child_price: Option<Decimal>,
    pub currency: Option<String>,
}

/// Create/update body of any rate kind. The kind is taken from the request path, so
/// bodies are decoded with [`RateRequest::from_json`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum RateRequest {
    HotelRoom(HotelRoomRateRequest),
    Transfer(TransferRateRequest),
    Vehicle(VehicleRateRequest),
    Guide(GuideRateRequest),
    Activity(ActivityRateRequest),
}

/// Stored rate of any kind.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum RateRecord {
    HotelRoom(hotel_room_rate::Model),
    Transfer(transfer_rate::Model),
    Vehicle(vehicle_rate::Model),
    Guide(guide_rate::Model),
    Activity(activity_rate::Model),
}

impl RateRequest {
    /// Decodes `body` as the request shape of `kind`.
    pub fn from_json(kind: RateKind, body: serde_json::Value) -> Result<Self, RepositoryError> {
        let decoded = match kind {
            RateKind::HotelRoom => serde_json::from_value(body).map(RateRequest::HotelRoom),
            RateKind::Transfer => serde_json::from_value(body).map(RateRequest::Transfer),
            RateKind::Vehicle => serde_json::from_value(body).map(RateRequest::Vehicle),
            RateKind::Guide => serde_json::from_value(body).map(RateRequest::Guide),
            RateKind::Activity => serde_json::from_value(body).map(RateRequest::Activity),
        };
        decoded.map_err(|err| {
            RepositoryError::validation_with_details(
                format!("Invalid {kind} rate body"),
                json!({ "reason": err.to_string() }),
            )
        })
    }

    pub fn kind(&self) -> RateKind {
        match self {
            RateRequest::HotelRoom(_) => RateKind::HotelRoom,
            RateRequest::Transfer(_) => RateKind::Transfer,
            RateRequest::Vehicle(_) => RateKind::Vehicle,
            RateRequest::Guide(_) => RateKind::Guide,
            RateRequest::Activity(_) => RateKind::Activity,
        }
    }

    fn common(&self) -> (Uuid, NaiveDate, NaiveDate, Option<&str>) {
        match self {
            RateRequest::HotelRoom(r) => {
                (r.service_offering_id, r.season_from, r.season_to, r.currency.as_deref())
            }
            RateRequest::Transfer(r) => {
                (r.service_offering_id, r.season_from, r.season_to, r.currency.as_deref())
            }
            RateRequest::Vehicle(r) => {
                (r.service_offering_id, r.season_from, r.season_to, r.currency.as_deref())
            }
            RateRequest::Guide(r) => {
                (r.service_offering_id, r.season_from, r.season_to, r.currency.as_deref())
            }
            RateRequest::Activity(r) => {
                (r.service_offering_id, r.season_from, r.season_to, r.currency.as_deref())
            }
        }
    }

    /// Board type is part of the uniqueness key for hotel rooms only.
    fn overlap_extra(&self) -> Option<Condition> {
        match self {
            RateRequest::HotelRoom(r) => {
                Some(Condition::all().add(hotel_room_rate::Column::BoardType.eq(r.board_type)))
            }
            _ => None,
        }
    }
}

/// Validated fields every rate kind shares.
struct CommonFields {
    service_offering_id: Uuid,
    season: SeasonRange,
    currency: String,
}

pub struct RateRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> RateRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        kind: RateKind,
        filter: &RateFilter,
    ) -> Result<(Vec<RateRecord>, u64), RepositoryError> {
        let db = self.db;
        let (records, total) = match kind {
            RateKind::HotelRoom => {
                let (rows, total) =
                    list_rates::<hotel_room_rate::Entity, _>(db, tenant_id, filter).await?;
                (rows.into_iter().map(RateRecord::HotelRoom).collect(), total)
            }
            RateKind::Transfer => {
                let (rows, total) =
                    list_rates::<transfer_rate::Entity, _>(db, tenant_id, filter).await?;
                (rows.into_iter().map(RateRecord::Transfer).collect(), total)
            }
            RateKind::Vehicle => {
                let (rows, total) =
                    list_rates::<vehicle_rate::Entity, _>(db, tenant_id, filter).await?;
                (rows.into_iter().map(RateRecord::Vehicle).collect(), total)
            }
            RateKind::Guide => {
                let (rows, total) =
                    list_rates::<guide_rate::Entity, _>(db, tenant_id, filter).await?;
                (rows.into_iter().map(RateRecord::Guide).collect(), total)
            }
            RateKind::Activity => {
                let (rows, total) =
                    list_rates::<activity_rate::Entity, _>(db, tenant_id, filter).await?;
                (rows.into_iter().map(RateRecord::Activity).collect(), total)
            }
        };
        Ok((records, total))
    }

    pub async fn get(
        &self,
        tenant_id: Uuid,
        kind: RateKind,
        id: Uuid,
    ) -> Result<RateRecord, RepositoryError> {
        let db = self.db;
        Ok(match kind {
            RateKind::HotelRoom => {
                let rate = get_rate::<hotel_room_rate::Entity, _>(db, tenant_id, id).await?;
                RateRecord::HotelRoom(rate)
            }
            RateKind::Transfer => {
                let rate = get_rate::<transfer_rate::Entity, _>(db, tenant_id, id).await?;
                RateRecord::Transfer(rate)
            }
            RateKind::Vehicle => {
                let rate = get_rate::<vehicle_rate::Entity, _>(db, tenant_id, id).await?;
                RateRecord::Vehicle(rate)
            }
            RateKind::Guide => {
                let rate = get_rate::<guide_rate::Entity, _>(db, tenant_id, id).await?;
                RateRecord::Guide(rate)
            }
            RateKind::Activity => {
                let rate = get_rate::<activity_rate::Entity, _>(db, tenant_id, id).await?;
                RateRecord::Activity(rate)
            }
        })
    }

    pub async fn deactivate(
        &self,
        tenant_id: Uuid,
        kind: RateKind,
        id: Uuid,
    ) -> Result<(), RepositoryError> {
        let db = self.db;
        match kind {
            RateKind::HotelRoom => {
                deactivate_rate::<hotel_room_rate::Entity, _>(db, tenant_id, id).await
            }
            RateKind::Transfer => {
                deactivate_rate::<transfer_rate::Entity, _>(db, tenant_id, id).await
            }
            RateKind::Vehicle => {
                deactivate_rate::<vehicle_rate::Entity, _>(db, tenant_id, id).await
            }
            RateKind::Guide => {
                deactivate_rate::<guide_rate::Entity, _>(db, tenant_id, id).await
            }
            RateKind::Activity => {
                deactivate_rate::<activity_rate::Entity, _>(db, tenant_id, id).await
            }
        }
    }

    /// Creates a rate after checking its season against active rates of the same key.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        request: RateRequest,
    ) -> Result<RateRecord, RepositoryError> {
        let common = self.validate_common(tenant_id, &request).await?;
        let scope = OverlapScope {
            tenant_id,
            service_offering_id: common.service_offering_id,
            extra: request.overlap_extra(),
            exclude_id: None,
        };
        let now = Utc::now();
        let id = Uuid::new_v4();

        let txn = self.db.begin().await?;
        let record = match request {
            RateRequest::HotelRoom(req) => {
                ensure_no_overlap::<hotel_room_rate::Entity, _>(&txn, &scope, &common.season)
                    .await?;
                let mut model = hotel_room_rate::ActiveModel {
                    id: Set(id),
                    tenant_id: Set(tenant_id),
                    is_active: Set(true),
                    created_at: Set(now.into()),
                    ..Default::default()
                };
                apply_hotel_room(&mut model, req, &common)?;
                RateRecord::HotelRoom(model.insert(&txn).await?)
            }
            RateRequest::Transfer(req) => {
                ensure_no_overlap::<transfer_rate::Entity, _>(&txn, &scope, &common.season)
                    .await?;
                let mut model = transfer_rate::ActiveModel {
                    id: Set(id),
                    tenant_id: Set(tenant_id),
                    is_active: Set(true),
                    created_at: Set(now.into()),
                    ..Default::default()
                };
                apply_transfer(&mut model, req, &common)?;
                RateRecord::Transfer(model.insert(&txn).await?)
            }
            RateRequest::Vehicle(req) => {
                ensure_no_overlap::<vehicle_rate::Entity, _>(&txn, &scope, &common.season)
                    .await?;
                let mut model = vehicle_rate::ActiveModel {
                    id: Set(id),
                    tenant_id: Set(tenant_id),
                    is_active: Set(true),
                    created_at: Set(now.into()),
                    ..Default::default()
                };
                apply_vehicle(&mut model, req, &common)?;
                RateRecord::Vehicle(model.insert(&txn).await?)
            }
            RateRequest::Guide(req) => {
                ensure_no_overlap::<guide_rate::Entity, _>(&txn, &scope, &common.season)
                    .await?;
                let mut model = guide_rate::ActiveModel {
                    id: Set(id),
                    tenant_id: Set(tenant_id),
                    is_active: Set(true),
                    created_at: Set(now.into()),
                    ..Default::default()
                };
                apply_guide(&mut model, req, &common)?;
                RateRecord::Guide(model.insert(&txn).await?)
            }
            RateRequest::Activity(req) => {
                ensure_no_overlap::<activity_rate::Entity, _>(&txn, &scope, &common.season)
                    .await?;
                let mut model = activity_rate::ActiveModel {
                    id: Set(id),
                    tenant_id: Set(tenant_id),
                    is_active: Set(true),
                    created_at: Set(now.into()),
                    ..Default::default()
                };
                apply_activity(&mut model, req, &common)?;
                RateRecord::Activity(model.insert(&txn).await?)
            }
        };
        txn.commit().await?;

        tracing::info!(rate_id = %id, kind = %record.kind(), "Rate created");
        Ok(record)
    }

    /// Replaces a rate. The row being updated is excluded from the overlap check.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        request: RateRequest,
    ) -> Result<RateRecord, RepositoryError> {
        let common = self.validate_common(tenant_id, &request).await?;
        let scope = OverlapScope {
            tenant_id,
            service_offering_id: common.service_offering_id,
            extra: request.overlap_extra(),
            exclude_id: Some(id),
        };

        let txn = self.db.begin().await?;
        let record = match request {
            RateRequest::HotelRoom(req) => {
                let existing = get_rate::<hotel_room_rate::Entity, _>(&txn, tenant_id, id).await?;
                if existing.is_active {
                    ensure_no_overlap::<hotel_room_rate::Entity, _>(&txn, &scope, &common.season)
                        .await?;
                }
                let mut model = existing.into_active_model();
                apply_hotel_room(&mut model, req, &common)?;
                RateRecord::HotelRoom(model.update(&txn).await?)
            }
            RateRequest::Transfer(req) => {
                let existing = get_rate::<transfer_rate::Entity, _>(&txn, tenant_id, id).await?;
                if existing.is_active {
                    ensure_no_overlap::<transfer_rate::Entity, _>(&txn, &scope, &common.season)
                        .await?;
                }
                let mut model = existing.into_active_model();
                apply_transfer(&mut model, req, &common)?;
                RateRecord::Transfer(model.update(&txn).await?)
            }
            RateRequest::Vehicle(req) => {
                let existing = get_rate::<vehicle_rate::Entity, _>(&txn, tenant_id, id).await?;
                if existing.is_active {
                    ensure_no_overlap::<vehicle_rate::Entity, _>(&txn, &scope, &common.season)
                        .await?;
                }
                let mut model = existing.into_active_model();
                apply_vehicle(&mut model, req, &common)?;
                RateRecord::Vehicle(model.update(&txn).await?)
            }
            RateRequest::Guide(req) => {
                let existing = get_rate::<guide_rate::Entity, _>(&txn, tenant_id, id).await?;
                if existing.is_active {
                    ensure_no_overlap::<guide_rate::Entity, _>(&txn, &scope, &common.season)
                        .await?;
                }
                let mut model = existing.into_active_model();
                apply_guide(&mut model, req, &common)?;
                RateRecord::Guide(model.update(&txn).await?)
            }
            RateRequest::Activity(req) => {
                let existing = get_rate::<activity_rate::Entity, _>(&txn, tenant_id, id).await?;
                if existing.is_active {
                    ensure_no_overlap::<activity_rate::Entity, _>(&txn, &scope, &common.season)
                        .await?;
                }
                let mut model = existing.into_active_model();
                apply_activity(&mut model, req, &common)?;
                RateRecord::Activity(model.update(&txn).await?)
            }
        };
        txn.commit().await?;

        Ok(record)
    }

    /// Checks the season, currency and that the offering belongs to the tenant and
    /// has the service type matching the rate kind.
    async fn validate_common(
        &self,
        tenant_id: Uuid,
        request: &RateRequest,
    ) -> Result<CommonFields, RepositoryError> {
        let (service_offering_id, season_from, season_to, currency) = request.common();
        let season = SeasonRange::new(season_from, season_to)?;
        let currency = normalize_currency("currency", currency.unwrap_or(DEFAULT_CURRENCY))?;

        let offering = ServiceOfferingRepository::new(self.db)
            .find(tenant_id, service_offering_id)
            .await?
            .ok_or_else(|| {
                RepositoryError::validation_with_details(
                    "service_offering_id does not reference an offering of this tenant",
                    json!({ "field": "service_offering_id", "value": service_offering_id }),
                )
            })?;

        let kind = request.kind();
        if offering.service_type != kind.service_type() {
            return Err(RepositoryError::validation_with_details(
                format!("A {kind} rate cannot be attached to this offering"),
                json!({
                    "field": "service_offering_id",
                    "offering_service_type": offering.service_type,
                    "expected_service_type": kind.service_type(),
                }),
            ));
        }

        Ok(CommonFields {
            service_offering_id,
            season,
            currency,
        })
    }
}

impl RateRecord {
    pub fn kind(&self) -> RateKind {
        match self {
            RateRecord::HotelRoom(_) => RateKind::HotelRoom,
            RateRecord::Transfer(_) => RateKind::Transfer,
            RateRecord::Vehicle(_) => RateKind::Vehicle,
            RateRecord::Guide(_) => RateKind::Guide,
            RateRecord::Activity(_) => RateKind::Activity,
        }
    }
}

fn optional_amount(
    field: &str,
    value: Option<Decimal>,
) -> Result<Option<Decimal>, RepositoryError> {
    value.map(|v| non_negative(field, v)).transpose()
}

fn apply_hotel_room(
    model: &mut hotel_room_rate::ActiveModel,
    req: HotelRoomRateRequest,
    common: &CommonFields,
) -> Result<(), RepositoryError> {
    model.service_offering_id = Set(common.service_offering_id);
    model.board_type = Set(req.board_type);
    model.season_from = Set(common.season.from());
    model.season_to = Set(common.season.to());
    model.price_single = Set(non_negative("price_single", req.price_single)?);
    model.price_double = Set(non_negative("price_double", req.price_double)?);
    model.price_triple = Set(optional_amount("price_triple", req.price_triple)?);
    model.currency = Set(common.currency.clone());
    model.updated_at = Set(Utc::now().into());
    Ok(())
}

fn apply_transfer(
    model: &mut transfer_rate::ActiveModel,
    req: TransferRateRequest,
    common: &CommonFields,
) -> Result<(), RepositoryError> {
    if req.vehicle_capacity < 1 {
        return Err(RepositoryError::validation_with_details(
            "vehicle_capacity must be at least 1",
            json!({ "field": "vehicle_capacity", "value": req.vehicle_capacity }),
        ));
    }
    model.service_offering_id = Set(common.service_offering_id);
    model.season_from = Set(common.season.from());
    model.season_to = Set(common.season.to());
    model.price_per_vehicle = Set(non_negative("price_per_vehicle", req.price_per_vehicle)?);
    model.vehicle_capacity = Set(req.vehicle_capacity);
    model.currency = Set(common.currency.clone());
    model.updated_at = Set(Utc::now().into());
    Ok(())
}

fn apply_vehicle(
    model: &mut vehicle_rate::ActiveModel,
    req: VehicleRateRequest,
    common: &CommonFields,
) -> Result<(), RepositoryError> {
    model.service_offering_id = Set(common.service_offering_id);
    model.season_from = Set(common.season.from());
    model.season_to = Set(common.season.to());
    model.daily_rate = Set(non_negative("daily_rate", req.daily_rate)?);
    model.half_day_rate = Set(optional_amount("half_day_rate", req.half_day_rate)?);
    model.currency = Set(common.currency.clone());
    model.updated_at = Set(Utc::now().into());
    Ok(())
}

fn apply_guide(
    model: &mut guide_rate::ActiveModel,
    req: GuideRateRequest,
    common: &CommonFields,
) -> Result<(), RepositoryError> {
    model.service_offering_id = Set(common.service_offering_id);
    model.season_from = Set(common.season.from());
    model.season_to = Set(common.season.to());
    model.daily_rate = Set(non_negative("daily_rate", req.daily_rate)?);
    model.language = Set(optional_text(req.language));
    model.currency = Set(common.currency.clone());
    model.updated_at = Set(Utc::now().into());
    Ok(())
}

fn apply_activity(
    model: &mut activity_rate::ActiveModel,
    req: ActivityRateRequest,
    common: &CommonFields,
) -> Result<(), RepositoryError> {
    model.service_offering_id = Set(common.service_offering_id);
    model.season_from = Set(common.season.from());
    model.season_to = Set(common.season.to());
    model.adult_price = Set(non_negative("adult_price", req.adult_price)?);
    model.child_price = Set(optional_amount("child_price", req.child_price)?);
    model.currency = Set(common.currency.clone());
    model.updated_at = Set(Utc::now().into());
    Ok(())
}
