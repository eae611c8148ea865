//! # Seasonal Rates
//!
//! The five rate tables (hotel room, transfer, vehicle, guide, activity) share the
//! same season columns and the same "no two active seasons may intersect" rule. This
//! module holds that shared behaviour; the kind-specific writes live in
//! [`crate::repositories::rate`].

pub mod overlap;

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::service_offering::ServiceType;
use crate::models::{activity_rate, guide_rate, hotel_room_rate, transfer_rate, vehicle_rate};

pub use overlap::{SeasonRange, overlap_conflict};

/// Rate table selector used in `/api/v1/rates/{kind}` paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RateKind {
    HotelRoom,
    Transfer,
    Vehicle,
    Guide,
    Activity,
}

impl RateKind {
    pub const ALL: [RateKind; 5] = [
        RateKind::HotelRoom,
        RateKind::Transfer,
        RateKind::Vehicle,
        RateKind::Guide,
        RateKind::Activity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RateKind::HotelRoom => "hotel-room",
            RateKind::Transfer => "transfer",
            RateKind::Vehicle => "vehicle",
            RateKind::Guide => "guide",
            RateKind::Activity => "activity",
        }
    }

    /// Offering type a rate of this kind may be attached to.
    pub fn service_type(&self) -> ServiceType {
        match self {
            RateKind::HotelRoom => ServiceType::HotelRoom,
            RateKind::Transfer => ServiceType::Transfer,
            RateKind::Vehicle => ServiceType::Vehicle,
            RateKind::Guide => ServiceType::Guide,
            RateKind::Activity => ServiceType::Activity,
        }
    }
}

impl fmt::Display for RateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RateKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown rate kind: {s}"))
    }
}

/// Column accessors shared by every seasonal rate entity.
pub trait SeasonalRateEntity: EntityTrait {
    fn id_column() -> Self::Column;
    fn tenant_column() -> Self::Column;
    fn offering_column() -> Self::Column;
    fn season_from_column() -> Self::Column;
    fn season_to_column() -> Self::Column;
    fn active_column() -> Self::Column;
    fn updated_at_column() -> Self::Column;
}

/// Row-level view of a seasonal rate.
pub trait SeasonalRateModel: Send + Sync {
    fn rate_id(&self) -> Uuid;
    fn season_bounds(&self) -> (NaiveDate, NaiveDate);

    fn season(&self) -> SeasonRange {
        let (from, to) = self.season_bounds();
        SeasonRange::stored(from, to)
    }
}

/// Identifies the set of rows a season must not collide with.
#[derive(Debug, Clone)]
pub struct OverlapScope {
    pub tenant_id: Uuid,
    pub service_offering_id: Uuid,
    /// Extra key columns, e.g. the board type for hotel rooms
    pub extra: Option<Condition>,
    /// Row being updated, which never conflicts with itself
    pub exclude_id: Option<Uuid>,
}

/// First active rate in `scope` whose season intersects `season`, if any.
pub async fn find_overlapping<E, C>(
    db: &C,
    scope: &OverlapScope,
    season: &SeasonRange,
) -> Result<Option<E::Model>, DbErr>
where
    E: SeasonalRateEntity,
    C: ConnectionTrait,
{
    let mut query = E::find()
        .filter(E::tenant_column().eq(scope.tenant_id))
        .filter(E::offering_column().eq(scope.service_offering_id))
        .filter(E::active_column().eq(true))
        .filter(season.overlap_condition(E::season_from_column(), E::season_to_column()));

    if let Some(extra) = scope.extra.clone() {
        query = query.filter(extra);
    }
    if let Some(exclude_id) = scope.exclude_id {
        query = query.filter(E::id_column().ne(exclude_id));
    }

    query.order_by_asc(E::season_from_column()).one(db).await
}

/// Fails with a 409-mapped conflict naming the colliding rate.
pub async fn ensure_no_overlap<E, C>(
    db: &C,
    scope: &OverlapScope,
    season: &SeasonRange,
) -> Result<(), RepositoryError>
where
    E: SeasonalRateEntity,
    E::Model: SeasonalRateModel,
    C: ConnectionTrait,
{
    match find_overlapping::<E, C>(db, scope, season).await? {
        Some(existing) => {
            tracing::debug!(
                existing_id = %existing.rate_id(),
                offering_id = %scope.service_offering_id,
                "Rejected overlapping season"
            );
            Err(overlap_conflict(existing.rate_id(), &existing.season()))
        }
        None => Ok(()),
    }
}

/// Filters for listing rates of one kind.
#[derive(Debug, Clone, Default)]
pub struct RateFilter {
    pub service_offering_id: Option<Uuid>,
    pub include_inactive: bool,
    pub limit: u64,
    pub offset: u64,
}

/// Page of rates ordered by offering then season start, plus the unpaged total.
pub async fn list_rates<E, C>(
    db: &C,
    tenant_id: Uuid,
    filter: &RateFilter,
) -> Result<(Vec<E::Model>, u64), DbErr>
where
    E: SeasonalRateEntity,
    E::Model: SeasonalRateModel,
    C: ConnectionTrait,
{
    let mut query = E::find().filter(E::tenant_column().eq(tenant_id));
    if let Some(offering_id) = filter.service_offering_id {
        query = query.filter(E::offering_column().eq(offering_id));
    }
    if !filter.include_inactive {
        query = query.filter(E::active_column().eq(true));
    }

    let total = query.clone().count(db).await?;
    let rows = query
        .order_by_asc(E::offering_column())
        .order_by_asc(E::season_from_column())
        .limit(filter.limit)
        .offset(filter.offset)
        .all(db)
        .await?;

    Ok((rows, total))
}

pub async fn get_rate<E, C>(db: &C, tenant_id: Uuid, id: Uuid) -> Result<E::Model, RepositoryError>
where
    E: SeasonalRateEntity,
    C: ConnectionTrait,
{
    E::find()
        .filter(E::tenant_column().eq(tenant_id))
        .filter(E::id_column().eq(id))
        .one(db)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Rate not found"))
}

/// Soft-deletes a rate so it stops blocking other seasons.
pub async fn deactivate_rate<E, C>(db: &C, tenant_id: Uuid, id: Uuid) -> Result<(), RepositoryError>
where
    E: SeasonalRateEntity,
    C: ConnectionTrait,
{
    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
    let result = E::update_many()
        .col_expr(E::active_column(), Expr::value(false))
        .col_expr(E::updated_at_column(), Expr::value(now))
        .filter(E::tenant_column().eq(tenant_id))
        .filter(E::id_column().eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(RepositoryError::not_found("Rate not found"));
    }
    Ok(())
}

impl SeasonalRateEntity for hotel_room_rate::Entity {
    fn id_column() -> Self::Column {
        hotel_room_rate::Column::Id
    }
    fn tenant_column() -> Self::Column {
        hotel_room_rate::Column::TenantId
    }
    fn offering_column() -> Self::Column {
        hotel_room_rate::Column::ServiceOfferingId
    }
    fn season_from_column() -> Self::Column {
        hotel_room_rate::Column::SeasonFrom
    }
    fn season_to_column() -> Self::Column {
        hotel_room_rate::Column::SeasonTo
    }
    fn active_column() -> Self::Column {
        hotel_room_rate::Column::IsActive
    }
    fn updated_at_column() -> Self::Column {
        hotel_room_rate::Column::UpdatedAt
    }
}

impl SeasonalRateModel for hotel_room_rate::Model {
    fn rate_id(&self) -> Uuid {
        self.id
    }
    fn season_bounds(&self) -> (NaiveDate, NaiveDate) {
        (self.season_from, self.season_to)
    }
}

impl SeasonalRateEntity for transfer_rate::Entity {
    fn id_column() -> Self::Column {
        transfer_rate::Column::Id
    }
    fn tenant_column() -> Self::Column {
        transfer_rate::Column::TenantId
    }
    fn offering_column() -> Self::Column {
        transfer_rate::Column::ServiceOfferingId
    }
    fn season_from_column() -> Self::Column {
        transfer_rate::Column::SeasonFrom
    }
    fn season_to_column() -> Self::Column {
        transfer_rate::Column::SeasonTo
    }
    fn active_column() -> Self::Column {
        transfer_rate::Column::IsActive
    }
    fn updated_at_column() -> Self::Column {
        transfer_rate::Column::UpdatedAt
    }
}

impl SeasonalRateModel for transfer_rate::Model {
    fn rate_id(&self) -> Uuid {
        self.id
    }
    fn season_bounds(&self) -> (NaiveDate, NaiveDate) {
        (self.season_from, self.season_to)
    }
}

impl SeasonalRateEntity for vehicle_rate::Entity {
    fn id_column() -> Self::Column {
        vehicle_rate::Column::Id
    }
    fn tenant_column() -> Self::Column {
        vehicle_rate::Column::TenantId
    }
    fn offering_column() -> Self::Column {
        vehicle_rate::Column::ServiceOfferingId
    }
    fn season_from_column() -> Self::Column {
        vehicle_rate::Column::SeasonFrom
    }
    fn season_to_column() -> Self::Column {
        vehicle_rate::Column::SeasonTo
    }
    fn active_column() -> Self::Column {
        vehicle_rate::Column::IsActive
    }
    fn updated_at_column() -> Self::Column {
        vehicle_rate::Column::UpdatedAt
    }
}

impl SeasonalRateModel for vehicle_rate::Model {
    fn rate_id(&self) -> Uuid {
        self.id
    }
    fn season_bounds(&self) -> (NaiveDate, NaiveDate) {
        (self.season_from, self.season_to)
    }
}

impl SeasonalRateEntity for guide_rate::Entity {
    fn id_column() -> Self::Column {
        guide_rate::Column::Id
    }
    fn tenant_column() -> Self::Column {
        guide_rate::Column::TenantId
    }
    fn offering_column() -> Self::Column {
        guide_rate::Column::ServiceOfferingId
    }
    fn season_from_column() -> Self::Column {
        guide_rate::Column::SeasonFrom
    }
    fn season_to_column() -> Self::Column {
        guide_rate::Column::SeasonTo
    }
    fn active_column() -> Self::Column {
        guide_rate::Column::IsActive
    }
    fn updated_at_column() -> Self::Column {
        guide_rate::Column::UpdatedAt
    }
}

impl SeasonalRateModel for guide_rate::Model {
    fn rate_id(&self) -> Uuid {
        self.id
    }
    fn season_bounds(&self) -> (NaiveDate, NaiveDate) {
        (self.season_from, self.season_to)
    }
}

impl SeasonalRateEntity for activity_rate::Entity {
    fn id_column() -> Self::Column {
        activity_rate::Column::Id
    }
    fn tenant_column() -> Self::Column {
        activity_rate::Column::TenantId
    }
    fn offering_column() -> Self::Column {
        activity_rate::Column::ServiceOfferingId
    }
    fn season_from_column() -> Self::Column {
        activity_rate::Column::SeasonFrom
    }
    fn season_to_column() -> Self::Column {
        activity_rate::Column::SeasonTo
    }
    fn active_column() -> Self::Column {
        activity_rate::Column::IsActive
    }
    fn updated_at_column() -> Self::Column {
        activity_rate::Column::UpdatedAt
    }
}

impl SeasonalRateModel for activity_rate::Model {
    fn rate_id(&self) -> Uuid {
        self.id
    }
    fn season_bounds(&self) -> (NaiveDate, NaiveDate) {
        (self.season_from, self.season_to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_kind_round_trips_path_segment() {
        for kind in RateKind::ALL {
            assert_eq!(kind.as_str().parse::<RateKind>().unwrap(), kind);
        }
        assert!("hotel_room".parse::<RateKind>().is_err());
    }

    #[test]
    fn test_rate_kind_serde_matches_path_segment() {
        let value = serde_json::to_value(RateKind::HotelRoom).unwrap();
        assert_eq!(value, "hotel-room");
    }

    #[test]
    fn test_rate_kind_service_type() {
        assert_eq!(RateKind::Guide.service_type(), ServiceType::Guide);
        assert_eq!(RateKind::HotelRoom.service_type(), ServiceType::HotelRoom);
    }
}
