//! Seasonal rate overlap rules exercised through the HTTP API.

use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use serde_json::{Value, json};
use tourcrm::auth::Role;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{
    bearer, body_json, create_test_tenant, get, post_json, send, setup_test_db, test_app,
};

struct Fixture {
    app: Router,
    auth: String,
    hotel_offering: String,
    guide_offering: String,
}

async fn fixture() -> Result<Fixture> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, "Anatolia Travel").await?;
    let (app, state) = test_app(db);
    let auth = bearer(&state, tenant_id, Role::Agent);

    let vendor = post_json(
        &app,
        &auth,
        "/api/v1/vendors",
        &json!({ "name": "Cave Suites", "vendor_type": "HOTEL", "city": "Goreme" }),
    )
    .await;
    assert_eq!(vendor.status(), StatusCode::CREATED);
    let vendor_id = body_json(vendor).await["id"].clone();

    let mut offerings = Vec::new();
    for (service_type, name) in [("HOTEL_ROOM", "Deluxe cave room"), ("GUIDE", "Valley walk")] {
        let offering = post_json(
            &app,
            &auth,
            "/api/v1/service-offerings",
            &json!({ "vendor_id": vendor_id, "service_type": service_type, "name": name }),
        )
        .await;
        assert_eq!(offering.status(), StatusCode::CREATED);
        offerings.push(body_json(offering).await["id"].as_str().unwrap().to_string());
    }

    Ok(Fixture {
        app,
        auth,
        guide_offering: offerings.pop().unwrap(),
        hotel_offering: offerings.pop().unwrap(),
    })
}

impl Fixture {
    async fn hotel(&self, offering: &str, board: &str, from: &str, to: &str) -> Response {
        post_json(
            &self.app,
            &self.auth,
            "/api/v1/rates/hotel-room",
            &hotel_rate(offering, board, from, to),
        )
        .await
    }

    async fn guide(&self, from: &str, to: &str, language: &str) -> Response {
        post_json(
            &self.app,
            &self.auth,
            "/api/v1/rates/guide",
            &json!({
                "service_offering_id": self.guide_offering,
                "season_from": from,
                "season_to": to,
                "daily_rate": "110.00",
                "language": language
            }),
        )
        .await
    }
}

fn hotel_rate(offering: &str, board: &str, from: &str, to: &str) -> Value {
    json!({
        "service_offering_id": offering,
        "board_type": board,
        "season_from": from,
        "season_to": to,
        "price_single": "95.00",
        "price_double": "120.00"
    })
}

#[tokio::test]
async fn overlapping_season_is_rejected() -> Result<()> {
    let f = fixture().await?;

    let first = f.hotel(&f.hotel_offering, "BB", "2026-05-01", "2026-06-30").await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let overlapping = f.hotel(&f.hotel_offering, "BB", "2026-06-15", "2026-07-31").await;
    assert_eq!(overlapping.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(overlapping).await["code"], "CONFLICT");

    // Inclusive bounds: sharing the last day is an overlap, the next day is not.
    let touching = f.hotel(&f.hotel_offering, "BB", "2026-06-30", "2026-07-31").await;
    assert_eq!(touching.status(), StatusCode::CONFLICT);
    let adjacent = f.hotel(&f.hotel_offering, "BB", "2026-07-01", "2026-07-31").await;
    assert_eq!(adjacent.status(), StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn guide_rates_reject_overlapping_seasons() -> Result<()> {
    let f = fixture().await?;

    let first = f.guide("2026-04-01", "2026-05-31", "en").await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let overlapping = f.guide("2026-05-15", "2026-06-15", "en").await;
    assert_eq!(overlapping.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(overlapping).await["code"], "CONFLICT");

    // Language does not widen the key; only hotel rooms carry an extra column.
    let other_language = f.guide("2026-05-31", "2026-06-30", "de").await;
    assert_eq!(other_language.status(), StatusCode::CONFLICT);

    let adjacent = f.guide("2026-06-01", "2026-06-30", "de").await;
    assert_eq!(adjacent.status(), StatusCode::CREATED);

    // Hotel seasons on another offering are independent of guide seasons.
    let hotel = f.hotel(&f.hotel_offering, "BB", "2026-04-01", "2026-05-31").await;
    assert_eq!(hotel.status(), StatusCode::CREATED);

    let listed = body_json(get(&f.app, &f.auth, "/api/v1/rates/guide").await).await;
    assert_eq!(listed["pagination"]["total"], 2);
    Ok(())
}

#[tokio::test]
async fn board_type_is_part_of_the_key() -> Result<()> {
    let f = fixture().await?;
    let uri = "/api/v1/rates/hotel-room";

    let bb = f.hotel(&f.hotel_offering, "BB", "2026-05-01", "2026-06-30").await;
    let hb = f.hotel(&f.hotel_offering, "HB", "2026-05-01", "2026-06-30").await;

    assert_eq!(bb.status(), StatusCode::CREATED);
    assert_eq!(hb.status(), StatusCode::CREATED);

    let listed = body_json(get(&f.app, &f.auth, uri).await).await;
    assert_eq!(listed["pagination"]["total"], 2);
    Ok(())
}

#[tokio::test]
async fn deactivated_rate_frees_its_season() -> Result<()> {
    let f = fixture().await?;
    let uri = "/api/v1/rates/hotel-room";

    let first = f.hotel(&f.hotel_offering, "BB", "2026-05-01", "2026-06-30").await;
    let id = body_json(first).await["id"].as_str().unwrap().to_string();

    let deleted = send(
        &f.app,
        Request::delete(format!("{uri}/{id}"))
            .header(header::AUTHORIZATION, &f.auth)
            .body(Body::empty())?,
    )
    .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let replacement = f.hotel(&f.hotel_offering, "BB", "2026-06-01", "2026-06-30").await;
    assert_eq!(replacement.status(), StatusCode::CREATED);

    let active = body_json(get(&f.app, &f.auth, uri).await).await;
    assert_eq!(active["pagination"]["total"], 1);
    let all = body_json(get(&f.app, &f.auth, &format!("{uri}?include_inactive=true")).await).await;
    assert_eq!(all["pagination"]["total"], 2);
    Ok(())
}

#[tokio::test]
async fn update_ignores_the_rate_itself() -> Result<()> {
    let f = fixture().await?;
    let uri = "/api/v1/rates/hotel-room";

    let first = f.hotel(&f.hotel_offering, "BB", "2026-05-01", "2026-06-30").await;
    let id = body_json(first).await["id"].as_str().unwrap().to_string();
    f.hotel(&f.hotel_offering, "BB", "2026-08-01", "2026-08-31").await;

    let put = |body: Value| {
        Request::put(format!("{uri}/{id}"))
            .header(header::AUTHORIZATION, &f.auth)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
    };

    let extended_body = hotel_rate(&f.hotel_offering, "BB", "2026-04-15", "2026-07-15");
    let extended = send(&f.app, put(extended_body)?).await;
    assert_eq!(extended.status(), StatusCode::OK);
    assert_eq!(body_json(extended).await["season_from"], "2026-04-15");

    let clashing_body = hotel_rate(&f.hotel_offering, "BB", "2026-05-01", "2026-08-10");
    let clashing = send(&f.app, put(clashing_body)?).await;
    assert_eq!(clashing.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn rate_kind_must_match_offering_type() -> Result<()> {
    let f = fixture().await?;

    let guide_as_hotel = f.hotel(&f.guide_offering, "BB", "2026-05-01", "2026-06-30").await;
    assert_eq!(guide_as_hotel.status(), StatusCode::BAD_REQUEST);

    let guide_rate = post_json(
        &f.app,
        &f.auth,
        "/api/v1/rates/guide",
        &json!({
            "service_offering_id": f.guide_offering,
            "season_from": "2026-05-01",
            "season_to": "2026-10-31",
            "daily_rate": "110.00",
            "language": "en"
        }),
    )
    .await;
    assert_eq!(guide_rate.status(), StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn inverted_season_is_rejected() -> Result<()> {
    let f = fixture().await?;

    let inverted = f.hotel(&f.hotel_offering, "BB", "2026-06-30", "2026-05-01").await;
    assert_eq!(inverted.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
