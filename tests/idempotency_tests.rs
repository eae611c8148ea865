//! Idempotent payment creation.

use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tourcrm::auth::Role;
use tourcrm::idempotency::{IDEMPOTENCY_KEY_HEADER, REPLAYED_HEADER};

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{
    bearer, body_json, create_confirmed_booking, create_test_client, create_test_tenant,
    create_try_eur_rate, get, post_json, send, setup_test_db, test_app,
};

struct Fixture {
    app: Router,
    finance: String,
    agent: String,
    booking_id: String,
}

async fn fixture() -> Result<Fixture> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, "Anatolia Travel").await?;
    let client_id = create_test_client(&db, tenant_id, "Ayse", Some("ayse@example.com")).await?;
    create_try_eur_rate(&db, tenant_id, dec!(0.0285), 0).await?;

    let (app, state) = test_app(db);
    let agent = bearer(&state, tenant_id, Role::Agent);
    let finance = bearer(&state, tenant_id, Role::Finance);
    let booking_id = create_confirmed_booking(&app, &agent, client_id).await;

    Ok(Fixture {
        app,
        finance,
        agent,
        booking_id,
    })
}

async fn pay(f: &Fixture, key: Option<&str>, body: &Value) -> Result<Response> {
    let mut request = Request::post("/api/v1/payments/client")
        .header(header::AUTHORIZATION, &f.finance)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = key {
        request = request.header(IDEMPOTENCY_KEY_HEADER, key);
    }
    Ok(send(&f.app, request.body(Body::from(body.to_string()))?).await)
}

fn payment(booking_id: &str, amount: &str) -> Value {
    json!({ "booking_id": booking_id, "amount": amount, "method": "BANK_TRANSFER" })
}

#[tokio::test]
async fn retry_with_same_key_replays_first_response() -> Result<()> {
    let f = fixture().await?;
    let body = payment(&f.booking_id, "150.00");

    let first = pay(&f, Some("deposit-1"), &body).await?;
    assert_eq!(first.status(), StatusCode::CREATED);
    assert!(first.headers().get(REPLAYED_HEADER).is_none());
    let first = body_json(first).await;
    assert_eq!(first["status"], "COMPLETED");
    assert_eq!(first["currency"], "EUR");

    let retry = pay(&f, Some("deposit-1"), &body).await?;
    assert_eq!(retry.status(), StatusCode::CREATED);
    assert_eq!(retry.headers().get(REPLAYED_HEADER).unwrap(), "true");
    assert_eq!(body_json(retry).await, first);

    let listed = body_json(
        get(
            &f.app,
            &f.finance,
            &format!("/api/v1/payments/client?booking_id={}", f.booking_id),
        )
        .await,
    )
    .await;
    assert_eq!(listed["pagination"]["total"], 1);

    let detail =
        body_json(get(&f.app, &f.finance, &format!("/api/v1/bookings/{}", f.booking_id)).await)
            .await;
    let paid: Decimal = detail["paid_total"].as_str().unwrap().parse()?;
    let balance: Decimal = detail["balance"].as_str().unwrap().parse()?;
    assert_eq!(paid.round_dp(2), dec!(150.00));
    assert_eq!(balance.round_dp(2), dec!(250.00));
    Ok(())
}

#[tokio::test]
async fn key_reused_for_different_body_conflicts() -> Result<()> {
    let f = fixture().await?;

    let first = pay(&f, Some("deposit-1"), &payment(&f.booking_id, "150.00")).await?;
    assert_eq!(first.status(), StatusCode::CREATED);

    let other = pay(&f, Some("deposit-1"), &payment(&f.booking_id, "175.00")).await?;
    assert_eq!(other.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(other).await["details"]["idempotency_key"], "deposit-1");
    Ok(())
}

#[tokio::test]
async fn requests_without_key_are_not_deduplicated() -> Result<()> {
    let f = fixture().await?;
    let body = payment(&f.booking_id, "50.00");

    for _ in 0..2 {
        let response = pay(&f, None, &body).await?;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let listed = body_json(get(&f.app, &f.finance, "/api/v1/payments/client").await).await;
    assert_eq!(listed["pagination"]["total"], 2);
    Ok(())
}

#[tokio::test]
async fn malformed_key_is_rejected() -> Result<()> {
    let f = fixture().await?;

    let response = pay(&f, Some("has space"), &payment(&f.booking_id, "50.00")).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn cancelled_booking_rejects_payments() -> Result<()> {
    let f = fixture().await?;

    let cancelled = post_json(
        &f.app,
        &f.agent,
        &format!("/api/v1/bookings/{}/cancel", f.booking_id),
        &json!({}),
    )
    .await;
    assert_eq!(cancelled.status(), StatusCode::OK);
    assert_eq!(body_json(cancelled).await["status"], "CANCELLED");

    let response = pay(&f, Some("late-payment"), &payment(&f.booking_id, "50.00")).await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Failed attempts are not stored, the key stays usable.
    let retry = pay(&f, Some("late-payment"), &payment(&f.booking_id, "50.00")).await?;
    assert!(retry.headers().get(REPLAYED_HEADER).is_none());
    assert_eq!(retry.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn agents_cannot_record_payments() -> Result<()> {
    let f = fixture().await?;

    let response = post_json(
        &f.app,
        &f.agent,
        "/api/v1/payments/client",
        &payment(&f.booking_id, "50.00"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}
