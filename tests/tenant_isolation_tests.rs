//! Tenant scoping: every lookup and listing only sees the caller's tenant.

use anyhow::Result;
use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;
use tourcrm::auth::Role;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{
    bearer, body_json, create_confirmed_booking, create_test_client, create_test_tenant,
    create_try_eur_rate, get, post_json, setup_test_db, test_app,
};

#[tokio::test]
async fn records_of_another_tenant_are_not_found() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_a = create_test_tenant(&db, "Anatolia Travel").await?;
    let tenant_b = create_test_tenant(&db, "Aegean Tours").await?;
    let client_a = create_test_client(&db, tenant_a, "Ayse", Some("ayse@example.com")).await?;
    create_try_eur_rate(&db, tenant_a, dec!(0.0285), 0).await?;

    let (app, state) = test_app(db);
    let auth_a = bearer(&state, tenant_a, Role::Admin);
    let auth_b = bearer(&state, tenant_b, Role::Admin);
    let booking_id = create_confirmed_booking(&app, &auth_a, client_a).await;

    for uri in [
        format!("/api/v1/clients/{client_a}"),
        format!("/api/v1/bookings/{booking_id}"),
    ] {
        assert_eq!(get(&app, &auth_a, &uri).await.status(), StatusCode::OK);
        let foreign = get(&app, &auth_b, &uri).await;
        assert_eq!(foreign.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body_json(foreign).await["code"], "NOT_FOUND");
    }

    for uri in ["/api/v1/clients", "/api/v1/quotations", "/api/v1/bookings"] {
        let own = body_json(get(&app, &auth_a, uri).await).await;
        let other = body_json(get(&app, &auth_b, uri).await).await;
        assert_eq!(own["pagination"]["total"], 1, "{uri}");
        assert_eq!(other["pagination"]["total"], 0, "{uri}");
    }
    Ok(())
}

#[tokio::test]
async fn foreign_references_are_rejected() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_a = create_test_tenant(&db, "Anatolia Travel").await?;
    let tenant_b = create_test_tenant(&db, "Aegean Tours").await?;
    let client_a = create_test_client(&db, tenant_a, "Ayse", Some("ayse@example.com")).await?;
    create_try_eur_rate(&db, tenant_a, dec!(0.0285), 0).await?;

    let (app, state) = test_app(db);
    let auth_a = bearer(&state, tenant_a, Role::Admin);
    let auth_b = bearer(&state, tenant_b, Role::Admin);
    let booking_id = create_confirmed_booking(&app, &auth_a, client_a).await;

    let quotation = post_json(
        &app,
        &auth_b,
        "/api/v1/quotations",
        &json!({ "client_id": client_a, "title": "Borrowed client" }),
    )
    .await;
    assert_eq!(quotation.status(), StatusCode::BAD_REQUEST);

    let payment = post_json(
        &app,
        &auth_b,
        "/api/v1/payments/client",
        &json!({ "booking_id": booking_id, "amount": "10.00", "method": "CASH" }),
    )
    .await;
    assert_eq!(payment.status(), StatusCode::BAD_REQUEST);

    let cancel = post_json(
        &app,
        &auth_b,
        &format!("/api/v1/bookings/{booking_id}/cancel"),
        &json!({}),
    )
    .await;
    assert_eq!(cancel.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn exchange_rates_are_tenant_scoped() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_a = create_test_tenant(&db, "Anatolia Travel").await?;
    let tenant_b = create_test_tenant(&db, "Aegean Tours").await?;
    let client_b = create_test_client(&db, tenant_b, "Mehmet", Some("mehmet@example.com")).await?;
    create_try_eur_rate(&db, tenant_a, dec!(0.0285), 0).await?;

    let (app, state) = test_app(db);
    let auth_b = bearer(&state, tenant_b, Role::Agent);

    let listed = body_json(get(&app, &auth_b, "/api/v1/exchange-rates").await).await;
    assert_eq!(listed["pagination"]["total"], 0);

    // Tenant A's rate must not be used to lock tenant B's booking.
    let created = post_json(
        &app,
        &auth_b,
        "/api/v1/quotations",
        &json!({ "client_id": client_b, "title": "Bodrum" }),
    )
    .await;
    let id = body_json(created).await["id"].as_str().unwrap().to_string();
    post_json(&app, &auth_b, &format!("/api/v1/quotations/{id}/send"), &json!({})).await;
    let accepted =
        post_json(&app, &auth_b, &format!("/api/v1/quotations/{id}/accept"), &json!({})).await;
    assert_eq!(accepted.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
