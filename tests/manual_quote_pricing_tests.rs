//! Manual quote builder: days, expenses and the stored PAX pricing table.

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tourcrm::auth::Role;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{
    bearer, body_json, create_test_tenant, get, post_json, send, setup_test_db, test_app,
};

fn money(value: &Value) -> Decimal {
    value
        .as_str()
        .expect("decimal string")
        .parse::<Decimal>()
        .expect("decimal")
        .round_dp(2)
}

/// `(pax, cost_total, sell_total, sell_per_person)` for every tier.
fn table(quote: &Value) -> Vec<(u64, Decimal, Decimal, Decimal)> {
    quote["pricing_table"]
        .as_array()
        .expect("pricing table")
        .iter()
        .map(|row| {
            (
                row["pax"].as_u64().expect("pax"),
                money(&row["cost_total"]),
                money(&row["sell_total"]),
                money(&row["sell_per_person"]),
            )
        })
        .collect()
}

async fn add_day(app: &axum::Router, auth: &str, quote_id: &str, title: &str) -> String {
    let day = post_json(
        app,
        auth,
        &format!("/api/v1/manual-quotes/{quote_id}/days"),
        &json!({ "title": title }),
    )
    .await;
    assert_eq!(day.status(), StatusCode::CREATED);
    body_json(day).await["id"].as_str().unwrap().to_string()
}

async fn add_expense(
    app: &axum::Router,
    auth: &str,
    quote_id: &str,
    day_id: &str,
    category: &str,
    price: &str,
) -> String {
    let expense = post_json(
        app,
        auth,
        &format!("/api/v1/manual-quotes/{quote_id}/days/{day_id}/expenses"),
        &json!({ "category": category, "description": category.to_lowercase(), "price": price }),
    )
    .await;
    assert_eq!(expense.status(), StatusCode::CREATED);
    body_json(expense).await["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn pricing_table_follows_expenses_and_settings() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, "Anatolia Travel").await?;
    let (app, state) = test_app(db);
    let auth = bearer(&state, tenant_id, Role::Agent);

    let created = post_json(
        &app,
        &auth,
        "/api/v1/manual-quotes",
        &json!({
            "title": "Cappadocia weekend",
            "markup_percent": "20",
            "tax_percent": "10",
            "transport_pricing": "PER_VEHICLE"
        }),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = body_json(created).await;
    assert_eq!(created["currency"], "EUR");
    let id = created["id"].as_str().unwrap().to_string();
    assert!(table(&created).iter().all(|row| row.1.is_zero()));

    let day_one = add_day(&app, &auth, &id, "Arrival").await;
    let day_two = add_day(&app, &auth, &id, "Valleys").await;
    add_expense(&app, &auth, &id, &day_one, "TRANSPORTATION", "300.00").await;
    add_expense(&app, &auth, &id, &day_one, "ACCOMMODATION", "100.00").await;
    let activity = add_expense(&app, &auth, &id, &day_two, "ACTIVITY", "50.00").await;

    let detail = body_json(get(&app, &auth, &format!("/api/v1/manual-quotes/{id}")).await).await;
    let days = detail["days"].as_array().unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0]["day_number"], 1);
    assert_eq!(days[0]["expenses"].as_array().unwrap().len(), 2);

    // Vehicle cost is shared: 300 + 150 per person, then +20% and +10%.
    let rows = table(&detail);
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0], (2, dec!(600.00), dec!(792.00), dec!(396.00)));
    assert_eq!(rows[1], (4, dec!(900.00), dec!(1188.00), dec!(297.00)));
    assert_eq!(rows[4], (10, dec!(1800.00), dec!(2376.00), dec!(237.60)));

    let repriced = send(
        &app,
        Request::patch(format!("/api/v1/manual-quotes/{id}/expenses/{activity}"))
            .header(header::AUTHORIZATION, &auth)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "price": "60.00" }).to_string()))?,
    )
    .await;
    assert_eq!(repriced.status(), StatusCode::OK);

    let settings = json!({
        "transport_pricing": "PER_PERSON",
        "markup_percent": "0",
        "tax_percent": "0"
    });
    let per_person = send(
        &app,
        Request::patch(format!("/api/v1/manual-quotes/{id}"))
            .header(header::AUTHORIZATION, &auth)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(settings.to_string()))?,
    )
    .await;
    assert_eq!(per_person.status(), StatusCode::OK);
    let rows = table(&body_json(per_person).await);
    assert_eq!(rows[0], (2, dec!(920.00), dec!(920.00), dec!(460.00)));
    Ok(())
}

#[tokio::test]
async fn deleting_a_day_renumbers_and_reprices() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, "Anatolia Travel").await?;
    let (app, state) = test_app(db);
    let auth = bearer(&state, tenant_id, Role::Agent);

    let created = post_json(
        &app,
        &auth,
        "/api/v1/manual-quotes",
        &json!({ "title": "Aegean coast" }),
    )
    .await;
    let id = body_json(created).await["id"].as_str().unwrap().to_string();

    let first = add_day(&app, &auth, &id, "Izmir").await;
    let second = add_day(&app, &auth, &id, "Ephesus").await;
    let third = add_day(&app, &auth, &id, "Pamukkale").await;
    add_expense(&app, &auth, &id, &first, "MEAL", "25.00").await;
    add_expense(&app, &auth, &id, &third, "GUIDE", "40.00").await;

    let deleted = send(
        &app,
        Request::delete(format!("/api/v1/manual-quotes/{id}/days/{first}"))
            .header(header::AUTHORIZATION, &auth)
            .body(Body::empty())?,
    )
    .await;
    assert_eq!(deleted.status(), StatusCode::OK);
    let rows = table(&body_json(deleted).await);
    assert_eq!(rows[0], (2, dec!(80.00), dec!(80.00), dec!(40.00)));

    let detail = body_json(get(&app, &auth, &format!("/api/v1/manual-quotes/{id}")).await).await;
    let numbering: Vec<(String, i64)> = detail["days"]
        .as_array()
        .unwrap()
        .iter()
        .map(|day| (day["id"].as_str().unwrap().to_string(), day["day_number"].as_i64().unwrap()))
        .collect();
    assert_eq!(numbering, vec![(second, 1), (third, 2)]);
    Ok(())
}

#[tokio::test]
async fn negative_prices_and_deactivated_quotes_are_rejected() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, "Anatolia Travel").await?;
    let (app, state) = test_app(db);
    let auth = bearer(&state, tenant_id, Role::Agent);

    let created = post_json(
        &app,
        &auth,
        "/api/v1/manual-quotes",
        &json!({ "title": "Black Sea" }),
    )
    .await;
    let id = body_json(created).await["id"].as_str().unwrap().to_string();
    let day = add_day(&app, &auth, &id, "Trabzon").await;

    let negative = post_json(
        &app,
        &auth,
        &format!("/api/v1/manual-quotes/{id}/days/{day}/expenses"),
        &json!({ "category": "MEAL", "description": "Dinner", "price": "-5.00" }),
    )
    .await;
    assert_eq!(negative.status(), StatusCode::BAD_REQUEST);

    let deactivated = send(
        &app,
        Request::delete(format!("/api/v1/manual-quotes/{id}"))
            .header(header::AUTHORIZATION, &auth)
            .body(Body::empty())?,
    )
    .await;
    assert_eq!(deactivated.status(), StatusCode::NO_CONTENT);

    let late_day = post_json(
        &app,
        &auth,
        &format!("/api/v1/manual-quotes/{id}/days"),
        &json!({ "title": "Sumela" }),
    )
    .await;
    assert_eq!(late_day.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn out_of_range_percentages_and_prices_are_rejected() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, "Anatolia Travel").await?;
    let (app, state) = test_app(db);
    let auth = bearer(&state, tenant_id, Role::Agent);

    let markup = post_json(
        &app,
        &auth,
        "/api/v1/manual-quotes",
        &json!({ "title": "Lycian way", "markup_percent": "100000" }),
    )
    .await;
    assert_eq!(markup.status(), StatusCode::BAD_REQUEST);
    let markup = body_json(markup).await;
    assert_eq!(markup["details"]["field"], "markup_percent");
    assert_eq!(markup["details"]["max"], "99999.99");

    let created = post_json(
        &app,
        &auth,
        "/api/v1/manual-quotes",
        &json!({ "title": "Lycian way", "markup_percent": "99999.99", "tax_percent": "99999.99" }),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let id = body_json(created).await["id"].as_str().unwrap().to_string();
    let day = add_day(&app, &auth, &id, "Fethiye").await;

    let too_large = post_json(
        &app,
        &auth,
        &format!("/api/v1/manual-quotes/{id}/days/{day}/expenses"),
        &json!({ "category": "ACCOMMODATION", "description": "Villa", "price": "1000000000000" }),
    )
    .await;
    assert_eq!(too_large.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(too_large).await["details"]["field"], "price");

    // The largest storable price still prices every tier.
    add_expense(&app, &auth, &id, &day, "ACCOMMODATION", "999999999999.99").await;
    let detail = body_json(get(&app, &auth, &format!("/api/v1/manual-quotes/{id}")).await).await;
    let rows = table(&detail);
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].1, dec!(1999999999999.98));
    Ok(())
}
