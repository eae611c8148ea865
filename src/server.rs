//! # Server Configuration
//!
//! Router assembly, OpenAPI document and the HTTP serve loop for the Tour CRM API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    http::{
        HeaderName, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{JwtManager, auth_middleware};
use crate::config::AppConfig;
use crate::handlers::{
    self, audit_logs, bookings, clients, exchange_rates, leads, manual_quotes, payments,
    quotations, rates, service_offerings, tenants, vendors,
};
use crate::idempotency::IDEMPOTENCY_KEY_HEADER;
use crate::telemetry::{TRACE_ID_HEADER, trace_context_middleware};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    /// Builds the state, failing when no JWT secret is configured.
    pub fn new(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<Self> {
        let secret = config
            .jwt_secret
            .as_deref()
            .context("TOURCRM_JWT_SECRET must be set to serve the API")?;
        let jwt = Arc::new(JwtManager::new(secret, config.jwt_expiration_seconds));

        Ok(Self {
            config: Arc::new(config),
            db,
            jwt,
        })
    }
}

/// Routes under `/api/v1`; every one of them requires a bearer token.
fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/tenants/current", get(tenants::current_tenant))
        .route(
            "/clients",
            get(clients::list_clients).post(clients::create_client),
        )
        .route(
            "/clients/{id}",
            get(clients::get_client)
                .patch(clients::update_client)
                .delete(clients::deactivate_client),
        )
        .route("/leads", get(leads::list_leads).post(leads::create_lead))
        .route(
            "/leads/{id}",
            get(leads::get_lead)
                .patch(leads::update_lead)
                .delete(leads::deactivate_lead),
        )
        .route(
            "/vendors",
            get(vendors::list_vendors).post(vendors::create_vendor),
        )
        .route(
            "/vendors/{id}",
            get(vendors::get_vendor)
                .patch(vendors::update_vendor)
                .delete(vendors::deactivate_vendor),
        )
        .route(
            "/service-offerings",
            get(service_offerings::list_service_offerings)
                .post(service_offerings::create_service_offering),
        )
        .route(
            "/service-offerings/{id}",
            get(service_offerings::get_service_offering)
                .patch(service_offerings::update_service_offering)
                .delete(service_offerings::deactivate_service_offering),
        )
        .route(
            "/rates/{kind}",
            get(rates::list_rates).post(rates::create_rate),
        )
        .route(
            "/rates/{kind}/{id}",
            get(rates::get_rate)
                .put(rates::update_rate)
                .delete(rates::deactivate_rate),
        )
        .route(
            "/exchange-rates",
            get(exchange_rates::list_exchange_rates).post(exchange_rates::create_exchange_rate),
        )
        .route(
            "/quotations",
            get(quotations::list_quotations).post(quotations::create_quotation),
        )
        .route(
            "/quotations/{id}",
            get(quotations::get_quotation).patch(quotations::update_quotation),
        )
        .route("/quotations/{id}/send", post(quotations::send_quotation))
        .route("/quotations/{id}/reject", post(quotations::reject_quotation))
        .route("/quotations/{id}/accept", post(quotations::accept_quotation))
        .route("/bookings", get(bookings::list_bookings))
        .route("/bookings/{id}", get(bookings::get_booking))
        .route("/bookings/{id}/cancel", post(bookings::cancel_booking))
        .route(
            "/payments/client",
            get(payments::list_client_payments).post(payments::create_client_payment),
        )
        .route(
            "/payments/vendor",
            get(payments::list_vendor_payments).post(payments::create_vendor_payment),
        )
        .route("/audit-logs/timeline", get(audit_logs::timeline))
        .route(
            "/manual-quotes",
            get(manual_quotes::list_manual_quotes).post(manual_quotes::create_manual_quote),
        )
        .route(
            "/manual-quotes/{id}",
            get(manual_quotes::get_manual_quote)
                .patch(manual_quotes::update_manual_quote)
                .delete(manual_quotes::deactivate_manual_quote),
        )
        .route("/manual-quotes/{id}/days", post(manual_quotes::add_day))
        .route(
            "/manual-quotes/{id}/days/{day_id}",
            axum::routing::delete(manual_quotes::delete_day),
        )
        .route(
            "/manual-quotes/{id}/days/{day_id}/expenses",
            post(manual_quotes::add_expense),
        )
        .route(
            "/manual-quotes/{id}/expenses/{expense_id}",
            axum::routing::patch(manual_quotes::update_expense)
                .delete(manual_quotes::delete_expense),
        )
        .route_layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            auth_middleware,
        ))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(IDEMPOTENCY_KEY_HEADER),
            TRACE_ID_HEADER,
        ])
        .expose_headers([TRACE_ID_HEADER])
        .max_age(Duration::from_secs(60 * 60))
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .nest("/api/v1", api_routes(&state))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(middleware::from_fn(trace_context_middleware))
}

/// Serves the API until `shutdown` is cancelled, then drains in-flight requests.
pub async fn run_server(state: AppState, shutdown: CancellationToken) -> anyhow::Result<()> {
    let addr = state
        .config
        .bind_addr()
        .with_context(|| format!("Invalid bind address: {}", state.config.api_bind_addr))?;
    let profile = state.config.profile.clone();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server failed")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Registers the `bearer_auth` JWT scheme referenced by protected operations.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::tenants::current_tenant,
        crate::handlers::clients::list_clients,
        crate::handlers::clients::get_client,
        crate::handlers::clients::create_client,
        crate::handlers::clients::update_client,
        crate::handlers::clients::deactivate_client,
        crate::handlers::leads::list_leads,
        crate::handlers::leads::get_lead,
        crate::handlers::leads::create_lead,
        crate::handlers::leads::update_lead,
        crate::handlers::leads::deactivate_lead,
        crate::handlers::vendors::list_vendors,
        crate::handlers::vendors::get_vendor,
        crate::handlers::vendors::create_vendor,
        crate::handlers::vendors::update_vendor,
        crate::handlers::vendors::deactivate_vendor,
        crate::handlers::service_offerings::list_service_offerings,
        crate::handlers::service_offerings::get_service_offering,
        crate::handlers::service_offerings::create_service_offering,
        crate::handlers::service_offerings::update_service_offering,
        crate::handlers::service_offerings::deactivate_service_offering,
        crate::handlers::rates::list_rates,
        crate::handlers::rates::get_rate,
        crate::handlers::rates::create_rate,
        crate::handlers::rates::update_rate,
        crate::handlers::rates::deactivate_rate,
        crate::handlers::exchange_rates::list_exchange_rates,
        crate::handlers::exchange_rates::create_exchange_rate,
        crate::handlers::quotations::list_quotations,
        crate::handlers::quotations::get_quotation,
        crate::handlers::quotations::create_quotation,
        crate::handlers::quotations::update_quotation,
        crate::handlers::quotations::send_quotation,
        crate::handlers::quotations::reject_quotation,
        crate::handlers::quotations::accept_quotation,
        crate::handlers::bookings::list_bookings,
        crate::handlers::bookings::get_booking,
        crate::handlers::bookings::cancel_booking,
        crate::handlers::payments::list_client_payments,
        crate::handlers::payments::create_client_payment,
        crate::handlers::payments::list_vendor_payments,
        crate::handlers::payments::create_vendor_payment,
        crate::handlers::audit_logs::timeline,
        crate::handlers::manual_quotes::list_manual_quotes,
        crate::handlers::manual_quotes::get_manual_quote,
        crate::handlers::manual_quotes::create_manual_quote,
        crate::handlers::manual_quotes::update_manual_quote,
        crate::handlers::manual_quotes::deactivate_manual_quote,
        crate::handlers::manual_quotes::add_day,
        crate::handlers::manual_quotes::delete_day,
        crate::handlers::manual_quotes::add_expense,
        crate::handlers::manual_quotes::update_expense,
        crate::handlers::manual_quotes::delete_expense,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::handlers::HealthStatus,
            crate::handlers::types::Pagination,
            crate::rates::RateKind,
            crate::repositories::rate::RateRequest,
            crate::repositories::rate::RateRecord,
            crate::quotation_workflow::AcceptedQuotation,
            crate::handlers::quotations::RejectQuotationRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "root", description = "Service info and health"),
        (name = "clients", description = "Travel clients"),
        (name = "leads", description = "Sales pipeline"),
        (name = "vendors", description = "Suppliers"),
        (name = "service-offerings", description = "Bookable vendor services"),
        (name = "rates", description = "Seasonal rate tables"),
        (name = "exchange-rates", description = "Currency rates by effective date"),
        (name = "quotations", description = "Quotations and their workflow"),
        (name = "bookings", description = "Bookings created from accepted quotations"),
        (name = "payments", description = "Client and vendor payments"),
        (name = "audit-logs", description = "Audit timeline"),
        (name = "manual-quotes", description = "Day-by-day quote builder with per-pax pricing"),
    ),
    info(
        title = "Tour CRM API",
        description = "Multi-tenant CRM for tour operators",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
