//! Application setup and server configuration.

use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method};
use axum::routing::get;
use axum::Router;
use sqlx::PgPool;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domains::properties::geocode::AddressResolver;
use crate::server::middleware::AGENT_ID_HEADER;
use crate::server::routes::{
    add_property, delete_property, edit_property, get_property, health_handler, list_properties,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub resolver: Arc<AddressResolver>,
}

/// Build the Axum application router
pub fn build_app(pool: PgPool, resolver: Arc<AddressResolver>) -> Router {
    let state = AppState {
        db_pool: pool,
        resolver,
    };

    // CORS configuration - the browser client runs on its own origin
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(AGENT_ID_HEADER)]);

    // Rate limiting: 10 requests per second with bursts of 20 per IP.
    // Also shields the rate-limited geocoding upstream on the write path.
    let rate_limit_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .use_headers() // Extract IP from X-Forwarded-For header
            .finish()
            .expect("Rate limiter configuration is valid and should never fail"),
    );
    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config,
    };

    let api = Router::new()
        .route("/api/properties", get(list_properties).post(add_property))
        .route(
            "/api/properties/:id",
            get(get_property)
                .patch(edit_property)
                .delete(delete_property),
        )
        .layer(rate_limit_layer);

    api
        // Health check (no rate limit)
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
