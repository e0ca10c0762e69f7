pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use chrono::FixedOffset;
use sqlx::PgPool;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    /// Frame the venue hours are authored in; search instants are normalized to it.
    pub venue: FixedOffset,
}

impl AppState {
    pub fn new(db: PgPool, config: Arc<Config>) -> anyhow::Result<Self> {
        let venue = services::clock::venue_offset(config.venue_utc_offset_minutes)?;
        Ok(Self { db, config, venue })
    }
}

/// Allow the configured base URL and localhost (development).
fn cors_layer(base_url: String) -> CorsLayer {
    let origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let Ok(o) = origin.to_str() else {
            return false;
        };
        o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1") || o == base_url
    });

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("x-admin-key"),
        ]))
        .allow_origin(origin)
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(state.config.app_base_url.clone());

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler))
        // Public search
        .route("/restaurants", get(routes::restaurants::list_restaurants))
        .route("/restaurants/nearby", get(routes::restaurants::nearby_restaurants))
        .route("/restaurants/{id}", get(routes::restaurants::get_restaurant))
        // Back office
        .route("/admin/restaurants", post(routes::admin::create_restaurant))
        .route(
            "/admin/restaurants/{id}",
            put(routes::admin::update_restaurant).delete(routes::admin::delete_restaurant),
        )
        .route("/admin/restaurants/{id}/restore", post(routes::admin::restore_restaurant))
        .route("/admin/restaurants/{id}/hours", put(routes::admin::replace_hours))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
