pub mod config;
pub mod modules;
pub mod services;

use axum::{
    extract::DefaultBodyLimit, http::HeaderValue, middleware, routing::get, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use modules::school::interface::SchoolRepository;
use modules::school::school_routes;
use services::jwt::JwtService;
use services::mailer::MailSender;
use services::security::security_headers;
use services::uploads::BlobStore;

/// Collaborators built once at startup and injected everywhere; no
/// module-level singletons.
pub struct AppState {
    pub schools: Arc<dyn SchoolRepository>,
    pub mailer: Arc<dyn MailSender>,
    pub uploads: Arc<dyn BlobStore>,
    pub jwt_service: JwtService,
    pub client_url: String,
}

pub async fn create_app(state: AppState, allowed_origins: Vec<String>) -> Router {
    let cors = if allowed_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/health", get(health_check))
        .merge(school_routes())
        .layer(middleware::from_fn(security_headers))
        .layer(DefaultBodyLimit::max(1024 * 1024 * 5)) // 5MB, fits profile images
        .layer(RequestBodyLimitLayer::new(1024 * 1024 * 5))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
