use crate::AppState;
use crate::utils::toml_config::CorsConfig;
use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);

    Router::new()
        .route("/", get(crate::api::handlers::meta::root))
        .route("/api/council", post(crate::api::handlers::council::convene))
        .route(
            "/api/council/stream",
            post(crate::api::handlers::council::convene_stream),
        )
        .route("/api/health", get(crate::api::handlers::meta::health))
        .route("/api/swarms", get(crate::api::handlers::meta::list_swarms))
        .route("/api/openapi.json", get(openapi_spec))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS restricted to the configured frontend origins. Origins that fail to
/// parse as header values are skipped with a warning instead of rejecting
/// the whole config.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring unparseable CORS origin: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(crate::api::ApiDoc::openapi())
}
