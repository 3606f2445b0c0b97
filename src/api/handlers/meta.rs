use crate::AppState;
use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use utoipa::ToSchema;

/// Service summary, served at the root path.
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let swarms: Vec<Value> = state
        .dispatcher
        .registry()
        .specs()
        .iter()
        .map(|spec| {
            json!({
                "name": spec.category.as_str(),
                "display_name": spec.display_name,
                "focus": spec.focus,
            })
        })
        .collect();

    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "swarms": swarms,
    }))
}

/// Detailed health check: store reachability with passage counts, the
/// configured generation model, and per-category readiness.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Component health map")
    ),
    tag = "meta"
)]
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let total_passages = state.store.passage_count();

    let mut passages_by_category = serde_json::Map::new();
    let mut swarms = serde_json::Map::new();
    for spec in state.dispatcher.registry().specs() {
        passages_by_category.insert(
            spec.store_filter.to_string(),
            json!(state.store.category_count(spec.store_filter)),
        );
        swarms.insert(
            spec.category.as_str().to_string(),
            json!({
                "status": "ready",
                "display_name": spec.display_name,
            }),
        );
    }

    let store_status = if total_passages > 0 { "ready" } else { "empty" };

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now(),
        "components": {
            "api": "up",
            "store": {
                "status": store_status,
                "passages": total_passages,
                "passages_by_category": passages_by_category,
            },
            "generation": {
                "model": state.config.generation.model,
            },
            "swarms": swarms,
        },
    }))
}

/// One configured perspective, as exposed by `/api/swarms`.
#[derive(Serialize, ToSchema)]
pub struct SwarmInfo {
    pub name: String,
    pub display_name: String,
    pub focus: String,
    pub color: String,
}

/// Response body for the swarm listing endpoint.
#[derive(Serialize, ToSchema)]
pub struct SwarmListResponse {
    pub swarms: Vec<SwarmInfo>,
}

/// List every configured perspective with its display metadata.
#[utoipa::path(
    get,
    path = "/api/swarms",
    responses(
        (status = 200, description = "Configured perspectives", body = SwarmListResponse)
    ),
    tag = "meta"
)]
pub async fn list_swarms(State(state): State<AppState>) -> Json<SwarmListResponse> {
    let swarms = state
        .dispatcher
        .registry()
        .specs()
        .iter()
        .map(|spec| SwarmInfo {
            name: spec.category.as_str().to_string(),
            display_name: spec.display_name.to_string(),
            focus: spec.focus.to_string(),
            color: spec.color.to_string(),
        })
        .collect();

    Json(SwarmListResponse { swarms })
}
