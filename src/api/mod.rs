//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for the council server, built on
//! the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Council (`/api/council`)
//! - `POST /api/council` - Convene the council, wait for the full session
//! - `POST /api/council/stream` - Convene the council as an SSE event stream
//!
//! ## Meta
//! - `GET /` - Service summary with configured perspectives
//! - `GET /api/health` - Detailed component health
//! - `GET /api/swarms` - Perspective introspection (name, focus, color)
//! - `GET /api/openapi.json` - OpenAPI document for this surface
//!
//! # Streaming
//!
//! The stream endpoint emits named SSE events in a fixed protocol order:
//! `swarm_start` for every configured perspective, one `swarm_result` per
//! perspective in completion order, `synthesis_start`, then either
//! `synthesis_result` or `error`, and finally `done`. Clients that drop the
//! connection cancel all outstanding work for that session.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::council::{DoneInfo, StageErrorInfo, SwarmStartInfo, SynthesisStartInfo};
use crate::types::{
    AgentResult, AgentStatus, CouncilRequest, CouncilSession, EvidencePassage,
    PerspectiveCategory, Verdict,
};
use utoipa::OpenApi;

/// Aggregated OpenAPI document for the annotated endpoints.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Council Server API",
        description = "Quad-swarm advisory council: one problem, four retrieval-augmented perspectives, one synthesized verdict."
    ),
    paths(
        handlers::council::convene,
        handlers::council::convene_stream,
        handlers::meta::health,
        handlers::meta::list_swarms,
    ),
    components(schemas(
        CouncilRequest,
        CouncilSession,
        AgentResult,
        AgentStatus,
        EvidencePassage,
        Verdict,
        PerspectiveCategory,
        SwarmStartInfo,
        SynthesisStartInfo,
        StageErrorInfo,
        DoneInfo,
    )),
    tags(
        (name = "council", description = "Convene the advisory council"),
        (name = "meta", description = "Service metadata and health")
    )
)]
pub struct ApiDoc;
