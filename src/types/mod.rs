//! Core types for the council pipeline: wire requests/responses, the
//! session data model, and crate-wide error handling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

// ============= API Request/Response Types =============

/// Request body accepted by both the synchronous and streaming endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CouncilRequest {
    /// Free-form problem statement to put before the council.
    pub problem: String,
}

// ============= Category Types =============

/// The fixed set of advisory perspectives. Each category maps to exactly one
/// retrieval-augmented agent and one metadata filter in the knowledge store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PerspectiveCategory {
    Visionary,
    Scaler,
    Scientist,
    Architect,
}

impl PerspectiveCategory {
    /// Stable wire name, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PerspectiveCategory::Visionary => "visionary",
            PerspectiveCategory::Scaler => "scaler",
            PerspectiveCategory::Scientist => "scientist",
            PerspectiveCategory::Architect => "architect",
        }
    }

    /// Parse a wire name back into a category.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "visionary" => Some(PerspectiveCategory::Visionary),
            "scaler" => Some(PerspectiveCategory::Scaler),
            "scientist" => Some(PerspectiveCategory::Scientist),
            "architect" => Some(PerspectiveCategory::Architect),
            _ => None,
        }
    }
}

impl std::fmt::Display for PerspectiveCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============= Evidence Types =============

/// A unit of retrieved text, owned by the knowledge store and referenced by
/// an [`AgentResult`]. Speaker ids are kebab-case (`brian-chesky`); use
/// [`EvidencePassage::speaker_name`] for display.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvidencePassage {
    pub text: String,
    pub speaker_id: String,
    pub source_id: String,
    /// Position within the source recording, `HH:MM:SS`.
    pub time_offset: String,
    pub relevance_score: f32,
}

impl EvidencePassage {
    /// Render the kebab-case speaker id as a capitalized display name
    /// (`brian-chesky` -> `Brian Chesky`).
    pub fn speaker_name(&self) -> String {
        self.speaker_id
            .split('-')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ============= Agent Result Types =============

/// Terminal state of one perspective agent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum AgentStatus {
    Success,
    Failed { reason: String },
}

impl AgentStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, AgentStatus::Success)
    }
}

/// Outcome of one perspective agent for one session. Produced exactly once
/// per category per session and immutable afterwards; a failure is carried
/// here as data, never as an exception crossing the category boundary.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgentResult {
    pub category: PerspectiveCategory,
    pub display_name: String,
    pub narrative_text: String,
    /// Citations chosen by speaker diversification, not raw relevance order.
    pub evidence: Vec<EvidencePassage>,
    pub status: AgentStatus,
}

impl AgentResult {
    pub fn failed(
        category: PerspectiveCategory,
        display_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            category,
            display_name: display_name.into(),
            narrative_text: String::new(),
            evidence: Vec::new(),
            status: AgentStatus::Failed {
                reason: reason.into(),
            },
        }
    }
}

// ============= Verdict Types =============

/// The synthesized decision artifact: one irreducible tension, two mutually
/// exclusive paths, a call between them, and a validating question.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Verdict {
    pub tension_statement: String,
    pub path_bold: String,
    pub path_measured: String,
    pub recommendation: String,
    pub validating_question: String,
}

impl Verdict {
    /// Terminal verdict for a session in which no perspective succeeded.
    /// This is a valid output, not an error.
    pub fn no_synthesis(failed_names: &[String]) -> Self {
        let missing = if failed_names.is_empty() {
            "no perspectives were configured".to_string()
        } else {
            format!("no response from {}", failed_names.join(", "))
        };
        Self {
            tension_statement: String::new(),
            path_bold: String::new(),
            path_measured: String::new(),
            recommendation: format!(
                "No synthesis could be formed: {}. Retry the request or check upstream health.",
                missing
            ),
            validating_question: String::new(),
        }
    }
}

// ============= Session Types =============

/// Aggregate of one council run. Created on request acceptance, filled in by
/// the dispatcher (agent results) and synthesizer (verdict), then returned
/// to the caller; nothing is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CouncilSession {
    pub id: Uuid,
    pub problem: String,
    /// One slot per configured category, written at most once.
    pub results: BTreeMap<PerspectiveCategory, AgentResult>,
    /// `None` when the synthesis stage could not produce output.
    pub verdict: Option<Verdict>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CouncilSession {
    pub fn new(id: Uuid, problem: impl Into<String>) -> Self {
        Self {
            id,
            problem: problem.into(),
            results: BTreeMap::new(),
            verdict: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Count of categories whose agent finished with `Success`.
    pub fn success_count(&self) -> usize {
        self.results
            .values()
            .filter(|r| r.status.is_success())
            .count()
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Knowledge store unreachable or empty. Degraded, not fatal: agents
    /// proceed with an empty evidence set.
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// Language-model capability error or timeout. Fatal to one category's
    /// result, never propagated to siblings.
    #[error("Generation failure: {0}")]
    GenerationFailure(String),

    /// Overall session wait budget elapsed.
    #[error("Session timed out: {0}")]
    SessionTimeout(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::RetrievalUnavailable(msg) => {
                (axum::http::StatusCode::SERVICE_UNAVAILABLE, msg)
            }
            AppError::GenerationFailure(msg) => (axum::http::StatusCode::BAD_GATEWAY, msg),
            AppError::SessionTimeout(msg) => (axum::http::StatusCode::GATEWAY_TIMEOUT, msg),
            AppError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::Config(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Internal(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
