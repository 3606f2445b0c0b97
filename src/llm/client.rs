//! Generation client abstraction
//!
//! All generation goes through [`GenerationClient`], keeping agents and the
//! synthesizer independent of the concrete provider and making both trivially
//! mockable in tests.

use crate::types::AppError;
use async_trait::async_trait;
use std::time::Duration;

/// One generation call: a system framing plus a single user message
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
    /// Overrides the configured default when set
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: None,
        }
    }
}

/// Errors from one generation capability call.
///
/// These are scoped to a single call so a failure can be attached to one
/// category's result without disturbing siblings.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),

    #[error("Upstream generation error: {0}")]
    Upstream(String),

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    /// Output that arrived but cannot be used, e.g. a synthesis response
    /// missing a required section
    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),

    #[error("Empty generation response")]
    EmptyResponse,
}

impl From<CapabilityError> for AppError {
    fn from(err: CapabilityError) -> Self {
        AppError::GenerationFailure(err.to_string())
    }
}

/// Provider-agnostic generation interface
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Run one completion and return its text content
    async fn generate(&self, request: &GenerationRequest)
        -> Result<String, CapabilityError>;

    /// Model identifier, for logs and health reporting
    fn model_name(&self) -> &str;
}
