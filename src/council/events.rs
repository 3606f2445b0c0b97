//! Session event stream vocabulary
//!
//! One council session emits an ordered sequence of these events: every
//! category's `swarm_start` first, one `swarm_result` per category in
//! completion order, then `synthesis_start`, `synthesis_result` (or a stage
//! `error`), and a terminal `done`.

use crate::types::{AgentResult, PerspectiveCategory, Verdict};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SwarmStartInfo {
    pub category: PerspectiveCategory,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SynthesisStartInfo {
    /// Categories whose result reached `Success`
    pub success_count: usize,
}

/// A stage that produced no output at all. Distinct from an
/// [`AgentResult`] with `Failed` status, which is a delivered result
/// carrying a failure payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StageErrorInfo {
    pub stage: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DoneInfo {
    pub session_id: Uuid,
}

/// One event in a session's stream.
///
/// Serialization is untagged: the SSE layer names the event via
/// [`CouncilEvent::name`] and sends only the payload as data.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CouncilEvent {
    SwarmStart(SwarmStartInfo),
    SwarmResult(AgentResult),
    SynthesisStart(SynthesisStartInfo),
    SynthesisResult(Verdict),
    Error(StageErrorInfo),
    Done(DoneInfo),
}

impl CouncilEvent {
    /// Wire name for the SSE `event:` field
    pub fn name(&self) -> &'static str {
        match self {
            CouncilEvent::SwarmStart(_) => "swarm_start",
            CouncilEvent::SwarmResult(_) => "swarm_result",
            CouncilEvent::SynthesisStart(_) => "synthesis_start",
            CouncilEvent::SynthesisResult(_) => "synthesis_result",
            CouncilEvent::Error(_) => "error",
            CouncilEvent::Done(_) => "done",
        }
    }
}
