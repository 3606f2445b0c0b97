//! Multi-agent advisory orchestration
//!
//! One problem statement fans out to four retrieval-augmented perspective
//! agents, their terminal results feed a synthesis step that forces a
//! two-path verdict, and the whole run is observable as an ordered event
//! stream (or drained synchronously into a [`crate::types::CouncilSession`]).

pub mod agent;
pub mod categories;
pub mod dispatcher;
pub mod events;
pub mod synthesizer;

pub use agent::{diversify_citations, PerspectiveAgent};
pub use categories::{CategoryRegistry, CategorySpec};
pub use dispatcher::{CouncilStream, Dispatcher};
pub use events::{
    CouncilEvent, DoneInfo, StageErrorInfo, SwarmStartInfo, SynthesisStartInfo,
};
pub use synthesizer::{parse_verdict, Synthesizer};
