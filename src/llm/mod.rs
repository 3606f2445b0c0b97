//! Language-model capability layer
//!
//! The rest of the application talks to generation through the
//! [`GenerationClient`] trait; the OpenAI implementation lives in
//! [`openai`] along with the embedding client used by the knowledge store.

pub mod client;
pub mod openai;

pub use client::{CapabilityError, GenerationClient, GenerationRequest};
pub use openai::{OpenAIClient, OpenAIEmbedder};
