//! # Council - Quad-Swarm Advisory Server
//!
//! An advisory council server: one problem statement is fanned out to four
//! retrieval-augmented perspective agents, each grounded in a knowledge store
//! of practitioner wisdom, and their answers are synthesized into a single
//! two-path verdict.
//!
//! ## Overview
//!
//! The council can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `council-server` binary
//! 2. **As a library** - Drive the [`council::Dispatcher`](council::Dispatcher)
//!    directly from your own Rust project
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use council::{CategoryRegistry, CouncilConfig, Dispatcher, OpenAIClient, PassageStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CouncilConfig::load("council.toml")?;
//!     let api_key = config.api_key()?;
//!
//!     let embedder = Arc::new(council::OpenAIEmbedder::from_config(
//!         &config.generation,
//!         api_key.clone(),
//!     ));
//!     let store = Arc::new(PassageStore::load_or_empty(&config.store.snapshot_path, embedder).await?);
//!     let client = Arc::new(OpenAIClient::from_config(&config.generation, api_key));
//!
//!     let dispatcher = Dispatcher::new(
//!         CategoryRegistry::from_config(&config.dispatch),
//!         store,
//!         client,
//!         config.dispatch.clone(),
//!     );
//!
//!     let session = dispatcher.convene("Should we rewrite the billing system?").await;
//!     println!("{:#?}", session.verdict);
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming
//!
//! [`Dispatcher::convene_streaming`](council::Dispatcher::convene_streaming)
//! returns a [`CouncilStream`](council::CouncilStream) of ordered events:
//! `swarm_start` for every configured perspective, `swarm_result` in
//! completion order, `synthesis_start`, `synthesis_result` (or a stage
//! `error`), and a terminal `done`. Dropping the stream cancels the session.
//!
//! ## Modules
//!
//! - [`council`] - Dispatcher, perspective agents, synthesizer, event stream
//! - [`store`] - Knowledge store: pre-embedded passages, cosine retrieval
//! - [`llm`] - Generation and embedding clients behind capability traits
//! - [`api`] - REST/SSE API handlers and routes
//! - [`cli`] - Command-line interface for the server binary
//! - [`types`] - Wire types, session model, and error handling
//! - [`utils`] - TOML configuration loading and validation

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface for the server binary.
pub mod cli;
/// The council pipeline: dispatcher, agents, synthesizer, events.
pub mod council;
/// Generation and embedding clients (OpenAI-backed).
pub mod llm;
/// Knowledge store: snapshot loading and similarity search.
pub mod store;
/// Core types (requests, session model, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use council::{CategoryRegistry, CouncilStream, Dispatcher};
pub use llm::{GenerationClient, OpenAIClient, OpenAIEmbedder};
pub use store::{Embedder, KnowledgeStore, PassageStore};
pub use types::{AppError, CouncilSession, Result, Verdict};
pub use utils::toml_config::CouncilConfig;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded infrastructure configuration
    pub config: Arc<CouncilConfig>,
    /// The council pipeline: fan-out, synthesis, event streaming
    pub dispatcher: Arc<Dispatcher>,
    /// Knowledge store backing retrieval, also reported by the health endpoint
    pub store: Arc<dyn KnowledgeStore>,
}
