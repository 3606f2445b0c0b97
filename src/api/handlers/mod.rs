//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Council convening handlers (synchronous and streaming).
pub mod council;
/// Service summary, health, and swarm introspection handlers.
pub mod meta;
