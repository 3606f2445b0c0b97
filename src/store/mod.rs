//! Knowledge store: pre-embedded passage snapshots with semantic search
//!
//! The store holds transcript passages embedded offline by the ingestion job.
//! At query time a passage is scored by cosine similarity between its stored
//! embedding and the query embedding, filtered to one collective's corpus.

pub mod memory;
pub mod traits;

pub use memory::{PassageStore, StoredPassage};
pub use traits::{Embedder, KnowledgeStore};
