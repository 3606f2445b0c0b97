//! Trait seams for retrieval

use crate::types::{EvidencePassage, Result};
use async_trait::async_trait;

/// Turns text into a dense vector.
///
/// Implementations wrap a remote embedding endpoint; failures surface as
/// `AppError::RetrievalUnavailable` so callers can degrade instead of abort.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single piece of text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Model identifier, for logs and health reporting
    fn model_name(&self) -> &str;
}

/// Read-only semantic search over the passage corpus.
///
/// `search` must be idempotent: the same query against the same store
/// contents returns the same passages in the same order.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Return up to `top_k` passages from `category_filter`'s corpus,
    /// most relevant first
    async fn search(
        &self,
        query_text: &str,
        category_filter: &str,
        top_k: usize,
    ) -> Result<Vec<EvidencePassage>>;

    /// Total passages held across all categories
    fn passage_count(&self) -> usize;

    /// Passages held for one category's corpus, for health reporting
    fn category_count(&self, category_filter: &str) -> usize;
}
