//! In-memory passage store backed by a JSON snapshot
//!
//! The snapshot is a JSON array of [`StoredPassage`] rows written by the
//! offline ingestion job. Embeddings are precomputed there; only the query
//! is embedded at search time.

use crate::store::traits::{Embedder, KnowledgeStore};
use crate::types::{AppError, EvidencePassage, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

// ============= Snapshot Row =============

/// One pre-embedded transcript passage as persisted in the snapshot file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPassage {
    /// Stable identifier, unique across the snapshot
    pub id: String,
    pub text: String,
    /// Kebab-case speaker identifier, e.g. "brian-chesky"
    pub speaker_id: String,
    /// Source recording or episode identifier
    pub source_id: String,
    /// Position within the source, e.g. "12:34"
    pub time_offset: String,
    /// Corpus this passage belongs to, e.g. "founder_swarm"
    pub category: String,
    pub embedding: Vec<f32>,
}

// ============= Passage Store =============

/// In-memory store over the snapshot rows.
///
/// The corpus is immutable after load, so reads need no locking and search
/// results are stable for the lifetime of the process.
pub struct PassageStore {
    embedder: Arc<dyn Embedder>,
    passages: Vec<StoredPassage>,
}

impl PassageStore {
    pub fn new(embedder: Arc<dyn Embedder>, passages: Vec<StoredPassage>) -> Self {
        Self { embedder, passages }
    }

    /// Load the snapshot from disk.
    ///
    /// A missing file is an error here; use [`Self::load_or_empty`] at
    /// startup where an empty corpus is acceptable.
    pub async fn load<P: AsRef<Path>>(path: P, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let path = path.as_ref();

        let data = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::Config(format!(
                "Failed to read passage snapshot '{}': {}",
                path.display(),
                e
            ))
        })?;

        let passages: Vec<StoredPassage> = serde_json::from_str(&data).map_err(|e| {
            AppError::Config(format!(
                "Failed to parse passage snapshot '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self::new(embedder, passages))
    }

    /// Load the snapshot, falling back to an empty corpus if the file does
    /// not exist. A present-but-corrupt snapshot is still an error.
    pub async fn load_or_empty<P: AsRef<Path>>(
        path: P,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                snapshot = %path.display(),
                "Passage snapshot not found, starting with an empty knowledge store"
            );
            return Ok(Self::new(embedder, Vec::new()));
        }

        Self::load(path, embedder).await
    }
}

#[async_trait]
impl KnowledgeStore for PassageStore {
    async fn search(
        &self,
        query_text: &str,
        category_filter: &str,
        top_k: usize,
    ) -> Result<Vec<EvidencePassage>> {
        let query_embedding = self.embedder.embed(query_text).await?;

        let mut scored: Vec<(&StoredPassage, f32)> = self
            .passages
            .iter()
            .filter(|p| p.category == category_filter)
            .map(|p| (p, cosine_similarity(&query_embedding, &p.embedding)))
            .collect();

        // Score descending, then id ascending so equal scores order
        // deterministically.
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(p, score)| EvidencePassage {
                text: p.text.clone(),
                speaker_id: p.speaker_id.clone(),
                source_id: p.source_id.clone(),
                time_offset: p.time_offset.clone(),
                relevance_score: score,
            })
            .collect())
    }

    fn passage_count(&self) -> usize {
        self.passages.len()
    }

    fn category_count(&self, category_filter: &str) -> usize {
        self.passages
            .iter()
            .filter(|p| p.category == category_filter)
            .count()
    }
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched dimensions or a zero-magnitude vector rather
/// than propagating NaN into the ranking.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
