//! Retrieval-augmented perspective agent
//!
//! One agent serves one category: it retrieves the category's most relevant
//! passages, frames them as grounding context under the persona prompt, and
//! runs a single generation call. The agent never raises past its boundary;
//! every run ends in a terminal [`AgentResult`].

use crate::council::categories::CategorySpec;
use crate::llm::{GenerationClient, GenerationRequest};
use crate::store::KnowledgeStore;
use crate::types::{AgentResult, AgentStatus, EvidencePassage, PerspectiveCategory};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

const EMPTY_CONTEXT_NOTE: &str = "No relevant context found from this collective.";

#[derive(Clone)]
pub struct PerspectiveAgent {
    spec: CategorySpec,
    store: Arc<dyn KnowledgeStore>,
    client: Arc<dyn GenerationClient>,
    top_k: usize,
    citation_cap: usize,
}

impl PerspectiveAgent {
    pub fn new(
        spec: CategorySpec,
        store: Arc<dyn KnowledgeStore>,
        client: Arc<dyn GenerationClient>,
        top_k: usize,
        citation_cap: usize,
    ) -> Self {
        Self {
            spec,
            store,
            client,
            top_k,
            citation_cap,
        }
    }

    pub fn category(&self) -> PerspectiveCategory {
        self.spec.category
    }

    pub fn display_name(&self) -> &str {
        self.spec.display_name
    }

    /// Run retrieval then generation for one problem statement.
    ///
    /// Retrieval trouble degrades to an empty evidence set; only a failed
    /// generation call turns the result `Failed`.
    pub async fn run(&self, problem: &str) -> AgentResult {
        let query = self.spec.build_query(problem);

        let passages = match self
            .store
            .search(&query, self.spec.store_filter, self.top_k)
            .await
        {
            Ok(passages) => passages,
            Err(e) => {
                tracing::warn!(
                    category = self.spec.category.as_str(),
                    "Retrieval degraded, continuing without evidence: {}",
                    e
                );
                Vec::new()
            }
        };

        let request = self.build_request(&query, &passages);

        match self.client.generate(&request).await {
            Ok(narrative_text) => AgentResult {
                category: self.spec.category,
                display_name: self.spec.display_name.to_string(),
                narrative_text,
                evidence: diversify_citations(&passages, self.citation_cap),
                status: AgentStatus::Success,
            },
            Err(e) => {
                tracing::warn!(
                    category = self.spec.category.as_str(),
                    "Generation failed: {}",
                    e
                );
                AgentResult::failed(self.spec.category, self.spec.display_name, e.to_string())
            }
        }
    }

    fn build_request(&self, query: &str, passages: &[EvidencePassage]) -> GenerationRequest {
        let context = if passages.is_empty() {
            EMPTY_CONTEXT_NOTE.to_string()
        } else {
            passages
                .iter()
                .map(|p| format!("[{} - {}] {}", p.speaker_name(), p.time_offset, p.text))
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        let system = format!(
            "{}\n\n---\n\nRelevant wisdom from the collective:\n{}",
            self.spec.persona_prompt, context
        );

        GenerationRequest::new(system, query)
    }
}

/// Pick which retrieved passages to surface as citations.
///
/// Passages are grouped by speaker in first-appearance (relevance) order,
/// then drawn round-robin, one per speaker per round, until `cap` is
/// reached. A speaker dominating the raw ranking cannot crowd others out
/// of the citation set.
pub fn diversify_citations(passages: &[EvidencePassage], cap: usize) -> Vec<EvidencePassage> {
    if passages.is_empty() || cap == 0 {
        return Vec::new();
    }

    let mut speaker_order: Vec<&str> = Vec::new();
    let mut by_speaker: HashMap<&str, VecDeque<&EvidencePassage>> = HashMap::new();
    for passage in passages {
        let speaker = passage.speaker_id.as_str();
        if !by_speaker.contains_key(speaker) {
            speaker_order.push(speaker);
        }
        by_speaker.entry(speaker).or_default().push_back(passage);
    }

    let mut citations = Vec::with_capacity(cap.min(passages.len()));
    while citations.len() < cap {
        let mut drew_any = false;
        for speaker in &speaker_order {
            if citations.len() >= cap {
                break;
            }
            if let Some(queue) = by_speaker.get_mut(speaker) {
                if let Some(passage) = queue.pop_front() {
                    citations.push(passage.clone());
                    drew_any = true;
                }
            }
        }
        if !drew_any {
            break;
        }
    }

    citations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::council::categories::CategoryRegistry;
    use crate::llm::CapabilityError;
    use crate::types::{AppError, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ============= Mocks =============

    struct StubStore {
        passages: Vec<EvidencePassage>,
        fail: bool,
    }

    #[async_trait]
    impl KnowledgeStore for StubStore {
        async fn search(
            &self,
            _query_text: &str,
            _category_filter: &str,
            top_k: usize,
        ) -> Result<Vec<EvidencePassage>> {
            if self.fail {
                return Err(AppError::RetrievalUnavailable("store offline".to_string()));
            }
            Ok(self.passages.iter().take(top_k).cloned().collect())
        }

        fn passage_count(&self) -> usize {
            self.passages.len()
        }

        fn category_count(&self, _category_filter: &str) -> usize {
            self.passages.len()
        }
    }

    struct RecordingClient {
        requests: Mutex<Vec<GenerationRequest>>,
        response: std::result::Result<String, String>,
    }

    impl RecordingClient {
        fn succeeding(text: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                response: Ok(text.to_string()),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                response: Err(reason.to_string()),
            }
        }

        fn last_request(&self) -> GenerationRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl GenerationClient for RecordingClient {
        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> std::result::Result<String, CapabilityError> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(reason) => Err(CapabilityError::Upstream(reason.clone())),
            }
        }

        fn model_name(&self) -> &str {
            "recording-test-client"
        }
    }

    fn passage(speaker: &str, text: &str, score: f32) -> EvidencePassage {
        EvidencePassage {
            text: text.to_string(),
            speaker_id: speaker.to_string(),
            source_id: "episode-1".to_string(),
            time_offset: "01:23".to_string(),
            relevance_score: score,
        }
    }

    fn visionary_agent(
        store: Arc<dyn KnowledgeStore>,
        client: Arc<RecordingClient>,
    ) -> PerspectiveAgent {
        let spec = CategoryRegistry::defaults()
            .get(PerspectiveCategory::Visionary)
            .unwrap()
            .clone();
        PerspectiveAgent::new(spec, store, client, 8, 4)
    }

    // ============= Agent Run =============

    #[tokio::test]
    async fn test_successful_run_grounds_generation_in_retrieved_context() {
        let store = Arc::new(StubStore {
            passages: vec![passage("brian-chesky", "Design the experience first.", 0.9)],
            fail: false,
        });
        let client = Arc::new(RecordingClient::succeeding("The bold view."));

        let agent = visionary_agent(store, client.clone());
        let result = agent.run("How to fix onboarding?").await;

        assert!(result.status.is_success());
        assert_eq!(result.narrative_text, "The bold view.");
        assert_eq!(result.evidence.len(), 1);

        let request = client.last_request();
        assert!(request.system.contains("Collective Consciousness"));
        assert!(request.system.contains("[Brian Chesky - 01:23] Design the experience first."));
        assert!(request.user.contains("How to fix onboarding?"));
        assert!(request.user.contains("founder's perspective"));
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_empty_evidence() {
        let store = Arc::new(StubStore {
            passages: Vec::new(),
            fail: true,
        });
        let client = Arc::new(RecordingClient::succeeding("Still answered."));

        let agent = visionary_agent(store, client.clone());
        let result = agent.run("A problem").await;

        assert!(result.status.is_success());
        assert!(result.evidence.is_empty());
        let request = client.last_request();
        assert!(request.system.contains(EMPTY_CONTEXT_NOTE));
    }

    #[tokio::test]
    async fn test_zero_passages_uses_explicit_note() {
        let store = Arc::new(StubStore {
            passages: Vec::new(),
            fail: false,
        });
        let client = Arc::new(RecordingClient::succeeding("Answered without context."));

        let agent = visionary_agent(store, client.clone());
        let result = agent.run("A problem").await;

        assert!(result.status.is_success());
        assert!(client.last_request().system.contains(EMPTY_CONTEXT_NOTE));
    }

    #[tokio::test]
    async fn test_generation_failure_becomes_failed_result() {
        let store = Arc::new(StubStore {
            passages: vec![passage("brian-chesky", "text", 0.9)],
            fail: false,
        });
        let client = Arc::new(RecordingClient::failing("rate limited"));

        let agent = visionary_agent(store, client);
        let result = agent.run("A problem").await;

        match result.status {
            AgentStatus::Failed { reason } => assert!(reason.contains("rate limited")),
            AgentStatus::Success => panic!("expected failure"),
        }
        assert!(result.narrative_text.is_empty());
        assert_eq!(result.category, PerspectiveCategory::Visionary);
    }

    // ============= Citation Diversification =============

    #[test]
    fn test_diversify_round_robins_across_speakers() {
        // One dominant speaker with 10 passages, two others with 1 each
        let mut passages = Vec::new();
        for i in 0..10 {
            passages.push(passage("dominant-speaker", &format!("d{}", i), 0.9));
        }
        passages.push(passage("second-speaker", "s", 0.5));
        passages.push(passage("third-speaker", "t", 0.4));

        let citations = diversify_citations(&passages, 4);

        assert_eq!(citations.len(), 4);
        let distinct: std::collections::HashSet<&str> = citations
            .iter()
            .map(|c| c.speaker_id.as_str())
            .collect();
        assert!(distinct.len() >= 3, "citations must span at least 3 speakers");
    }

    #[test]
    fn test_diversify_preserves_relevance_order_within_round() {
        let passages = vec![
            passage("alpha", "a1", 0.9),
            passage("beta", "b1", 0.8),
            passage("alpha", "a2", 0.7),
            passage("beta", "b2", 0.6),
        ];

        let citations = diversify_citations(&passages, 4);
        let texts: Vec<&str> = citations.iter().map(|c| c.text.as_str()).collect();
        // Round one: best per speaker in first-appearance order; round two: next best
        assert_eq!(texts, vec!["a1", "b1", "a2", "b2"]);
    }

    #[test]
    fn test_diversify_respects_cap_and_exhaustion() {
        let passages = vec![passage("alpha", "a1", 0.9), passage("beta", "b1", 0.8)];

        assert_eq!(diversify_citations(&passages, 1).len(), 1);
        assert_eq!(diversify_citations(&passages, 10).len(), 2);
        assert!(diversify_citations(&[], 4).is_empty());
        assert!(diversify_citations(&passages, 0).is_empty());
    }
}
