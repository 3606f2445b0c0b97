//! Integration tests for the council pipeline
//!
//! These drive the Dispatcher end to end with mock retrieval and generation,
//! checking the event protocol, failure containment, timeout handling,
//! cancellation, and the synchronous aggregate.

use async_trait::async_trait;
use council::council::{CategoryRegistry, CouncilEvent, Dispatcher};
use council::llm::{CapabilityError, GenerationClient, GenerationRequest};
use council::store::{Embedder, KnowledgeStore, PassageStore, StoredPassage};
use council::types::{AgentStatus, EvidencePassage, PerspectiveCategory, Result};
use council::utils::toml_config::DispatchConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// ============= Mock Knowledge Store =============

/// Mock store serving canned passages per category filter
struct StubStore {
    by_filter: HashMap<String, Vec<EvidencePassage>>,
}

impl StubStore {
    fn empty() -> Self {
        Self {
            by_filter: HashMap::new(),
        }
    }
}

#[async_trait]
impl KnowledgeStore for StubStore {
    async fn search(
        &self,
        _query_text: &str,
        category_filter: &str,
        top_k: usize,
    ) -> Result<Vec<EvidencePassage>> {
        let mut passages = self
            .by_filter
            .get(category_filter)
            .cloned()
            .unwrap_or_default();
        passages.truncate(top_k);
        Ok(passages)
    }

    fn passage_count(&self) -> usize {
        self.by_filter.values().map(Vec::len).sum()
    }

    fn category_count(&self, category_filter: &str) -> usize {
        self.by_filter.get(category_filter).map_or(0, Vec::len)
    }
}

fn evidence(speaker: &str, text: &str) -> EvidencePassage {
    EvidencePassage {
        text: text.to_string(),
        speaker_id: speaker.to_string(),
        source_id: format!("{speaker}-interview"),
        time_offset: "00:12:30".to_string(),
        relevance_score: 0.9,
    }
}

fn seeded_store() -> Arc<StubStore> {
    let mut by_filter = HashMap::new();
    for filter in [
        "founder_swarm",
        "product_swarm",
        "growth_swarm",
        "engineering_swarm",
    ] {
        by_filter.insert(
            filter.to_string(),
            vec![
                evidence("brian-chesky", "Obsess over every detail of the experience."),
                evidence("claire-hughes-johnson", "Write the operating principles down."),
                evidence("elena-verna", "Growth is a system, not a team."),
            ],
        );
    }
    Arc::new(StubStore { by_filter })
}

// ============= Mock Generation Client =============

/// Agent query template prefixes, used to target behavior at one category.
const VISIONARY_PREFIX: &str = "From a founder's perspective";
const SCALER_PREFIX: &str = "What product strategy";

const SYNTHESIS_FIXTURE: &str = "**THE CORE TENSION**\n\
    Momentum against trust. Forcing the issue wins speed and risks the relationship.\n\n\
    **PATH A: THE BOLD MOVE**\n\
    - First, take the initiative to your executive sponsor\n\
    - Then, ship a visible pilot\n\
    - Prepare for a strained reporting line\n\n\
    **PATH B: THE MEASURED MOVE**\n\
    - First, map your manager's actual objections\n\
    - Then, co-own a smaller win\n\
    - Prepare for slower progress\n\n\
    **THE TIE-BREAKER**\n\
    Take Path A. You sacrifice short-term harmony for momentum, and your \
    executive support is a perishable asset. What would staying silent for \
    another quarter cost you?";

/// Mock generation client. Synthesis calls are recognized by their coach
/// framing; agent calls can be delayed or failed per query-template prefix.
struct MockCouncilClient {
    fail_prefixes: &'static [&'static str],
    slow_prefix: Option<&'static str>,
    slow_delay: Duration,
    base_delay: Duration,
    malformed_synthesis: bool,
    completed: Arc<AtomicUsize>,
}

impl MockCouncilClient {
    fn succeeding() -> Self {
        Self {
            fail_prefixes: &[],
            slow_prefix: None,
            slow_delay: Duration::ZERO,
            base_delay: Duration::ZERO,
            malformed_synthesis: false,
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn failing_for(prefixes: &'static [&'static str]) -> Self {
        Self {
            fail_prefixes: prefixes,
            ..Self::succeeding()
        }
    }

    fn failing_all() -> Self {
        Self::failing_for(&[
            "From a founder's perspective",
            "What product strategy",
            "What growth systems",
            "What are the technical",
        ])
    }

    fn with_latency(slow_prefix: &'static str, slow: Duration, fast: Duration) -> Self {
        Self {
            slow_prefix: Some(slow_prefix),
            slow_delay: slow,
            base_delay: fast,
            ..Self::succeeding()
        }
    }

    fn sleeping(delay: Duration) -> Self {
        Self {
            base_delay: delay,
            ..Self::succeeding()
        }
    }

    fn malformed_synthesis() -> Self {
        Self {
            malformed_synthesis: true,
            ..Self::succeeding()
        }
    }

    fn completed_calls(&self) -> Arc<AtomicUsize> {
        self.completed.clone()
    }
}

#[async_trait]
impl GenerationClient for MockCouncilClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<String, CapabilityError> {
        if request.user.contains("Executive Coach") {
            if self.malformed_synthesis {
                return Ok("Some prose with none of the required sections.".to_string());
            }
            return Ok(SYNTHESIS_FIXTURE.to_string());
        }

        let delay = match self.slow_prefix {
            Some(prefix) if request.user.starts_with(prefix) => self.slow_delay,
            _ => self.base_delay,
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        for prefix in self.fail_prefixes {
            if request.user.starts_with(prefix) {
                return Err(CapabilityError::Upstream(
                    "simulated provider outage".to_string(),
                ));
            }
        }

        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok("A grounded narrative citing the collective's wisdom.".to_string())
    }

    fn model_name(&self) -> &str {
        "mock-council-client"
    }
}

// ============= Test Helpers =============

fn dispatcher_with(client: Arc<dyn GenerationClient>) -> Dispatcher {
    dispatcher_with_config(client, DispatchConfig::default())
}

fn dispatcher_with_config(client: Arc<dyn GenerationClient>, config: DispatchConfig) -> Dispatcher {
    Dispatcher::new(CategoryRegistry::defaults(), seeded_store(), client, config)
}

async fn drain(dispatcher: &Dispatcher, problem: &str) -> Vec<CouncilEvent> {
    let mut stream = dispatcher.convene_streaming(problem);
    let mut events = Vec::new();
    while let Some(event) = stream.next_event().await {
        events.push(event);
    }
    events
}

fn result_categories(events: &[CouncilEvent]) -> Vec<PerspectiveCategory> {
    events
        .iter()
        .filter_map(|e| match e {
            CouncilEvent::SwarmResult(result) => Some(result.category),
            _ => None,
        })
        .collect()
}

// ============= Event Protocol =============

#[tokio::test]
async fn test_event_protocol_order_all_success() {
    let dispatcher = dispatcher_with(Arc::new(MockCouncilClient::succeeding()));
    let mut stream = dispatcher.convene_streaming("Should we sunset the legacy tier?");
    let session_id = stream.session_id();

    let mut events = Vec::new();
    while let Some(event) = stream.next_event().await {
        events.push(event);
    }

    let names: Vec<&str> = events.iter().map(|e| e.name()).collect();
    assert_eq!(
        names,
        vec![
            "swarm_start",
            "swarm_start",
            "swarm_start",
            "swarm_start",
            "swarm_result",
            "swarm_result",
            "swarm_result",
            "swarm_result",
            "synthesis_start",
            "synthesis_result",
            "done",
        ]
    );

    // Starts are announced in registry order before any result.
    let start_order: Vec<PerspectiveCategory> = events
        .iter()
        .filter_map(|e| match e {
            CouncilEvent::SwarmStart(info) => Some(info.category),
            _ => None,
        })
        .collect();
    assert_eq!(
        start_order,
        vec![
            PerspectiveCategory::Visionary,
            PerspectiveCategory::Scaler,
            PerspectiveCategory::Scientist,
            PerspectiveCategory::Architect,
        ]
    );

    // Each category resolves exactly once.
    let mut resolved = result_categories(&events);
    resolved.sort();
    resolved.dedup();
    assert_eq!(resolved.len(), 4);

    match events.iter().find(|e| e.name() == "synthesis_start") {
        Some(CouncilEvent::SynthesisStart(info)) => assert_eq!(info.success_count, 4),
        other => panic!("expected synthesis_start, got {:?}", other),
    }

    match events.last() {
        Some(CouncilEvent::Done(info)) => assert_eq!(info.session_id, session_id),
        other => panic!("expected done terminal event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_results_stream_in_completion_order_not_config_order() {
    let client = MockCouncilClient::with_latency(
        VISIONARY_PREFIX,
        Duration::from_millis(500),
        Duration::from_millis(10),
    );
    let dispatcher = dispatcher_with(Arc::new(client));

    let events = drain(&dispatcher, "Where should the platform team report?").await;
    let order = result_categories(&events);

    assert_eq!(order.len(), 4);
    // The slow category is configured first but lands last.
    assert_ne!(order[0], PerspectiveCategory::Visionary);
    assert_eq!(order[3], PerspectiveCategory::Visionary);
}

// ============= Failure Containment =============

#[tokio::test]
async fn test_failed_category_is_contained() {
    let client = MockCouncilClient::failing_for(&[SCALER_PREFIX]);
    let dispatcher = dispatcher_with(Arc::new(client));

    let events = drain(&dispatcher, "Do we build the enterprise tier now?").await;

    let scaler = events
        .iter()
        .find_map(|e| match e {
            CouncilEvent::SwarmResult(r) if r.category == PerspectiveCategory::Scaler => Some(r),
            _ => None,
        })
        .expect("scaler must still resolve");
    match &scaler.status {
        AgentStatus::Failed { reason } => assert!(reason.contains("simulated provider outage")),
        AgentStatus::Success => panic!("scaler should have failed"),
    }

    // Siblings are untouched and synthesis still runs on the remaining three.
    match events.iter().find(|e| e.name() == "synthesis_start") {
        Some(CouncilEvent::SynthesisStart(info)) => assert_eq!(info.success_count, 3),
        other => panic!("expected synthesis_start, got {:?}", other),
    }
    assert!(events.iter().any(|e| e.name() == "synthesis_result"));
    assert!(!events.iter().any(|e| e.name() == "error"));
}

#[tokio::test]
async fn test_all_failures_yield_explicit_no_synthesis_verdict() {
    let dispatcher = dispatcher_with(Arc::new(MockCouncilClient::failing_all()));

    let events = drain(&dispatcher, "Should we pivot to services?").await;

    let verdict = events
        .iter()
        .find_map(|e| match e {
            CouncilEvent::SynthesisResult(v) => Some(v),
            _ => None,
        })
        .expect("an all-failure session still delivers an explicit verdict");

    assert!(verdict.recommendation.contains("No synthesis could be formed"));
    for name in ["The Visionary", "The Scaler", "The Scientist", "The Architect"] {
        assert!(verdict.recommendation.contains(name));
    }
    assert!(!events.iter().any(|e| e.name() == "error"));
    assert_eq!(events.last().map(|e| e.name()), Some("done"));
}

#[tokio::test]
async fn test_synthesis_failure_emits_stage_error() {
    let dispatcher = dispatcher_with(Arc::new(MockCouncilClient::malformed_synthesis()));

    let events = drain(&dispatcher, "Is the rewrite worth it?").await;

    let error = events
        .iter()
        .find_map(|e| match e {
            CouncilEvent::Error(info) => Some(info),
            _ => None,
        })
        .expect("malformed synthesis must surface as a stage error");
    assert_eq!(error.stage, "synthesis");
    assert!(error.message.contains("missing required section"));

    assert!(!events.iter().any(|e| e.name() == "synthesis_result"));
    assert_eq!(events.last().map(|e| e.name()), Some("done"));
}

// ============= Timeouts =============

#[tokio::test]
async fn test_agent_timeout_yields_failed_result() {
    let client = MockCouncilClient::with_latency(
        VISIONARY_PREFIX,
        Duration::from_secs(5),
        Duration::ZERO,
    );
    let config = DispatchConfig {
        agent_timeout_secs: 1,
        ..DispatchConfig::default()
    };
    let dispatcher = dispatcher_with_config(Arc::new(client), config);

    let events = drain(&dispatcher, "Can we ship by the conference?").await;

    let visionary = events
        .iter()
        .find_map(|e| match e {
            CouncilEvent::SwarmResult(r) if r.category == PerspectiveCategory::Visionary => {
                Some(r)
            }
            _ => None,
        })
        .expect("visionary must resolve despite the timeout");
    match &visionary.status {
        AgentStatus::Failed { reason } => assert!(reason.contains("timed out")),
        AgentStatus::Success => panic!("visionary should have timed out"),
    }

    match events.iter().find(|e| e.name() == "synthesis_start") {
        Some(CouncilEvent::SynthesisStart(info)) => assert_eq!(info.success_count, 3),
        other => panic!("expected synthesis_start, got {:?}", other),
    }
}

#[tokio::test]
async fn test_session_deadline_marks_pending_failed() {
    let client = MockCouncilClient::sleeping(Duration::from_secs(5));
    let config = DispatchConfig {
        agent_timeout_secs: 10,
        session_timeout_secs: 1,
        ..DispatchConfig::default()
    };
    let dispatcher = dispatcher_with_config(Arc::new(client), config);

    let events = drain(&dispatcher, "Do we freeze hiring?").await;

    let results = result_categories(&events);
    assert_eq!(results.len(), 4, "every category must still resolve");
    for event in &events {
        if let CouncilEvent::SwarmResult(r) = event {
            match &r.status {
                AgentStatus::Failed { reason } => {
                    assert!(reason.contains("session timed out"))
                }
                AgentStatus::Success => panic!("no agent should finish within the budget"),
            }
        }
    }

    // Synthesis still runs (and short-circuits to the no-synthesis verdict).
    assert!(events.iter().any(|e| e.name() == "synthesis_start"));
    assert!(events.iter().any(|e| e.name() == "synthesis_result"));
    assert_eq!(events.last().map(|e| e.name()), Some("done"));
}

// ============= Cancellation =============

#[tokio::test]
async fn test_dropping_stream_cancels_in_flight_work() {
    let client = MockCouncilClient::sleeping(Duration::from_millis(200));
    let completed = client.completed_calls();
    let dispatcher = dispatcher_with(Arc::new(client));

    let mut stream = dispatcher.convene_streaming("Should we open-source the SDK?");
    let first = stream.next_event().await.expect("first event");
    assert_eq!(first.name(), "swarm_start");
    drop(stream);

    // Well past the mock latency; aborted generation calls never complete.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(completed.load(Ordering::SeqCst), 0);
}

// ============= Synchronous Aggregate =============

#[tokio::test]
async fn test_convene_end_to_end() {
    let dispatcher = dispatcher_with(Arc::new(MockCouncilClient::succeeding()));

    let session = dispatcher
        .convene(
            "My manager blocks every initiative; I have executive support but don't want to burn bridges",
        )
        .await;

    assert_eq!(session.results.len(), 4);
    for result in session.results.values() {
        assert!(result.status.is_success());
        assert!(!result.narrative_text.is_empty());
        assert!(!result.evidence.is_empty());
        assert!(result.evidence.len() <= 4);
    }

    let verdict = session.verdict.expect("verdict must be present");
    assert!(!verdict.tension_statement.is_empty());
    assert!(!verdict.path_bold.is_empty());
    assert!(!verdict.path_measured.is_empty());
    assert_ne!(verdict.path_bold, verdict.path_measured);
    assert!(verdict.recommendation.contains("Path A") || verdict.recommendation.contains("Path B"));
    assert!(verdict.validating_question.ends_with('?'));
    assert!(session.completed_at.is_some());
}

#[tokio::test]
async fn test_convene_with_empty_store_still_succeeds() {
    let dispatcher = Dispatcher::new(
        CategoryRegistry::defaults(),
        Arc::new(StubStore::empty()),
        Arc::new(MockCouncilClient::succeeding()),
        DispatchConfig::default(),
    );

    let session = dispatcher.convene("Does the roadmap survive a down round?").await;

    // Degraded retrieval is not fatal: agents run with no evidence.
    assert_eq!(session.results.len(), 4);
    for result in session.results.values() {
        assert!(result.status.is_success());
        assert!(result.evidence.is_empty());
    }
    assert!(session.verdict.is_some());
}

// ============= Retrieval Idempotence =============

struct FixedEmbedder;

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    fn model_name(&self) -> &str {
        "fixed-test-embedder"
    }
}

fn stored(id: &str, speaker: &str, category: &str, embedding: Vec<f32>) -> StoredPassage {
    StoredPassage {
        id: id.to_string(),
        text: format!("passage {id}"),
        speaker_id: speaker.to_string(),
        source_id: format!("{speaker}-pod"),
        time_offset: "01:02:03".to_string(),
        category: category.to_string(),
        embedding,
    }
}

#[tokio::test]
async fn test_identical_queries_return_identical_sequences() {
    let store = PassageStore::new(
        Arc::new(FixedEmbedder),
        vec![
            stored("p1", "brian-chesky", "founder_swarm", vec![0.9, 0.1]),
            stored("p2", "tony-fadell", "founder_swarm", vec![1.0, 0.0]),
            stored("p3", "elena-verna", "growth_swarm", vec![1.0, 0.0]),
            stored("p4", "claire-hughes-johnson", "founder_swarm", vec![0.5, 0.5]),
        ],
    );

    let first = store.search("how to run founder mode", "founder_swarm", 10).await.unwrap();
    let second = store.search("how to run founder mode", "founder_swarm", 10).await.unwrap();

    let first_speakers: Vec<&str> = first.iter().map(|p| p.speaker_id.as_str()).collect();
    let second_speakers: Vec<&str> = second.iter().map(|p| p.speaker_id.as_str()).collect();
    assert_eq!(first_speakers, second_speakers);
    assert_eq!(first.len(), 3);
    // Best cosine match first, other collectives filtered out.
    assert_eq!(first[0].speaker_id, "tony-fadell");
    assert!(first.iter().all(|p| p.speaker_id != "elena-verna"));
}
