//! Session orchestration: fan-out, barrier, synthesis, event delivery
//!
//! The dispatcher fans one problem statement out to every configured
//! category's agent on independent tasks, forwards results to a per-session
//! event channel as they land, then runs synthesis once every category is
//! terminal. Dropping the returned [`CouncilStream`] cancels all in-flight
//! work for that session; other sessions are unaffected.

use crate::council::agent::PerspectiveAgent;
use crate::council::categories::CategoryRegistry;
use crate::council::events::{
    CouncilEvent, DoneInfo, StageErrorInfo, SwarmStartInfo, SynthesisStartInfo,
};
use crate::council::synthesizer::Synthesizer;
use crate::llm::{CapabilityError, GenerationClient};
use crate::store::KnowledgeStore;
use crate::types::{AgentResult, CouncilSession, PerspectiveCategory};
use crate::utils::toml_config::DispatchConfig;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Events per session are bounded (starts + results + synthesis + done),
/// so the channel never fills and the driver never blocks on a slow reader.
const EVENT_CHANNEL_CAPACITY: usize = 32;

pub struct Dispatcher {
    registry: CategoryRegistry,
    agents: Vec<PerspectiveAgent>,
    synthesizer: Synthesizer,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        registry: CategoryRegistry,
        store: Arc<dyn KnowledgeStore>,
        client: Arc<dyn GenerationClient>,
        config: DispatchConfig,
    ) -> Self {
        let agents = registry
            .specs()
            .iter()
            .map(|spec| {
                PerspectiveAgent::new(
                    spec.clone(),
                    store.clone(),
                    client.clone(),
                    config.top_k,
                    config.citation_cap,
                )
            })
            .collect();

        Self {
            registry,
            agents,
            synthesizer: Synthesizer::new(client),
            config,
        }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// Start a session and return its event stream.
    ///
    /// The pipeline runs on a detached task; events arrive through the
    /// stream in the order promised by the protocol. Dropping the stream
    /// cancels the session.
    pub fn convene_streaming(&self, problem: impl Into<String>) -> CouncilStream {
        let session_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let driver = SessionDriver {
            session_id,
            problem: problem.into(),
            agents: self.agents.clone(),
            registry: self.registry.clone(),
            synthesizer: self.synthesizer.clone(),
            config: self.config.clone(),
            tx,
            cancel: cancel.clone(),
        };

        tokio::spawn(driver.run());

        CouncilStream {
            session_id,
            rx,
            cancel,
        }
    }

    /// Run a session to completion and return the aggregate.
    ///
    /// Implemented by draining the streaming pipeline, so both modes are
    /// observably consistent for the same input.
    pub async fn convene(&self, problem: impl Into<String>) -> CouncilSession {
        let problem = problem.into();
        let mut stream = self.convene_streaming(problem.clone());
        let mut session = CouncilSession::new(stream.session_id(), problem);

        while let Some(event) = stream.next_event().await {
            match event {
                CouncilEvent::SwarmResult(result) => {
                    session.results.insert(result.category, result);
                }
                CouncilEvent::SynthesisResult(verdict) => {
                    session.verdict = Some(verdict);
                }
                CouncilEvent::Done(_) => {
                    session.completed_at = Some(chrono::Utc::now());
                }
                _ => {}
            }
        }

        session
    }
}

// ============= Session Stream =============

/// Consumer handle for one session's ordered event sequence.
///
/// Exactly one consumer drains a session. Dropping the handle cancels
/// every in-flight agent and synthesis call for the session.
pub struct CouncilStream {
    session_id: Uuid,
    rx: mpsc::Receiver<CouncilEvent>,
    cancel: CancellationToken,
}

impl CouncilStream {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Next event in protocol order; `None` once the terminal `done` event
    /// has been delivered
    pub async fn next_event(&mut self) -> Option<CouncilEvent> {
        self.rx.recv().await
    }
}

impl Drop for CouncilStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ============= Session Driver =============

struct SessionDriver {
    session_id: Uuid,
    problem: String,
    agents: Vec<PerspectiveAgent>,
    registry: CategoryRegistry,
    synthesizer: Synthesizer,
    config: DispatchConfig,
    tx: mpsc::Sender<CouncilEvent>,
    cancel: CancellationToken,
}

impl SessionDriver {
    async fn run(self) {
        tracing::info!(
            "Convening council session {} across {} categories",
            self.session_id,
            self.registry.len()
        );

        // Announce every category before any result can land.
        for spec in self.registry.specs() {
            if !self
                .send(CouncilEvent::SwarmStart(SwarmStartInfo {
                    category: spec.category,
                    display_name: spec.display_name.to_string(),
                }))
                .await
            {
                return;
            }
        }

        let mut tasks: JoinSet<(PerspectiveCategory, AgentResult)> = JoinSet::new();
        let mut task_categories: HashMap<tokio::task::Id, PerspectiveCategory> = HashMap::new();
        let mut pending: BTreeSet<PerspectiveCategory> = BTreeSet::new();

        let agent_budget = self.config.agent_timeout();
        for agent in &self.agents {
            let agent = agent.clone();
            let problem = self.problem.clone();
            let category = agent.category();
            pending.insert(category);

            let handle = tasks.spawn(async move {
                let result = match tokio::time::timeout(agent_budget, agent.run(&problem)).await {
                    Ok(result) => result,
                    Err(_) => AgentResult::failed(
                        category,
                        agent.display_name(),
                        CapabilityError::Timeout(agent_budget).to_string(),
                    ),
                };
                (category, result)
            });
            task_categories.insert(handle.id(), category);
        }

        let mut results: BTreeMap<PerspectiveCategory, AgentResult> = BTreeMap::new();
        let deadline = tokio::time::Instant::now() + self.config.session_timeout();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::debug!("Session {} cancelled, aborting agent tasks", self.session_id);
                    tasks.abort_all();
                    return;
                }
                _ = tokio::time::sleep_until(deadline) => {
                    tracing::warn!(
                        "Session {} wait budget elapsed with {} categories pending",
                        self.session_id,
                        pending.len()
                    );
                    break;
                }
                joined = tasks.join_next_with_id() => {
                    match joined {
                        Some(Ok((id, (category, result)))) => {
                            task_categories.remove(&id);
                            pending.remove(&category);
                            results.insert(category, result.clone());
                            if !self.send(CouncilEvent::SwarmResult(result)).await {
                                return;
                            }
                        }
                        Some(Err(join_err)) => {
                            // A panicked or aborted task still resolves its
                            // category with a terminal result.
                            let Some(category) = task_categories.remove(&join_err.id()) else {
                                tracing::warn!("Join error for unknown agent task: {}", join_err);
                                continue;
                            };
                            pending.remove(&category);
                            let display_name = self
                                .registry
                                .get(category)
                                .map(|s| s.display_name.to_string())
                                .unwrap_or_else(|| category.to_string());
                            let result = AgentResult::failed(
                                category,
                                display_name,
                                format!("agent task failed: {}", join_err),
                            );
                            results.insert(category, result.clone());
                            if !self.send(CouncilEvent::SwarmResult(result)).await {
                                return;
                            }
                        }
                        None => break,
                    }
                }
            }
        }

        // Anything still pending after the budget is terminal Failed.
        if !pending.is_empty() {
            tasks.abort_all();
            for category in std::mem::take(&mut pending) {
                let display_name = self
                    .registry
                    .get(category)
                    .map(|s| s.display_name.to_string())
                    .unwrap_or_else(|| category.to_string());
                let result = AgentResult::failed(
                    category,
                    display_name,
                    "session timed out before this perspective completed",
                );
                results.insert(category, result.clone());
                if !self.send(CouncilEvent::SwarmResult(result)).await {
                    return;
                }
            }
        }

        let success_count = results.values().filter(|r| r.status.is_success()).count();
        tracing::info!(
            "Session {} agents complete: {}/{} succeeded",
            self.session_id,
            success_count,
            self.registry.len()
        );

        if !self
            .send(CouncilEvent::SynthesisStart(SynthesisStartInfo {
                success_count,
            }))
            .await
        {
            return;
        }

        let synthesis_budget = self.config.agent_timeout();
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => return,
            outcome = tokio::time::timeout(
                synthesis_budget,
                self.synthesizer.synthesize(&results, &self.registry),
            ) => outcome,
        };

        match outcome {
            Ok(Ok(verdict)) => {
                if !self.send(CouncilEvent::SynthesisResult(verdict)).await {
                    return;
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Synthesis failed for session {}: {}", self.session_id, e);
                if !self
                    .send(CouncilEvent::Error(StageErrorInfo {
                        stage: "synthesis".to_string(),
                        message: e.to_string(),
                    }))
                    .await
                {
                    return;
                }
            }
            Err(_) => {
                let e = CapabilityError::Timeout(synthesis_budget);
                tracing::error!("Synthesis timed out for session {}", self.session_id);
                if !self
                    .send(CouncilEvent::Error(StageErrorInfo {
                        stage: "synthesis".to_string(),
                        message: e.to_string(),
                    }))
                    .await
                {
                    return;
                }
            }
        }

        self.send(CouncilEvent::Done(DoneInfo {
            session_id: self.session_id,
        }))
        .await;
    }

    /// Deliver one event; a closed channel means the consumer is gone, so
    /// the session is cancelled and the driver unwinds.
    async fn send(&self, event: CouncilEvent) -> bool {
        if self.tx.send(event).await.is_err() {
            self.cancel.cancel();
            return false;
        }
        true
    }
}
