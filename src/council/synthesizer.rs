//! Verdict synthesis
//!
//! Takes the terminal agent results for a session and runs one generation
//! call framed as an executive coach forcing a strategic fork: one core
//! tension, two mutually exclusive paths, a tie-breaking call, and a
//! validating question. The response is parsed into a typed [`Verdict`] at
//! this boundary; the rest of the system never sees raw synthesis text.

use crate::council::categories::CategoryRegistry;
use crate::llm::{CapabilityError, GenerationClient, GenerationRequest};
use crate::types::{AgentResult, PerspectiveCategory, Verdict};
use std::collections::BTreeMap;
use std::sync::Arc;

const SYNTHESIS_SYSTEM: &str =
    "You are a strategic advisor synthesizing multiple perspectives from expert collectives.";

const SYNTHESIS_FRAMING: &str = r#"YOUR ROLE: Find the Strategic Fork. Don't seek false consensus—identify the real choice the leader must make.

FORBIDDEN:
- No generic advice ("implement a framework," "have a conversation," "align stakeholders")
- No hedging without ultimately making a call
- No pretending both paths can be taken simultaneously

REQUIRED FORMAT:

**THE CORE TENSION**
In 2-3 sentences, name the fundamental disagreement between the swarms. What is the trade-off that cannot be optimized away? Acknowledge why this is genuinely hard.

**PATH A: THE BOLD MOVE**
The higher-risk, higher-reward option. For each path, provide 3 tactical execution bullets:
- First, do X (the immediate action)
- Then, do Y (the follow-through)
- Prepare for Z (the likely consequence to manage)

**PATH B: THE MEASURED MOVE**
The structured, lower-risk option. Same format—3 tactical bullets:
- First, do X (the immediate action)
- Then, do Y (the follow-through)
- Prepare for Z (the likely consequence to manage)

**THE TIE-BREAKER**
Make a clear call. State which path you recommend and why, based on what you can infer from the situation. Acknowledge what the leader sacrifices by choosing this path. End with the one question they should ask themselves to validate this choice.

---

Tone: Direct but empathetic. You're forcing a choice, but you understand these decisions are hard and have real costs. Write like a trusted advisor, not a corporate consultant. 450 words max."#;

#[derive(Clone)]
pub struct Synthesizer {
    client: Arc<dyn GenerationClient>,
}

impl Synthesizer {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self { client }
    }

    /// Produce the session verdict from terminal agent results.
    ///
    /// Only `Success` results contribute grounding; failed categories appear
    /// as explicit "No response from X" markers so the verdict can
    /// acknowledge the gap. Zero successes short-circuits to the
    /// no-synthesis verdict without a generation call.
    pub async fn synthesize(
        &self,
        results: &BTreeMap<PerspectiveCategory, AgentResult>,
        registry: &CategoryRegistry,
    ) -> Result<Verdict, CapabilityError> {
        let successes = results.values().filter(|r| r.status.is_success()).count();
        if successes == 0 {
            tracing::info!("No successful perspectives, returning no-synthesis verdict");
            let failed_names: Vec<String> = registry
                .specs()
                .iter()
                .map(|s| s.display_name.to_string())
                .collect();
            return Ok(Verdict::no_synthesis(&failed_names));
        }

        let request = self.build_request(results, registry);
        let response = self.client.generate(&request).await?;

        lint_forbidden_patterns(&response);
        parse_verdict(&response)
    }

    fn build_request(
        &self,
        results: &BTreeMap<PerspectiveCategory, AgentResult>,
        registry: &CategoryRegistry,
    ) -> GenerationRequest {
        let mut perspectives = String::new();
        for spec in registry.specs() {
            let narrative = results
                .get(&spec.category)
                .filter(|r| r.status.is_success())
                .map(|r| r.narrative_text.clone())
                .unwrap_or_else(|| format!("No response from {}", spec.display_name));

            perspectives.push_str(&format!(
                "**{} ({}):** {}\n\n",
                spec.display_name, spec.collective, narrative
            ));
        }

        let user = format!(
            "You are a seasoned Executive Coach advising a leader facing a difficult decision.\n\n\
             You have received perspectives from {} expert collectives:\n\n\
             {}---\n\n{}",
            registry.len(),
            perspectives,
            SYNTHESIS_FRAMING
        );

        GenerationRequest::new(SYNTHESIS_SYSTEM, user)
    }
}

// ============= Verdict Parsing =============

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Tension,
    Bold,
    Measured,
    TieBreaker,
}

/// Classify a line as a section header.
///
/// Headers are matched case-insensitively with asterisks and markdown
/// heading markers optional. An unemphasized line must spell the full
/// header so body prose mentioning "Path A" is not mistaken for one.
fn classify_header(line: &str) -> Option<Section> {
    let trimmed = line.trim();
    let emphasized = trimmed.starts_with("**") || trimmed.starts_with('#');

    let stripped = trimmed.trim_start_matches('#').replace('*', "");
    let normalized = stripped.trim().trim_end_matches(':').to_uppercase();

    if emphasized {
        if normalized.starts_with("THE CORE TENSION") {
            return Some(Section::Tension);
        }
        if normalized.starts_with("PATH A") {
            return Some(Section::Bold);
        }
        if normalized.starts_with("PATH B") {
            return Some(Section::Measured);
        }
        if normalized.starts_with("THE TIE-BREAKER") || normalized.starts_with("TIE-BREAKER") {
            return Some(Section::TieBreaker);
        }
        return None;
    }

    if normalized == "THE CORE TENSION" {
        return Some(Section::Tension);
    }
    if normalized.starts_with("PATH A: THE BOLD MOVE") {
        return Some(Section::Bold);
    }
    if normalized.starts_with("PATH B: THE MEASURED MOVE") {
        return Some(Section::Measured);
    }
    if normalized == "THE TIE-BREAKER" || normalized == "TIE-BREAKER" {
        return Some(Section::TieBreaker);
    }
    None
}

/// Parse a synthesis response into a typed verdict.
///
/// All four required sections must be present and non-empty; anything else
/// is a malformed-response capability error and the session carries no
/// verdict.
pub fn parse_verdict(text: &str) -> Result<Verdict, CapabilityError> {
    let mut current: Option<Section> = None;
    let mut tension = String::new();
    let mut bold = String::new();
    let mut measured = String::new();
    let mut tie_breaker = String::new();

    for line in text.lines() {
        if let Some(section) = classify_header(line) {
            current = Some(section);
            continue;
        }
        let Some(section) = current else {
            // Preamble before the first header carries no verdict content
            continue;
        };
        let target = match section {
            Section::Tension => &mut tension,
            Section::Bold => &mut bold,
            Section::Measured => &mut measured,
            Section::TieBreaker => &mut tie_breaker,
        };
        target.push_str(line);
        target.push('\n');
    }

    let tension = tension.trim().to_string();
    let bold = bold.trim().to_string();
    let measured = measured.trim().to_string();
    let tie_breaker = tie_breaker.trim().to_string();

    let mut missing = Vec::new();
    if tension.is_empty() {
        missing.push("THE CORE TENSION");
    }
    if bold.is_empty() {
        missing.push("PATH A: THE BOLD MOVE");
    }
    if measured.is_empty() {
        missing.push("PATH B: THE MEASURED MOVE");
    }
    if tie_breaker.is_empty() {
        missing.push("THE TIE-BREAKER");
    }
    if !missing.is_empty() {
        return Err(CapabilityError::MalformedResponse(format!(
            "synthesis response missing required section(s): {}",
            missing.join(", ")
        )));
    }

    let (recommendation, validating_question) = split_tie_breaker(&tie_breaker);

    Ok(Verdict {
        tension_statement: tension,
        path_bold: bold,
        path_measured: measured,
        recommendation,
        validating_question,
    })
}

/// Split the tie-breaker body into the recommendation and its trailing
/// validating question (the last question-mark-terminated sentence).
fn split_tie_breaker(body: &str) -> (String, String) {
    let trimmed = body.trim();
    let Some(q_end) = trimmed.rfind('?') else {
        return (trimmed.to_string(), String::new());
    };

    let before = &trimmed[..q_end];
    let start = before
        .rfind(|c: char| matches!(c, '.' | '!' | '?' | '\n'))
        .map(|i| i + 1)
        .unwrap_or(0);

    let question = trimmed[start..=q_end].trim().to_string();

    let mut recommendation = trimmed[..start].trim_end().to_string();
    let tail = trimmed[q_end + 1..].trim();
    if !tail.is_empty() {
        if !recommendation.is_empty() {
            recommendation.push(' ');
        }
        recommendation.push_str(tail);
    }
    if recommendation.is_empty() {
        recommendation = trimmed.to_string();
    }

    (recommendation, question)
}

// ============= Forbidden-Pattern Lint =============

fn line_is_numbered_step(line: &str) -> bool {
    let trimmed = line.trim_start();
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return false;
    }
    matches!(trimmed.chars().nth(digits), Some('.') | Some(')'))
}

/// Warn-only guard for listicle patterns the framing forbids
fn lint_forbidden_patterns(text: &str) {
    let numbered = text.lines().filter(|l| line_is_numbered_step(l)).count();
    if numbered > 0 {
        tracing::warn!(
            "Synthesis response contains {} numbered-step line(s); framing forbids listicle advice",
            numbered
        );
    }
}
