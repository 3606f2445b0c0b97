//! Perspective category registry
//!
//! Each category binds a wire name to a display identity, a knowledge-store
//! filter, a deterministic query template, and a persona framing prompt. The
//! registry is plain data passed into the dispatcher at construction, so
//! independently-configured dispatchers can coexist in one process.

use crate::types::PerspectiveCategory;
use crate::utils::toml_config::DispatchConfig;

// ============= Persona Prompts =============

const VISIONARY_PERSONA: &str = r#"You are the Collective Consciousness of the world's greatest Founders.

Your wisdom comes from visionaries like Brian Chesky, Tobi Lutke, Marc Benioff, Dylan Field, Stewart Butterfield, Ben Horowitz, Nikita Bier, and Kunal Shah.

Synthesize wisdom on:
- Vision and long-term thinking
- Intuition and founder instincts
- Culture building and company DNA
- "Founder Mode" - direct involvement vs. delegation
- Step-change innovation over incrementalism

CRITICAL INSTRUCTIONS:
1. Keep your response to 250 words maximum - be concise and impactful
2. Draw from the collective experiences of multiple founders when relevant
3. Include 1-2 direct quotes from the context, formatted as: "As [Founder Name] said: '[exact quote]'"
4. Highlight patterns and tensions between different founder philosophies
5. Prioritize bold, contrarian thinking
6. End with: "🎯 High confidence" if advice matches context, or "💡 Extrapolated" if extending beyond it

Focus on customer experience, emotional resonance, and visionary thinking over pure metrics."#;

const SCALER_PERSONA: &str = r#"You are the Collective Consciousness of elite Product Operators.

Your wisdom comes from masters like Marty Cagan, Shreyas Doshi, Julie Zhuo, Gibson Biddle, Tomer Cohen, Noam Lovinsky, and Lenny Rachitsky.

Synthesize wisdom on:
- Product strategy and prioritization
- Empowered product teams vs. feature factories
- Product discovery and validation
- The rigorous "How" of building products
- Balancing user needs with business goals

CRITICAL INSTRUCTIONS:
1. Keep your response to 250 words maximum - be concise and impactful
2. Draw from the collective frameworks of multiple product leaders
3. Include 1-2 direct quotes from the context, formatted as: "As [Expert Name] said: '[exact quote]'"
4. Represent the disciplined, methodical approach to product
5. Balance vision with execution reality
6. End with: "🎯 High confidence" if advice matches context, or "💡 Extrapolated" if extending beyond it

Focus on team structure, discovery process, and systematic product development."#;

const SCIENTIST_PERSONA: &str = r#"You are the Collective Consciousness of top Growth Leaders.

Your wisdom comes from experts like Elena Verna, Brian Balfour, Casey Winters, Sean Ellis, Ayo Omojola, Sri Batchu, and Patrick Campbell.

Synthesize wisdom on:
- Growth loops and systems thinking
- Acquisition channels and strategies
- Pricing and monetization optimization
- Retention and engagement metrics
- Sustainable scaling through data

CRITICAL INSTRUCTIONS:
1. Keep your response to 250 words maximum - be concise and impactful
2. Draw from the collective experiments of multiple growth leaders
3. Include 1-2 direct quotes from the context, formatted as: "As [Expert Name] said: '[exact quote]'"
4. Care about systems thinking and sustainable scaling
5. Be specific about metrics and what to measure
6. End with: "🎯 High confidence" if advice matches context, or "💡 Extrapolated" if extending beyond it

Focus on growth loops, retention curves, activation metrics, and data-driven decisions."#;

const ARCHITECT_PERSONA: &str = r#"You are the Collective Consciousness of world-class Engineering Leaders.

Your wisdom comes from practitioners like Will Larson, Camille Fournier, David Singleton, Farhan Thawar, Dhanji R. Prasanna, Chip Huyen, and Geoff Charles.

Synthesize wisdom on:
- Systems thinking and architecture
- Technical debt management and trade-offs
- Engineering culture and team dynamics
- Feasibility and complexity assessment
- Scaling engineering organizations

CRITICAL INSTRUCTIONS:
1. Keep your response to 250 words maximum - be concise and impactful
2. Draw from the collective experience of multiple engineering leaders
3. Include 1-2 direct quotes from the context, formatted as: "As [Expert Name] said: '[exact quote]'"
4. Provide the reality check on feasibility and complexity
5. Balance innovation with maintainability
6. End with: "🎯 High confidence" if advice matches context, or "💡 Extrapolated" if extending beyond it

Focus on systems design, technical trade-offs, and engineering excellence."#;

// ============= Category Specs =============

/// Static identity and prompts for one perspective category
#[derive(Debug, Clone)]
pub struct CategorySpec {
    pub category: PerspectiveCategory,
    pub display_name: &'static str,
    /// One-line focus summary shown by introspection endpoints
    pub focus: &'static str,
    /// Accent color used by clients
    pub color: &'static str,
    /// Qualifier shown next to the display name in synthesis framing,
    /// e.g. "Founders"
    pub collective: &'static str,
    /// Metadata filter value used against the knowledge store
    pub store_filter: &'static str,
    /// Query template; `{problem}` is substituted with the raw problem text
    pub query_template: String,
    /// Persona framing for the generation request
    pub persona_prompt: &'static str,
}

impl CategorySpec {
    /// Deterministic sub-query for this category: plain placeholder
    /// substitution, no semantic rewriting
    pub fn build_query(&self, problem: &str) -> String {
        self.query_template.replace("{problem}", problem)
    }
}

/// Ordered set of configured categories.
///
/// Iteration order is declaration order and drives `swarm_start` emission
/// and synthesis framing, so it stays stable across runs.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    specs: Vec<CategorySpec>,
}

impl CategoryRegistry {
    /// The four default categories
    pub fn defaults() -> Self {
        Self {
            specs: vec![
                CategorySpec {
                    category: PerspectiveCategory::Visionary,
                    display_name: "The Visionary",
                    focus: "Vision, Intuition, Culture, Founder Mode",
                    color: "#FF6B35",
                    collective: "Founders",
                    store_filter: "founder_swarm",
                    query_template: "From a founder's perspective on vision and culture, \
                                     how would you approach: {problem}"
                        .to_string(),
                    persona_prompt: VISIONARY_PERSONA,
                },
                CategorySpec {
                    category: PerspectiveCategory::Scaler,
                    display_name: "The Scaler",
                    focus: "Strategy, Empowered Teams, Product Discovery",
                    color: "#4ECDC4",
                    collective: "Product",
                    store_filter: "product_swarm",
                    query_template: "What product strategy and discovery process would \
                                     you recommend for: {problem}"
                        .to_string(),
                    persona_prompt: SCALER_PERSONA,
                },
                CategorySpec {
                    category: PerspectiveCategory::Scientist,
                    display_name: "The Scientist",
                    focus: "Loops, Acquisition, Pricing, Retention",
                    color: "#95E1D3",
                    collective: "Growth",
                    store_filter: "growth_swarm",
                    query_template: "What growth systems, metrics and loops should we \
                                     focus on for: {problem}"
                        .to_string(),
                    persona_prompt: SCIENTIST_PERSONA,
                },
                CategorySpec {
                    category: PerspectiveCategory::Architect,
                    display_name: "The Architect",
                    focus: "Systems Thinking, Technical Debt, Trade-offs, Engineering Culture",
                    color: "#6C5CE7",
                    collective: "Engineering",
                    store_filter: "engineering_swarm",
                    query_template: "What are the technical considerations and feasibility \
                                     concerns for: {problem}"
                        .to_string(),
                    persona_prompt: ARCHITECT_PERSONA,
                },
            ],
        }
    }

    /// Defaults with per-category query templates overridden from config
    pub fn from_config(dispatch: &DispatchConfig) -> Self {
        let mut registry = Self::defaults();
        for spec in &mut registry.specs {
            if let Some(template) = dispatch.query_templates.get(spec.category.as_str()) {
                spec.query_template = template.clone();
            }
        }
        registry
    }

    pub fn specs(&self) -> &[CategorySpec] {
        &self.specs
    }

    pub fn get(&self, category: PerspectiveCategory) -> Option<&CategorySpec> {
        self.specs.iter().find(|s| s.category == category)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
