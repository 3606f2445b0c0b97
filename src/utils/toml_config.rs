//! TOML-based configuration for the council server
//!
//! This module provides declarative configuration for the HTTP server, CORS,
//! generation backend, knowledge-store snapshot, and dispatch tuning via a
//! TOML file (`council.toml`). Secrets are referenced by environment-variable
//! name and resolved at client construction, never stored in the file.

use crate::types::PerspectiveCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure loaded from council.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CouncilConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub cors: CorsConfig,

    /// Language-model and embedding backend settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Knowledge-store snapshot settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Fan-out tuning: retrieval depth, citation cap, timeout budgets
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

// ============= CORS Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

// ============= Generation Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Environment variable containing the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            api_base: default_api_base(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
        }
    }
}

// ============= Store Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the pre-embedded passage snapshot produced by the ingestion job
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("./data/passages.json")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

// ============= Dispatch Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Passages retrieved per category
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Citations surfaced per agent after speaker diversification
    #[serde(default = "default_citation_cap")]
    pub citation_cap: usize,

    /// Budget for one agent's retrieval + generation, and for the
    /// synthesis call
    #[serde(default = "default_agent_timeout_secs")]
    pub agent_timeout_secs: u64,

    /// Overall wait budget for the fan-out barrier
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,

    /// Per-category query template overrides; each template must contain
    /// a `{problem}` placeholder
    #[serde(default)]
    pub query_templates: HashMap<String, String>,
}

fn default_top_k() -> usize {
    8
}

fn default_citation_cap() -> usize {
    4
}

fn default_agent_timeout_secs() -> u64 {
    45
}

fn default_session_timeout_secs() -> u64 {
    120
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            citation_cap: default_citation_cap(),
            agent_timeout_secs: default_agent_timeout_secs(),
            session_timeout_secs: default_session_timeout_secs(),
            query_templates: HashMap::new(),
        }
    }
}

impl DispatchConfig {
    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_timeout_secs)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }
}

// ============= Configuration Loading & Validation =============

/// Configuration warnings that don't prevent operation but may indicate issues
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub kind: ConfigWarningKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarningKind {
    SnapshotMissing,
    NoCorsOrigins,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Query template override names unknown category '{0}'")]
    UnknownCategory(String),
}

impl CouncilConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: CouncilConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration for internal consistency and env var
    /// availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_env_var(&self.generation.api_key_env)?;

        if self.dispatch.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "dispatch.top_k must be at least 1".to_string(),
            ));
        }
        if self.dispatch.citation_cap == 0 {
            return Err(ConfigError::ValidationError(
                "dispatch.citation_cap must be at least 1".to_string(),
            ));
        }
        if self.dispatch.agent_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "dispatch.agent_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.dispatch.session_timeout_secs < self.dispatch.agent_timeout_secs {
            return Err(ConfigError::ValidationError(format!(
                "dispatch.session_timeout_secs ({}) must not be shorter than \
                 dispatch.agent_timeout_secs ({})",
                self.dispatch.session_timeout_secs, self.dispatch.agent_timeout_secs
            )));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::ValidationError(format!(
                "generation.temperature ({}) must be between 0.0 and 2.0",
                self.generation.temperature
            )));
        }

        // Template overrides must target known categories and keep the
        // {problem} placeholder the dispatcher substitutes.
        for (name, template) in &self.dispatch.query_templates {
            if PerspectiveCategory::from_wire(name).is_none() {
                return Err(ConfigError::UnknownCategory(name.clone()));
            }
            if !template.contains("{problem}") {
                return Err(ConfigError::ValidationError(format!(
                    "query template for '{}' is missing the {{problem}} placeholder",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Validate and collect non-fatal warnings
    pub fn validate_with_warnings(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        self.validate()?;

        let mut warnings = Vec::new();

        if !self.store.snapshot_path.exists() {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::SnapshotMissing,
                message: format!(
                    "Passage snapshot '{}' does not exist; the knowledge store will start empty",
                    self.store.snapshot_path.display()
                ),
            });
        }

        if self.cors.allowed_origins.is_empty() {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::NoCorsOrigins,
                message: "cors.allowed_origins is empty; browser clients will be rejected"
                    .to_string(),
            });
        }

        Ok(warnings)
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Resolve the generation API key from the configured env var
    pub fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.generation.api_key_env)
            .map_err(|_| ConfigError::MissingEnvVar(self.generation.api_key_env.clone()))
    }
}
