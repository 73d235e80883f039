use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::text::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    pub auth: AuthConfig,
    pub extraction: ExtractionConfig,

    /// Completion backends, interrogated in declaration order
    pub backends: Vec<BackendConfig>,

    /// Vector indexes keyed by their public name
    pub indexes: HashMap<String, IndexConfig>,

    /// Named classifiers available to chain filters
    pub classifiers: HashMap<String, ClassifierConfig>,

    /// Reasoning chains keyed by the model name they answer to
    pub chains: HashMap<String, ChainConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Static bearer token guarding the completion and index surfaces.
/// No token means the gateway is open.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    OpenAi,
}

/// One upstream completion backend
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    #[serde(rename = "type")]
    pub kind: BackendKind,

    /// Base URL; empty selects the public OpenAI endpoint
    pub base_url: String,

    pub api_key: Option<String>,

    /// Models served by this backend; empty means "ask the backend"
    pub models: Vec<String>,
}

/// An in-memory vector index and the model embedding its documents
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Embedding model resolved through the dispatcher
    pub embedding: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Completion model the classifier prompts
    pub model: String,

    /// Category name to description
    pub categories: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
    React,
    Refine,
}

/// A reasoning chain exposed under its own model name
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    #[serde(rename = "type")]
    pub kind: ChainKind,

    /// Completion model driving the chain
    pub model: String,

    /// Index queried by a refine chain
    #[serde(default)]
    pub index: Option<String>,

    /// Model rewriting follow-up questions before retrieval
    #[serde(default)]
    pub contextualizer: Option<String>,

    /// System prompt prepended by a react chain
    #[serde(default)]
    pub system: Option<String>,

    #[serde(default)]
    pub limit: Option<usize>,

    #[serde(default)]
    pub distance: Option<f32>,

    /// Metadata filter key to classifier name
    #[serde(default)]
    pub filters: HashMap<String, String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
