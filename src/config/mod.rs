//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, AuthConfig, BackendConfig, BackendKind, ChainConfig, ChainKind, ClassifierConfig,
    ExtractionConfig, IndexConfig, LogFormat, LoggingConfig, MetricsConfig, ServerConfig,
};
