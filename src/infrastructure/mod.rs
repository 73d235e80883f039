//! Infrastructure layer - concrete backends, chains, and observability

pub mod chain;
pub mod classify;
pub mod embedding;
pub mod extraction;
pub mod index;
pub mod llm;
pub mod logging;
pub mod observability;
