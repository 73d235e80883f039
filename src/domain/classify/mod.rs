//! Text classification capability

use async_trait::async_trait;

use crate::domain::DomainError;

/// Capability that assigns an input to one of a set of categories.
///
/// The Refine chain uses named classifiers to derive metadata filter
/// values from the query text.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// The matched category label, or an empty string for no match
    async fn classify(&self, input: &str) -> Result<String, DomainError>;
}
