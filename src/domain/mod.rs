//! Domain layer - capability contracts and core algorithms

pub mod classify;
pub mod embedding;
pub mod error;
pub mod extraction;
pub mod index;
pub mod llm;
pub mod prompt;
pub mod text;

pub use error::DomainError;
pub use llm::{
    CompleteOptions, Completer, Completion, CompletionReason, CompletionStream, FunctionCall,
    LlmBackend, Message, MessageRole, Model, ModelCompleter, Tool, Usage,
};

pub use classify::Classifier;
pub use embedding::Embedder;
pub use extraction::{Block, ExtractedDocument, Extractor, File};
pub use index::{Document, ListOptions, Page, QueryOptions, ScoredDocument, VectorIndex};
pub use prompt::PromptTemplate;
pub use text::{normalize_text, TextSplitter};
