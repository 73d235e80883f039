//! Completion domain model and backend capability traits

mod backend;
mod completion;
mod message;
mod options;
mod tool;

pub use backend::{Completer, CompletionStream, LlmBackend, Model, ModelCompleter};
pub use completion::{Completion, CompletionReason, Usage};
pub use message::{FunctionCall, Message, MessageRole};
pub use options::CompleteOptions;
pub use tool::Tool;

#[cfg(test)]
pub use backend::mock;
