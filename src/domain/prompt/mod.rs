//! Prompt rendering

mod template;

pub use template::PromptTemplate;
