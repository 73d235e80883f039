use async_trait::async_trait;
use pulldown_cmark::{Event, Parser, Tag};

use crate::domain::{DomainError, ExtractedDocument, Extractor, File, TextSplitter};

/// Extracts markdown files by stripping markup before chunking
#[derive(Debug, Clone, Default)]
pub struct MarkdownExtractor {
    splitter: TextSplitter,
}

impl MarkdownExtractor {
    pub fn new(splitter: TextSplitter) -> Self {
        Self { splitter }
    }
}

#[async_trait]
impl Extractor for MarkdownExtractor {
    async fn extract(&self, file: &File) -> Result<ExtractedDocument, DomainError> {
        let source = std::str::from_utf8(&file.content)
            .map_err(|_| DomainError::validation(format!("{} is not valid utf-8", file.name)))?;

        let text = strip_markup(source);

        Ok(super::document_from_text(&file.name, &text, &self.splitter))
    }
}

/// Flatten a markdown document to plain text, keeping block boundaries
/// as paragraph breaks
fn strip_markup(source: &str) -> String {
    let mut text = String::new();

    for event in Parser::new(source) {
        match event {
            Event::Text(part) | Event::Code(part) => text.push_str(&part),
            Event::SoftBreak => text.push(' '),
            Event::HardBreak => text.push('\n'),
            Event::End(tag) => match tag {
                Tag::Paragraph
                | Tag::Heading(..)
                | Tag::Item
                | Tag::CodeBlock(_)
                | Tag::BlockQuote
                | Tag::Table(_) => text.push_str("\n\n"),
                _ => {}
            },
            _ => {}
        }
    }

    text
}
