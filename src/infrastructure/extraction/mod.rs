pub mod markdown;
pub mod text;

pub use markdown::MarkdownExtractor;
pub use text::TextExtractor;

use std::path::Path;

use crate::domain::{Block, DomainError, ExtractedDocument, Extractor, TextSplitter};

/// Picks an extractor by file extension, falling back on the guessed
/// media type for other text formats
#[derive(Debug, Clone)]
pub struct ExtractorRegistry {
    text: TextExtractor,
    markdown: MarkdownExtractor,
}

impl ExtractorRegistry {
    pub fn new(splitter: TextSplitter) -> Self {
        Self {
            text: TextExtractor::new(splitter.clone()),
            markdown: MarkdownExtractor::new(splitter),
        }
    }

    pub fn for_file(&self, name: &str) -> Result<&dyn Extractor, DomainError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        match extension.as_str() {
            "md" | "markdown" => Ok(&self.markdown),
            "txt" | "text" | "" => Ok(&self.text),
            _ => {
                let mime = mime_guess::from_path(name).first_or_text_plain();

                if mime.type_() == mime_guess::mime::TEXT {
                    Ok(&self.text)
                } else {
                    Err(DomainError::validation(format!(
                        "unsupported file type: {name}"
                    )))
                }
            }
        }
    }
}

fn document_from_text(name: &str, text: &str, splitter: &TextSplitter) -> ExtractedDocument {
    let blocks = splitter
        .split(text)
        .into_iter()
        .enumerate()
        .map(|(index, content)| Block {
            id: format!("{name}#{index}"),
            content,
        })
        .collect();

    ExtractedDocument {
        name: name.to_string(),
        content: crate::domain::normalize_text(text),
        blocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::File;

    #[tokio::test]
    async fn test_registry_routes_by_extension() {
        let registry = ExtractorRegistry::new(TextSplitter::new());

        let markdown = registry.for_file("guide.md").unwrap();
        let extracted = markdown
            .extract(&File::new("guide.md", "# Title".as_bytes().to_vec()))
            .await
            .unwrap();
        assert_eq!(extracted.content, "Title");

        assert!(registry.for_file("notes.txt").is_ok());
        assert!(registry.for_file("data.csv").is_ok());
    }

    #[test]
    fn test_registry_rejects_binary_types() {
        let registry = ExtractorRegistry::new(TextSplitter::new());

        let error = registry.for_file("report.pdf").unwrap_err();
        assert!(error.to_string().contains("unsupported file type"));

        assert!(registry.for_file("image.png").is_err());
    }

    #[test]
    fn test_blocks_are_numbered_by_name() {
        let splitter = TextSplitter::new().with_chunk_size(12);
        let extracted = document_from_text("notes.txt", "first part\n\nsecond part", &splitter);

        assert_eq!(extracted.blocks.len(), 2);
        assert_eq!(extracted.blocks[0].id, "notes.txt#0");
        assert_eq!(extracted.blocks[1].id, "notes.txt#1");
    }
}
