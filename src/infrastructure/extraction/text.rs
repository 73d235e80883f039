use async_trait::async_trait;

use crate::domain::{DomainError, ExtractedDocument, Extractor, File, TextSplitter};

/// Extracts plain-text files by decoding and chunking their content
#[derive(Debug, Clone, Default)]
pub struct TextExtractor {
    splitter: TextSplitter,
}

impl TextExtractor {
    pub fn new(splitter: TextSplitter) -> Self {
        Self { splitter }
    }
}

#[async_trait]
impl Extractor for TextExtractor {
    async fn extract(&self, file: &File) -> Result<ExtractedDocument, DomainError> {
        let content = std::str::from_utf8(&file.content)
            .map_err(|_| DomainError::validation(format!("{} is not valid utf-8", file.name)))?;

        Ok(super::document_from_text(&file.name, content, &self.splitter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extracts_and_chunks_text() {
        let extractor = TextExtractor::new(TextSplitter::new().with_chunk_size(12));
        let file = File::new("a.txt", "alpha beta\n\ngamma delta".as_bytes().to_vec());

        let extracted = extractor.extract(&file).await.unwrap();

        assert_eq!(extracted.name, "a.txt");
        assert_eq!(extracted.content, "alpha beta\ngamma delta");
        assert_eq!(extracted.blocks.len(), 2);
        assert_eq!(extracted.blocks[0].content, "alpha beta");
        assert_eq!(extracted.blocks[1].id, "a.txt#1");
    }

    #[tokio::test]
    async fn test_rejects_invalid_utf8() {
        let extractor = TextExtractor::new(TextSplitter::new());
        let file = File::new("bad.txt", vec![0xff, 0xfe, 0x00]);

        let error = extractor.extract(&file).await.unwrap_err();

        assert!(error.to_string().contains("utf-8"));
    }
}
