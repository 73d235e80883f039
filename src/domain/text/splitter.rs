use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_CHUNK_SIZE: usize = 4000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Default separator priorities: paragraph, line, word, whole unit
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

static PARAGRAPH_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\n\s*\n\s*").unwrap());
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const PARAGRAPH_MARK: &str = "\u{1f}";

/// Collapse blank-line runs to single newlines and any other whitespace
/// runs to single spaces
pub fn normalize_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let text = PARAGRAPH_BREAKS.replace_all(&text, PARAGRAPH_MARK);
    let text = WHITESPACE_RUNS.replace_all(&text, " ");

    text.replace(PARAGRAPH_MARK, "\n").trim().to_string()
}

/// Recursive text splitter.
///
/// Splits on the highest-priority separator present, greedily re-joins
/// small parts up to `chunk_size`, and recurses into oversized parts with
/// the remaining lower-priority separators. `chunk_size` is a soft
/// ceiling: a unit with no separator left is returned whole. Sizes are
/// measured in bytes of the UTF-8 encoding.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
    normalize: bool,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            normalize: true,
        }
    }
}

impl TextSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Accepted for option-surface compatibility; the split itself does
    /// not apply overlap.
    pub fn with_chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.chunk_overlap = chunk_overlap;
        self
    }

    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into an ordered sequence of non-empty chunks
    pub fn split(&self, text: &str) -> Vec<String> {
        let text = if self.normalize {
            normalize_text(text)
        } else {
            text.to_string()
        };

        let mut chunks = Vec::new();
        self.split_with(&text, &self.separators, &mut chunks);
        chunks
    }

    fn split_with(&self, text: &str, separators: &[String], chunks: &mut Vec<String>) {
        let Some(position) = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep.as_str()))
        else {
            push_chunk(chunks, text);
            return;
        };

        let separator = &separators[position];
        let remaining = &separators[position + 1..];

        // The empty separator means there is nothing left to split on
        if separator.is_empty() {
            push_chunk(chunks, text);
            return;
        }

        let mut buffer: Vec<&str> = Vec::new();

        for part in text.split(separator.as_str()) {
            if part.len() < self.chunk_size {
                buffer.push(part);
                continue;
            }

            self.flush_buffer(&mut buffer, separator, chunks);

            if remaining.is_empty() {
                push_chunk(chunks, part);
            } else {
                self.split_with(part, remaining, chunks);
            }
        }

        self.flush_buffer(&mut buffer, separator, chunks);
    }

    /// Greedily re-join buffered parts with their separator, emitting a
    /// chunk whenever the next part would overflow `chunk_size`
    fn flush_buffer(&self, buffer: &mut Vec<&str>, separator: &str, chunks: &mut Vec<String>) {
        if buffer.is_empty() {
            return;
        }

        let mut current = String::new();

        for part in buffer.drain(..) {
            if !current.is_empty()
                && current.len() + separator.len() + part.len() > self.chunk_size
            {
                push_chunk(chunks, &current);
                current.clear();
            }

            if !current.is_empty() {
                current.push_str(separator);
            }

            current.push_str(part);
        }

        push_chunk(chunks, &current);
    }
}

fn push_chunk(chunks: &mut Vec<String>, chunk: &str) {
    if chunk.trim().is_empty() {
        return;
    }

    chunks.push(chunk.to_string());
}
