//! Pure text utilities

mod splitter;

pub use splitter::{
    normalize_text, TextSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_SEPARATORS,
};
