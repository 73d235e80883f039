pub mod memory;

pub use memory::MemoryIndex;
