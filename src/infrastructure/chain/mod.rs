pub mod contextualizer;
pub mod react;
pub mod refine;

pub use contextualizer::Contextualizer;
pub use react::ReactChain;
pub use refine::RefineChain;
