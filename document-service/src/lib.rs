pub mod embeddings;
pub mod models;
pub mod reader;
pub mod splitter;
pub mod store;

pub use embeddings::EmbeddingService;
pub use models::{Document, SearchHit};
pub use reader::DocumentReader;
pub use splitter::ChunkSplitter;
pub use store::VectorStore;
