pub mod search;
pub mod store;

pub use search::SemanticRetriever;
pub use store::ChunkStore;
