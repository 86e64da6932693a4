pub mod index;
pub mod rerank;
pub mod search;
pub mod tfidf;
pub mod tokenizer;

pub use index::{LexicalIndex, LexicalIndexBuilder};
pub use rerank::OverlapModel;
pub use search::LexicalRetriever;
