// Re-export main components
pub mod api;
pub mod cancel;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod tokenizer;
pub mod walker;

// Re-export commonly used types
pub use cancel::CancellationToken;
pub use config::IndexerConfig;
pub use engine::{IndexSummary, Indexer};
pub use error::{CollectingSink, ErrorSink, IndexError, LogSink};
pub use index::{IndexStats, InvertedIndex};
pub use tokenizer::{EmptyTokens, StemmingTokenizer, Tokenizer, WordTokenizer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
