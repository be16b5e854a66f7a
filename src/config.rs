use crate::index::DEFAULT_SHARDS;
use crate::tokenizer::{EmptyTokens, StemmingTokenizer, Tokenizer, WordTokenizer};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

/// Indexer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Worker threads used to list directories and read files. `0` uses the
    /// global rayon pool.
    pub workers: usize,
    /// Number of posting shards
    pub shards: usize,
    /// Whether boundary delimiters produce an empty `""` token
    pub empty_tokens: EmptyTokens,
    /// Use the stemming analyzer instead of the plain word split
    pub stemming: bool,
    /// Descend into symlinked directories and index symlinked files
    pub follow_symlinks: bool,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            shards: DEFAULT_SHARDS,
            empty_tokens: EmptyTokens::Keep,
            stemming: false,
            follow_symlinks: true,
        }
    }
}

impl IndexerConfig {
    /// Load settings from a JSON file; missing fields keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Build the analyzer these settings describe
    pub fn tokenizer(&self) -> Arc<dyn Tokenizer> {
        if self.stemming {
            Arc::new(StemmingTokenizer::new())
        } else {
            Arc::new(WordTokenizer::with_empty_tokens(self.empty_tokens))
        }
    }
}
