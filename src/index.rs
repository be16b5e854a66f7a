use parking_lot::RwLock;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

/// Default number of posting shards
pub const DEFAULT_SHARDS: usize = 16;

type Postings = HashMap<String, HashSet<String>>;

/// Inverted index: token -> set of document IDs.
///
/// The table is split into lock-protected shards keyed by token hash, so
/// writers touching different tokens rarely contend and readers only ever
/// hold one shard's read lock.
#[derive(Debug)]
pub struct InvertedIndex {
    shards: Vec<RwLock<Postings>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Create an index with `count` shards, rounded up to a power of two.
    pub fn with_shards(count: usize) -> Self {
        let count = count.max(1).next_power_of_two();
        Self {
            shards: (0..count).map(|_| RwLock::new(HashMap::new())).collect(),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard_of(&self, token: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        (hasher.finish() as usize) & (self.shards.len() - 1)
    }

    /// Add a document under every given token.
    ///
    /// Tokens are grouped per shard first so each shard's write lock is taken
    /// once per document.
    pub fn add_document<I>(&self, doc_id: &str, tokens: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut grouped: HashMap<usize, Vec<String>> = HashMap::new();
        for token in tokens {
            grouped.entry(self.shard_of(&token)).or_default().push(token);
        }

        for (shard, tokens) in grouped {
            let mut postings = self.shards[shard].write();
            for token in tokens {
                let docs = postings.entry(token).or_default();
                if !docs.contains(doc_id) {
                    docs.insert(doc_id.to_string());
                }
            }
        }
    }

    /// Get a copy of the document IDs containing a token
    pub fn get_documents(&self, token: &str) -> HashSet<String> {
        self.shards[self.shard_of(token)]
            .read()
            .get(token)
            .cloned()
            .unwrap_or_default()
    }

    /// Get number of documents containing a term
    pub fn doc_frequency(&self, token: &str) -> usize {
        self.shards[self.shard_of(token)]
            .read()
            .get(token)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    pub fn contains(&self, token: &str, doc_id: &str) -> bool {
        self.shards[self.shard_of(token)]
            .read()
            .get(token)
            .map_or(false, |docs| docs.contains(doc_id))
    }

    /// Number of distinct tokens
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().is_empty())
    }

    /// Get index statistics
    pub fn stats(&self) -> IndexStats {
        let mut documents: HashSet<String> = HashSet::new();
        let mut total_tokens = 0;
        let mut total_postings = 0;

        for shard in &self.shards {
            let postings = shard.read();
            total_tokens += postings.len();
            for docs in postings.values() {
                total_postings += docs.len();
                documents.extend(docs.iter().cloned());
            }
        }

        IndexStats {
            total_documents: documents.len(),
            total_tokens,
            avg_docs_per_token: if total_tokens == 0 {
                0.0
            } else {
                total_postings as f64 / total_tokens as f64
            },
        }
    }
}

impl Default for InvertedIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub total_documents: usize,
    pub total_tokens: usize,
    pub avg_docs_per_token: f64,
}
