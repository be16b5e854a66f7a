use crate::cancel::CancellationToken;
use crate::config::IndexerConfig;
use crate::error::{ErrorSink, IndexError, LogSink};
use crate::index::{IndexStats, InvertedIndex};
use crate::tokenizer::Tokenizer;
use crate::walker::Walker;
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of one `index` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    pub files_indexed: usize,
    pub directories_visited: usize,
    pub failures: usize,
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

/// Counts what passes through to the caller's sink
struct CountingSink<'a> {
    inner: &'a dyn ErrorSink,
    count: AtomicUsize,
}

impl ErrorSink for CountingSink<'_> {
    fn report(&self, error: IndexError) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.inner.report(error);
    }
}

/// Main indexing engine
pub struct Indexer {
    index: InvertedIndex,
    tokenizer: Arc<dyn Tokenizer>,
    config: IndexerConfig,
    pool: Option<ThreadPool>,
}

impl Indexer {
    /// Create an engine with the default configuration
    pub fn new() -> Self {
        Self::with_config(IndexerConfig::default())
    }

    pub fn with_config(config: IndexerConfig) -> Self {
        let tokenizer = config.tokenizer();
        Self::with_tokenizer(tokenizer, config)
    }

    /// Create an engine around a custom analyzer
    pub fn with_tokenizer(tokenizer: Arc<dyn Tokenizer>, config: IndexerConfig) -> Self {
        let pool = if config.workers == 0 {
            None
        } else {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(config.workers)
                .thread_name(|i| format!("wordex-worker-{i}"))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(err) => {
                    tracing::warn!("Failed to build worker pool, using the global one: {}", err);
                    None
                }
            }
        };

        Self {
            index: InvertedIndex::with_shards(config.shards),
            tokenizer,
            config,
            pool,
        }
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Index a file or a directory tree.
    ///
    /// Unreadable entries are logged and skipped; only a missing root fails.
    pub fn index<P: AsRef<Path>>(&self, path: P) -> Result<(), IndexError> {
        self.index_with(path, &LogSink, &CancellationToken::new())?;
        Ok(())
    }

    /// Index a file or a directory tree, sending per-entry failures to `sink`
    /// and stopping early once `cancel` fires.
    pub fn index_with<P: AsRef<Path>>(
        &self,
        path: P,
        sink: &dyn ErrorSink,
        cancel: &CancellationToken,
    ) -> Result<IndexSummary, IndexError> {
        let root = path.as_ref();
        if !root.exists() {
            return Err(IndexError::PathNotFound(root.to_path_buf()));
        }

        let start = Instant::now();
        tracing::info!(root = %root.display(), "indexing started");

        let sink = CountingSink {
            inner: sink,
            count: AtomicUsize::new(0),
        };
        let files_indexed = AtomicUsize::new(0);

        let run = || {
            if root.is_dir() {
                let mut walker = Walker::new(root, self.config.follow_symlinks, cancel, &sink);
                while let Some(batch) = walker.next_batch() {
                    batch.par_iter().for_each(|file| {
                        if !cancel.is_cancelled() {
                            self.index_one(file, &sink, &files_indexed);
                        }
                    });
                }
                walker.directories()
            } else if root.is_file() {
                self.index_one(root, &sink, &files_indexed);
                0
            } else {
                tracing::debug!(root = %root.display(), "not a regular file, skipping");
                0
            }
        };

        let directories_visited = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };

        let summary = IndexSummary {
            files_indexed: files_indexed.into_inner(),
            directories_visited,
            failures: sink.count.into_inner(),
            cancelled: cancel.is_cancelled(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            files = summary.files_indexed,
            directories = summary.directories_visited,
            failures = summary.failures,
            cancelled = summary.cancelled,
            "indexing finished in {}ms",
            summary.elapsed_ms
        );

        Ok(summary)
    }

    fn index_one(&self, file: &Path, sink: &dyn ErrorSink, indexed: &AtomicUsize) {
        match self.index_file(file) {
            Ok(()) => {
                indexed.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => sink.report(err),
        }
    }

    /// Fold every token of one file into the index.
    ///
    /// The file's tokens are collected first, so a read failure halfway
    /// through records nothing for that file.
    fn index_file(&self, file: &Path) -> Result<(), IndexError> {
        let doc_id = fs::canonicalize(file).map_err(|err| IndexError::io(file, err))?;
        let tokens = self
            .read_tokens(&doc_id)
            .map_err(|err| IndexError::io(&doc_id, err))?;

        tracing::debug!(file = %doc_id.display(), tokens = tokens.len(), "indexed file");
        self.index.add_document(&doc_id.to_string_lossy(), tokens);
        Ok(())
    }

    fn read_tokens(&self, file: &Path) -> std::io::Result<HashSet<String>> {
        let mut reader = BufReader::new(File::open(file)?);
        let mut tokens = HashSet::new();
        let mut line = Vec::new();

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            if line.last() == Some(&b'\n') {
                line.pop();
            }
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            tokens.extend(self.tokenizer.tokenize(&String::from_utf8_lossy(&line)));
        }

        Ok(tokens)
    }

    /// Documents containing `word`; empty when there are none.
    pub fn query(&self, word: &str) -> HashSet<String> {
        self.index.get_documents(&self.tokenizer.normalize(word))
    }

    /// Get index statistics
    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }
}

impl Default for Indexer {
    fn default() -> Self {
        Self::new()
    }
}
