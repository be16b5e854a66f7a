use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl IndexError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::IoFailure {
            path: path.into(),
            source,
        }
    }

    /// Path the error refers to
    pub fn path(&self) -> &Path {
        match self {
            Self::PathNotFound(path) => path.as_path(),
            Self::IoFailure { path, .. } => path.as_path(),
        }
    }
}

/// Receives the per-entry failures of a traversal.
///
/// Reporting never stops the traversal; the sink decides whether to log,
/// collect or escalate.
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: IndexError);
}

impl<F> ErrorSink for F
where
    F: Fn(IndexError) + Send + Sync,
{
    fn report(&self, error: IndexError) {
        self(error)
    }
}

/// Logs every failure as a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn report(&self, error: IndexError) {
        tracing::warn!(path = %error.path().display(), "skipping entry: {}", error);
    }
}

/// Keeps every failure for later inspection.
#[derive(Debug, Default)]
pub struct CollectingSink {
    errors: Mutex<Vec<IndexError>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }

    pub fn into_errors(self) -> Vec<IndexError> {
        self.errors.into_inner()
    }
}

impl ErrorSink for CollectingSink {
    fn report(&self, error: IndexError) {
        self.errors.lock().push(error);
    }
}
