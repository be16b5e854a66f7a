//! Iterative directory traversal.
//!
//! The tree is walked one level at a time: every directory of the current
//! frontier is listed (in parallel on the active rayon pool), the files found
//! are handed back as a batch, and the subdirectories become the next
//! frontier. No recursion, so deep trees cannot exhaust the stack.

use crate::cancel::CancellationToken;
use crate::error::{ErrorSink, IndexError};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Files and subdirectories found in one directory
#[derive(Debug, Default)]
struct Listing {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
}

pub struct Walker<'a> {
    follow_symlinks: bool,
    cancel: &'a CancellationToken,
    sink: &'a dyn ErrorSink,
    frontier: Vec<PathBuf>,
    visited: HashSet<PathBuf>,
    directories: usize,
}

impl<'a> Walker<'a> {
    /// Start a walk at `root`, which must be a directory.
    pub fn new(
        root: &Path,
        follow_symlinks: bool,
        cancel: &'a CancellationToken,
        sink: &'a dyn ErrorSink,
    ) -> Self {
        let mut walker = Self {
            follow_symlinks,
            cancel,
            sink,
            frontier: Vec::new(),
            visited: HashSet::new(),
            directories: 0,
        };
        walker.enqueue(root.to_path_buf());
        walker
    }

    /// Number of directories listed so far
    pub fn directories(&self) -> usize {
        self.directories
    }

    /// Queue a directory unless it was already reached through another link.
    fn enqueue(&mut self, dir: PathBuf) {
        if self.follow_symlinks {
            match fs::canonicalize(&dir) {
                Ok(canonical) => {
                    if !self.visited.insert(canonical) {
                        tracing::debug!(dir = %dir.display(), "directory already visited");
                        return;
                    }
                }
                Err(err) => {
                    self.sink.report(IndexError::io(dir, err));
                    return;
                }
            }
        }
        self.frontier.push(dir);
    }

    /// List the current frontier and return the files it contains.
    ///
    /// Returns `None` once the tree is exhausted or the walk was cancelled.
    /// A level may contain no files, in which case an empty batch is
    /// returned and the walk continues with the next level.
    pub fn next_batch(&mut self) -> Option<Vec<PathBuf>> {
        if self.frontier.is_empty() || self.cancel.is_cancelled() {
            return None;
        }

        let frontier = std::mem::take(&mut self.frontier);
        self.directories += frontier.len();

        let listings: Vec<Listing> = frontier
            .par_iter()
            .map(|dir| self.list(dir))
            .collect();

        let mut files = Vec::new();
        for listing in listings {
            files.extend(listing.files);
            for dir in listing.dirs {
                self.enqueue(dir);
            }
        }

        Some(files)
    }

    fn list(&self, dir: &Path) -> Listing {
        let mut listing = Listing::default();

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                self.sink.report(IndexError::io(dir, err));
                return listing;
            }
        };

        for entry in entries {
            if self.cancel.is_cancelled() {
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.sink.report(IndexError::io(dir, err));
                    continue;
                }
            };
            let path = entry.path();

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(err) => {
                    self.sink.report(IndexError::io(path, err));
                    continue;
                }
            };

            let file_type = if file_type.is_symlink() {
                if !self.follow_symlinks {
                    continue;
                }
                match fs::metadata(&path) {
                    Ok(metadata) => metadata.file_type(),
                    Err(err) => {
                        self.sink.report(IndexError::io(path, err));
                        continue;
                    }
                }
            } else {
                file_type
            };

            if file_type.is_dir() {
                listing.dirs.push(path);
            } else if file_type.is_file() {
                listing.files.push(path);
            }
        }

        listing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectingSink;
    use std::io;

    fn write(path: &Path, content: &str) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)
    }

    fn collect(walker: &mut Walker) -> Vec<PathBuf> {
        let mut all = Vec::new();
        while let Some(batch) = walker.next_batch() {
            all.extend(batch);
        }
        all.sort();
        all
    }

    #[test]
    fn test_walks_nested_tree() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        write(&dir.path().join("a.txt"), "a")?;
        write(&dir.path().join("sub/b.txt"), "b")?;
        write(&dir.path().join("sub/deeper/c.txt"), "c")?;
        fs::create_dir(dir.path().join("empty"))?;

        let cancel = CancellationToken::new();
        let sink = CollectingSink::new();
        let mut walker = Walker::new(dir.path(), true, &cancel, &sink);
        let files = collect(&mut walker);

        assert_eq!(files.len(), 3);
        assert!(files.iter().any(|f| f.ends_with("sub/deeper/c.txt")));
        assert_eq!(walker.directories(), 4);
        assert!(sink.is_empty());
        Ok(())
    }

    #[test]
    fn test_deep_tree_is_iterative() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut deep = dir.path().to_path_buf();
        for level in 0..64 {
            deep.push(format!("d{level}"));
        }
        write(&deep.join("leaf.txt"), "leaf")?;

        let cancel = CancellationToken::new();
        let sink = CollectingSink::new();
        let files = collect(&mut Walker::new(dir.path(), true, &cancel, &sink));
        assert_eq!(files.len(), 1);
        Ok(())
    }

    #[test]
    fn test_cancelled_walk_yields_nothing() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        write(&dir.path().join("a.txt"), "a")?;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let sink = CollectingSink::new();
        let mut walker = Walker::new(dir.path(), true, &cancel, &sink);
        assert!(walker.next_batch().is_none());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_visited_once() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        write(&dir.path().join("sub/a.txt"), "a")?;
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub/loop"))?;

        let cancel = CancellationToken::new();
        let sink = CollectingSink::new();
        let files = collect(&mut Walker::new(dir.path(), true, &cancel, &sink));
        assert_eq!(files.len(), 1);
        assert!(sink.is_empty());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_skipped_when_not_followed() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        write(&dir.path().join("a.txt"), "a")?;
        std::os::unix::fs::symlink(dir.path().join("a.txt"), dir.path().join("link.txt"))?;

        let cancel = CancellationToken::new();
        let sink = CollectingSink::new();
        let files = collect(&mut Walker::new(dir.path(), false, &cancel, &sink));
        assert_eq!(files, vec![dir.path().join("a.txt")]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_link_is_reported() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        write(&dir.path().join("a.txt"), "a")?;
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("broken"))?;

        let cancel = CancellationToken::new();
        let sink = CollectingSink::new();
        let files = collect(&mut Walker::new(dir.path(), true, &cancel, &sink));
        assert_eq!(files.len(), 1);
        assert_eq!(sink.len(), 1);
        Ok(())
    }
}
