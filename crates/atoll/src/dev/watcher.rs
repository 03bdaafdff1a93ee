//! Source tree watcher.
//!
//! Watches the source root recursively and forwards relevant changes into a
//! tokio channel. Hidden paths, the build output and configured ignore
//! patterns are filtered out, and repeated events for one path inside the
//! debounce window are dropped.

use crate::error::{CliError, Result};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const CHANNEL_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }

    fn from_event(kind: &EventKind, path: &Path) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(Self::Created(path.to_path_buf())),
            // Permission and timestamp updates do not change what gets built.
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(_) => Some(Self::Modified(path.to_path_buf())),
            EventKind::Remove(_) => Some(Self::Removed(path.to_path_buf())),
            _ => None,
        }
    }
}

/// Filter applied to every raw event path
#[derive(Debug, Clone)]
pub struct WatchFilter {
    root: PathBuf,
    out_dir: PathBuf,
    ignore: Vec<String>,
}

impl WatchFilter {
    /// Existing `root` and `out_dir` are canonicalized, since the watcher
    /// reports paths with symlinks resolved.
    pub fn new(root: impl Into<PathBuf>, out_dir: impl Into<PathBuf>, ignore: Vec<String>) -> Self {
        Self {
            root: canonical(root.into()),
            out_dir: canonical(out_dir.into()),
            ignore,
        }
    }

    pub fn should_ignore(&self, path: &Path) -> bool {
        if path.starts_with(&self.out_dir) {
            return true;
        }
        let Ok(rel) = path.strip_prefix(&self.root) else {
            return true;
        };
        let rel_str = rel.to_string_lossy();

        for pattern in &self.ignore {
            if let Some(suffix) = pattern.strip_prefix('*') {
                if rel_str.ends_with(suffix) {
                    return true;
                }
            } else if rel.components().any(|c| c.as_os_str() == pattern.as_str()) {
                return true;
            }
        }

        rel.components().any(|c| {
            c.as_os_str()
                .to_str()
                .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
        })
    }
}

/// Per-path debounce: an event passes if the same path did not pass within
/// the window.
#[derive(Debug)]
struct Debouncer {
    window: Duration,
    last: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self {
            window,
            last: HashMap::new(),
        }
    }

    fn admit(&mut self, path: &Path, now: Instant) -> bool {
        if let Some(prev) = self.last.get(path) {
            if now.duration_since(*prev) < self.window {
                return false;
            }
        }
        self.last.insert(path.to_path_buf(), now);
        // Keep the map from growing over a long session.
        let window = self.window;
        self.last.retain(|_, at| now.duration_since(*at) < window * 10);
        true
    }
}

/// Handle keeping the OS watch alive; dropping it stops the stream.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    pub fn new(filter: WatchFilter, debounce_ms: u64) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        let root = filter.root.clone();
        if !root.is_dir() {
            return Err(CliError::Server(format!(
                "Cannot watch {}: not a directory",
                root.display()
            )));
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let mut debouncer = Debouncer::new(Duration::from_millis(debounce_ms));

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(error = %err, "watch error");
                    return;
                }
            };
            for path in &event.paths {
                if filter.should_ignore(path) {
                    continue;
                }
                let Some(change) = FileChange::from_event(&event.kind, path) else {
                    continue;
                };
                if !debouncer.admit(path, Instant::now()) {
                    continue;
                }
                tracing::trace!(?change, "source change");
                // The receiver is gone once the session shuts down.
                if tx.blocking_send(change).is_err() {
                    return;
                }
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        tracing::debug!(root = %root.display(), "watching sources");

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn canonical(path: PathBuf) -> PathBuf {
    std::fs::canonicalize(&path).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(ignore: &[&str]) -> WatchFilter {
        WatchFilter::new(
            "/project/app",
            "/project/.atoll",
            ignore.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn ignores_configured_directories_and_extensions() {
        let filter = filter(&["node_modules", "*.log"]);
        assert!(filter.should_ignore(Path::new("/project/app/node_modules/x/index.js")));
        assert!(filter.should_ignore(Path::new("/project/app/debug.log")));
        assert!(!filter.should_ignore(Path::new("/project/app/pages/index.jsx")));
        // Component match, not substring.
        assert!(!filter.should_ignore(Path::new("/project/app/pages/node_modules_guide.jsx")));
    }

    #[test]
    fn ignores_hidden_paths_output_and_outside_root() {
        let filter = filter(&[]);
        assert!(filter.should_ignore(Path::new("/project/app/.cache/file.js")));
        assert!(filter.should_ignore(Path::new("/project/app/pages/.index.jsx.swp")));
        assert!(filter.should_ignore(Path::new("/project/.atoll/server/pages/index.js")));
        assert!(filter.should_ignore(Path::new("/elsewhere/file.js")));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_roots_match_resolved_event_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir_all(real.join("app/pages")).unwrap();
        std::fs::create_dir_all(real.join(".atoll")).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let filter = WatchFilter::new(link.join("app"), link.join(".atoll"), Vec::new());
        let resolved = std::fs::canonicalize(&real).unwrap();
        assert!(!filter.should_ignore(&resolved.join("app/pages/index.jsx")));
        assert!(filter.should_ignore(&resolved.join(".atoll/server/pages/index.js")));
    }

    #[test]
    fn metadata_only_modifications_are_dropped() {
        let path = Path::new("/project/app/pages/index.jsx");
        let meta = EventKind::Modify(ModifyKind::Metadata(notify::event::MetadataKind::Any));
        assert_eq!(FileChange::from_event(&meta, path), None);

        let data = EventKind::Modify(ModifyKind::Data(notify::event::DataChange::Content));
        assert_eq!(
            FileChange::from_event(&data, path),
            Some(FileChange::Modified(path.to_path_buf()))
        );
    }

    #[test]
    fn debounce_is_per_path() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let now = Instant::now();
        let a = Path::new("/project/app/a.jsx");
        let b = Path::new("/project/app/b.jsx");

        assert!(debouncer.admit(a, now));
        assert!(debouncer.admit(b, now));
        assert!(!debouncer.admit(a, now + Duration::from_millis(50)));
        assert!(debouncer.admit(a, now + Duration::from_millis(150)));
    }
}
