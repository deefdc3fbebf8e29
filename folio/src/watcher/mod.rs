use crate::path::to_slash;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// A debounced change to a file below the content root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherEvent {
    /// Path relative to the content root, `/`-separated
    pub path: String,
    pub kind: ChangeKind,
}

/// Watches the content root for file changes.
/// Debounced events are sent through an mpsc channel; feed their paths to
/// [`DocumentStore::rebuild_for_paths`](crate::store::DocumentStore::rebuild_for_paths).
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    /// Handle to the background thread processing events
    _thread: std::thread::JoinHandle<()>,
    /// Receiver for debounced file change events
    pub event_rx: mpsc::Receiver<WatcherEvent>,
}

impl FileWatcher {
    /// Start watching `content_root` recursively with the default 100ms debounce.
    pub fn start(content_root: &Path) -> Result<Self, notify::Error> {
        Self::with_debounce(content_root, Duration::from_millis(100))
    }

    pub fn with_debounce(content_root: &Path, debounce: Duration) -> Result<Self, notify::Error> {
        let (notify_tx, notify_rx) = mpsc::channel::<notify::Result<Event>>();
        let (event_tx, event_rx) = mpsc::channel::<WatcherEvent>();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = notify_tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(content_root, RecursiveMode::Recursive)?;

        // Events carry absolute (possibly canonicalized) paths
        let root = content_root
            .canonicalize()
            .unwrap_or_else(|_| content_root.to_path_buf());
        let fallback_root = content_root.to_path_buf();

        let thread = std::thread::spawn(move || {
            let mut pending: Vec<(PathBuf, ChangeKind)> = Vec::new();
            let mut last_event = Instant::now();

            loop {
                match notify_rx.recv_timeout(debounce) {
                    Ok(Ok(event)) => {
                        if let Some(kind) = ChangeKind::from_event_kind(&event.kind) {
                            for path in event.paths {
                                if is_content_file(&path) {
                                    pending.push((path, kind));
                                }
                            }
                        }
                        last_event = Instant::now();
                    }
                    Ok(Err(e)) => {
                        log::warn!("File watcher error: {e}");
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        if pending.is_empty() || last_event.elapsed() < debounce {
                            continue;
                        }
                        // Keep the last change kind per path
                        let mut seen = HashMap::new();
                        for (path, kind) in pending.drain(..) {
                            seen.insert(path, kind);
                        }
                        let mut events: Vec<WatcherEvent> = seen
                            .into_iter()
                            .filter_map(|(path, kind)| {
                                let relative = relative_to(&path, &root)
                                    .or_else(|| relative_to(&path, &fallback_root))?;
                                Some(WatcherEvent { path: relative, kind })
                            })
                            .collect();
                        events.sort_by(|a, b| a.path.cmp(&b.path));

                        for event in events {
                            log::debug!("Content change: {:?} {}", event.kind, event.path);
                            if event_tx.send(event).is_err() {
                                return; // Receiver dropped
                            }
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        log::info!("Watching {}", content_root.display());
        Ok(FileWatcher {
            _watcher: watcher,
            _thread: thread,
            event_rx,
        })
    }

    /// Block until at least one change arrives, then drain whatever else is
    /// queued. Returns `None` once the watcher thread has stopped.
    pub fn next_batch(&self) -> Option<Vec<WatcherEvent>> {
        let first = self.event_rx.recv().ok()?;
        let mut batch = vec![first];
        batch.extend(self.event_rx.try_iter());
        Some(batch)
    }
}

/// The kind of file change detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

impl ChangeKind {
    fn from_event_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(ChangeKind::Created),
            EventKind::Modify(_) => Some(ChangeKind::Modified),
            EventKind::Remove(_) => Some(ChangeKind::Deleted),
            _ => None,
        }
    }
}

/// Relative paths of a batch, deduplicated, in order.
pub fn changed_paths(events: &[WatcherEvent]) -> Vec<&str> {
    let mut paths: Vec<&str> = events.iter().map(|e| e.path.as_str()).collect();
    paths.sort_unstable();
    paths.dedup();
    paths
}

fn relative_to(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let relative = to_slash(relative);
    (!relative.is_empty()).then_some(relative)
}

/// Editor swap and backup files never belong to a collection.
fn is_content_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    !(name.ends_with('~') || name.ends_with(".swp") || name.ends_with(".tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    #[test]
    fn test_change_kind_mapping() {
        assert_eq!(
            ChangeKind::from_event_kind(&EventKind::Create(CreateKind::File)),
            Some(ChangeKind::Created)
        );
        assert_eq!(
            ChangeKind::from_event_kind(&EventKind::Modify(ModifyKind::Any)),
            Some(ChangeKind::Modified)
        );
        assert_eq!(
            ChangeKind::from_event_kind(&EventKind::Remove(RemoveKind::File)),
            Some(ChangeKind::Deleted)
        );
        assert_eq!(ChangeKind::from_event_kind(&EventKind::Any), None);
    }

    #[test]
    fn test_relative_to() {
        let root = Path::new("/site/content");
        assert_eq!(
            relative_to(Path::new("/site/content/posts/a.md"), root),
            Some("posts/a.md".to_string())
        );
        assert_eq!(relative_to(Path::new("/elsewhere/a.md"), root), None);
        assert_eq!(relative_to(root, root), None);
    }

    #[test]
    fn test_is_content_file() {
        assert!(is_content_file(Path::new("posts/a.md")));
        assert!(!is_content_file(Path::new("posts/a.md~")));
        assert!(!is_content_file(Path::new("posts/.a.md.swp")));
    }

    #[test]
    fn test_changed_paths_dedup() {
        let events = vec![
            WatcherEvent {
                path: "posts/b.md".into(),
                kind: ChangeKind::Modified,
            },
            WatcherEvent {
                path: "posts/a.md".into(),
                kind: ChangeKind::Created,
            },
            WatcherEvent {
                path: "posts/b.md".into(),
                kind: ChangeKind::Deleted,
            },
        ];
        assert_eq!(changed_paths(&events), ["posts/a.md", "posts/b.md"]);
    }
}
