//! Filesystem monitor backed by a recursive [`notify`] watch.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use super::{Monitor, MonitorError, RefreshSignal};
use crate::source::SourceInput;

/// Most recently modified immediate subdirectory of `root`.
///
/// # Errors
///
/// Returns [`MonitorError::NoSubdirectory`] if `root` has none.
pub fn latest_subdirectory(root: &Path) -> Result<PathBuf, MonitorError> {
    let io_err = |source| MonitorError::Io {
        path: root.to_path_buf(),
        source,
    };
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in std::fs::read_dir(root).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.is_dir() {
            continue;
        }
        let Ok(modified) = path.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        if newest.as_ref().map_or(true, |(best, _)| modified > *best) {
            newest = Some((modified, path));
        }
    }
    newest
        .map(|(_, path)| path)
        .ok_or_else(|| MonitorError::NoSubdirectory(root.to_path_buf()))
}

/// Signals whenever a file under the watched folder is created or its content changes.
pub struct FilesystemMonitor {
    root: PathBuf,
    signal: Arc<RefreshSignal>,
    watcher: Option<RecommendedWatcher>,
}

impl std::fmt::Debug for FilesystemMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesystemMonitor")
            .field("root", &self.root)
            .field("watching", &self.watcher.is_some())
            .finish()
    }
}

impl FilesystemMonitor {
    /// Start watching `root` recursively.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Watch`] if the watcher cannot be created or
    /// `root` cannot be watched.
    pub fn new(root: &Path) -> Result<Self, MonitorError> {
        let signal = Arc::new(RefreshSignal::new());
        let signal_for_watcher = Arc::clone(&signal);

        let mut watcher =
            notify::recommended_watcher(move |event: notify::Result<notify::Event>| match event {
                Ok(evt) => {
                    // Reads only produce access events, so our own refreshes never retrigger.
                    if matches!(evt.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                        debug!(paths = ?evt.paths, "input changed");
                        signal_for_watcher.set();
                    }
                }
                Err(e) => warn!(error = %e, "filesystem watch error"),
            })?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        Ok(Self {
            root: root.to_path_buf(),
            signal,
            watcher: Some(watcher),
        })
    }

    /// Watched folder.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Monitor for FilesystemMonitor {
    fn signal(&self) -> Arc<RefreshSignal> {
        Arc::clone(&self.signal)
    }

    fn latest(&self) -> Result<SourceInput, MonitorError> {
        let dir = latest_subdirectory(&self.root)?;
        debug!(dir = %dir.display(), "latest subdirectory");
        Ok(SourceInput::Path(dir))
    }

    fn stop(&mut self) {
        // Dropping the watcher ends notify's event thread.
        self.watcher.take();
    }
}
