//! Change monitors.
//!
//! A [`Monitor`] tells the main loop when the input changed. Each monitor
//! owns one [`RefreshSignal`] and at most one background worker:
//!
//! - [`NoopMonitor`]: never signals (one-shot rendering)
//! - [`fs::FilesystemMonitor`]: recursive `notify` watch on the input folder
//! - [`stdin::StdinMonitor`]: reader thread buffering CSV lines from stdin

use std::path::PathBuf;
use std::sync::Arc;

use crate::source::SourceInput;

pub mod fs;
pub mod signal;
pub mod stdin;

pub use fs::FilesystemMonitor;
pub use signal::RefreshSignal;
pub use stdin::StdinMonitor;

/// Monitor failures.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The filesystem watch could not be set up.
    #[error("failed to watch input: {0}")]
    Watch(#[from] notify::Error),

    /// The wait was interrupted (Ctrl-C).
    #[error("interrupted")]
    Interrupted,

    /// Stdin ended before enough data arrived.
    #[error("stdin closed before enough data was read")]
    InputClosed,

    /// Latest mode found no subdirectory to plot.
    #[error("no subdirectory found in '{}'", .0.display())]
    NoSubdirectory(PathBuf),

    /// Listing the input folder failed.
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        /// Folder being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

/// Source of "input changed" notifications for the main loop.
pub trait Monitor: Send {
    /// The signal this monitor sets; also used to interrupt waits.
    fn signal(&self) -> Arc<RefreshSignal>;

    /// The input to render now.
    fn latest(&self) -> Result<SourceInput, MonitorError>;

    /// Stop the background worker. Never blocks.
    fn stop(&mut self);

    /// Whether another render is due.
    fn should_refresh(&self) -> bool {
        self.signal().is_set()
    }

    /// Request another render.
    fn set_should_refresh(&self) {
        self.signal().set();
    }

    /// Forget pending changes.
    fn reset_condition(&self) {
        self.signal().clear();
    }

    /// Block until the input changes; a change seen before the call returns immediately.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Interrupted`] when interrupted.
    fn wait_till_new_modification(&self) -> Result<(), MonitorError> {
        self.signal().wait()
    }
}

/// Monitor for one-shot rendering: nothing ever changes.
#[derive(Debug)]
pub struct NoopMonitor {
    input: SourceInput,
    signal: Arc<RefreshSignal>,
}

impl NoopMonitor {
    /// Monitor that always reports `input` as latest.
    pub fn new(input: SourceInput) -> Self {
        Self {
            input,
            signal: Arc::new(RefreshSignal::new()),
        }
    }
}

impl Monitor for NoopMonitor {
    fn signal(&self) -> Arc<RefreshSignal> {
        Arc::clone(&self.signal)
    }

    fn latest(&self) -> Result<SourceInput, MonitorError> {
        Ok(self.input.clone())
    }

    fn stop(&mut self) {}

    fn wait_till_new_modification(&self) -> Result<(), MonitorError> {
        if self.signal.is_interrupted() {
            return Err(MonitorError::Interrupted);
        }
        self.signal.clear();
        Ok(())
    }
}
