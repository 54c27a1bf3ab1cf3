//! Stdin monitor: a reader thread buffers lines as they arrive.

use std::io::BufRead;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, warn};

use super::{Monitor, MonitorError, RefreshSignal};
use crate::source::SourceInput;

/// How often [`StdinMonitor::wait_for_lines`] rechecks for interruption.
const POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
struct Buffer {
    lines: Vec<String>,
    closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    buffer: Mutex<Buffer>,
    grew: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Buffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Signals once per line read, and once more when the stream ends.
#[derive(Debug)]
pub struct StdinMonitor {
    shared: Arc<Shared>,
    signal: Arc<RefreshSignal>,
    reader: Option<JoinHandle<()>>,
}

impl StdinMonitor {
    /// Start a reader thread consuming `reader` line by line.
    pub fn spawn<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let shared = Arc::new(Shared::default());
        let signal = Arc::new(RefreshSignal::new());

        let worker_shared = Arc::clone(&shared);
        let worker_signal = Arc::clone(&signal);
        let handle = std::thread::spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        worker_shared.lock().lines.push(line);
                        worker_shared.grew.notify_all();
                        worker_signal.set();
                    }
                    Err(e) => {
                        warn!(error = %e, "stdin read failed");
                        break;
                    }
                }
            }
            debug!("stdin closed");
            worker_shared.lock().closed = true;
            worker_shared.grew.notify_all();
            worker_signal.set();
        });

        Self {
            shared,
            signal,
            reader: Some(handle),
        }
    }

    /// Whether the stream has ended.
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Lines buffered so far.
    pub fn line_count(&self) -> usize {
        self.shared.lock().lines.len()
    }

    /// Block until at least `count` lines are buffered.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::InputClosed`] if the stream ends first and
    /// [`MonitorError::Interrupted`] when interrupted.
    pub fn wait_for_lines(&self, count: usize) -> Result<(), MonitorError> {
        let mut buffer = self.shared.lock();
        loop {
            if buffer.lines.len() >= count {
                return Ok(());
            }
            if buffer.closed {
                return Err(MonitorError::InputClosed);
            }
            if self.signal.is_interrupted() {
                return Err(MonitorError::Interrupted);
            }
            buffer = match self.shared.grew.wait_timeout(buffer, POLL) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }
}

impl Monitor for StdinMonitor {
    fn signal(&self) -> Arc<RefreshSignal> {
        Arc::clone(&self.signal)
    }

    /// Everything read so far, newline-joined. Clears the pending change.
    fn latest(&self) -> Result<SourceInput, MonitorError> {
        // Reset before the snapshot so a line pushed in between stays pending.
        self.reset_condition();
        let mut text = self.shared.lock().lines.join("\n");
        text.push('\n');
        Ok(SourceInput::Buffer(text))
    }

    /// An open stream always counts as "more may come".
    fn should_refresh(&self) -> bool {
        self.signal.is_set() || !self.is_closed()
    }

    fn stop(&mut self) {
        // A reader blocked on stdin cannot be cancelled; leave it detached.
        if self.reader.as_ref().is_some_and(JoinHandle::is_finished) {
            if let Some(handle) = self.reader.take() {
                if handle.join().is_err() {
                    warn!("stdin reader panicked");
                }
            }
        }
    }
}
