//! Refresh signal shared between a monitor's worker and the main loop.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::MonitorError;

#[derive(Debug, Default)]
struct SignalState {
    pending: bool,
    interrupted: bool,
}

/// A "something changed" flag with blocking waits and interruption.
///
/// Workers call [`set`](Self::set); the main loop blocks in
/// [`wait`](Self::wait). A set that happens before the wait is not lost.
/// [`interrupt`](Self::interrupt) wakes every waiter for good.
#[derive(Debug, Default)]
pub struct RefreshSignal {
    state: Mutex<SignalState>,
    changed: Condvar,
}

impl RefreshSignal {
    /// A cleared, uninterrupted signal.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SignalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark a change as pending and wake waiters.
    pub fn set(&self) {
        self.lock().pending = true;
        self.changed.notify_all();
    }

    /// Forget any pending change.
    pub fn clear(&self) {
        self.lock().pending = false;
    }

    /// Whether a change is pending.
    pub fn is_set(&self) -> bool {
        self.lock().pending
    }

    /// Abort every current and future wait.
    pub fn interrupt(&self) {
        self.lock().interrupted = true;
        self.changed.notify_all();
    }

    /// Whether [`interrupt`](Self::interrupt) was called.
    pub fn is_interrupted(&self) -> bool {
        self.lock().interrupted
    }

    /// Block until a change is pending, then clear it.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Interrupted`] once interrupted.
    pub fn wait(&self) -> Result<(), MonitorError> {
        let mut state = self.lock();
        while !state.pending && !state.interrupted {
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.interrupted {
            return Err(MonitorError::Interrupted);
        }
        state.pending = false;
        Ok(())
    }

    /// Sleep for `duration`, returning early only when interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Interrupted`] once interrupted.
    pub fn sleep(&self, duration: Duration) -> Result<(), MonitorError> {
        let deadline = Instant::now().checked_add(duration);
        let mut state = self.lock();
        loop {
            if state.interrupted {
                return Err(MonitorError::Interrupted);
            }
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => Duration::from_secs(3600),
            };
            if remaining.is_zero() {
                return Ok(());
            }
            state = match self.changed.wait_timeout(state, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }
}
