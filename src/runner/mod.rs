//! Orchestration loop.
//!
//! ```text
//! INIT ──► RENDER ──► DONE
//!            │  ▲
//!            ▼  │
//!            WAIT
//! ```
//!
//! INIT resolves the input, RENDER draws one cycle, WAIT blocks on the
//! monitor. Errors leave through FAILED; Ctrl-C ends in DONE.

use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::PlotConfig;
use crate::monitor::{
    FilesystemMonitor, Monitor, MonitorError, NoopMonitor, RefreshSignal, StdinMonitor,
};
use crate::render::{create_plotter, Plotter, RenderError};
use crate::source::{DataSource, SourceError, SourceInput, SourceKind};

pub mod cycle;

pub use cycle::draw_cycle;

/// Lines stdin must deliver before the first render: a header and one row.
const MIN_STDIN_LINES: usize = 2;

/// States of the orchestration loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Resolving the input.
    Init,
    /// Drawing one cycle.
    Render,
    /// Waiting for the input to change.
    Wait,
    /// Finished normally.
    Done,
    /// Stopped on an error.
    Failed,
}

/// Anything that ends a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Reading the data failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Drawing failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Monitoring the input failed.
    #[error(transparent)]
    Monitor(#[from] MonitorError),

    /// No source kind recognizes the input.
    #[error("cannot determine the data source for '{}'; pass --data-source", .0.display())]
    UndeterminedSource(PathBuf),

    /// The options do not fit the input.
    #[error("{0}")]
    Usage(String),
}

impl RunError {
    /// Whether latest+follow mode should log this and wait for new data.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Source(
                SourceError::Missing { .. }
                    | SourceError::Processing(_)
                    | SourceError::NonNumeric { .. }
            ) | Self::Render(RenderError::Plotting(_))
        )
    }
}

/// Auto-detect the source kind for `path`.
///
/// Tries `csv`, `tensorboard`, `jsonl` in turn (`jsonl` first for `.json` and
/// `.jsonl` paths). Only a [`SourceError::Missing`] moves on to the next kind.
///
/// # Errors
///
/// Returns [`RunError::UndeterminedSource`] when no kind matches, or the first
/// non-`Missing` source error.
pub fn detect_source(path: &Path, config: &PlotConfig) -> Result<SourceKind, RunError> {
    let json_like = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json") || ext.eq_ignore_ascii_case("jsonl"));
    let order = if json_like {
        [SourceKind::Jsonl, SourceKind::Csv, SourceKind::Tensorboard]
    } else {
        [SourceKind::Csv, SourceKind::Tensorboard, SourceKind::Jsonl]
    };

    let input = SourceInput::Path(path.to_path_buf());
    for kind in order {
        match DataSource::open(kind, &input, config, &HashSet::new()) {
            Ok(_) => {
                debug!(%kind, path = %path.display(), "detected data source");
                return Ok(kind);
            }
            Err(SourceError::Missing { .. }) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(RunError::UndeterminedSource(path.to_path_buf()))
}

/// Drives one run from INIT to DONE or FAILED.
pub struct Runner<'a> {
    config: &'a PlotConfig,
    plotter: Box<dyn Plotter>,
    monitor: ActiveMonitor,
    kind: SourceKind,
    input: SourceInput,
    excluded: HashSet<String>,
    state: RunState,
}

/// The run's monitor; stdin keeps its concrete type for the initial line wait.
enum ActiveMonitor {
    Stdin(StdinMonitor),
    Other(Box<dyn Monitor>),
}

impl ActiveMonitor {
    fn get(&self) -> &dyn Monitor {
        match self {
            Self::Stdin(monitor) => monitor,
            Self::Other(monitor) => monitor.as_ref(),
        }
    }

    fn get_mut(&mut self) -> &mut dyn Monitor {
        match self {
            Self::Stdin(monitor) => monitor,
            Self::Other(monitor) => monitor.as_mut(),
        }
    }
}

impl std::fmt::Debug for Runner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("excluded", &self.excluded)
            .finish_non_exhaustive()
    }
}

impl<'a> Runner<'a> {
    /// Build the configured backend and read CSV from the process stdin when
    /// no folder is given.
    ///
    /// # Errors
    ///
    /// See [`Runner::with_parts`]; backend capability errors are fatal here.
    pub fn new(config: &'a PlotConfig) -> Result<Self, RunError> {
        let plotter = create_plotter(config)?;
        Self::with_parts(config, plotter, BufReader::new(std::io::stdin()))
    }

    /// Build a runner around an existing backend and stdin reader.
    ///
    /// `stdin` is only consumed when `config.target` is `None`.
    ///
    /// # Errors
    ///
    /// Fails if the filesystem watch cannot be set up, `--latest` is used on
    /// something other than a directory, or no source kind fits the input.
    pub fn with_parts<R>(
        config: &'a PlotConfig,
        plotter: Box<dyn Plotter>,
        stdin: R,
    ) -> Result<Self, RunError>
    where
        R: BufRead + Send + 'static,
    {
        let Some(target) = config.target.clone() else {
            return Ok(Self {
                config,
                plotter,
                monitor: ActiveMonitor::Stdin(StdinMonitor::spawn(stdin)),
                kind: SourceKind::StdinCsv,
                input: SourceInput::Buffer(String::new()),
                excluded: HashSet::new(),
                state: RunState::Init,
            });
        };

        let mut monitor: Box<dyn Monitor> = if config.follow || config.latest {
            Box::new(FilesystemMonitor::new(&target)?)
        } else {
            Box::new(NoopMonitor::new(SourceInput::Path(target.clone())))
        };

        match Self::resolve_target(config, monitor.as_ref(), &target) {
            Ok((kind, input)) => Ok(Self {
                config,
                plotter,
                monitor: ActiveMonitor::Other(monitor),
                kind,
                input,
                excluded: HashSet::new(),
                state: RunState::Init,
            }),
            Err(e) => {
                monitor.stop();
                Err(e)
            }
        }
    }

    fn resolve_target(
        config: &PlotConfig,
        monitor: &dyn Monitor,
        target: &Path,
    ) -> Result<(SourceKind, SourceInput), RunError> {
        let input = if config.latest {
            if !target.is_dir() {
                return Err(RunError::Usage(format!(
                    "--latest requires a directory, got '{}'",
                    target.display()
                )));
            }
            monitor.latest()?
        } else {
            SourceInput::Path(target.to_path_buf())
        };

        let kind = match (config.data_source, &input) {
            (Some(kind), _) => kind,
            (None, SourceInput::Path(path)) => detect_source(path, config)?,
            (None, SourceInput::Buffer(_)) => SourceKind::StdinCsv,
        };
        info!(%kind, "plotting");
        Ok((kind, input))
    }

    /// Signal used to interrupt the run from another thread.
    pub fn signal(&self) -> Arc<RefreshSignal> {
        self.monitor.get().signal()
    }

    /// Current state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Resolved source kind.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Series skipped because they are not numeric.
    pub fn excluded(&self) -> &HashSet<String> {
        &self.excluded
    }

    /// Run until done, failed or interrupted. The monitor is stopped on every exit.
    ///
    /// # Errors
    ///
    /// Returns the error that moved the loop to FAILED. Interruption is not an error.
    pub fn run(&mut self) -> Result<(), RunError> {
        let result = self.drive();
        self.monitor.get_mut().stop();
        match result {
            Ok(()) => {
                self.state = RunState::Done;
                Ok(())
            }
            Err(RunError::Monitor(MonitorError::Interrupted)) => {
                info!("interrupted");
                self.state = RunState::Done;
                Ok(())
            }
            Err(e) => {
                self.state = RunState::Failed;
                Err(e)
            }
        }
    }

    fn drive(&mut self) -> Result<(), RunError> {
        loop {
            self.state = match self.state {
                RunState::Init => self.init()?,
                RunState::Render => self.render()?,
                RunState::Wait => self.wait()?,
                RunState::Done | RunState::Failed => return Ok(()),
            };
        }
    }

    fn init(&mut self) -> Result<RunState, RunError> {
        if let ActiveMonitor::Stdin(monitor) = &self.monitor {
            monitor.wait_for_lines(MIN_STDIN_LINES)?;
            self.input = monitor.latest()?;
        }
        Ok(RunState::Render)
    }

    fn render(&mut self) -> Result<RunState, RunError> {
        match self.render_once() {
            Ok(()) => {
                if !self.config.follow && !self.monitor.get().should_refresh() {
                    return Ok(RunState::Done);
                }
                self.monitor.get().signal().sleep(self.config.interval)?;
                Ok(RunState::Wait)
            }
            Err(e) if e.is_recoverable() && self.config.latest && self.config.follow => {
                warn!(error = %e, "render failed; waiting for new data");
                Ok(RunState::Wait)
            }
            Err(e) => Err(e),
        }
    }

    /// One cycle, retried after excluding each non-numeric series it hits.
    fn render_once(&mut self) -> Result<(), RunError> {
        loop {
            let mut source = DataSource::open(self.kind, &self.input, self.config, &self.excluded)?;
            match draw_cycle(self.plotter.as_mut(), &mut source, self.config) {
                Err(RunError::Source(SourceError::NonNumeric { series })) => {
                    warn!(series = %series, "skipping non-numeric series");
                    if !self.excluded.insert(series.clone()) {
                        return Err(SourceError::NonNumeric { series }.into());
                    }
                }
                other => return other,
            }
        }
    }

    fn wait(&mut self) -> Result<RunState, RunError> {
        self.monitor.get().wait_till_new_modification()?;
        if self.config.latest || self.kind == SourceKind::StdinCsv {
            self.monitor.get().reset_condition();
            self.input = self.monitor.get().latest()?;
        }
        Ok(RunState::Render)
    }
}
