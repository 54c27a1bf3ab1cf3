//! Series sources.
//!
//! A [`DataSource`] discovers one or more [`Figure`]s for an input and
//! exposes their filtered scalar names. Each Figure yields x/y [`Series`]
//! for one named scalar. Variants are selected by [`SourceKind`]:
//!
//! - [`tensorboard`]: `events.out.*` event-log folders
//! - CSV / TSV tables
//! - JSON-lines records
//! - CSV text buffered from stdin

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{PlotConfig, XAxisKind};

pub mod consolidate;
pub mod tensorboard;

mod csv;
mod jsonl;
mod stdin;
mod table;

pub use consolidate::{guess_prefix, ConsolidatedStats, StatGroup};

/// Data source variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// TensorBoard event logs.
    Tensorboard,
    /// CSV or TSV files.
    Csv,
    /// JSON-lines files.
    Jsonl,
    /// CSV text read from stdin.
    StdinCsv,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tensorboard => "tensorboard",
            Self::Csv => "csv",
            Self::Jsonl => "jsonl",
            Self::StdinCsv => "stdin-csv",
        };
        f.write_str(name)
    }
}

/// What a source is opened on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInput {
    /// A file or folder on disk.
    Path(PathBuf),
    /// Text buffered in memory (stdin).
    Buffer(String),
}

/// How the values of one axis should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Plain numbers.
    Numeric,
    /// Seconds since the Unix epoch.
    Temporal,
}

/// Equal-length x/y samples for one named scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// X values.
    pub x: Vec<f64>,
    /// Y values.
    pub y: Vec<f64>,
    /// Interpretation of `x`.
    pub x_kind: ValueKind,
    /// Interpretation of `y`.
    pub y_kind: ValueKind,
}

impl Series {
    /// Pair up `x` and `y`, dropping every index where either value is not finite.
    ///
    /// Extra trailing values in the longer input are ignored.
    pub fn new(x: Vec<f64>, x_kind: ValueKind, y: Vec<f64>, y_kind: ValueKind) -> Self {
        let (x, y) = x
            .into_iter()
            .zip(y)
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .unzip();
        Self {
            x,
            y,
            x_kind,
            y_kind,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether there are no samples.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Source failures.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Nothing matching the source kind exists at the input.
    #[error("no {kind} data found at '{}'", path.display())]
    Missing {
        /// Source kind that was looked for.
        kind: SourceKind,
        /// Input path.
        path: PathBuf,
    },

    /// Data was found but could not be turned into series.
    #[error("failed to process data: {0}")]
    Processing(String),

    /// A series holds values that are neither numbers nor timestamps.
    #[error("series '{series}' is not numeric")]
    NonNumeric {
        /// Offending series name.
        series: String,
    },

    /// The x-axis selector cannot be used with this source.
    #[error("unsupported x-axis '{x_axis}': {reason}")]
    UnsupportedXAxis {
        /// Requested selector.
        x_axis: String,
        /// Why it cannot be used.
        reason: String,
    },

    /// Reading the input failed.
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        /// File or folder being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

impl SourceError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One plot column: an ordered set of named scalar series.
pub trait Figure: Send {
    /// Display title.
    fn title(&self) -> &str;

    /// All scalar names, unfiltered, in source order.
    fn scalar_names(&self) -> &[String];

    /// Re-read the backing storage. Idempotent; safe to call before every cycle.
    fn refresh(&mut self) -> Result<(), SourceError>;

    /// X/y samples of `y` against the chosen x-axis.
    fn get_series(&mut self, x_axis: &XAxisKind, y: &str) -> Result<Series, SourceError>;
}

/// Keep names containing any whitelist keyword (if any are given), then drop
/// names containing any blacklist keyword or listed in `excluded`.
pub fn filter_names<'a>(
    names: impl IntoIterator<Item = &'a String>,
    whitelist: &[String],
    blacklist: &[String],
    excluded: &HashSet<String>,
) -> Vec<String> {
    names
        .into_iter()
        .filter(|name| {
            whitelist.is_empty() || whitelist.iter().any(|kw| name.contains(kw.as_str()))
        })
        .filter(|name| !blacklist.iter().any(|kw| name.contains(kw.as_str())))
        .filter(|name| !excluded.contains(name.as_str()))
        .cloned()
        .collect()
}

/// The set of Figures discovered for one input.
pub struct DataSource {
    kind: SourceKind,
    figures: Vec<Box<dyn Figure>>,
    x_axis: XAxisKind,
    consolidate: u8,
    whitelist: Vec<String>,
    blacklist: Vec<String>,
    excluded: HashSet<String>,
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let titles: Vec<&str> = self.figures.iter().map(|fig| fig.title()).collect();
        f.debug_struct("DataSource")
            .field("kind", &self.kind)
            .field("figures", &titles)
            .finish_non_exhaustive()
    }
}

impl DataSource {
    /// Discover Figures of `kind` for `input`.
    ///
    /// Figures are enumerated only here; later refreshes update their data
    /// but never add or remove Figures. `excluded` names are hidden from
    /// [`Self::all_scalar_names`].
    ///
    /// # Errors
    ///
    /// [`SourceError::Missing`] when nothing matches, [`SourceError::Processing`]
    /// when a matching Figure holds no scalars.
    pub fn open(
        kind: SourceKind,
        input: &SourceInput,
        config: &PlotConfig,
        excluded: &HashSet<String>,
    ) -> Result<Self, SourceError> {
        let figures = match input {
            SourceInput::Buffer(text) => match kind {
                SourceKind::StdinCsv => vec![stdin::open(text)?],
                other => {
                    return Err(SourceError::Processing(format!(
                        "{other} sources cannot read buffered input"
                    )))
                }
            },
            SourceInput::Path(path) => discover(kind, path)?,
        };
        debug!(%kind, figures = figures.len(), "opened data source");

        Ok(Self {
            kind,
            figures,
            x_axis: config.x_axis.clone(),
            consolidate: config.consolidate,
            whitelist: config.whitelist.clone(),
            blacklist: config.blacklist.clone(),
            excluded: excluded.clone(),
        })
    }

    /// Variant of this source.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Number of Figures.
    pub fn len(&self) -> usize {
        self.figures.len()
    }

    /// Whether there are no Figures.
    pub fn is_empty(&self) -> bool {
        self.figures.is_empty()
    }

    /// Figure `index`, refreshed before it is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or the refresh fails.
    pub fn figure(&mut self, index: usize) -> Result<&mut dyn Figure, SourceError> {
        let count = self.figures.len();
        let figure = self.figures.get_mut(index).ok_or_else(|| {
            SourceError::Processing(format!("figure {index} out of range ({count} figures)"))
        })?;
        figure.refresh()?;
        Ok(figure.as_mut())
    }

    /// Filtered names of every Figure, concatenated in Figure order.
    pub fn all_scalar_names(&self) -> Vec<String> {
        self.figures
            .iter()
            .flat_map(|figure| {
                filter_names(
                    figure.scalar_names(),
                    &self.whitelist,
                    &self.blacklist,
                    &self.excluded,
                )
            })
            .collect()
    }

    /// Filtered names grouped into subplot rows.
    pub fn consolidated_stats(&self) -> ConsolidatedStats {
        ConsolidatedStats::build(
            self.all_scalar_names(),
            self.consolidate,
            self.x_axis.as_str(),
        )
    }
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

pub(crate) fn is_event_file(path: &Path) -> bool {
    file_name(path).starts_with("events.out.")
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}

/// Sorted immediate entries of `dir` matching `keep`.
pub(crate) fn list_sorted(
    dir: &Path,
    keep: impl Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>, SourceError> {
    let entries = std::fs::read_dir(dir).map_err(|e| SourceError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| SourceError::io(dir, e))?.path();
        if keep(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn discover(kind: SourceKind, path: &Path) -> Result<Vec<Box<dyn Figure>>, SourceError> {
    let missing = || SourceError::Missing {
        kind,
        path: path.to_path_buf(),
    };
    if !path.exists() {
        return Err(missing());
    }

    let figures: Vec<Box<dyn Figure>> = match kind {
        SourceKind::Tensorboard => {
            if path.is_file() {
                if !is_event_file(path) {
                    return Err(missing());
                }
                vec![tensorboard::open(path)?]
            } else if !list_sorted(path, |p| p.is_file() && is_event_file(p))?.is_empty() {
                vec![tensorboard::open(path)?]
            } else {
                let mut figures = Vec::new();
                for dir in list_sorted(path, Path::is_dir)? {
                    if !list_sorted(&dir, |p| p.is_file() && is_event_file(p))?.is_empty() {
                        figures.push(tensorboard::open(&dir)?);
                    }
                }
                figures
            }
        }
        SourceKind::Csv => {
            if path.is_file() {
                if is_event_file(path) {
                    return Err(missing());
                }
                vec![csv::open(path)?]
            } else {
                list_sorted(path, |p| p.is_file() && has_extension(p, &["csv", "tsv"]))?
                    .iter()
                    .map(|p| csv::open(p))
                    .collect::<Result<_, _>>()?
            }
        }
        SourceKind::Jsonl => {
            if path.is_file() {
                vec![jsonl::open(path)?]
            } else {
                list_sorted(path, |p| p.is_file() && has_extension(p, &["jsonl", "json"]))?
                    .iter()
                    .map(|p| jsonl::open(p))
                    .collect::<Result<_, _>>()?
            }
        }
        SourceKind::StdinCsv => {
            if !path.is_file() {
                return Err(missing());
            }
            vec![csv::open(path)?]
        }
    };

    if figures.is_empty() {
        return Err(missing());
    }
    Ok(figures)
}
