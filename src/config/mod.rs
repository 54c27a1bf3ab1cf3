//! Plot configuration.
//!
//! [`PlotConfig`] is built once at startup (see [`crate::cli::Cli::into_config`])
//! and passed by reference into every component constructor. Nothing reads
//! ambient or global configuration.
//!
//! The optional TOML defaults file lives in [`file`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::render::color::PlotColor;
use crate::source::SourceKind;

pub mod file;

/// Errors produced while parsing option values or building the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A `ROW,COL` cell could not be parsed.
    #[error("invalid subplot cell '{0}': expected ROW,COL (e.g. 1,2)")]
    InvalidCell(String),
    /// A `MIN,MAX` pair could not be parsed.
    #[error("invalid range '{0}': expected MIN,MAX (e.g. 30.0,2.2)")]
    InvalidRange(String),
    /// A `[ROW,COL=]MIN,MAX` limit could not be parsed.
    #[error("invalid limit '{0}': expected ROW,COL=MIN,MAX or MIN,MAX")]
    InvalidLimit(String),
    /// A `WIDTH,HEIGHT` size could not be parsed.
    #[error("invalid size '{0}': expected WIDTH,HEIGHT (e.g. 50,20)")]
    InvalidSize(String),
    /// A color name or hex code was not recognised.
    #[error("invalid color '{0}': expected a color name or #rrggbb")]
    InvalidColor(String),
    /// The smoothing factor was outside `[0, 1]`.
    #[error("invalid smoothing factor '{0}': expected a value from 0 to 1")]
    InvalidFactor(String),
    /// The refresh interval was negative or not finite.
    #[error("invalid interval '{0}': expected a non-negative number of seconds")]
    InvalidInterval(String),
}

// ---------------------------------------------------------------------------
// Backend selection
// ---------------------------------------------------------------------------

/// Rendering backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Braille text grid printed to the terminal.
    #[default]
    Text,
    /// PNG image written to a file or to stdout.
    Raster,
    /// PNG image piped into a terminal image viewer (`timg`, `kitty icat`).
    RasterTerminal,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Raster => "raster",
            Self::RasterTerminal => "raster-terminal",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// X axis
// ---------------------------------------------------------------------------

/// Which values to use for the x-axis.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum XAxisKind {
    /// Sample index, or the recorded step for event logs.
    #[default]
    Step,
    /// Wall time relative to the first sample (event logs only).
    Time,
    /// A named column of a tabular source.
    Column(String),
}

impl XAxisKind {
    /// Series name this selector occupies; it is never plotted as a y series.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Step => "step",
            Self::Time => "time",
            Self::Column(name) => name,
        }
    }
}

impl FromStr for XAxisKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "step" | "index" => Self::Step,
            "time" => Self::Time,
            other => Self::Column(other.to_owned()),
        })
    }
}

impl fmt::Display for XAxisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Subplot targeting
// ---------------------------------------------------------------------------

/// A 1-based `(row, col)` subplot position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Row, starting at 1.
    pub row: usize,
    /// Column, starting at 1.
    pub col: usize,
}

impl Cell {
    /// Create a cell.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Parse `a,b` into two floats.
fn parse_pair(s: &str) -> Option<(f64, f64)> {
    let (a, b) = s.split_once(',')?;
    if b.contains(',') {
        return None;
    }
    let a = a.trim().parse::<f64>().ok()?;
    let b = b.trim().parse::<f64>().ok()?;
    Some((a, b))
}

/// Convert a float parsed from the command line into a non-negative integer.
fn to_index(value: f64) -> Option<usize> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // checked above
    Some(value as usize)
}

impl FromStr for Cell {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidCell(s.to_owned());
        let (row, col) = parse_pair(s).ok_or_else(invalid)?;
        let row = to_index(row).ok_or_else(invalid)?;
        let col = to_index(col).ok_or_else(invalid)?;
        Ok(Self { row, col })
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

/// Which subplots a scale option applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CellSelection {
    /// Option omitted: applies nowhere.
    #[default]
    None,
    /// Option given without cells: applies to every subplot.
    All,
    /// Option given with cells: applies to those subplots only.
    Cells(Vec<Cell>),
}

impl CellSelection {
    /// Build from the command-line form (`None` = omitted, empty = wildcard).
    pub fn from_arg(arg: Option<Vec<Cell>>) -> Self {
        match arg {
            None => Self::None,
            Some(cells) if cells.is_empty() => Self::All,
            Some(cells) => Self::Cells(cells),
        }
    }

    /// Whether the option applies to the subplot at `(row, col)`.
    pub fn matches(&self, row: usize, col: usize) -> bool {
        match self {
            Self::None => false,
            Self::All => true,
            Self::Cells(cells) => cells.contains(&Cell { row, col }),
        }
    }

    /// Whether the option was given at all.
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// An axis range `min..max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl FromStr for AxisRange {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, max) = parse_pair(s).ok_or_else(|| ConfigError::InvalidRange(s.to_owned()))?;
        Ok(Self { min, max })
    }
}

/// An axis limit override, optionally scoped to one subplot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitDirective {
    /// Target subplot; `None` is the default applied to unmatched subplots.
    pub cell: Option<Cell>,
    /// The limits to apply.
    pub range: AxisRange,
}

impl FromStr for LimitDirective {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidLimit(s.to_owned());
        match s.split_once('=') {
            None => Ok(Self {
                cell: None,
                range: s.parse().map_err(|_| invalid())?,
            }),
            Some((cell, range)) => {
                if range.contains('=') {
                    return Err(invalid());
                }
                Ok(Self {
                    cell: Some(cell.parse().map_err(|_| invalid())?),
                    range: range.parse().map_err(|_| invalid())?,
                })
            }
        }
    }
}

/// Pick the limit for a subplot: an exact cell match wins, then the default entry.
pub fn resolve_limit(directives: &[LimitDirective], row: usize, col: usize) -> Option<AxisRange> {
    let target = Some(Cell { row, col });
    directives
        .iter()
        .find(|d| d.cell == target)
        .or_else(|| directives.iter().find(|d| d.cell.is_none()))
        .map(|d| d.range)
}

/// Fixed size of each subplot (characters for text, pixels for raster).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotSize {
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl FromStr for PlotSize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidSize(s.to_owned());
        let (w, h) = parse_pair(s).ok_or_else(invalid)?;
        let width = to_index(w).and_then(|v| u32::try_from(v).ok());
        let height = to_index(h).and_then(|v| u32::try_from(v).ok());
        match (width, height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => Ok(Self { width, height }),
            _ => Err(invalid()),
        }
    }
}

/// Parse a smoothing factor in `[0, 1]`.
pub fn parse_smoothing_factor(s: &str) -> Result<f64, ConfigError> {
    let factor: f64 = s
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidFactor(s.to_owned()))?;
    if (0.0..=1.0).contains(&factor) {
        Ok(factor)
    } else {
        Err(ConfigError::InvalidFactor(s.to_owned()))
    }
}

/// Parse a refresh interval in seconds.
pub fn parse_interval(secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidInterval(secs.to_string()))
}

// ---------------------------------------------------------------------------
// Capability negotiation
// ---------------------------------------------------------------------------

/// Options a backend may be unable to honor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotOption {
    /// `--xsymlog`
    XSymlog,
    /// `--ysymlog`
    YSymlog,
    /// `--as-raw-bytes`
    AsRawBytes,
    /// `--output`
    Output,
    /// `--terminal-width`
    TerminalWidth,
    /// `--terminal-height`
    TerminalHeight,
}

impl PlotOption {
    /// The command-line flag for this option.
    pub fn flag(self) -> &'static str {
        match self {
            Self::XSymlog => "--xsymlog",
            Self::YSymlog => "--ysymlog",
            Self::AsRawBytes => "--as-raw-bytes",
            Self::Output => "--output",
            Self::TerminalWidth => "--terminal-width",
            Self::TerminalHeight => "--terminal-height",
        }
    }
}

impl fmt::Display for PlotOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

// ---------------------------------------------------------------------------
// PlotConfig
// ---------------------------------------------------------------------------

/// Immutable configuration snapshot for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    /// Source folder or file; `None` reads CSV from stdin.
    pub target: Option<PathBuf>,
    /// Rendering backend.
    pub backend: BackendKind,
    /// Data source variant; `None` auto-detects.
    pub data_source: Option<SourceKind>,
    /// Always plot the most recently modified subdirectory of `target`.
    pub latest: bool,
    /// Keep redrawing as the input changes.
    pub follow: bool,
    /// Pause between redraws.
    pub interval: Duration,
    /// Fixed size of each subplot.
    pub plotsize: Option<PlotSize>,
    /// Consolidation level: 0 none, 1 by prefix, 2+ everything in one subplot.
    pub consolidate: u8,
    /// Draw points instead of lines.
    pub as_scatter: bool,
    /// Background of the plotting area.
    pub canvas_color: Option<PlotColor>,
    /// Background of the axes, labels and title.
    pub axes_color: Option<PlotColor>,
    /// Color of ticks, tick labels and grid lines.
    pub ticks_color: Option<PlotColor>,
    /// Draw grid lines.
    pub grid: bool,
    /// Strip all colors.
    pub colorless: bool,
    /// Use a fixed, non-repeating color sequence per subplot.
    pub no_iter_color: bool,
    /// Label series even when each subplot has only one.
    pub force_label: bool,
    /// Keep only series containing one of these keywords.
    pub whitelist: Vec<String>,
    /// Drop series containing one of these keywords.
    pub blacklist: Vec<String>,
    /// X-axis selector.
    pub x_axis: XAxisKind,
    /// Subplots with a logarithmic x-axis.
    pub xlog: CellSelection,
    /// Subplots with a logarithmic y-axis.
    pub ylog: CellSelection,
    /// Subplots with a symmetric-log x-axis.
    pub xsymlog: CellSelection,
    /// Subplots with a symmetric-log y-axis.
    pub ysymlog: CellSelection,
    /// X-axis limit overrides.
    pub xlim: Vec<LimitDirective>,
    /// Y-axis limit overrides.
    pub ylim: Vec<LimitDirective>,
    /// Write PNG bytes to stdout instead of displaying.
    pub as_raw_bytes: bool,
    /// PNG file written by the raster backend.
    pub output: Option<PathBuf>,
    /// Savitzky–Golay smoothing factor.
    pub smooth: Option<f64>,
    /// Polynomial order for smoothing.
    pub smooth_poly_order: usize,
    /// Override the terminal width.
    pub terminal_width: Option<u16>,
    /// Override the terminal height.
    pub terminal_height: Option<u16>,
    /// Verbose logging.
    pub debug: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            target: None,
            backend: BackendKind::Text,
            data_source: None,
            latest: false,
            follow: false,
            interval: Duration::from_secs(5),
            plotsize: None,
            consolidate: 0,
            as_scatter: false,
            canvas_color: None,
            axes_color: None,
            ticks_color: None,
            grid: false,
            colorless: false,
            no_iter_color: false,
            force_label: false,
            whitelist: Vec::new(),
            blacklist: Vec::new(),
            x_axis: XAxisKind::Step,
            xlog: CellSelection::None,
            ylog: CellSelection::None,
            xsymlog: CellSelection::None,
            ysymlog: CellSelection::None,
            xlim: Vec::new(),
            ylim: Vec::new(),
            as_raw_bytes: false,
            output: None,
            smooth: None,
            smooth_poly_order: 3,
            terminal_width: None,
            terminal_height: None,
            debug: false,
        }
    }
}

impl PlotConfig {
    /// Whether `option` carries a non-default value.
    pub fn is_set(&self, option: PlotOption) -> bool {
        match option {
            PlotOption::XSymlog => self.xsymlog.is_set(),
            PlotOption::YSymlog => self.ysymlog.is_set(),
            PlotOption::AsRawBytes => self.as_raw_bytes,
            PlotOption::Output => self.output.is_some(),
            PlotOption::TerminalWidth => self.terminal_width.is_some(),
            PlotOption::TerminalHeight => self.terminal_height.is_some(),
        }
    }

    /// Series get a legend label when consolidating or when forced.
    pub fn labels_series(&self) -> bool {
        self.consolidate > 0 || self.force_label
    }

    /// Title of the top subplot of a figure column.
    pub fn figure_title(&self, figure_title: &str) -> String {
        if self.follow {
            format!(
                "'{figure_title}' [refresh every {}s]",
                self.interval.as_secs_f64()
            )
        } else {
            format!("'{figure_title}'")
        }
    }
}
