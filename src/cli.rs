//! Command-line surface.
//!
//! [`Cli`] is parsed once by the binary and turned into an immutable
//! [`PlotConfig`] with [`Cli::into_config`], layered over the optional TOML
//! defaults file.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::config::file::FileDefaults;
use crate::config::{
    parse_interval, parse_smoothing_factor, BackendKind, Cell, CellSelection, ConfigError,
    LimitDirective, PlotConfig, PlotSize, XAxisKind,
};
use crate::render::color::PlotColor;
use crate::source::SourceKind;

/// Data source choice on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DataSourceArg {
    /// Try csv, tensorboard, then jsonl (jsonl first for `.json`/`.jsonl` paths).
    #[default]
    Auto,
    /// TensorBoard event-log folders.
    Tensorboard,
    /// CSV or TSV files.
    Csv,
    /// JSON-lines files.
    Jsonl,
    /// CSV streamed on stdin.
    StdinCsv,
}

impl DataSourceArg {
    fn kind(self) -> Option<SourceKind> {
        match self {
            Self::Auto => None,
            Self::Tensorboard => Some(SourceKind::Tensorboard),
            Self::Csv => Some(SourceKind::Csv),
            Self::Jsonl => Some(SourceKind::Jsonl),
            Self::StdinCsv => Some(SourceKind::StdinCsv),
        }
    }
}

/// termplot: plot scalar metrics from event logs, CSV and JSON-lines files in the terminal.
#[derive(Debug, Parser)]
#[command(name = "termplot", version, about)]
pub struct Cli {
    /// Event-log folder, CSV/JSONL file or folder. Reads CSV from stdin when omitted.
    pub folder: Option<PathBuf>,

    /// Rendering backend.
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Shorthand for `--backend raster`.
    #[arg(short = 'r', long)]
    pub raster: bool,

    /// Data source type.
    #[arg(long, value_enum, default_value_t = DataSourceArg::Auto)]
    pub data_source: DataSourceArg,

    /// Shorthand for `--data-source csv`.
    #[arg(long)]
    pub csv: bool,

    /// Plot the most recently modified subdirectory of FOLDER.
    #[arg(short, long)]
    pub latest: bool,

    /// Fixed size of each subplot as WIDTH,HEIGHT.
    #[arg(long, value_name = "W,H")]
    pub plotsize: Option<PlotSize>,

    /// Consolidate series by prefix (-c) or into a single subplot (-cc).
    #[arg(short = 'c', long, action = ArgAction::Count)]
    pub consolidate: u8,

    /// Draw points instead of lines.
    #[arg(long)]
    pub as_scatter: bool,

    /// Background color of the plotting area.
    #[arg(long)]
    pub canvas_color: Option<PlotColor>,

    /// Background color of the axes, labels and title.
    #[arg(long)]
    pub axes_color: Option<PlotColor>,

    /// Color of ticks, tick labels and grid lines.
    #[arg(long)]
    pub ticks_color: Option<PlotColor>,

    /// Draw grid lines.
    #[arg(long)]
    pub grid: bool,

    /// Strip all colors.
    #[arg(long)]
    pub colorless: bool,

    /// Black canvas and axes, white ticks (explicit colors still win).
    #[arg(short, long)]
    pub dark_theme: bool,

    /// Use a fixed color sequence per subplot instead of cycling.
    #[arg(long)]
    pub no_iter_color: bool,

    /// Label series even without consolidation.
    #[arg(long)]
    pub force_label: bool,

    /// Keep redrawing as the input changes.
    #[arg(short, long)]
    pub follow: bool,

    /// Seconds between redraws when following.
    #[arg(short = 'n', long, value_name = "SECS")]
    pub interval: Option<f64>,

    /// Only plot series containing one of these keywords.
    #[arg(short, long, num_args = 1.., value_name = "KW")]
    pub whitelist: Vec<String>,

    /// Skip series containing one of these keywords.
    #[arg(short, long, num_args = 1.., value_name = "KW")]
    pub blacklist: Vec<String>,

    /// X-axis: `step` (or `index`), `time`, or a column name.
    #[arg(short = 'x', long, default_value = "step")]
    pub xaxis_type: String,

    /// Logarithmic x-axis, for all subplots or the given ROW,COL cells.
    #[arg(long, num_args = 0.., value_name = "ROW,COL")]
    pub xlog: Option<Vec<Cell>>,

    /// Logarithmic y-axis, for all subplots or the given ROW,COL cells.
    #[arg(long, num_args = 0.., value_name = "ROW,COL")]
    pub ylog: Option<Vec<Cell>>,

    /// Symmetric-log x-axis, for all subplots or the given ROW,COL cells.
    #[arg(long, num_args = 0.., value_name = "ROW,COL")]
    pub xsymlog: Option<Vec<Cell>>,

    /// Symmetric-log y-axis, for all subplots or the given ROW,COL cells.
    #[arg(long, num_args = 0.., value_name = "ROW,COL")]
    pub ysymlog: Option<Vec<Cell>>,

    /// X-axis limits as `[ROW,COL=]MIN,MAX`.
    #[arg(long, num_args = 1.., value_name = "[ROW,COL=]MIN,MAX")]
    pub xlim: Vec<LimitDirective>,

    /// Y-axis limits as `[ROW,COL=]MIN,MAX`.
    #[arg(long, num_args = 1.., value_name = "[ROW,COL=]MIN,MAX")]
    pub ylim: Vec<LimitDirective>,

    /// Write PNG bytes to stdout instead of displaying.
    #[arg(long)]
    pub as_raw_bytes: bool,

    /// PNG file written by the raster backend.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Savitzky–Golay smoothing factor in [0, 1].
    #[arg(
        short,
        long,
        num_args = 0..=1,
        default_missing_value = "0.05",
        value_parser = parse_smoothing_factor,
    )]
    pub smooth: Option<f64>,

    /// Polynomial order used for smoothing.
    #[arg(long, default_value_t = 3)]
    pub smooth_poly_order: usize,

    /// Override the terminal width.
    #[arg(long)]
    pub terminal_width: Option<u16>,

    /// Override the terminal height.
    #[arg(long)]
    pub terminal_height: Option<u16>,

    /// Defaults file (TOML).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Also write JSON logs to this directory.
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Verbose logging.
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Log directory from the command line, else from the defaults file.
    pub fn log_dir(&self, file: &FileDefaults) -> Option<PathBuf> {
        self.log_dir.clone().or_else(|| file.logging.log_dir.clone())
    }

    /// Build the run configuration, filling gaps from `file`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a value from the defaults file is invalid.
    pub fn into_config(self, file: &FileDefaults) -> Result<PlotConfig, ConfigError> {
        let display = &file.display;

        let backend = if self.raster {
            BackendKind::Raster
        } else {
            self.backend.or(display.backend).unwrap_or_default()
        };

        let data_source = if self.folder.is_none() {
            Some(SourceKind::StdinCsv)
        } else if self.csv {
            Some(SourceKind::Csv)
        } else {
            self.data_source.kind()
        };

        let file_color = |value: &Option<String>| -> Result<Option<PlotColor>, ConfigError> {
            value.as_deref().map(str::parse).transpose()
        };
        let mut canvas_color = self.canvas_color.or(file_color(&display.canvas_color)?);
        let mut axes_color = self.axes_color.or(file_color(&display.axes_color)?);
        let mut ticks_color = self.ticks_color.or(file_color(&display.ticks_color)?);
        if self.dark_theme || display.dark_theme {
            canvas_color = canvas_color.or(Some(PlotColor::Black));
            axes_color = axes_color.or(Some(PlotColor::Black));
            ticks_color = ticks_color.or(Some(PlotColor::White));
        }

        let interval = parse_interval(self.interval.unwrap_or(file.refresh.interval_secs))?;
        let x_axis = self
            .xaxis_type
            .parse::<XAxisKind>()
            .unwrap_or_else(|never| match never {});

        Ok(PlotConfig {
            target: self.folder,
            backend,
            data_source,
            latest: self.latest,
            follow: self.follow,
            interval,
            plotsize: self.plotsize,
            consolidate: self.consolidate,
            as_scatter: self.as_scatter,
            canvas_color,
            axes_color,
            ticks_color,
            grid: self.grid || display.grid,
            colorless: self.colorless || display.colorless,
            no_iter_color: self.no_iter_color,
            force_label: self.force_label,
            whitelist: self.whitelist,
            blacklist: self.blacklist,
            x_axis,
            xlog: CellSelection::from_arg(self.xlog),
            ylog: CellSelection::from_arg(self.ylog),
            xsymlog: CellSelection::from_arg(self.xsymlog),
            ysymlog: CellSelection::from_arg(self.ysymlog),
            xlim: self.xlim,
            ylim: self.ylim,
            as_raw_bytes: self.as_raw_bytes,
            output: self.output,
            smooth: self.smooth,
            smooth_poly_order: self.smooth_poly_order,
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
            debug: self.debug,
        })
    }
}
