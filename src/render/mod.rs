//! Rendering backends.
//!
//! Every backend implements [`Plotter`]. The provided trait methods record
//! the per-cycle drawing calls into a backend-neutral [`Scene`]; backends
//! only decide how a finished scene reaches its sink:
//!
//! - [`text::TextPlotter`]: braille charts printed to the terminal
//! - [`raster::RasterPlotter`]: PNG written to a file or stdout
//! - [`viewer::RasterTerminalPlotter`]: PNG piped into a terminal image viewer
//!
//! Backends reject options they cannot honor when they are constructed.

use std::io::Write;

use crate::config::{resolve_limit, BackendKind, PlotConfig, PlotOption};
use crate::source::Series;

pub mod color;
pub mod raster;
pub mod scale;
pub mod scene;
pub mod text;
pub mod viewer;

use color::{ColorCycle, PlotColor};
use scale::Scale;
pub use scene::{Scene, Subplot, Trace, TraceStyle};

/// Rendering failures.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Invalid use of the subplot grid.
    #[error("plotting error: {0}")]
    Plotting(String),

    /// The backend cannot honor an option that was set.
    #[error("the {backend} backend does not support {option}")]
    UnsupportedOption {
        /// Backend being constructed.
        backend: BackendKind,
        /// Offending option.
        option: PlotOption,
    },

    /// No terminal image viewer is installed.
    #[error("no terminal image viewer found; install timg or kitty")]
    ViewerUnavailable,

    /// The drawing library or image encoder failed.
    #[error("drawing failed: {0}")]
    Draw(String),

    /// Writing to the sink failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fail if any option in `unsupported` is set in `config`.
pub fn check_capabilities(
    backend: BackendKind,
    unsupported: &[PlotOption],
    config: &PlotConfig,
) -> Result<(), RenderError> {
    match unsupported.iter().find(|option| config.is_set(**option)) {
        Some(option) => Err(RenderError::UnsupportedOption {
            backend,
            option: *option,
        }),
        None => Ok(()),
    }
}

/// Build the backend selected in `config`.
///
/// # Errors
///
/// Returns [`RenderError::UnsupportedOption`] or [`RenderError::ViewerUnavailable`]
/// when the backend cannot serve this configuration.
pub fn create_plotter(config: &PlotConfig) -> Result<Box<dyn Plotter>, RenderError> {
    Ok(match config.backend {
        BackendKind::Text => Box::new(text::TextPlotter::new(config)?),
        BackendKind::Raster => Box::new(raster::RasterPlotter::new(config)?),
        BackendKind::RasterTerminal => Box::new(viewer::RasterTerminalPlotter::new(config)?),
    })
}

/// A rendering backend driven through a fixed per-cycle lifecycle:
///
/// 1. [`clear_current_figure`](Self::clear_current_figure)
/// 2. [`create_subplot`](Self::create_subplot)
/// 3. per cell: [`target_subplot`](Self::target_subplot), [`set_title`](Self::set_title),
///    [`plot`](Self::plot) / [`scatter`](Self::scatter), [`post_setup`](Self::post_setup)
/// 4. [`clear_terminal_printed_lines`](Self::clear_terminal_printed_lines) then
///    [`show`](Self::show), or [`write_image`](Self::write_image) alone for raw bytes
/// 5. [`close`](Self::close)
pub trait Plotter {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;

    /// Recorded drawing state.
    fn scene(&self) -> &Scene;

    /// Mutable drawing state.
    fn scene_mut(&mut self) -> &mut Scene;

    /// Series colors, in order.
    fn palette(&self) -> Vec<PlotColor>;

    /// Remove the previous frame from the terminal, if this backend draws there.
    fn clear_terminal_printed_lines(&mut self) -> Result<(), RenderError>;

    /// Emit the scene to the backend's sink.
    fn show(&mut self) -> Result<(), RenderError>;

    /// Write the scene as PNG bytes.
    fn write_image(&mut self, out: &mut dyn Write) -> Result<(), RenderError>;

    /// Release the scene.
    fn close(&mut self) {
        self.scene_mut().clear();
    }

    /// Start a new frame.
    fn clear_current_figure(&mut self) {
        self.scene_mut().clear();
    }

    /// Lay out a `rows × cols` grid.
    fn create_subplot(&mut self, rows: usize, cols: usize) -> Result<(), RenderError> {
        self.scene_mut().create_grid(rows, cols)
    }

    /// Select the 1-based cell that later calls draw into.
    fn target_subplot(&mut self, row: usize, col: usize) -> Result<(), RenderError> {
        self.scene_mut().target(row, col)
    }

    /// Title of the current cell.
    fn set_title(&mut self, title: &str) -> Result<(), RenderError> {
        self.scene_mut().current_mut()?.title = Some(title.to_owned());
        Ok(())
    }

    /// Draw a line in the current cell.
    fn plot(
        &mut self,
        series: &Series,
        label: Option<&str>,
        color: PlotColor,
    ) -> Result<(), RenderError> {
        let trace = Trace::new(series, label, color, TraceStyle::Line);
        self.scene_mut().current_mut()?.traces.push(trace);
        Ok(())
    }

    /// Draw points in the current cell.
    fn scatter(
        &mut self,
        series: &Series,
        label: Option<&str>,
        color: PlotColor,
    ) -> Result<(), RenderError> {
        let trace = Trace::new(series, label, color, TraceStyle::Scatter);
        self.scene_mut().current_mut()?.traces.push(trace);
        Ok(())
    }

    /// Apply labels, colors, grid, legend, scales and limits to the current cell.
    fn post_setup(
        &mut self,
        config: &PlotConfig,
        x_label: &str,
        y_label: &str,
        row: usize,
        col: usize,
    ) -> Result<(), RenderError> {
        let (x_scale, y_scale) = Scale::for_cell(config, row, col);
        let subplot = self.scene_mut().current_mut()?;
        subplot.x_label = x_label.to_owned();
        subplot.y_label = y_label.to_owned();
        subplot.canvas_color = config.canvas_color;
        subplot.axes_color = config.axes_color;
        subplot.ticks_color = config.ticks_color;
        subplot.grid = config.grid;
        subplot.colorless = config.colorless;
        subplot.legend = config.labels_series();
        subplot.x_scale = x_scale;
        subplot.y_scale = y_scale;
        subplot.x_limits = resolve_limit(&config.xlim, row, col);
        subplot.y_limits = resolve_limit(&config.ylim, row, col);
        Ok(())
    }

    /// A fresh color sequence for one cell.
    fn colors(&self, no_iter_color: bool) -> ColorCycle {
        if no_iter_color {
            ColorCycle::fixed(self.palette())
        } else {
            ColorCycle::cycling(self.palette())
        }
    }
}

/// Clear the terminal and move the cursor home.
pub(crate) fn clear_terminal(out: &mut impl Write) -> Result<(), RenderError> {
    crossterm::execute!(
        out,
        crossterm::terminal::Clear(crossterm::terminal::ClearType::All),
        crossterm::cursor::MoveTo(0, 0)
    )?;
    Ok(())
}
