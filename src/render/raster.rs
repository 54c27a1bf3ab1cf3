//! Raster backend: plotters draws into an RGB buffer, `image` encodes it as PNG.
//!
//! Text needs a TrueType font. One is looked up once per process from
//! `TERMPLOT_FONT` or a list of common system locations and registered with
//! plotters; without one, charts are drawn without any text.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use tracing::{debug, info, warn};

use crate::config::{BackendKind, PlotConfig, PlotOption, PlotSize};

use super::color::{tableau_palette, PlotColor};
use super::scene::{Scene, Subplot, TraceStyle};
use super::{check_capabilities, Plotter, RenderError};

/// Options the raster backend cannot honor.
pub const UNSUPPORTED: [PlotOption; 2] = [PlotOption::TerminalWidth, PlotOption::TerminalHeight];

/// Pixel size of one cell when `--plotsize` is not given.
pub const DEFAULT_CELL_SIZE: PlotSize = PlotSize {
    width: 640,
    height: 360,
};

/// Family name fonts are registered under.
const FONT_FAMILY: &str = "sans-serif";

const FONT_CANDIDATES: [&str; 8] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static FONT: OnceLock<Option<&'static str>> = OnceLock::new();

fn try_register(path: &Path) -> bool {
    let Ok(bytes) = std::fs::read(path) else {
        return false;
    };
    // plotters keeps registered fonts for the life of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
        Ok(()) => {
            debug!(path = %path.display(), "registered raster font");
            true
        }
        Err(_) => false,
    }
}

/// Family name to draw text with, if a font could be registered.
fn text_font() -> Option<&'static str> {
    *FONT.get_or_init(|| {
        let explicit = std::env::var_os("TERMPLOT_FONT").map(PathBuf::from);
        let found = explicit
            .iter()
            .map(PathBuf::as_path)
            .chain(FONT_CANDIDATES.iter().map(Path::new))
            .any(try_register);
        if found {
            Some(FONT_FAMILY)
        } else {
            warn!("no TrueType font found; raster plots will have no text (set TERMPLOT_FONT)");
            None
        }
    })
}

fn draw_err(e: impl std::fmt::Display) -> RenderError {
    RenderError::Draw(e.to_string())
}

fn rgb(color: PlotColor) -> RGBColor {
    let (r, g, b) = color.rgb();
    RGBColor(r, g, b)
}

fn themed(color: Option<PlotColor>, fallback: PlotColor, colorless: bool) -> RGBColor {
    if colorless {
        rgb(fallback)
    } else {
        rgb(color.unwrap_or(fallback))
    }
}

fn draw_subplot(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    subplot: &Subplot,
    bottom_row: bool,
    font: Option<&str>,
) -> Result<(), RenderError> {
    let prepared = subplot.prepare();
    let colorless = subplot.colorless;
    let axes = themed(subplot.axes_color, PlotColor::White, colorless);
    let canvas = themed(subplot.canvas_color, PlotColor::White, colorless);
    let ticks = themed(subplot.ticks_color, PlotColor::Black, colorless);

    area.fill(&axes).map_err(draw_err)?;

    let mut builder = ChartBuilder::on(area);
    builder.margin(10);
    match font {
        Some(family) => {
            builder.x_label_area_size(35).y_label_area_size(60);
            if let Some(title) = &subplot.title {
                builder.caption(title, (family, 16.0).into_font().color(&ticks));
            }
        }
        None => {
            builder.x_label_area_size(0).y_label_area_size(0);
        }
    }
    let mut chart = builder
        .build_cartesian_2d(prepared.x.min..prepared.x.max, prepared.y.min..prepared.y.max)
        .map_err(draw_err)?;
    chart.plotting_area().fill(&canvas).map_err(draw_err)?;

    let x_format = |v: &f64| prepared.x.label(*v);
    let y_format = |v: &f64| prepared.y.label(*v);
    let mut mesh = chart.configure_mesh();
    mesh.axis_style(ticks.stroke_width(1));
    if subplot.grid {
        mesh.bold_line_style(ticks.mix(0.3).stroke_width(1))
            .light_line_style(ticks.mix(0.1).stroke_width(1));
    } else {
        mesh.disable_mesh();
    }
    match font {
        Some(family) => {
            mesh.x_labels(6)
                .y_labels(6)
                .x_label_formatter(&x_format)
                .y_label_formatter(&y_format)
                .label_style((family, 12.0).into_font().color(&ticks))
                .axis_desc_style((family, 13.0).into_font().color(&ticks))
                .y_desc(subplot.y_label.as_str());
            if bottom_row {
                mesh.x_desc(subplot.x_label.as_str());
            }
        }
        None => {
            mesh.x_labels(0).y_labels(0);
        }
    }
    mesh.draw().map_err(draw_err)?;

    let show_legend = subplot.legend && font.is_some() && subplot.has_labels();
    for trace in &prepared.traces {
        let color = if colorless { BLACK } else { rgb(trace.color) };
        let anno = match trace.style {
            TraceStyle::Line => chart
                .draw_series(LineSeries::new(
                    trace.points.iter().copied(),
                    color.stroke_width(2),
                ))
                .map_err(draw_err)?,
            TraceStyle::Scatter => chart
                .draw_series(
                    trace
                        .points
                        .iter()
                        .map(|p| Circle::new(*p, 3, color.filled())),
                )
                .map_err(draw_err)?,
        };
        if let (true, Some(label)) = (show_legend, &trace.label) {
            anno.label(label.as_str()).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x.saturating_add(20), y)], color.stroke_width(2))
            });
        }
    }

    if show_legend {
        if let Some(family) = font {
            chart
                .configure_series_labels()
                .background_style(canvas.mix(0.8))
                .border_style(ticks)
                .label_font((family, 12.0).into_font().color(&ticks))
                .draw()
                .map_err(draw_err)?;
        }
    }
    Ok(())
}

/// Render `scene` to PNG bytes with cells of `cell` pixels.
///
/// # Errors
///
/// Returns [`RenderError::Draw`] if drawing or encoding fails.
pub fn render_png(scene: &Scene, cell: PlotSize) -> Result<Vec<u8>, RenderError> {
    let count = |n: usize| u32::try_from(n.max(1)).unwrap_or(u32::MAX);
    let width = cell.width.saturating_mul(count(scene.cols()));
    let height = cell.height.saturating_mul(count(scene.rows()));
    let len = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|n| n.checked_mul(3))
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| RenderError::Draw(format!("image of {width}x{height} is too large")))?;

    let mut pixels = vec![0u8; len];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        if !scene.is_empty() {
            let font = text_font();
            let areas = root.split_evenly((scene.rows(), scene.cols()));
            for (area, (row, _, subplot)) in areas.iter().zip(scene.cells()) {
                draw_subplot(area, subplot, row == scene.rows(), font)?;
            }
        }
        root.present().map_err(draw_err)?;
    }

    let image = RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| RenderError::Draw("pixel buffer does not match image size".into()))?;
    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, ImageFormat::Png)
        .map_err(draw_err)?;
    Ok(png.into_inner())
}

/// PNG written to `--output` or, with `--as-raw-bytes`, to stdout.
#[derive(Debug)]
pub struct RasterPlotter {
    scene: Scene,
    output: PathBuf,
    cell: PlotSize,
}

impl RasterPlotter {
    /// Create the backend.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnsupportedOption`] for terminal size overrides.
    pub fn new(config: &PlotConfig) -> Result<Self, RenderError> {
        check_capabilities(BackendKind::Raster, &UNSUPPORTED, config)?;
        Ok(Self::unchecked(config))
    }

    /// Create without capability checks; the caller has done its own.
    pub(crate) fn unchecked(config: &PlotConfig) -> Self {
        Self {
            scene: Scene::default(),
            output: config
                .output
                .clone()
                .unwrap_or_else(|| std::env::temp_dir().join("termplot.png")),
            cell: config.plotsize.unwrap_or(DEFAULT_CELL_SIZE),
        }
    }

    /// File written by [`Plotter::show`].
    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Encode the current scene.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Draw`] if drawing or encoding fails.
    pub fn render_png(&self) -> Result<Vec<u8>, RenderError> {
        render_png(&self.scene, self.cell)
    }
}

impl Plotter for RasterPlotter {
    fn kind(&self) -> BackendKind {
        BackendKind::Raster
    }

    fn scene(&self) -> &Scene {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Colorless output still cycles the full palette; traces are drawn black.
    fn palette(&self) -> Vec<PlotColor> {
        tableau_palette()
    }

    fn clear_terminal_printed_lines(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    fn show(&mut self) -> Result<(), RenderError> {
        let png = self.render_png()?;
        std::fs::write(&self.output, png)?;
        info!(path = %self.output.display(), "wrote plot");
        Ok(())
    }

    fn write_image(&mut self, out: &mut dyn Write) -> Result<(), RenderError> {
        let png = self.render_png()?;
        out.write_all(&png)?;
        out.flush()?;
        Ok(())
    }
}
