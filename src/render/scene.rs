//! Backend-neutral drawing state.
//!
//! The provided [`super::Plotter`] methods record titles, traces and
//! cosmetics into a [`Scene`]; backends turn the scene into output when
//! shown. [`Subplot::prepare`] applies scales and limits once so every
//! backend sees identical coordinates.

use crate::config::AxisRange;
use crate::source::{Series, ValueKind};

use super::color::PlotColor;
use super::scale::{format_number, format_time, nice_ticks, Scale};
use super::RenderError;

/// How a trace is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceStyle {
    /// Connected line.
    Line,
    /// Unconnected points.
    Scatter,
}

/// One plotted series.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    /// X values.
    pub x: Vec<f64>,
    /// Y values.
    pub y: Vec<f64>,
    /// Whether x holds timestamps.
    pub x_temporal: bool,
    /// Whether y holds timestamps.
    pub y_temporal: bool,
    /// Legend label.
    pub label: Option<String>,
    /// Draw color.
    pub color: PlotColor,
    /// Line or scatter.
    pub style: TraceStyle,
}

impl Trace {
    /// Build a trace from a series.
    pub fn new(series: &Series, label: Option<&str>, color: PlotColor, style: TraceStyle) -> Self {
        Self {
            x: series.x.clone(),
            y: series.y.clone(),
            x_temporal: series.x_kind == ValueKind::Temporal,
            y_temporal: series.y_kind == ValueKind::Temporal,
            label: label.map(str::to_owned),
            color,
            style,
        }
    }
}

/// Drawing state of one grid cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subplot {
    /// Title shown above the cell.
    pub title: Option<String>,
    /// X-axis label.
    pub x_label: String,
    /// Y-axis label.
    pub y_label: String,
    /// Plotted series in draw order.
    pub traces: Vec<Trace>,
    /// X-axis scale.
    pub x_scale: Scale,
    /// Y-axis scale.
    pub y_scale: Scale,
    /// X-axis limits in data space.
    pub x_limits: Option<AxisRange>,
    /// Y-axis limits in data space.
    pub y_limits: Option<AxisRange>,
    /// Show a legend of labelled traces.
    pub legend: bool,
    /// Draw grid lines.
    pub grid: bool,
    /// Plot-area background.
    pub canvas_color: Option<PlotColor>,
    /// Background around the plot area.
    pub axes_color: Option<PlotColor>,
    /// Ticks, tick labels and grid color.
    pub ticks_color: Option<PlotColor>,
    /// Strip all colors.
    pub colorless: bool,
}

/// Cell grid with a cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    rows: usize,
    cols: usize,
    cursor: Option<usize>,
    cells: Vec<Subplot>,
}

impl Scene {
    /// Drop every cell and the grid.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Replace the grid with `rows × cols` empty cells.
    pub fn create_grid(&mut self, rows: usize, cols: usize) -> Result<(), RenderError> {
        let count = rows
            .checked_mul(cols)
            .filter(|count| *count > 0)
            .ok_or_else(|| {
                RenderError::Plotting(format!("cannot create a {rows}x{cols} subplot grid"))
            })?;
        self.rows = rows;
        self.cols = cols;
        self.cursor = None;
        self.cells = vec![Subplot::default(); count];
        Ok(())
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row == 0 || col == 0 || row > self.rows || col > self.cols {
            return None;
        }
        row.checked_sub(1)?
            .checked_mul(self.cols)?
            .checked_add(col.checked_sub(1)?)
    }

    /// Move the cursor to the 1-based cell `(row, col)`.
    pub fn target(&mut self, row: usize, col: usize) -> Result<(), RenderError> {
        let index = self.index(row, col).ok_or_else(|| {
            RenderError::Plotting(format!(
                "subplot ({row}, {col}) is outside the {}x{} grid",
                self.rows, self.cols
            ))
        })?;
        self.cursor = Some(index);
        Ok(())
    }

    /// The cell under the cursor.
    pub fn current_mut(&mut self) -> Result<&mut Subplot, RenderError> {
        self.cursor
            .and_then(|index| self.cells.get_mut(index))
            .ok_or_else(|| RenderError::Plotting("no subplot is targeted".into()))
    }

    /// The 1-based cell `(row, col)`.
    pub fn subplot(&self, row: usize, col: usize) -> Option<&Subplot> {
        self.cells.get(self.index(row, col)?)
    }

    /// Grid rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Grid columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether no grid exists.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in row-major order with their 1-based positions.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &Subplot)> + '_ {
        let cols = self.cols.max(1);
        (1..=self.rows)
            .flat_map(move |row| (1..=cols).map(move |col| (row, col)))
            .zip(self.cells.iter())
            .map(|((row, col), cell)| (row, col, cell))
    }
}

/// A trace in plot space.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTrace {
    /// Transformed points.
    pub points: Vec<(f64, f64)>,
    /// Legend label.
    pub label: Option<String>,
    /// Draw color.
    pub color: PlotColor,
    /// Line or scatter.
    pub style: TraceStyle,
}

/// One axis in plot space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisView {
    /// Scale applied to the data.
    pub scale: Scale,
    /// Visible range in plot space, `min < max`.
    pub min: f64,
    /// Upper end of the visible range.
    pub max: f64,
    /// Whether the axis holds timestamps.
    pub temporal: bool,
}

impl AxisView {
    fn new(
        scale: Scale,
        values: impl Iterator<Item = f64>,
        limits: Option<AxisRange>,
        temporal: bool,
    ) -> Self {
        let limits = limits.and_then(|l| Some((scale.forward(l.min)?, scale.forward(l.max)?)));
        let (min, max) = limits.unwrap_or_else(|| {
            values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
        });
        let (min, max) = if min.is_finite() && max.is_finite() {
            (min.min(max), min.max(max))
        } else {
            (0.0, 1.0)
        };
        let (min, max) = if max > min {
            (min, max)
        } else {
            let pad = if min == 0.0 { 0.5 } else { min.abs() * 0.05 };
            (min - pad, max + pad)
        };
        Self {
            scale,
            min,
            max,
            temporal,
        }
    }

    /// Label for a plot-space position.
    pub fn label(&self, position: f64) -> String {
        let value = self.scale.inverse(position);
        if self.temporal {
            format_time(value, self.scale.inverse(self.max) - self.scale.inverse(self.min))
        } else {
            format_number(value)
        }
    }

    /// Tick positions in plot space with their labels.
    pub fn ticks(&self, target: u32) -> Vec<(f64, String)> {
        nice_ticks(self.min, self.max, target)
            .into_iter()
            .map(|pos| (pos, self.label(pos)))
            .collect()
    }
}

/// A subplot ready to draw: transformed traces and axis ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSubplot {
    /// Traces in draw order.
    pub traces: Vec<PreparedTrace>,
    /// X axis.
    pub x: AxisView,
    /// Y axis.
    pub y: AxisView,
}

impl Subplot {
    /// Apply scales and limits.
    pub fn prepare(&self) -> PreparedSubplot {
        let traces: Vec<PreparedTrace> = self
            .traces
            .iter()
            .map(|trace| PreparedTrace {
                points: trace
                    .x
                    .iter()
                    .zip(&trace.y)
                    .filter_map(|(x, y)| {
                        Some((self.x_scale.forward(*x)?, self.y_scale.forward(*y)?))
                    })
                    .collect(),
                label: trace.label.clone(),
                color: trace.color,
                style: trace.style,
            })
            .collect();

        let x_temporal = self.traces.iter().any(|t| t.x_temporal);
        let y_temporal = self.traces.iter().any(|t| t.y_temporal);
        let points = || traces.iter().flat_map(|t| t.points.iter());
        let x = AxisView::new(self.x_scale, points().map(|p| p.0), self.x_limits, x_temporal);
        let y = AxisView::new(self.y_scale, points().map(|p| p.1), self.y_limits, y_temporal);

        PreparedSubplot { traces, x, y }
    }

    /// Whether any trace carries a legend label.
    pub fn has_labels(&self) -> bool {
        self.traces.iter().any(|t| t.label.is_some())
    }
}
