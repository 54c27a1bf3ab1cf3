//! Text backend: braille charts laid out with ratatui and printed with crossterm.
//!
//! The scene is rendered into an off-screen [`Buffer`] sized to the terminal
//! (or to `--plotsize` per cell) and printed line by line, with ANSI colors
//! unless colorless output was requested.

use std::io::Write;

use crossterm::style::{Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::{Axis, Block, Chart, Dataset, GraphType, Widget};

use crate::config::{BackendKind, PlotConfig, PlotOption, PlotSize};

use super::color::{text_palette, PlotColor};
use super::scene::{AxisView, Scene, Subplot, TraceStyle};
use super::{check_capabilities, clear_terminal, Plotter, RenderError};

/// Options the text backend cannot honor.
pub const UNSUPPORTED: [PlotOption; 4] = [
    PlotOption::XSymlog,
    PlotOption::YSymlog,
    PlotOption::AsRawBytes,
    PlotOption::Output,
];

/// Canvas size used when the terminal size is unknown.
const FALLBACK_SIZE: (u16, u16) = (100, 40);

fn to_ratatui(color: PlotColor) -> Color {
    match color {
        PlotColor::Black => Color::Black,
        PlotColor::White => Color::White,
        PlotColor::Red => Color::Red,
        PlotColor::Green => Color::Green,
        PlotColor::Blue => Color::Blue,
        PlotColor::Cyan => Color::Cyan,
        PlotColor::Magenta => Color::Magenta,
        PlotColor::Yellow => Color::Yellow,
        PlotColor::Orange => Color::Indexed(208),
        PlotColor::Gray => Color::Gray,
        PlotColor::Rgb(r, g, b) => Color::Rgb(r, g, b),
    }
}

/// ratatui names the bright ANSI colors `Light*`; crossterm names the dim ones `Dark*`.
fn to_crossterm(color: Color) -> crossterm::style::Color {
    use crossterm::style::Color as C;
    match color {
        Color::Reset => C::Reset,
        Color::Black => C::Black,
        Color::Red => C::DarkRed,
        Color::Green => C::DarkGreen,
        Color::Yellow => C::DarkYellow,
        Color::Blue => C::DarkBlue,
        Color::Magenta => C::DarkMagenta,
        Color::Cyan => C::DarkCyan,
        Color::Gray => C::Grey,
        Color::DarkGray => C::DarkGrey,
        Color::LightRed => C::Red,
        Color::LightGreen => C::Green,
        Color::LightYellow => C::Yellow,
        Color::LightBlue => C::Blue,
        Color::LightMagenta => C::Magenta,
        Color::LightCyan => C::Cyan,
        Color::White => C::White,
        Color::Rgb(r, g, b) => C::Rgb { r, g, b },
        Color::Indexed(i) => C::AnsiValue(i),
    }
}

/// Evenly spaced positions from `min` to `max` inclusive.
fn spread(axis: &AxisView, count: u32) -> Vec<f64> {
    let steps = f64::from(count.saturating_sub(1).max(1));
    (0..count)
        .map(|i| axis.min + (axis.max - axis.min) * f64::from(i) / steps)
        .collect()
}

fn fg(color: Option<PlotColor>, colored: bool) -> Style {
    match color {
        Some(color) if colored => Style::default().fg(to_ratatui(color)),
        _ => Style::default(),
    }
}

fn bg(color: Option<PlotColor>, colored: bool) -> Style {
    match color {
        Some(color) if colored => Style::default().bg(to_ratatui(color)),
        _ => Style::default(),
    }
}

fn render_cell(subplot: &Subplot, area: Rect, buf: &mut Buffer) {
    let prepared = subplot.prepare();
    let colored = !subplot.colorless;
    let ticks_style = fg(subplot.ticks_color, colored);

    let x_count = if area.width >= 60 { 5 } else { 3 };
    let y_count = if area.height >= 20 { 5 } else { 3 };
    let x_ticks = spread(&prepared.x, x_count);
    let y_ticks = spread(&prepared.y, y_count);

    let mut grid_lines: Vec<[(f64, f64); 2]> = Vec::new();
    if subplot.grid {
        for x in &x_ticks {
            grid_lines.push([(*x, prepared.y.min), (*x, prepared.y.max)]);
        }
        for y in &y_ticks {
            grid_lines.push([(prepared.x.min, *y), (prepared.x.max, *y)]);
        }
    }

    let mut datasets: Vec<Dataset<'_>> = grid_lines
        .iter()
        .map(|line| {
            Dataset::default()
                .marker(Marker::Dot)
                .graph_type(GraphType::Line)
                .style(ticks_style)
                .data(line)
        })
        .collect();

    for trace in &prepared.traces {
        let graph_type = match trace.style {
            TraceStyle::Line => GraphType::Line,
            TraceStyle::Scatter => GraphType::Scatter,
        };
        let mut dataset = Dataset::default()
            .marker(Marker::Braille)
            .graph_type(graph_type)
            .style(fg(Some(trace.color), colored))
            .data(&trace.points);
        if subplot.legend {
            if let Some(label) = &trace.label {
                dataset = dataset.name(label.clone());
            }
        }
        datasets.push(dataset);
    }

    let mut block =
        Block::bordered().border_style(bg(subplot.axes_color, colored).patch(ticks_style));
    if let Some(title) = &subplot.title {
        block = block.title(title.clone());
    }

    let x_axis = Axis::default()
        .title(subplot.x_label.clone())
        .bounds([prepared.x.min, prepared.x.max])
        .labels(x_ticks.iter().map(|x| prepared.x.label(*x)))
        .style(ticks_style);
    let y_axis = Axis::default()
        .title(subplot.y_label.clone())
        .bounds([prepared.y.min, prepared.y.max])
        .labels(y_ticks.iter().map(|y| prepared.y.label(*y)))
        .style(ticks_style);

    Chart::new(datasets)
        .block(block)
        .style(bg(subplot.canvas_color, colored))
        .x_axis(x_axis)
        .y_axis(y_axis)
        .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)))
        .render(area, buf);
}

/// Cell rectangles of `scene` in row-major order.
fn cell_areas(scene: &Scene, area: Rect) -> Vec<Rect> {
    let rows = Layout::vertical(vec![Constraint::Fill(1); scene.rows()]).split(area);
    rows.iter()
        .flat_map(|row| {
            Layout::horizontal(vec![Constraint::Fill(1); scene.cols()])
                .split(*row)
                .to_vec()
        })
        .collect()
}

/// Convert a rendered buffer into printable lines.
fn buffer_lines(buf: &Buffer, colorless: bool) -> Result<Vec<String>, RenderError> {
    let area = buf.area;
    let mut lines = Vec::with_capacity(usize::from(area.height));
    for y in area.top()..area.bottom() {
        let mut line: Vec<u8> = Vec::new();
        let mut current: Option<(Color, Color)> = None;
        for x in area.left()..area.right() {
            let Some(cell) = buf.cell((x, y)) else {
                continue;
            };
            if !colorless && current != Some((cell.fg, cell.bg)) {
                crossterm::queue!(
                    line,
                    SetForegroundColor(to_crossterm(cell.fg)),
                    SetBackgroundColor(to_crossterm(cell.bg))
                )?;
                current = Some((cell.fg, cell.bg));
            }
            crossterm::queue!(line, Print(cell.symbol()))?;
        }
        if !colorless {
            crossterm::queue!(line, ResetColor)?;
        }
        lines.push(String::from_utf8_lossy(&line).into_owned());
    }
    Ok(lines)
}

/// Braille charts printed to stdout.
#[derive(Debug)]
pub struct TextPlotter {
    scene: Scene,
    canvas: Option<PlotColor>,
    colorless: bool,
    plotsize: Option<PlotSize>,
    terminal_width: Option<u16>,
    terminal_height: Option<u16>,
}

impl TextPlotter {
    /// Create the backend.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnsupportedOption`] for symlog scales, raw bytes or `--output`.
    pub fn new(config: &PlotConfig) -> Result<Self, RenderError> {
        check_capabilities(BackendKind::Text, &UNSUPPORTED, config)?;
        Ok(Self {
            scene: Scene::default(),
            canvas: config.canvas_color,
            colorless: config.colorless,
            plotsize: config.plotsize,
            terminal_width: config.terminal_width,
            terminal_height: config.terminal_height,
        })
    }

    /// Character size of the whole frame.
    pub fn canvas_size(&self) -> (u16, u16) {
        if let Some(size) = self.plotsize {
            let scale = |cell: u32, count: usize| {
                let count = u32::try_from(count.max(1)).unwrap_or(u32::MAX);
                u16::try_from(cell.saturating_mul(count)).unwrap_or(u16::MAX)
            };
            return (
                scale(size.width, self.scene.cols()),
                scale(size.height, self.scene.rows()),
            );
        }
        let (width, height) = crossterm::terminal::size()
            // Keep the prompt line visible below the frame.
            .map(|(w, h)| (w, h.saturating_sub(1)))
            .unwrap_or(FALLBACK_SIZE);
        (
            self.terminal_width.unwrap_or(width),
            self.terminal_height.unwrap_or(height),
        )
    }

    /// Render the current scene into printable lines.
    ///
    /// # Errors
    ///
    /// Returns an error if ANSI sequences cannot be encoded.
    pub fn render_lines(&self) -> Result<Vec<String>, RenderError> {
        let (width, height) = self.canvas_size();
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        if !self.scene.is_empty() {
            let areas = cell_areas(&self.scene, area);
            for (cell_area, (_, _, subplot)) in areas.into_iter().zip(self.scene.cells()) {
                render_cell(subplot, cell_area, &mut buf);
            }
        }
        buffer_lines(&buf, self.colorless)
    }
}

impl Plotter for TextPlotter {
    fn kind(&self) -> BackendKind {
        BackendKind::Text
    }

    fn scene(&self) -> &Scene {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    fn palette(&self) -> Vec<PlotColor> {
        text_palette(self.canvas)
    }

    fn clear_terminal_printed_lines(&mut self) -> Result<(), RenderError> {
        clear_terminal(&mut std::io::stdout())
    }

    fn show(&mut self) -> Result<(), RenderError> {
        let lines = self.render_lines()?;
        let mut out = std::io::stdout().lock();
        for line in lines {
            writeln!(out, "{line}")?;
        }
        out.flush()?;
        Ok(())
    }

    fn write_image(&mut self, _out: &mut dyn Write) -> Result<(), RenderError> {
        Err(RenderError::UnsupportedOption {
            backend: BackendKind::Text,
            option: PlotOption::AsRawBytes,
        })
    }
}
