//! Axis scales, tick placement and tick labels.
//!
//! Log and symlog axes are drawn by transforming coordinates before they
//! reach a backend. Ticks are placed in transformed space and labelled with
//! the untransformed value.

use chrono::DateTime;

use crate::config::{CellSelection, PlotConfig};

/// Axis scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scale {
    /// Identity.
    #[default]
    Linear,
    /// Base-10 logarithm; non-positive values are dropped.
    Log,
    /// Linear within `[-1, 1]`, logarithmic outside.
    Symlog,
}

impl Scale {
    /// Transform a data value to plot space; `None` when the value cannot be shown.
    pub fn forward(self, value: f64) -> Option<f64> {
        match self {
            Self::Linear => Some(value),
            Self::Log => (value > 0.0).then(|| value.log10()),
            Self::Symlog => Some(if value.abs() <= 1.0 {
                value
            } else {
                value.signum() * (1.0 + value.abs().log10())
            }),
        }
    }

    /// Map a plot-space value back to data space.
    pub fn inverse(self, value: f64) -> f64 {
        match self {
            Self::Linear => value,
            Self::Log => 10f64.powf(value),
            Self::Symlog => {
                if value.abs() <= 1.0 {
                    value
                } else {
                    value.signum() * 10f64.powf(value.abs() - 1.0)
                }
            }
        }
    }

    /// Scale selected for a subplot by the log and symlog options.
    pub fn select(log: &CellSelection, symlog: &CellSelection, row: usize, col: usize) -> Self {
        if symlog.matches(row, col) {
            Self::Symlog
        } else if log.matches(row, col) {
            Self::Log
        } else {
            Self::Linear
        }
    }

    /// X and y scales for a subplot.
    pub fn for_cell(config: &PlotConfig, row: usize, col: usize) -> (Self, Self) {
        (
            Self::select(&config.xlog, &config.xsymlog, row, col),
            Self::select(&config.ylog, &config.ysymlog, row, col),
        )
    }
}

/// Evenly spaced "round" tick positions covering `[min, max]`.
pub fn nice_ticks(min: f64, max: f64, target: u32) -> Vec<f64> {
    let span = max - min;
    if !span.is_finite() || span <= 0.0 || target == 0 {
        return vec![min];
    }
    let raw = span / f64::from(target);
    let magnitude = 10f64.powf(raw.log10().floor());
    let norm = raw / magnitude;
    let unit = if norm < 1.5 {
        1.0
    } else if norm < 3.0 {
        2.0
    } else if norm < 7.0 {
        5.0
    } else {
        10.0
    };
    let step = unit * magnitude;

    let mut ticks = Vec::new();
    let mut k = (min / step).ceil();
    while k * step <= max + step * 1e-9 && ticks.len() < 64 {
        let tick = k * step;
        // Avoid "-0" style residue at the origin.
        ticks.push(if tick.abs() < step * 1e-9 { 0.0 } else { tick });
        k += 1.0;
    }
    ticks
}

/// Compact label for a numeric tick.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_owned();
    }
    let magnitude = value.abs();
    if !(1e-3..1e5).contains(&magnitude) {
        return format!("{value:.1e}");
    }
    let text = format!("{value:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.to_owned()
}

/// Label for a temporal tick (seconds since the Unix epoch); `span` picks the precision.
pub fn format_time(seconds: f64, span: f64) -> String {
    #[allow(clippy::cast_possible_truncation)] // plot ticks are well within i64 range
    let millis = (seconds * 1000.0).round() as i64;
    let Some(dt) = DateTime::from_timestamp_millis(millis) else {
        return format_number(seconds);
    };
    let layout = if span >= 2.0 * 86_400.0 {
        "%Y-%m-%d"
    } else if span >= 120.0 {
        "%m-%d %H:%M"
    } else {
        "%H:%M:%S"
    };
    dt.format(layout).to_string()
}
