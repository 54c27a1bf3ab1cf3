//! Plot colors, backend palettes and per-subplot color sequences.

use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

/// A named or RGB color accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlotColor {
    /// Black.
    Black,
    /// White.
    White,
    /// Red.
    Red,
    /// Green.
    Green,
    /// Blue.
    Blue,
    /// Cyan.
    Cyan,
    /// Magenta.
    Magenta,
    /// Yellow.
    Yellow,
    /// Orange.
    Orange,
    /// Gray.
    Gray,
    /// Arbitrary 24-bit color.
    Rgb(u8, u8, u8),
}

impl PlotColor {
    /// 24-bit components.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Black => (0, 0, 0),
            Self::White => (255, 255, 255),
            Self::Red => (205, 49, 49),
            Self::Green => (13, 188, 121),
            Self::Blue => (36, 114, 200),
            Self::Cyan => (17, 168, 205),
            Self::Magenta => (188, 63, 188),
            Self::Yellow => (229, 229, 16),
            Self::Orange => (255, 140, 0),
            Self::Gray => (128, 128, 128),
            Self::Rgb(r, g, b) => (r, g, b),
        }
    }
}

fn parse_hex(s: &str) -> Option<PlotColor> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|part| u8::from_str_radix(part, 16).ok())
    };
    Some(PlotColor::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

impl FromStr for PlotColor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let color = match s.trim().to_ascii_lowercase().as_str() {
            "black" => Self::Black,
            "white" => Self::White,
            "red" => Self::Red,
            "green" => Self::Green,
            "blue" => Self::Blue,
            "cyan" => Self::Cyan,
            "magenta" => Self::Magenta,
            "yellow" => Self::Yellow,
            "orange" => Self::Orange,
            "gray" | "grey" => Self::Gray,
            other => parse_hex(other).ok_or_else(|| ConfigError::InvalidColor(s.to_owned()))?,
        };
        Ok(color)
    }
}

impl fmt::Display for PlotColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Black => f.write_str("black"),
            Self::White => f.write_str("white"),
            Self::Red => f.write_str("red"),
            Self::Green => f.write_str("green"),
            Self::Blue => f.write_str("blue"),
            Self::Cyan => f.write_str("cyan"),
            Self::Magenta => f.write_str("magenta"),
            Self::Yellow => f.write_str("yellow"),
            Self::Orange => f.write_str("orange"),
            Self::Gray => f.write_str("gray"),
            Self::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

/// Text backend palette with the canvas color removed (white when unset).
pub fn text_palette(canvas: Option<PlotColor>) -> Vec<PlotColor> {
    let canvas = canvas.unwrap_or(PlotColor::White);
    [
        PlotColor::Blue,
        PlotColor::Red,
        PlotColor::Magenta,
        PlotColor::Green,
        PlotColor::Orange,
        PlotColor::Cyan,
        PlotColor::Black,
        PlotColor::White,
        PlotColor::Gray,
    ]
    .into_iter()
    .filter(|c| *c != canvas)
    .collect()
}

/// The ten Tableau colors.
pub fn tableau_palette() -> Vec<PlotColor> {
    vec![
        PlotColor::Rgb(0x1f, 0x77, 0xb4),
        PlotColor::Rgb(0xff, 0x7f, 0x0e),
        PlotColor::Rgb(0x2c, 0xa0, 0x2c),
        PlotColor::Rgb(0xd6, 0x27, 0x28),
        PlotColor::Rgb(0x94, 0x67, 0xbd),
        PlotColor::Rgb(0x8c, 0x56, 0x4b),
        PlotColor::Rgb(0xe3, 0x77, 0xc2),
        PlotColor::Rgb(0x7f, 0x7f, 0x7f),
        PlotColor::Rgb(0xbc, 0xbd, 0x22),
        PlotColor::Rgb(0x17, 0xbe, 0xcf),
    ]
}

/// Colors handed out to the series of one subplot.
///
/// A fixed cycle ends after the palette; a cycling one wraps forever.
#[derive(Debug, Clone)]
pub struct ColorCycle {
    palette: Vec<PlotColor>,
    next: usize,
    repeat: bool,
}

impl ColorCycle {
    /// Each palette color once, then `None`.
    pub fn fixed(palette: Vec<PlotColor>) -> Self {
        Self {
            palette,
            next: 0,
            repeat: false,
        }
    }

    /// The palette repeated indefinitely.
    pub fn cycling(palette: Vec<PlotColor>) -> Self {
        Self {
            palette,
            next: 0,
            repeat: true,
        }
    }
}

impl Iterator for ColorCycle {
    type Item = PlotColor;

    fn next(&mut self) -> Option<PlotColor> {
        if self.next >= self.palette.len() {
            if !self.repeat {
                return None;
            }
            self.next = 0;
        }
        let color = self.palette.get(self.next).copied()?;
        self.next = self.next.saturating_add(1);
        Some(color)
    }
}
