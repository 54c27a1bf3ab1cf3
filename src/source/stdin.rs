//! CSV text buffered from stdin.

use super::table::TabularFigure;
use super::{csv, Figure, SourceError};

/// The single Figure of a stdin buffer.
pub(crate) fn open(text: &str) -> Result<Box<dyn Figure>, SourceError> {
    Ok(Box::new(TabularFigure::from_text("stdin", text, csv::parse_csv)?))
}
