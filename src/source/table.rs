//! Column-oriented tables shared by the CSV, JSON-lines and stdin sources.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use super::{Figure, Series, SourceError, ValueKind};
use crate::config::XAxisKind;

/// Attempts made when a read yields no data.
const READ_ATTEMPTS: u32 = 10;

/// Back-off unit between attempts; attempt `n` waits `n` units.
const RETRY_STEP: Duration = Duration::from_millis(50);

/// Naive timestamp layouts accepted for temporal columns (read as UTC).
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parsed values of one column.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Column {
    /// Numbers, with NaN for blanks.
    Numeric(Vec<f64>),
    /// Seconds since the Unix epoch, with NaN for blanks.
    Temporal(Vec<f64>),
    /// At least one cell is neither a number nor a timestamp.
    NonNumeric,
}

/// Named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    rows: usize,
}

fn is_blank(cell: &str) -> bool {
    matches!(cell, "" | "nan" | "NaN" | "NAN" | "null" | "None")
}

fn parse_number(cell: &str) -> Option<f64> {
    match cell {
        "true" | "True" | "TRUE" => Some(1.0),
        "false" | "False" | "FALSE" => Some(0.0),
        _ => cell.parse().ok(),
    }
}

/// Seconds since the Unix epoch for an RFC 3339 or ISO-like timestamp.
pub(crate) fn parse_timestamp(cell: &str) -> Option<f64> {
    let micros = if let Ok(dt) = DateTime::parse_from_rfc3339(cell) {
        dt.timestamp_micros()
    } else if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cell, fmt).ok())
    {
        dt.and_utc().timestamp_micros()
    } else {
        NaiveDate::parse_from_str(cell, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?
            .and_utc()
            .timestamp_micros()
    };
    #[allow(clippy::cast_precision_loss)] // microsecond timestamps fit f64 for plotting
    Some(micros as f64 / 1e6)
}

fn coerce(cells: &[Option<&str>]) -> Column {
    let present = || {
        cells
            .iter()
            .copied()
            .map(|c| c.map(str::trim).filter(|c| !is_blank(c)))
    };

    let numbers: Option<Vec<f64>> = present()
        .map(|c| c.map_or(Some(f64::NAN), parse_number))
        .collect();
    if let Some(values) = numbers {
        return Column::Numeric(values);
    }

    let times: Option<Vec<f64>> = present()
        .map(|c| c.map_or(Some(f64::NAN), parse_timestamp))
        .collect();
    match times {
        Some(values) => Column::Temporal(values),
        None => Column::NonNumeric,
    }
}

impl Table {
    /// Build a table from header names and row cells.
    ///
    /// Rows shorter than the header are padded with blanks; extra cells are ignored.
    pub(crate) fn from_rows(names: Vec<String>, rows: &[Vec<Option<String>>]) -> Self {
        let columns = (0..names.len())
            .map(|col| {
                let cells: Vec<Option<&str>> = rows
                    .iter()
                    .map(|row| row.get(col).and_then(|c| c.as_deref()))
                    .collect();
                coerce(&cells)
            })
            .collect();
        Self {
            names,
            columns,
            rows: rows.len(),
        }
    }

    /// Column names in source order.
    pub(crate) fn names(&self) -> &[String] {
        &self.names
    }

    fn values(&self, name: &str) -> Option<Result<(Vec<f64>, ValueKind), SourceError>> {
        let index = self.names.iter().position(|n| n == name)?;
        let column = self.columns.get(index)?;
        Some(match column {
            Column::Numeric(values) => Ok((values.clone(), ValueKind::Numeric)),
            Column::Temporal(values) => Ok((values.clone(), ValueKind::Temporal)),
            Column::NonNumeric => Err(SourceError::NonNumeric {
                series: name.to_owned(),
            }),
        })
    }

    /// Series of column `y` against the chosen x-axis.
    pub(crate) fn series(&self, x_axis: &XAxisKind, y: &str) -> Result<Series, SourceError> {
        let (y_values, y_kind) = self
            .values(y)
            .ok_or_else(|| SourceError::Processing(format!("no series named '{y}'")))??;

        let (x_values, x_kind) = match x_axis {
            XAxisKind::Step => {
                #[allow(clippy::cast_precision_loss)] // row indices are small
                let index = (0..self.rows).map(|i| i as f64).collect();
                (index, ValueKind::Numeric)
            }
            XAxisKind::Time => {
                return Err(SourceError::UnsupportedXAxis {
                    x_axis: x_axis.to_string(),
                    reason: "only event logs record wall time; pass a column name instead".into(),
                })
            }
            XAxisKind::Column(name) => {
                self.values(name)
                    .ok_or_else(|| SourceError::UnsupportedXAxis {
                        x_axis: name.clone(),
                        reason: "no such column".into(),
                    })??
            }
        };

        Ok(Series::new(x_values, x_kind, y_values, y_kind))
    }
}

/// Read a whole file, retrying while it is empty (e.g. caught mid-write).
pub(crate) fn read_with_retry(path: &Path) -> Result<String, SourceError> {
    for attempt in 1..=READ_ATTEMPTS {
        let text = std::fs::read_to_string(path).map_err(|e| SourceError::io(path, e))?;
        if !text.trim().is_empty() {
            return Ok(text);
        }
        debug!(path = %path.display(), attempt, "file is empty, retrying");
        if attempt < READ_ATTEMPTS {
            std::thread::sleep(RETRY_STEP.saturating_mul(attempt));
        }
    }
    Err(SourceError::Processing(format!(
        "'{}' contains no data",
        path.display()
    )))
}

/// Modification time and length used to skip unchanged files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: SystemTime,
    len: u64,
}

impl FileStamp {
    fn of(path: &Path) -> Result<Self, SourceError> {
        let meta = std::fs::metadata(path).map_err(|e| SourceError::io(path, e))?;
        Ok(Self {
            modified: meta.modified().map_err(|e| SourceError::io(path, e))?,
            len: meta.len(),
        })
    }
}

/// Parses the whole text of one input into a table.
pub(crate) type TableParser = fn(&str) -> Result<Table, SourceError>;

/// A Figure over one table, from a file or a text buffer.
pub(crate) struct TabularFigure {
    title: String,
    path: Option<PathBuf>,
    parse: TableParser,
    stamp: Option<FileStamp>,
    table: Table,
}

impl TabularFigure {
    /// Load `path` with `parse`.
    pub(crate) fn from_file(path: &Path, parse: TableParser) -> Result<Self, SourceError> {
        let stamp = FileStamp::of(path)?;
        let table = parse(&read_with_retry(path)?)?;
        Self::checked(Self {
            title: path.display().to_string(),
            path: Some(path.to_path_buf()),
            parse,
            stamp: Some(stamp),
            table,
        })
    }

    /// Parse an in-memory buffer; refresh never changes it.
    pub(crate) fn from_text(
        title: &str,
        text: &str,
        parse: TableParser,
    ) -> Result<Self, SourceError> {
        if text.trim().is_empty() {
            return Err(SourceError::Processing(format!("{title} contains no data")));
        }
        Self::checked(Self {
            title: title.to_owned(),
            path: None,
            parse,
            stamp: None,
            table: parse(text)?,
        })
    }

    fn checked(figure: Self) -> Result<Self, SourceError> {
        if figure.table.names().is_empty() {
            return Err(SourceError::Processing(format!(
                "cannot find any scalars in '{}'",
                figure.title
            )));
        }
        Ok(figure)
    }
}

impl Figure for TabularFigure {
    fn title(&self) -> &str {
        &self.title
    }

    fn scalar_names(&self) -> &[String] {
        self.table.names()
    }

    fn refresh(&mut self) -> Result<(), SourceError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let stamp = FileStamp::of(path)?;
        if self.stamp == Some(stamp) {
            return Ok(());
        }
        debug!(path = %path.display(), "table changed, re-reading");
        self.table = (self.parse)(&read_with_retry(path)?)?;
        self.stamp = Some(stamp);
        Ok(())
    }

    fn get_series(&mut self, x_axis: &XAxisKind, y: &str) -> Result<Series, SourceError> {
        self.table.series(x_axis, y)
    }
}
