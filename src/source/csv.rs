//! CSV and TSV files.

use std::path::Path;

use super::table::{Table, TableParser, TabularFigure};
use super::{Figure, SourceError};

/// Parse comma-separated text with a header row.
pub(crate) fn parse_csv(text: &str) -> Result<Table, SourceError> {
    parse_delimited(text, b',')
}

fn parse_tsv(text: &str) -> Result<Table, SourceError> {
    parse_delimited(text, b'\t')
}

fn parse_delimited(text: &str, delimiter: u8) -> Result<Table, SourceError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let names: Vec<String> = reader
        .headers()
        .map_err(|e| SourceError::Processing(format!("invalid header row: {e}")))?
        .iter()
        .map(str::to_owned)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| SourceError::Processing(format!("invalid record: {e}")))?;
        rows.push(record.iter().map(|cell| Some(cell.to_owned())).collect());
    }
    Ok(Table::from_rows(names, &rows))
}

/// One Figure for a CSV file, or a TSV file when the extension is `.tsv`.
pub(crate) fn open(path: &Path) -> Result<Box<dyn Figure>, SourceError> {
    let is_tsv = path.extension().is_some_and(|ext| ext == "tsv");
    let parse: TableParser = if is_tsv { parse_tsv } else { parse_csv };
    Ok(Box::new(TabularFigure::from_file(path, parse)?))
}
