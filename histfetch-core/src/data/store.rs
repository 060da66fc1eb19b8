//! CSV artifact storage.
//!
//! Layout: `{dir}/{SYMBOL}_historical.csv`
//!
//! The whole table is rendered in memory first, written to `.tmp`, then
//! renamed over the destination. A failed write never leaves a partial file at
//! the artifact path, and every successful write fully replaces the previous one.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use super::normalize::{Column, NormalizedSeries, Row, Value};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors from reading or writing artifacts.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed artifact: {0}")]
    Parse(String),
}

/// Path of the stored artifact for `symbol` under `dir`.
pub fn artifact_path(dir: &Path, symbol: &str) -> PathBuf {
    dir.join(format!("{symbol}_historical.csv"))
}

/// Render the table as CSV text: header row, one line per date, no index.
pub fn render_csv(series: &NormalizedSeries) -> Result<String, StoreError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(series.headers())?;

    for row in series.rows() {
        let mut record = Vec::with_capacity(row.values.len() + 1);
        record.push(row.date.format(DATE_FORMAT).to_string());
        for value in &row.values {
            record.push(value.map(|v| v.to_string()).unwrap_or_default());
        }
        wtr.write_record(&record)?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| StoreError::Parse(format!("failed to flush CSV writer: {e}")))?;
    String::from_utf8(data).map_err(|e| StoreError::Parse(format!("CSV output is not UTF-8: {e}")))
}

/// Write the artifact for `series` under `dir`, creating `dir` if needed.
///
/// Returns the artifact path.
pub fn write_artifact(series: &NormalizedSeries, dir: &Path) -> Result<PathBuf, StoreError> {
    let csv = render_csv(series)?;

    fs::create_dir_all(dir).map_err(|source| StoreError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = artifact_path(dir, series.symbol());
    let tmp_path = path.with_extension("csv.tmp");

    fs::write(&tmp_path, csv).map_err(|source| {
        // A short write can leave a partial temp file behind
        let _ = fs::remove_file(&tmp_path);
        StoreError::Io {
            path: tmp_path.clone(),
            source,
        }
    })?;

    // Atomic rename
    fs::rename(&tmp_path, &path).map_err(|source| {
        // Clean up temp file on rename failure
        let _ = fs::remove_file(&tmp_path);
        StoreError::Io {
            path: path.clone(),
            source,
        }
    })?;

    debug!(path = %path.display(), rows = series.len(), "artifact written");
    Ok(path)
}

/// Read an artifact back into a `NormalizedSeries`.
///
/// The symbol is taken from the file name. Volume cells parse as integers,
/// every other non-date column as floats.
pub fn read_artifact(path: &Path) -> Result<NormalizedSeries, StoreError> {
    let symbol = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix("_historical.csv"))
        .ok_or_else(|| StoreError::Parse(format!("not an artifact path: {}", path.display())))?
        .to_string();

    let text = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rdr = csv::Reader::from_reader(text.as_bytes());

    let columns = rdr
        .headers()?
        .iter()
        .map(|h| {
            Column::from_header(h).ok_or_else(|| StoreError::Parse(format!("unknown column '{h}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if columns.first() != Some(&Column::Date) {
        return Err(StoreError::Parse("first column must be Date".into()));
    }
    if !columns.windows(2).all(|w| w[0] < w[1]) {
        return Err(StoreError::Parse("columns are not in canonical order".into()));
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let date_field = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(date_field, DATE_FORMAT)
            .map_err(|e| StoreError::Parse(format!("bad date '{date_field}': {e}")))?;

        let values = columns[1..]
            .iter()
            .enumerate()
            .map(|(i, col)| parse_cell(*col, record.get(i + 1).unwrap_or_default()))
            .collect::<Result<Vec<_>, _>>()?;

        rows.push(Row { date, values });
    }

    Ok(NormalizedSeries::new(symbol, columns, rows))
}

fn parse_cell(column: Column, raw: &str) -> Result<Option<Value>, StoreError> {
    if raw.is_empty() {
        return Ok(None);
    }
    let value = match column {
        Column::Volume => raw.parse::<u64>().map(Value::Int).map_err(|e| e.to_string()),
        _ => raw.parse::<f64>().map(Value::Float).map_err(|e| e.to_string()),
    };
    value
        .map(Some)
        .map_err(|e| StoreError::Parse(format!("bad {column} value '{raw}': {e}")))
}
