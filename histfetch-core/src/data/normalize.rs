//! Column normalization.
//!
//! Turns a `RawSeries` of either header layout into a `NormalizedSeries`:
//! explicit date column, single-level headers, canonical column order, and
//! only the columns the provider actually supplied.

use std::fmt;

use chrono::NaiveDate;
use tracing::debug;

use super::series::{ColumnData, GroupedHeader, RawSeries, RawTable};

/// Canonical output columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Date,
    Open,
    High,
    Low,
    Close,
    AdjClose,
    Volume,
}

impl Column {
    /// Preferred ordering of the projected table.
    pub const CANONICAL: [Column; 7] = [
        Column::Date,
        Column::Open,
        Column::High,
        Column::Low,
        Column::Close,
        Column::AdjClose,
        Column::Volume,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Column::Date => "Date",
            Column::Open => "Open",
            Column::High => "High",
            Column::Low => "Low",
            Column::Close => "Close",
            Column::AdjClose => "Adj Close",
            Column::Volume => "Volume",
        }
    }

    /// Exact, case-sensitive header match.
    pub fn from_header(header: &str) -> Option<Column> {
        Column::CANONICAL.into_iter().find(|c| c.header() == header)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// A single cell value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Float(f64),
    Int(u64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
        }
    }
}

/// One row of the normalized table.
///
/// `values` lines up with `NormalizedSeries::columns()` minus the leading
/// `Date` column, which lives in `date`.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub date: NaiveDate,
    pub values: Vec<Option<Value>>,
}

/// Flat table: one row per trading date, canonical column subset.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSeries {
    symbol: String,
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl NormalizedSeries {
    /// Assemble a series. `columns` must start with `Date` and follow the
    /// canonical order; each row carries one value per non-date column.
    pub fn new(symbol: impl Into<String>, columns: Vec<Column>, rows: Vec<Row>) -> Self {
        debug_assert_eq!(columns.first(), Some(&Column::Date));
        debug_assert!(columns.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(rows.iter().all(|r| r.values.len() + 1 == columns.len()));
        Self {
            symbol: symbol.into(),
            columns,
            rows,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.header()).collect()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> &[Row] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Cells of a non-date column, or `None` if the column is absent.
    pub fn column_values(&self, column: Column) -> Option<Vec<Option<Value>>> {
        let pos = self.value_position(column)?;
        Some(self.rows.iter().map(|r| r.values[pos]).collect())
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    fn value_position(&self, column: Column) -> Option<usize> {
        if column == Column::Date {
            return None;
        }
        self.columns
            .iter()
            .filter(|c| **c != Column::Date)
            .position(|c| *c == column)
    }
}

/// Normalize a provider response for `symbol`.
pub fn normalize(symbol: &str, raw: RawSeries) -> NormalizedSeries {
    let flat = match raw {
        RawSeries::Flat(table) => table,
        RawSeries::Grouped { table, group_key } => collapse_grouped(table, &group_key),
    };
    project(symbol, flat)
}

/// Drop the symbol level of grouped headers, keeping the field name.
///
/// Two grouped columns can collapse onto the same field (e.g. a response that
/// carries more than one symbol); the first one wins.
fn collapse_grouped(table: RawTable<GroupedHeader>, group_key: &str) -> RawTable<String> {
    let RawTable { index, columns } = table;
    let mut flat = RawTable::new(index);
    for (header, data) in columns {
        if header.symbol != group_key {
            debug!(
                field = %header.field,
                symbol = %header.symbol,
                group_key,
                "grouped column is not under the requested symbol"
            );
        }
        if flat.columns.iter().any(|(name, _)| *name == header.field) {
            debug!(field = %header.field, "dropping duplicate field after header collapse");
            continue;
        }
        flat.push_column(header.field, data);
    }
    flat
}

/// Project onto the canonical order, intersecting with what is present, and
/// drop rows that have no date.
fn project(symbol: &str, table: RawTable<String>) -> NormalizedSeries {
    let RawTable { index, columns } = table;

    let mut picked: Vec<(Column, ColumnData)> = Vec::new();
    for (header, data) in columns {
        match Column::from_header(&header) {
            // The index is the date column; a stray "Date" field would shadow it.
            Some(Column::Date) => debug!("ignoring non-index Date column"),
            Some(col) if picked.iter().any(|(c, _)| *c == col) => {
                debug!(column = %col, "dropping duplicate column");
            }
            Some(col) => picked.push((col, data)),
            None => debug!(column = %header, "dropping non-canonical column"),
        }
    }
    picked.sort_by_key(|(c, _)| *c);

    let mut columns = Vec::with_capacity(picked.len() + 1);
    columns.push(Column::Date);
    columns.extend(picked.iter().map(|(c, _)| *c));

    let mut dropped = 0usize;
    let mut rows = Vec::with_capacity(index.len());
    for (i, date) in index.iter().enumerate() {
        let Some(date) = *date else {
            dropped += 1;
            continue;
        };
        let values = picked.iter().map(|(_, data)| cell(data, i)).collect();
        rows.push(Row { date, values });
    }
    if dropped > 0 {
        debug!(symbol, dropped, "dropped rows without a date");
    }

    NormalizedSeries::new(symbol, columns, rows)
}

fn cell(data: &ColumnData, i: usize) -> Option<Value> {
    match data {
        ColumnData::Float(v) => v.get(i).copied().flatten().map(Value::Float),
        ColumnData::Int(v) => v.get(i).copied().flatten().map(Value::Int),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 1, day)
    }

    fn floats(v: &[f64]) -> ColumnData {
        ColumnData::Float(v.iter().copied().map(Some).collect())
    }

    fn ints(v: &[u64]) -> ColumnData {
        ColumnData::Int(v.iter().copied().map(Some).collect())
    }

    #[test]
    fn header_names_round_trip() {
        for col in Column::CANONICAL {
            assert_eq!(Column::from_header(col.header()), Some(col));
        }
        assert_eq!(Column::from_header("adj close"), None);
        assert_eq!(Column::from_header("AdjClose"), None);
    }

    #[test]
    fn projection_keeps_present_columns_in_canonical_order() {
        let table = RawTable::new(vec![d(2), d(3)])
            .with_column("Volume".to_string(), ints(&[100, 200]))
            .with_column("ExtraField".to_string(), floats(&[1.0, 2.0]))
            .with_column("Close".to_string(), floats(&[10.5, 11.0]))
            .with_column("Open".to_string(), floats(&[10.0, 10.5]));

        let series = normalize("AAPL", RawSeries::Flat(table));

        assert_eq!(series.headers(), vec!["Date", "Open", "Close", "Volume"]);
        assert_eq!(series.len(), 2);
        assert_eq!(
            series.rows()[0].values,
            vec![Some(Value::Float(10.0)), Some(Value::Float(10.5)), Some(Value::Int(100))]
        );
        assert!(!series.has_column(Column::High));
        assert!(!series.has_column(Column::AdjClose));
    }

    #[test]
    fn grouped_headers_collapse_to_flat_names() {
        let grouped = RawTable::new(vec![d(2), d(3)])
            .with_column(GroupedHeader::new("Close", "SPY"), floats(&[470.0, 471.0]))
            .with_column(GroupedHeader::new("High", "SPY"), floats(&[472.0, 473.0]))
            .with_column(GroupedHeader::new("Volume", "SPY"), ints(&[5, 6]));
        let flat = RawTable::new(vec![d(2), d(3)])
            .with_column("Close".to_string(), floats(&[470.0, 471.0]))
            .with_column("High".to_string(), floats(&[472.0, 473.0]))
            .with_column("Volume".to_string(), ints(&[5, 6]));

        let from_grouped = normalize(
            "SPY",
            RawSeries::Grouped {
                table: grouped,
                group_key: "SPY".into(),
            },
        );
        let from_flat = normalize("SPY", RawSeries::Flat(flat));

        assert_eq!(from_grouped, from_flat);
        assert_eq!(from_grouped.headers(), vec!["Date", "High", "Close", "Volume"]);
    }

    #[test]
    fn duplicate_field_after_collapse_keeps_first() {
        let grouped = RawTable::new(vec![d(2)])
            .with_column(GroupedHeader::new("Close", "SPY"), floats(&[1.0]))
            .with_column(GroupedHeader::new("Close", "QQQ"), floats(&[2.0]));
        let series = normalize(
            "SPY",
            RawSeries::Grouped {
                table: grouped,
                group_key: "SPY".into(),
            },
        );
        assert_eq!(
            series.column_values(Column::Close),
            Some(vec![Some(Value::Float(1.0))])
        );
    }

    #[test]
    fn rows_without_date_are_dropped() {
        let table = RawTable::new(vec![d(2), None, d(4)])
            .with_column("Close".to_string(), floats(&[1.0, 2.0, 3.0]));
        let series = normalize("X", RawSeries::Flat(table));
        assert_eq!(series.len(), 2);
        assert_eq!(series.dates(), vec![d(2).unwrap(), d(4).unwrap()]);
        assert_eq!(
            series.column_values(Column::Close),
            Some(vec![Some(Value::Float(1.0)), Some(Value::Float(3.0))])
        );
    }

    #[test]
    fn missing_cells_stay_missing() {
        let table = RawTable::new(vec![d(2), d(3)])
            .with_column("Open".to_string(), ColumnData::Float(vec![None, Some(2.0)]));
        let series = normalize("X", RawSeries::Flat(table));
        assert_eq!(
            series.column_values(Column::Open),
            Some(vec![None, Some(Value::Float(2.0))])
        );
    }

    #[test]
    fn head_is_bounded_by_len() {
        let table = RawTable::new(vec![d(2), d(3)])
            .with_column("Close".to_string(), floats(&[1.0, 2.0]));
        let series = normalize("X", RawSeries::Flat(table));
        assert_eq!(series.head(5).len(), 2);
        assert_eq!(series.head(1).len(), 1);
    }

    #[test]
    fn date_has_no_value_position() {
        let table = RawTable::new(vec![d(2)]).with_column("Close".to_string(), floats(&[1.0]));
        let series = normalize("X", RawSeries::Flat(table));
        assert_eq!(series.column_values(Column::Date), None);
    }
}
