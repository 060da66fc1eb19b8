//! Raw provider responses.
//!
//! A provider hands back a date-indexed table whose headers are either flat
//! (`"Close"`) or grouped under the requested symbol (`("Close", "AAPL")`).
//! The shape is carried in the type so normalization matches on it instead of
//! inspecting headers at runtime.

use chrono::NaiveDate;

/// One typed column of cells. `None` is a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Float(Vec<Option<f64>>),
    Int(Vec<Option<u64>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Float(v) => v.len(),
            ColumnData::Int(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Two-level header: the price field and the symbol it is grouped under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupedHeader {
    pub field: String,
    pub symbol: String,
}

impl GroupedHeader {
    pub fn new(field: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            symbol: symbol.into(),
        }
    }
}

/// Date-indexed table with header type `H`.
///
/// `index[i]` is the date of row `i`; a `None` entry is a row whose date the
/// provider could not supply. Every column has `index.len()` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable<H> {
    pub index: Vec<Option<NaiveDate>>,
    pub columns: Vec<(H, ColumnData)>,
}

impl<H> RawTable<H> {
    pub fn new(index: Vec<Option<NaiveDate>>) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    /// Append a column. Builder-style so fixtures read top to bottom.
    pub fn with_column(mut self, header: H, data: ColumnData) -> Self {
        debug_assert_eq!(data.len(), self.index.len(), "column length must match index");
        self.columns.push((header, data));
        self
    }

    pub fn push_column(&mut self, header: H, data: ColumnData) {
        debug_assert_eq!(data.len(), self.index.len(), "column length must match index");
        self.columns.push((header, data));
    }

    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    /// Zero rows or zero columns.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.columns.is_empty()
    }
}

impl<H> Default for RawTable<H> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// A provider response in one of the two header layouts.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSeries {
    Flat(RawTable<String>),
    Grouped {
        table: RawTable<GroupedHeader>,
        group_key: String,
    },
}

impl RawSeries {
    /// An empty flat series: what a provider returns when it has no rows.
    pub fn empty() -> Self {
        RawSeries::Flat(RawTable::default())
    }

    pub fn row_count(&self) -> usize {
        match self {
            RawSeries::Flat(table) => table.row_count(),
            RawSeries::Grouped { table, .. } => table.row_count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RawSeries::Flat(table) => table.is_empty(),
            RawSeries::Grouped { table, .. } => table.is_empty(),
        }
    }
}
