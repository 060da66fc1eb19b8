//! Provider access, normalization, and artifact storage.

pub mod normalize;
pub mod provider;
pub mod series;
pub mod store;
pub mod yahoo;

pub use normalize::{normalize, Column, NormalizedSeries, Row, Value};
pub use provider::{DataError, DataProvider};
pub use series::{ColumnData, GroupedHeader, RawSeries, RawTable};
pub use store::{artifact_path, read_artifact, render_csv, write_artifact, StoreError};
pub use yahoo::YahooProvider;
