//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over the upstream source (Yahoo Finance
//! today) so the fetch loop can be driven by a stub in tests.

use chrono::NaiveDate;
use thiserror::Error;

use super::series::RawSeries;

/// Structured error types for provider calls.
///
/// Every variant is retryable from the fetcher's point of view; the split
/// exists for diagnostics only.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP {status} for {symbol}")]
    Http { status: u16, symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for upstream price providers.
///
/// Implementations must not write progress output of their own; the caller
/// owns all reporting.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Download daily history for `symbol` over `[start, end)`.
    ///
    /// An empty series is a valid answer (no trading days, throttled partial
    /// response). Failures of the call itself come back as `DataError`.
    fn download(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeries, DataError>;
}
