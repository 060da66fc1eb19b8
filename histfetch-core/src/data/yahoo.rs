//! Yahoo Finance data provider.
//!
//! Fetches daily bars from Yahoo's v8 chart API and hands them back as a flat
//! `RawSeries`. One HTTP request per call: the fetcher owns retries.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use super::provider::{DataError, DataProvider};
use super::series::{ColumnData, RawSeries, RawTable};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

/// Exchange offset from UTC in seconds; bars are stamped at local open.
#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(BASE_URL)
    }

    /// Point the provider at a different host (mirrors, local fixtures).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Build the chart API URL for a symbol and `[start, end)`.
    ///
    /// The window is padded by a day on each side because exchange-local
    /// dates can sit up to a day away from the UTC date; `parse_response`
    /// trims back to `[start, end)` once the exchange offset is known.
    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let pad = chrono::Duration::days(1);
        let start_ts = (start - pad).and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = (end + pad).and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        format!(
            "{}/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true",
            self.base_url
        )
    }

    /// Map an HTTP status to a provider error, if it is one.
    ///
    /// Yahoo answers unknown symbols with 404 and a chart error body, so 404
    /// falls through to body parsing.
    fn check_status(
        symbol: &str,
        status: reqwest::StatusCode,
        retry_after: Option<&str>,
    ) -> Result<(), DataError> {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = retry_after
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(60);
            return Err(DataError::RateLimited { retry_after_secs });
        }
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::Http {
                status: status.as_u16(),
                symbol: symbol.to_string(),
            });
        }
        Ok(())
    }

    /// Parse the chart API response into a flat table of bars dated
    /// `[start, end)` in the exchange's local calendar.
    ///
    /// A response with no result rows is an empty series, not an error.
    fn parse_response(
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        resp: ChartResponse,
    ) -> Result<RawSeries, DataError> {
        let Some(result) = resp.chart.result else {
            return match resp.chart.error {
                Some(err) if err.code == "Not Found" => Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                }),
                Some(err) => Err(DataError::ResponseFormatChanged(format!(
                    "{}: {}",
                    err.code, err.description
                ))),
                None => Ok(RawSeries::empty()),
            };
        };

        let Some(data) = result.into_iter().next() else {
            return Ok(RawSeries::empty());
        };

        let Some(timestamps) = data.timestamp else {
            return Ok(RawSeries::empty());
        };

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let gmtoffset = data.meta.gmtoffset;
        let n = timestamps.len();
        let mut index = Vec::with_capacity(n);
        let mut open = Vec::with_capacity(n);
        let mut high = Vec::with_capacity(n);
        let mut low = Vec::with_capacity(n);
        let mut close = Vec::with_capacity(n);
        let mut adj = Vec::with_capacity(n);
        let mut volume = Vec::with_capacity(n);

        for (i, &ts) in timestamps.iter().enumerate() {
            let o = quote.open.get(i).copied().flatten();
            let h = quote.high.get(i).copied().flatten();
            let l = quote.low.get(i).copied().flatten();
            let c = quote.close.get(i).copied().flatten();
            let v = quote.volume.get(i).copied().flatten();

            // Skip bars where all OHLCV are None (holidays/non-trading days)
            if o.is_none() && h.is_none() && l.is_none() && c.is_none() && v.is_none() {
                continue;
            }

            // An unparseable timestamp stays in the table as a dateless row;
            // normalization drops it.
            let date = ts
                .checked_add(gmtoffset)
                .and_then(|local| chrono::DateTime::from_timestamp(local, 0))
                .map(|dt| dt.naive_utc().date());
            if matches!(date, Some(d) if d < start || d >= end) {
                continue;
            }

            index.push(date);
            open.push(o);
            high.push(h);
            low.push(l);
            close.push(c);
            volume.push(v);
            adj.push(
                adj_closes
                    .as_ref()
                    .and_then(|a| a.get(i).copied().flatten()),
            );
        }

        if index.is_empty() {
            return Ok(RawSeries::empty());
        }

        let mut table = RawTable::new(index)
            .with_column("Open".to_string(), ColumnData::Float(open))
            .with_column("High".to_string(), ColumnData::Float(high))
            .with_column("Low".to_string(), ColumnData::Float(low))
            .with_column("Close".to_string(), ColumnData::Float(close));
        if adj_closes.is_some() {
            table.push_column("Adj Close".to_string(), ColumnData::Float(adj));
        }
        table.push_column("Volume".to_string(), ColumnData::Int(volume));

        Ok(RawSeries::Flat(table))
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn download(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeries, DataError> {
        let url = self.chart_url(symbol, start, end);
        debug!(%url, "requesting chart");

        let resp = self.client.get(&url).send().map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                DataError::NetworkUnreachable(e.to_string())
            } else {
                DataError::Other(e.to_string())
            }
        })?;

        Self::check_status(
            symbol,
            resp.status(),
            resp.headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok()),
        )?;

        let body = resp
            .text()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
        let chart: ChartResponse = serde_json::from_str(&body).map_err(|e| {
            DataError::ResponseFormatChanged(format!(
                "failed to parse response for {symbol}: {e}"
            ))
        })?;

        Self::parse_response(symbol, start, end, chart)
    }
}
