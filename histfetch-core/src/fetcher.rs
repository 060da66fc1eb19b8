//! The fetch loop: call the provider, normalize, persist, retry on anything
//! short of success.
//!
//! Every failure mode is retryable and none escapes `Fetcher::fetch`: the
//! caller sees either a table or `None`. A provider error, an empty response,
//! and a failed artifact write all consume one attempt.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::data::normalize::{normalize, NormalizedSeries};
use crate::data::provider::{DataError, DataProvider};
use crate::data::series::RawSeries;
use crate::data::store::write_artifact;
use crate::observer::{AttemptEvent, FetchObserver, NoopObserver};

pub const DEFAULT_SAVE_PATH: &str = "data/raw";
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

/// Parameters of one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub save_path: PathBuf,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl FetchRequest {
    /// Request with the default save path, attempt count, and delay.
    pub fn new(symbol: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            start_date,
            end_date,
            save_path: PathBuf::from(DEFAULT_SAVE_PATH),
            max_attempts: DEFAULT_RETRIES,
            retry_delay: DEFAULT_DELAY,
        }
    }

    pub fn with_save_path(mut self, save_path: impl Into<PathBuf>) -> Self {
        self.save_path = save_path.into();
        self
    }

    /// At least one attempt is always made.
    pub fn with_retries(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }
}

/// Result of a single provider call.
#[derive(Debug)]
pub enum FetchOutcome {
    Success(RawSeries),
    Empty,
    TransportError(String),
}

impl FetchOutcome {
    pub fn from_provider(result: Result<RawSeries, DataError>) -> Self {
        match result {
            Ok(series) if series.is_empty() => FetchOutcome::Empty,
            Ok(series) => FetchOutcome::Success(series),
            Err(e) => FetchOutcome::TransportError(e.to_string()),
        }
    }
}

/// How an attempt ended, as reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Success,
    Empty,
    TransportError,
    /// The provider answered but writing the artifact failed.
    StorageError,
}

/// Pause between attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Blocks the current thread.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Drives the retry loop against one provider.
pub struct Fetcher<'a> {
    provider: &'a dyn DataProvider,
    observer: &'a dyn FetchObserver,
    sleeper: &'a dyn Sleeper,
}

impl<'a> Fetcher<'a> {
    pub fn new(provider: &'a dyn DataProvider) -> Self {
        Self {
            provider,
            observer: &NoopObserver,
            sleeper: &ThreadSleeper,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn FetchObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_sleeper(mut self, sleeper: &'a dyn Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Fetch, normalize, and store the series for `request`.
    ///
    /// Returns `None` once every attempt has failed; nothing is written in
    /// that case.
    pub fn fetch(&self, request: &FetchRequest) -> Option<NormalizedSeries> {
        let symbol = request.symbol.as_str();
        let max_attempts = request.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            self.observer
                .on_attempt_start(symbol, attempt, max_attempts);
            info!(
                symbol,
                attempt,
                max_attempts,
                provider = self.provider.name(),
                "downloading"
            );

            let outcome = FetchOutcome::from_provider(self.provider.download(
                symbol,
                request.start_date,
                request.end_date,
            ));

            let (kind, detail) = match outcome {
                FetchOutcome::Success(raw) => {
                    let series = normalize(symbol, raw);
                    match write_artifact(&series, &request.save_path) {
                        Ok(path) => {
                            self.report(request, attempt, max_attempts, OutcomeKind::Success, None);
                            info!(symbol, path = %path.display(), rows = series.len(), "saved");
                            self.observer.on_saved(symbol, &path, series.len());
                            return Some(series);
                        }
                        Err(e) => (OutcomeKind::StorageError, Some(e.to_string())),
                    }
                }
                FetchOutcome::Empty => (OutcomeKind::Empty, None),
                FetchOutcome::TransportError(reason) => {
                    (OutcomeKind::TransportError, Some(reason))
                }
            };

            match &detail {
                Some(reason) => warn!(symbol, attempt, max_attempts, ?kind, %reason, "attempt failed"),
                None => warn!(symbol, attempt, max_attempts, "no data for attempt {attempt} of {max_attempts}"),
            }
            self.report(request, attempt, max_attempts, kind, detail);

            if attempt < max_attempts {
                self.sleeper.sleep(request.retry_delay);
            }
        }

        warn!(symbol, max_attempts, "all attempts failed");
        self.observer.on_exhausted(symbol, max_attempts);
        None
    }

    fn report(
        &self,
        request: &FetchRequest,
        attempt: u32,
        max_attempts: u32,
        kind: OutcomeKind,
        detail: Option<String>,
    ) {
        self.observer.on_attempt_complete(&AttemptEvent {
            symbol: request.symbol.clone(),
            attempt,
            max_attempts,
            kind,
            detail,
        });
    }
}

/// Fetch `request` with no observer: the table on success, `None` once
/// every attempt has failed.
pub fn fetch_historical(
    provider: &dyn DataProvider,
    request: &FetchRequest,
) -> Option<NormalizedSeries> {
    Fetcher::new(provider).fetch(request)
}
