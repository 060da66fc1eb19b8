//! Per-attempt progress hooks for the fetch loop.

use std::path::Path;
use std::sync::Mutex;

use crate::fetcher::OutcomeKind;

/// What one attempt ended as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptEvent {
    pub symbol: String,
    pub attempt: u32,
    pub max_attempts: u32,
    pub kind: OutcomeKind,
    /// Failure reason for `TransportError` / `StorageError`.
    pub detail: Option<String>,
}

/// Progress callback for the fetch loop.
pub trait FetchObserver {
    /// Called before the provider is invoked.
    fn on_attempt_start(&self, symbol: &str, attempt: u32, max_attempts: u32);

    /// Called once per attempt with its outcome.
    fn on_attempt_complete(&self, event: &AttemptEvent);

    /// Called after the artifact has been written.
    fn on_saved(&self, symbol: &str, path: &Path, rows: usize);

    /// Called when every attempt failed.
    fn on_exhausted(&self, symbol: &str, max_attempts: u32);
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl FetchObserver for NoopObserver {
    fn on_attempt_start(&self, _symbol: &str, _attempt: u32, _max_attempts: u32) {}
    fn on_attempt_complete(&self, _event: &AttemptEvent) {}
    fn on_saved(&self, _symbol: &str, _path: &Path, _rows: usize) {}
    fn on_exhausted(&self, _symbol: &str, _max_attempts: u32) {}
}

/// Simple progress reporter that prints to stdout.
pub struct ConsoleObserver;

impl FetchObserver for ConsoleObserver {
    fn on_attempt_start(&self, symbol: &str, attempt: u32, _max_attempts: u32) {
        println!("Downloading {symbol} data, attempt {attempt}...");
    }

    fn on_attempt_complete(&self, event: &AttemptEvent) {
        match event.kind {
            OutcomeKind::Success => {}
            OutcomeKind::Empty => println!(
                "No data returned for {}. Attempt {} of {}",
                event.symbol, event.attempt, event.max_attempts
            ),
            OutcomeKind::TransportError | OutcomeKind::StorageError => println!(
                "Attempt {} failed: {}",
                event.attempt,
                event.detail.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    fn on_saved(&self, symbol: &str, path: &Path, _rows: usize) {
        println!("Data for {symbol} saved to {}", path.display());
    }

    fn on_exhausted(&self, _symbol: &str, _max_attempts: u32) {
        println!("All attempts failed. Please check your network or try again later.");
    }
}

/// Observer that keeps every attempt event. Handy for tests and summaries.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<AttemptEvent>>,
    saved: Mutex<Option<(String, usize)>>,
    exhausted: Mutex<bool>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AttemptEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<OutcomeKind> {
        self.events().into_iter().map(|e| e.kind).collect()
    }

    /// `(path, rows)` of the saved artifact, if any.
    pub fn saved(&self) -> Option<(String, usize)> {
        self.saved.lock().ok().and_then(|s| s.clone())
    }

    pub fn exhausted(&self) -> bool {
        self.exhausted.lock().map(|e| *e).unwrap_or(false)
    }
}

impl FetchObserver for RecordingObserver {
    fn on_attempt_start(&self, _symbol: &str, _attempt: u32, _max_attempts: u32) {}

    fn on_attempt_complete(&self, event: &AttemptEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }

    fn on_saved(&self, _symbol: &str, path: &Path, rows: usize) {
        if let Ok(mut saved) = self.saved.lock() {
            *saved = Some((path.display().to_string(), rows));
        }
    }

    fn on_exhausted(&self, _symbol: &str, _max_attempts: u32) {
        if let Ok(mut exhausted) = self.exhausted.lock() {
            *exhausted = true;
        }
    }
}
