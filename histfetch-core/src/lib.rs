//! histfetch core — download one symbol's daily history and store it as CSV.
//!
//! - `data`: provider trait and Yahoo implementation, raw series model,
//!   column normalization, CSV artifact storage
//! - `fetcher`: the retry loop tying them together
//! - `observer`: per-attempt progress hooks
//! - `config`: TOML settings for the CLI

pub mod config;
pub mod data;
pub mod fetcher;
pub mod observer;

pub use config::{ConfigError, FetchConfig};
pub use fetcher::{fetch_historical, FetchOutcome, FetchRequest, Fetcher, OutcomeKind};
pub use observer::{AttemptEvent, ConsoleObserver, FetchObserver, NoopObserver, RecordingObserver};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types handed across threads stay Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<data::RawSeries>();
        require_sync::<data::RawSeries>();
        require_send::<data::NormalizedSeries>();
        require_sync::<data::NormalizedSeries>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<FetchRequest>();
        require_sync::<FetchRequest>();
        require_send::<FetchConfig>();
        require_sync::<FetchConfig>();
        require_send::<RecordingObserver>();
        require_sync::<RecordingObserver>();

        // The fetcher drives providers through a trait object.
        fn _provider_is_object_safe(provider: &dyn data::DataProvider) -> &str {
            provider.name()
        }
    }
}
