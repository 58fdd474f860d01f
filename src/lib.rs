//! Lingo: lazy, language-scoped translation cache.
//! Groups of translations are fetched on first use from
//! `{host}/{language}/{path}`, cached per language, and discarded (along
//! with any in-flight fetch) when the language changes.

pub mod cache;
pub mod cancellation;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fetch;
pub mod metrics;
pub mod resolver;
pub mod translation;

pub use cache::{Revision, TranslationGroup};
pub use config::SessionConfig;
pub use error::{ConfigError, FetchError, SessionError};
pub use fetch::{Fetcher, HttpFetcher};
pub use metrics::{LoadStats, MetricSummary};
pub use resolver::Session;
pub use translation::Translation;

/// Install a fmt subscriber filtered by `RUST_LOG` (default `lingo=debug`).
/// `LINGO_LOG_FORMAT=json` switches to JSON lines. Safe to call more than once.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lingo=debug"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);
    let json = std::env::var("LINGO_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
