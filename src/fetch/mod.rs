//! Fetch boundary: `GET {host}/{language}/{path}` → one whole translation group.
//! The coordinator only sees the `Fetcher` trait; `HttpFetcher` is the
//! reqwest-backed implementation.

pub mod http;
#[cfg(test)]
pub(crate) mod scripted;

use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::cache::TranslationGroup;
use crate::error::FetchError;

pub use http::HttpFetcher;

/// Fetcher trait (adapter for different transports).
///
/// Once `cancel` fires before the fetch settles, the returned future must
/// resolve to `Err(FetchError::Cancelled)`.
pub trait Fetcher: Send + Sync {
    fn fetch(
        &self,
        url: String,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<TranslationGroup, FetchError>>;
}

/// Accept only a flat JSON object as a group body.
pub fn decode_group(body: &[u8]) -> Result<TranslationGroup, FetchError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    match value {
        Value::Object(group) => Ok(group),
        other => Err(FetchError::Decode(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
