//! reqwest-backed group fetcher.
//! Connection pooling via a shared client; the request races the load's
//! cancellation token.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{decode_group, Fetcher};
use crate::cache::TranslationGroup;
use crate::error::FetchError;

#[derive(Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    /// Wrap an already configured client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(
        &self,
        url: String,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<TranslationGroup, FetchError>> {
        let http = self.http.clone();
        Box::pin(async move {
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            let request = get_group(&http, &url);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(url = %url, "request dropped on cancellation");
                    Err(FetchError::Cancelled)
                }
                result = request => result,
            }
        })
    }
}

async fn get_group(http: &reqwest::Client, url: &str) -> Result<TranslationGroup, FetchError> {
    let response = http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    let body = response.bytes().await?;
    decode_group(&body)
}
