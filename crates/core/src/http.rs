//! Shared HTTP fetcher
//!
//! One retrying client for every upstream data source. Providers layer
//! their own parsing on top; transport failures surface as `Err` and are
//! collapsed to absence at the provider boundary.

use std::time::Duration;

use anyhow::{anyhow, Error};
use reqwest::{Client, Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use slog::{debug, Logger};

pub struct HttpFetcher {
    logger: Logger,
    client: ClientWithMiddleware,
}

impl HttpFetcher {
    pub fn new(logger: Logger, user_agent: &str) -> Result<HttpFetcher, Error> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(2);
        let client = ClientBuilder::new(Client::builder().user_agent(user_agent).build()?)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        Ok(HttpFetcher { logger, client })
    }

    /// GET a URL, returning the raw response. Non-2xx statuses are returned
    /// to the caller, which may treat e.g. 404 as "not published yet".
    pub async fn get(&self, url: &str, timeout: Duration) -> Result<Response, Error> {
        debug!(self.logger, "requesting: {}", url);
        self.client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| anyhow!("error sending request to {}: {}", url, e))
    }

    /// GET a URL and return its body, failing on any non-success status.
    pub async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String, Error> {
        let response = self.get(url, timeout).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("error response {} from {}", status, url));
        }
        response
            .text()
            .await
            .map_err(|e| anyhow!("error reading body from {}: {}", url, e))
    }

    /// GET a URL, distinguishing "not there" from transport failure.
    /// Returns `Ok(None)` on 404, `Ok(Some(body))` on success.
    pub async fn fetch_text_opt(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<Option<String>, Error> {
        let response = self.get(url, timeout).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(anyhow!("error response {} from {}", response.status(), url));
        }
        let body = response
            .text()
            .await
            .map_err(|e| anyhow!("error reading body from {}: {}", url, e))?;
        Ok(Some(body))
    }
}
