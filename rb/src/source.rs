//! Status API client
//!
//! The poller only sees the [`StatusSource`] trait; [`PracticumClient`] is
//! the reqwest-backed implementation used by the binary.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::FetchError;

/// Undecoded answer from the status API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches homework statuses updated since a timestamp
///
/// Any HTTP answer, including error statuses, is a successful fetch.
/// `Err` is reserved for transport failures.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self, from_date: i64) -> Result<RawReply, FetchError>;
}

/// Homework status API client
pub struct PracticumClient {
    endpoint: String,
    token: String,
    http: Client,
    timeout: Duration,
}

impl PracticumClient {
    pub fn new(config: &ApiConfig, token: impl Into<String>) -> Result<Self, FetchError> {
        debug!(endpoint = %config.endpoint, timeout_ms = config.timeout_ms, "PracticumClient::new: called");
        let timeout = config.timeout();
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            token: token.into(),
            http,
            timeout,
        })
    }

    fn authorization(&self) -> String {
        format!("OAuth {}", self.token)
    }

    /// Timeouts get their own variant whether they hit the send or the body read
    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network(e)
        }
    }

    fn build_request(&self, from_date: i64) -> reqwest::RequestBuilder {
        self.http
            .get(&self.endpoint)
            .header("Authorization", self.authorization())
            .query(&[("from_date", from_date)])
    }
}

#[async_trait]
impl StatusSource for PracticumClient {
    async fn fetch(&self, from_date: i64) -> Result<RawReply, FetchError> {
        debug!(from_date, "fetch: called");

        let response = self
            .build_request(from_date)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| self.classify(e))?.to_vec();

        debug!(status, bytes = body.len(), "fetch: response received");
        Ok(RawReply { status, body })
    }
}
