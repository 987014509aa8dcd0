// src/fetch/client.rs

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

/// Response header carrying the block height the answering node was at.
///
/// Cosmos LCD deployments set this on every response; behind a load balancer
/// it is the only signal that lets us notice one backend lagging another.
pub const BLOCK_HEIGHT_HEADER: &str = "grpc-metadata-x-cosmos-block-height";

const USER_AGENT: &str = concat!("fetchdag/", env!("CARGO_PKG_VERSION"));

/// Record of one attempted remote call, kept for the rendering stage.
///
/// Disabled queries produce no outcome at all; everything actually sent over
/// the wire produces exactly one, successful or not.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// Logical source identifier (chain name, or e.g. "coingecko").
    pub chain: String,
    /// Fully-formed target URL.
    pub url: String,
    /// Wall time spent on the call, including body read and decode.
    pub duration: Duration,
    pub success: bool,
}

/// Why a remote call failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected http status {0}")]
    Status(StatusCode),

    #[error("decoding response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response was well-formed but reported a block height behind one we
    /// have already seen from this URL; the payload cannot be trusted.
    #[error("stale response: height {observed} regressed below previously observed {prior}")]
    Stale { prior: u64, observed: u64 },

    /// The transport succeeded but the body carried an application-level
    /// error envelope (non-zero `code`).
    #[error("application error code {code}: {message}")]
    Application { code: i64, message: String },

    #[error("building endpoint url: {0}")]
    Url(#[from] url::ParseError),
}

/// Thin timed-GET client with staleness guarding.
///
/// One instance per remote source; the per-call timeout is fixed at
/// construction and applies uniformly to every call.
#[derive(Debug, Clone)]
pub struct HttpClient {
    chain: String,
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(chain: impl Into<String>, timeout: Duration) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("building http client")?;

        Ok(Self {
            chain: chain.into(),
            inner,
        })
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }

    /// Issue one timed GET and decode the body as JSON into `T`.
    ///
    /// Returns `(outcome, observed_height, body)`. The outcome is produced on
    /// every path, with the elapsed duration at the point of failure. The
    /// observed height is `0` when the response carried no height header (or
    /// never arrived).
    ///
    /// If the response reports a height strictly below a non-zero
    /// `prior_height`, the call is failed with [`FetchError::Stale`] even
    /// when transport and decode both succeeded: the caller must not trust
    /// the payload, and must not advance its height tracker.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        prior_height: u64,
    ) -> (QueryOutcome, u64, Result<T, FetchError>) {
        let started = Instant::now();

        let response = match self.inner.get(url.clone()).send().await {
            Ok(r) => r,
            Err(e) => {
                return (self.outcome(url, started, false), 0, Err(e.into()));
            }
        };

        let height = extract_height(response.headers());
        let status = response.status();
        if !status.is_success() {
            return (
                self.outcome(url, started, false),
                height,
                Err(FetchError::Status(status)),
            );
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                return (self.outcome(url, started, false), height, Err(e.into()));
            }
        };

        let decoded = serde_json::from_str::<T>(&body);

        if height != 0 && prior_height != 0 && height < prior_height {
            return (
                self.outcome(url, started, false),
                height,
                Err(FetchError::Stale {
                    prior: prior_height,
                    observed: height,
                }),
            );
        }

        match decoded {
            Ok(value) => (self.outcome(url, started, true), height, Ok(value)),
            Err(e) => (self.outcome(url, started, false), height, Err(e.into())),
        }
    }

    fn outcome(&self, url: &Url, started: Instant, success: bool) -> QueryOutcome {
        QueryOutcome {
            chain: self.chain.clone(),
            url: url.to_string(),
            duration: started.elapsed(),
            success,
        }
    }
}

/// Pull the block-height marker out of the response headers, if present.
fn extract_height(headers: &HeaderMap) -> u64 {
    headers
        .get(BLOCK_HEIGHT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0)
}
