// src/fetch/facade.rs

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::ChainConfig;
use crate::fetch::client::{FetchError, HttpClient, QueryOutcome};

/// Per-query-kind enable flags for one source.
///
/// Absence of a kind means enabled, so new query kinds never need config
/// changes to start working (fail-open).
#[derive(Debug, Clone, Default)]
pub struct QueryToggles(BTreeMap<String, bool>);

impl QueryToggles {
    pub fn new(map: BTreeMap<String, bool>) -> Self {
        Self(map)
    }

    pub fn enabled(&self, kind: &str) -> bool {
        self.0.get(kind).copied().unwrap_or(true)
    }
}

/// Untagged envelope over LCD response bodies.
///
/// Error bodies carry `{"code": N, "message": "..."}` alongside a 200-level
/// status on some deployments; trying the error shape first lets us surface
/// those as failures instead of decode noise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Error { code: i64, message: String },
    Data(T),
}

/// One remote source: endpoint construction, query toggles, and the per-URL
/// staleness tracker layered over [`HttpClient`].
///
/// Built once at startup and shared across scrapes, so the height tracker
/// protects later scrapes against load-balanced backends that lag behind
/// ones observed earlier.
#[derive(Debug)]
pub struct Rpc {
    client: HttpClient,
    base_url: Url,
    toggles: QueryToggles,
    /// Target URL -> highest block height observed from it. Updated only on
    /// successful calls; monotonically non-decreasing per URL.
    heights: Mutex<HashMap<String, u64>>,
}

impl Rpc {
    pub fn new(
        chain: impl Into<String>,
        base_url: Url,
        toggles: QueryToggles,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(chain, timeout)?,
            base_url,
            toggles,
            heights: Mutex::new(HashMap::new()),
        })
    }

    pub fn from_chain_config(cfg: &ChainConfig, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(&cfg.lcd)
            .with_context(|| format!("chain '{}' lcd url", cfg.name))?;
        Self::new(
            cfg.name.clone(),
            base_url,
            QueryToggles::new(cfg.queries.clone()),
            timeout,
        )
    }

    pub fn chain(&self) -> &str {
        self.client.chain()
    }

    /// Highest block height recorded for a target URL, if any call to it has
    /// succeeded. Mainly useful for diagnostics and tests.
    pub fn last_height(&self, url: &str) -> Option<u64> {
        self.heights.lock().unwrap().get(url).copied()
    }

    /// Perform one query of the given kind against `path` (relative to the
    /// source's base URL).
    ///
    /// Returns `None` when the kind is disabled via config: no payload, no
    /// outcome, no error. Call sites cannot (and must not) distinguish that
    /// from "not applicable"; it is never counted as a failure.
    ///
    /// Otherwise returns the decoded body (or the failure) together with the
    /// outcome record for the rendering stage.
    pub async fn get<T: DeserializeOwned>(
        &self,
        kind: &str,
        path: &str,
    ) -> Option<(Result<T, FetchError>, QueryOutcome)> {
        if !self.toggles.enabled(kind) {
            debug!(chain = %self.chain(), kind, "query disabled; skipping");
            return None;
        }

        let url = match self.base_url.join(path) {
            Ok(u) => u,
            Err(e) => {
                // Malformed path is a wiring bug; report it as a failed call
                // rather than poisoning the whole task.
                let outcome = QueryOutcome {
                    chain: self.chain().to_string(),
                    url: format!("{}{}", self.base_url, path),
                    duration: Duration::ZERO,
                    success: false,
                };
                return Some((Err(FetchError::Url(e)), outcome));
            }
        };

        let prior = self.last_height(url.as_str()).unwrap_or(0);

        let (mut outcome, height, body) = self.client.get_json::<Envelope<T>>(&url, prior).await;

        let result = match body {
            Ok(Envelope::Data(value)) => Ok(value),
            Ok(Envelope::Error { code, message }) => {
                // Transport and decode succeeded, but the application said no.
                outcome.success = false;
                Err(FetchError::Application { code, message })
            }
            Err(e) => Err(e),
        };

        if outcome.success && height != 0 {
            // Max-merge rather than overwrite: two calls to the same URL may
            // overlap (sibling fan-out, concurrent scrapes), and the slower
            // one may carry the lower height. The recorded height must never
            // move backwards.
            let mut heights = self.heights.lock().unwrap();
            let entry = heights.entry(url.to_string()).or_insert(0);
            *entry = (*entry).max(height);
        }

        Some((result, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_fail_open() {
        let mut map = BTreeMap::new();
        map.insert("delegations".to_string(), false);
        map.insert("validators".to_string(), true);
        let toggles = QueryToggles::new(map);

        assert!(!toggles.enabled("delegations"));
        assert!(toggles.enabled("validators"));
        // Unknown kinds default to enabled.
        assert!(toggles.enabled("node-status"));
    }

    #[test]
    fn envelope_decodes_error_and_data() {
        let err: Envelope<Vec<u64>> =
            serde_json::from_str(r#"{"code": 5, "message": "not found"}"#).unwrap();
        assert!(matches!(err, Envelope::Error { code: 5, .. }));

        let data: Envelope<Vec<u64>> = serde_json::from_str("[1, 2, 3]").unwrap();
        assert!(matches!(data, Envelope::Data(v) if v == vec![1, 2, 3]));
    }
}
