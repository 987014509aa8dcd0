// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// listen_addr = "127.0.0.1:9560"
/// timeout = 10
///
/// [[chain]]
/// name = "cosmoshub"
/// lcd = "https://api.cosmos.network"
/// validators = ["cosmosvaloper1..."]
/// coingecko_currency = "cosmos"
///
/// [chain.queries]
/// delegations = false
///
/// [price]
/// enabled = true
/// ```
///
/// All sections except `[[chain]]` are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Address the exporter listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Per-remote-call timeout in seconds, uniform for every wave.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// One entry per monitored chain, from `[[chain]]`.
    #[serde(default)]
    pub chain: Vec<ChainConfig>,

    /// Price-source settings from `[price]`.
    #[serde(default)]
    pub price: PriceSection,
}

fn default_listen_addr() -> String {
    "127.0.0.1:9560".to_string()
}

fn default_timeout() -> u64 {
    10
}

/// `[[chain]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    /// Logical chain identifier; becomes the `chain` label on every metric
    /// and outcome produced for this source.
    pub name: String,

    /// Base URL of the chain's LCD REST endpoint.
    pub lcd: String,

    /// Validator operator addresses to track on this chain.
    #[serde(default)]
    pub validators: Vec<String>,

    /// CoinGecko currency id for this chain's token, if priced.
    #[serde(default)]
    pub coingecko_currency: Option<String>,

    /// Per-query-kind toggles. An absent kind is enabled (fail-open).
    ///
    /// ```toml
    /// [chain.queries]
    /// delegations = false
    /// ```
    #[serde(default)]
    pub queries: BTreeMap<String, bool>,
}

/// `[price]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceSection {
    /// Whether the price task runs at all.
    #[serde(default = "default_price_enabled")]
    pub enabled: bool,

    /// Base URL of the CoinGecko-style API.
    #[serde(default = "default_price_api")]
    pub api: String,
}

fn default_price_enabled() -> bool {
    true
}

fn default_price_api() -> String {
    "https://api.coingecko.com".to_string()
}

impl Default for PriceSection {
    fn default() -> Self {
        Self {
            enabled: default_price_enabled(),
            api: default_price_api(),
        }
    }
}
