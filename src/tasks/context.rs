// src/tasks/context.rs

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::config::ConfigFile;
use crate::fetch::{QueryToggles, Rpc};

/// One monitored chain as seen by the fetch tasks: its RPC facade plus the
/// config-derived bits tasks need (which validators to track, which currency
/// the chain's token is priced as).
#[derive(Debug, Clone)]
pub struct ChainHandle {
    pub rpc: Arc<Rpc>,
    pub validators: Vec<String>,
    pub currency: Option<String>,
}

/// Everything a task may reach for during a run.
///
/// Built once at startup and shared across scrapes; the facades inside carry
/// the per-URL height trackers, so staleness protection spans requests.
#[derive(Debug, Default)]
pub struct FetchContext {
    pub chains: Vec<ChainHandle>,
    /// Facade for the price API, when pricing is enabled.
    pub price_api: Option<Arc<Rpc>>,
}

impl FetchContext {
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let timeout = Duration::from_secs(cfg.timeout);

        let mut chains = Vec::with_capacity(cfg.chain.len());
        for chain_cfg in cfg.chain.iter() {
            let rpc = Rpc::from_chain_config(chain_cfg, timeout)?;
            chains.push(ChainHandle {
                rpc: Arc::new(rpc),
                validators: chain_cfg.validators.clone(),
                currency: chain_cfg.coingecko_currency.clone(),
            });
        }

        let price_api = if cfg.price.enabled {
            let base = Url::parse(&cfg.price.api).context("[price].api url")?;
            let rpc = Rpc::new("coingecko", base, QueryToggles::default(), timeout)?;
            Some(Arc::new(rpc))
        } else {
            None
        };

        Ok(Self { chains, price_api })
    }

    /// Context with no remote sources; useful for scheduler tests.
    pub fn empty() -> Self {
        Self::default()
    }
}
