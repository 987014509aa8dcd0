// src/config/validate.rs

use std::collections::HashSet;

use anyhow::{Context, Result, anyhow};
use url::Url;

use crate::config::model::ConfigFile;

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - there is at least one `[[chain]]` entry
/// - chain names are unique and non-empty
/// - every `lcd` base URL and the price API URL parse
/// - `timeout >= 1`
///
/// Task-graph feasibility (cycles, dangling dependency references) is checked
/// separately by [`crate::dag::DagGraph::validate`], since the task set is
/// assembled per scrape, not read from config.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_chains(cfg)?;
    validate_chains(cfg)?;
    validate_global(cfg)?;
    Ok(())
}

fn ensure_has_chains(cfg: &ConfigFile) -> Result<()> {
    if cfg.chain.is_empty() {
        return Err(anyhow!("config must contain at least one [[chain]] entry"));
    }
    Ok(())
}

fn validate_chains(cfg: &ConfigFile) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::new();

    for chain in cfg.chain.iter() {
        if chain.name.trim().is_empty() {
            return Err(anyhow!("chain entries must have a non-empty `name`"));
        }
        if !seen.insert(chain.name.as_str()) {
            return Err(anyhow!("duplicate chain name '{}'", chain.name));
        }

        Url::parse(&chain.lcd)
            .with_context(|| format!("chain '{}' has an invalid `lcd` URL", chain.name))?;

        for addr in chain.validators.iter() {
            if addr.trim().is_empty() {
                return Err(anyhow!(
                    "chain '{}' has an empty validator address entry",
                    chain.name
                ));
            }
        }
    }

    Ok(())
}

fn validate_global(cfg: &ConfigFile) -> Result<()> {
    if cfg.timeout == 0 {
        return Err(anyhow!("`timeout` must be >= 1 second (got 0)"));
    }

    Url::parse(&cfg.price.api).context("invalid [price].api URL")?;

    Ok(())
}
