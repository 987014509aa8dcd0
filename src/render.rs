// src/render.rs

//! Per-scrape metric rendering.
//!
//! A fresh `prometheus::Registry` is built for every scrape from the run's
//! [`State`] and outcome list, then encoded to exposition text. Nothing is
//! retained between scrapes.

use anyhow::{Context, Result, anyhow};
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::fetch::QueryOutcome;
use crate::state::State;
use crate::tasks::{delegations, node_status, price, validators};

pub fn render(state: &State, outcomes: &[QueryOutcome]) -> Result<String> {
    let registry = Registry::new();

    render_node_status(&registry, state)?;
    render_validators(&registry, state)?;
    render_delegations(&registry, state)?;
    render_prices(&registry, state)?;
    render_outcomes(&registry, outcomes)?;

    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .context("encoding metrics")?;
    String::from_utf8(buffer).context("metrics output was not utf-8")
}

fn gauge(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> Result<GaugeVec> {
    let gauge = GaugeVec::new(Opts::new(name, help), labels)?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

/// Pull a task's payload out of the store, distinguishing "never ran /
/// explicitly absent" (renders nothing) from "wrong variant" (a
/// producer/consumer contract bug, which fails the scrape).
macro_rules! payload_or_return {
    ($state:expr, $task:path, $accessor:ident) => {
        match $state.get($task) {
            None => return Ok(()),
            Some(payload) if payload.is_absent() => return Ok(()),
            Some(payload) => payload
                .$accessor()
                .ok_or_else(|| anyhow!("'{}' payload has the wrong type", $task))?
                .clone(),
        }
    };
}

fn render_node_status(registry: &Registry, state: &State) -> Result<()> {
    let statuses = payload_or_return!(state, node_status::NAME, as_node_status);

    let height = gauge(
        registry,
        "fetchdag_chain_height",
        "Latest block height reported by the chain's node.",
        &["chain", "chain_id"],
    )?;

    for (chain, status) in statuses.iter() {
        height
            .with_label_values(&[chain, &status.chain_id])
            .set(status.height as f64);
    }
    Ok(())
}

fn render_validators(registry: &Registry, state: &State) -> Result<()> {
    let per_chain = payload_or_return!(state, validators::NAME, as_validators);

    let tokens = gauge(
        registry,
        "fetchdag_validator_tokens",
        "Validator's bonded tokens in base denom.",
        &["chain", "address", "moniker"],
    )?;
    let jailed = gauge(
        registry,
        "fetchdag_validator_jailed",
        "1 when the validator is jailed.",
        &["chain", "address", "moniker"],
    )?;

    for (chain, validators) in per_chain.iter() {
        for v in validators {
            let labels = [chain.as_str(), v.address.as_str(), v.moniker.as_str()];
            tokens.with_label_values(&labels).set(v.tokens);
            jailed
                .with_label_values(&labels)
                .set(if v.jailed { 1.0 } else { 0.0 });
        }
    }
    Ok(())
}

fn render_delegations(registry: &Registry, state: &State) -> Result<()> {
    let per_chain = payload_or_return!(state, delegations::NAME, as_delegations);

    let delegators = gauge(
        registry,
        "fetchdag_validator_delegators",
        "Number of delegators on the validator.",
        &["chain", "address"],
    )?;

    for (chain, counts) in per_chain.iter() {
        for (address, count) in counts {
            delegators
                .with_label_values(&[chain, address])
                .set(*count as f64);
        }
    }
    Ok(())
}

fn render_prices(registry: &Registry, state: &State) -> Result<()> {
    let prices = payload_or_return!(state, price::NAME, as_prices);

    let price = gauge(
        registry,
        "fetchdag_token_price_usd",
        "Token price in USD.",
        &["currency"],
    )?;

    for (currency, usd) in prices.iter() {
        price.with_label_values(&[currency]).set(*usd);
    }
    Ok(())
}

fn render_outcomes(registry: &Registry, outcomes: &[QueryOutcome]) -> Result<()> {
    if outcomes.is_empty() {
        return Ok(());
    }

    let success = gauge(
        registry,
        "fetchdag_query_success",
        "1 when the remote query succeeded.",
        &["chain", "url"],
    )?;
    let duration = gauge(
        registry,
        "fetchdag_query_duration_seconds",
        "Wall time of the remote query.",
        &["chain", "url"],
    )?;

    for outcome in outcomes {
        let labels = [outcome.chain.as_str(), outcome.url.as_str()];
        success
            .with_label_values(&labels)
            .set(if outcome.success { 1.0 } else { 0.0 });
        duration
            .with_label_values(&labels)
            .set(outcome.duration.as_secs_f64());
    }
    Ok(())
}
