// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod fetch;
pub mod logging;
pub mod render;
pub mod server;
pub mod state;
pub mod tasks;

use std::sync::Arc;

use anyhow::Result;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::DagGraph;
use crate::tasks::{FetchContext, build_task_set};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the per-chain RPC facades (shared across scrapes)
/// - the HTTP server whose `/metrics` handler runs the scheduler
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    if args.check {
        print_check(&cfg)?;
        return Ok(());
    }

    let listen_addr = args.listen.unwrap_or_else(|| cfg.listen_addr.clone());
    let ctx = Arc::new(FetchContext::from_config(&cfg)?);

    server::serve(&listen_addr, ctx).await
}

/// `--check` output: validate the config and the built-in task graph, print
/// what a scrape would do, and exit without serving.
fn print_check(cfg: &ConfigFile) -> Result<()> {
    let tasks = build_task_set();
    let graph = DagGraph::from_tasks(&tasks)?;
    graph.validate()?;

    println!("fetchdag check");
    println!("  listen_addr = {}", cfg.listen_addr);
    println!("  timeout = {}s per remote call", cfg.timeout);
    println!();

    println!("chains ({}):", cfg.chain.len());
    for chain in cfg.chain.iter() {
        println!("  - {}", chain.name);
        println!("      lcd: {}", chain.lcd);
        if !chain.validators.is_empty() {
            println!("      validators: {}", chain.validators.len());
        }
        if let Some(ref currency) = chain.coingecko_currency {
            println!("      coingecko_currency: {currency}");
        }
        for (kind, enabled) in chain.queries.iter() {
            if !enabled {
                println!("      query disabled: {kind}");
            }
        }
    }
    println!();

    println!("tasks:");
    let mut names: Vec<&str> = graph.tasks().collect();
    names.sort_unstable();
    for name in names {
        let deps = graph.dependencies_of(name);
        if deps.is_empty() {
            println!("  - {name}");
        } else {
            println!("  - {name} (after: {})", deps.join(", "));
        }
    }

    Ok(())
}
