use std::collections::BTreeMap;
use std::sync::Arc;

use fetchdag::config::{ChainConfig, ConfigFile, PriceSection};
use fetchdag::dag::Controller;
use fetchdag::fetch::BLOCK_HEIGHT_HEADER;
use fetchdag::render::render;
use fetchdag::tasks::{FetchContext, build_task_set};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_lcd(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/cosmos/base/tendermint/v1beta1/blocks/latest"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(BLOCK_HEIGHT_HEADER, "123")
                .set_body_json(json!({
                    "block": {
                        "header": {
                            "chain_id": "test-1",
                            "height": "123",
                            "time": "2026-01-01T00:00:00Z"
                        }
                    }
                })),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cosmos/staking/v1beta1/validators/testvaloper1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(BLOCK_HEIGHT_HEADER, "123")
                .set_body_json(json!({
                    "validator": {
                        "operator_address": "testvaloper1",
                        "description": { "moniker": "guard" },
                        "jailed": false,
                        "status": "BOND_STATUS_BONDED",
                        "tokens": "1000000"
                    }
                })),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(
            "/cosmos/staking/v1beta1/validators/testvaloper1/delegations",
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(BLOCK_HEIGHT_HEADER, "123")
                .set_body_json(json!({
                    "delegation_responses": [],
                    "pagination": { "next_key": null, "total": "42" }
                })),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/simple/price"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"testcoin": {"usd": 1.5}})),
        )
        .mount(server)
        .await;
}

fn chain(name: &str, lcd: String) -> ChainConfig {
    ChainConfig {
        name: name.to_string(),
        lcd,
        validators: vec!["testvaloper1".to_string()],
        coingecko_currency: Some("testcoin".to_string()),
        queries: BTreeMap::new(),
    }
}

fn config(chains: Vec<ChainConfig>, price_api: String) -> ConfigFile {
    ConfigFile {
        listen_addr: "127.0.0.1:0".to_string(),
        timeout: 5,
        chain: chains,
        price: PriceSection {
            enabled: true,
            api: price_api,
        },
    }
}

#[tokio::test]
async fn full_scrape_collects_and_renders_all_sources() {
    let server = MockServer::start().await;
    mount_lcd(&server).await;

    let cfg = config(vec![chain("testchain", server.uri())], server.uri());
    let ctx = Arc::new(FetchContext::from_config(&cfg).unwrap());

    let (state, outcomes) = Controller::new(build_task_set())
        .run(ctx)
        .await
        .unwrap();

    // node-status + validator + delegations + price.
    assert_eq!(outcomes.len(), 4);
    assert!(outcomes.iter().all(|o| o.success));

    let text = render(&state, &outcomes).unwrap();
    assert!(text.contains("fetchdag_chain_height"));
    assert!(text.contains("test-1"));
    assert!(text.contains("fetchdag_validator_tokens"));
    assert!(text.contains("guard"));
    assert!(text.contains("fetchdag_validator_delegators"));
    assert!(text.contains("42"));
    assert!(text.contains("fetchdag_token_price_usd"));
    assert!(text.contains("fetchdag_query_success"));
}

#[tokio::test]
async fn unreachable_chain_degrades_without_blocking_the_rest() {
    let server = MockServer::start().await;
    mount_lcd(&server).await;

    // Second chain points at a dead endpoint; everything about it fails,
    // nothing about the healthy chain or the dependent task does.
    let cfg = config(
        vec![
            chain("testchain", server.uri()),
            chain("deadchain", "http://127.0.0.1:9".to_string()),
        ],
        server.uri(),
    );
    let ctx = Arc::new(FetchContext::from_config(&cfg).unwrap());

    let (state, outcomes) = Controller::new(build_task_set())
        .run(ctx)
        .await
        .unwrap();

    // node-status x2, validators x2, delegations only for the chain whose
    // validator resolved, price x1.
    assert_eq!(outcomes.len(), 6);
    assert!(outcomes.iter().any(|o| !o.success));
    assert!(
        outcomes
            .iter()
            .filter(|o| o.chain == "testchain")
            .all(|o| o.success)
    );

    // The dependent task ran and produced data for the healthy chain.
    let delegations = state.get("delegations").unwrap();
    let per_chain = delegations.as_delegations().unwrap();
    assert_eq!(
        per_chain.get("testchain").unwrap().get("testvaloper1"),
        Some(&42)
    );
    assert!(!per_chain.contains_key("deadchain"));

    let text = render(&state, &outcomes).unwrap();
    assert!(text.contains("fetchdag_query_success"));
    assert!(text.contains("deadchain"));
}

#[tokio::test]
async fn disabled_query_kind_contributes_no_outcome() {
    let server = MockServer::start().await;
    mount_lcd(&server).await;

    let mut cfg = config(vec![chain("testchain", server.uri())], server.uri());
    cfg.chain[0]
        .queries
        .insert("delegations".to_string(), false);

    let ctx = Arc::new(FetchContext::from_config(&cfg).unwrap());
    let (state, outcomes) = Controller::new(build_task_set())
        .run(ctx)
        .await
        .unwrap();

    // Neither a success nor a failure is recorded for the disabled kind.
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| o.success));
    assert!(
        !outcomes
            .iter()
            .any(|o| o.url.contains("/delegations"))
    );

    // The producer still completed, with an explicitly absent payload.
    assert!(state.get("delegations").unwrap().is_absent());
}
