// src/tasks/node_status.rs

use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use tracing::error;

use crate::dag::{Task, TaskOutput};
use crate::fetch::QueryOutcome;
use crate::state::Payload;
use crate::tasks::FetchContext;

pub const NAME: &str = "node-status";

const QUERY_KIND: &str = "node-status";
const LATEST_BLOCK_PATH: &str = "/cosmos/base/tendermint/v1beta1/blocks/latest";

/// What this task stores per chain.
#[derive(Debug, Clone)]
pub struct NodeStatus {
    pub height: u64,
    pub chain_id: String,
}

#[derive(Debug, Deserialize)]
struct LatestBlockResponse {
    block: BlockBody,
}

#[derive(Debug, Deserialize)]
struct BlockBody {
    header: BlockHeader,
}

#[derive(Debug, Deserialize)]
struct BlockHeader {
    chain_id: String,
    /// Decimal string in LCD responses.
    height: String,
}

/// Fetches the latest block header from every chain concurrently.
pub struct NodeStatusTask;

#[async_trait]
impl Task for NodeStatusTask {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, ctx: &FetchContext, _deps: Vec<Payload>) -> TaskOutput {
        let calls = ctx.chains.iter().map(|chain| async {
            let reply = chain
                .rpc
                .get::<LatestBlockResponse>(QUERY_KIND, LATEST_BLOCK_PATH)
                .await;
            (chain.rpc.chain().to_string(), reply)
        });

        let mut statuses: HashMap<String, NodeStatus> = HashMap::new();
        let mut outcomes: Vec<QueryOutcome> = Vec::new();
        let mut attempted = false;

        for (chain, reply) in join_all(calls).await {
            let Some((result, outcome)) = reply else {
                continue; // query disabled for this chain
            };
            attempted = true;

            match result {
                Ok(response) => {
                    let header = response.block.header;
                    statuses.insert(
                        chain,
                        NodeStatus {
                            height: header.height.parse().unwrap_or(0),
                            chain_id: header.chain_id,
                        },
                    );
                }
                Err(err) => {
                    error!(chain = %chain, url = %outcome.url, %err, "fetching latest block failed");
                }
            }

            outcomes.push(outcome);
        }

        if !attempted {
            return TaskOutput::absent();
        }
        TaskOutput::new(Payload::NodeStatus(statuses), outcomes)
    }
}
