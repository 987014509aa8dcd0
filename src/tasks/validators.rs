// src/tasks/validators.rs

use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use tracing::error;

use crate::dag::{Task, TaskOutput};
use crate::fetch::QueryOutcome;
use crate::state::Payload;
use crate::tasks::FetchContext;

pub const NAME: &str = "validators";

const QUERY_KIND: &str = "validators";

/// What this task stores per tracked validator.
#[derive(Debug, Clone)]
pub struct ValidatorInfo {
    pub address: String,
    pub moniker: String,
    pub jailed: bool,
    pub status: String,
    pub tokens: f64,
}

#[derive(Debug, Deserialize)]
struct ValidatorResponse {
    validator: ValidatorBody,
}

#[derive(Debug, Deserialize)]
struct ValidatorBody {
    operator_address: String,
    description: ValidatorDescription,
    #[serde(default)]
    jailed: bool,
    status: String,
    /// Base-denom amount as a decimal string.
    tokens: String,
}

#[derive(Debug, Deserialize)]
struct ValidatorDescription {
    moniker: String,
}

/// Fetches every configured validator on every chain, one call per address.
pub struct ValidatorsTask;

#[async_trait]
impl Task for ValidatorsTask {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, ctx: &FetchContext, _deps: Vec<Payload>) -> TaskOutput {
        let calls = ctx.chains.iter().flat_map(|chain| {
            chain.validators.iter().map(move |address| async move {
                let path = format!("/cosmos/staking/v1beta1/validators/{address}");
                let reply = chain.rpc.get::<ValidatorResponse>(QUERY_KIND, &path).await;
                (chain.rpc.chain().to_string(), reply)
            })
        });

        let mut per_chain: HashMap<String, Vec<ValidatorInfo>> = HashMap::new();
        let mut outcomes: Vec<QueryOutcome> = Vec::new();
        let mut attempted = false;

        for (chain, reply) in join_all(calls).await {
            let Some((result, outcome)) = reply else {
                continue;
            };
            attempted = true;

            match result {
                Ok(response) => {
                    let v = response.validator;
                    per_chain.entry(chain).or_default().push(ValidatorInfo {
                        address: v.operator_address,
                        moniker: v.description.moniker,
                        jailed: v.jailed,
                        status: v.status,
                        tokens: v.tokens.parse().unwrap_or(0.0),
                    });
                }
                Err(err) => {
                    error!(chain = %chain, url = %outcome.url, %err, "fetching validator failed");
                }
            }

            outcomes.push(outcome);
        }

        if !attempted {
            return TaskOutput::absent();
        }
        TaskOutput::new(Payload::Validators(per_chain), outcomes)
    }
}
