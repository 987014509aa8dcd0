// src/tasks/delegations.rs

use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use tracing::error;

use crate::dag::{Task, TaskOutput};
use crate::fetch::QueryOutcome;
use crate::state::Payload;
use crate::tasks::FetchContext;
use crate::tasks::validators;

pub const NAME: &str = "delegations";

const QUERY_KIND: &str = "delegations";

/// Validator operator address -> number of delegators.
pub type DelegationCounts = HashMap<String, u64>;

#[derive(Debug, Deserialize)]
struct DelegationsResponse {
    pagination: PaginationInfo,
}

#[derive(Debug, Deserialize)]
struct PaginationInfo {
    /// Total item count as a decimal string.
    total: String,
}

/// Counts delegators per validator.
///
/// Depends on [`validators::ValidatorsTask`]: only validators that actually
/// resolved there are queried, so a chain whose validator lookups all failed
/// costs no further calls here. With a degraded or `Absent` validators
/// payload this task still runs and simply stores empty counts.
pub struct DelegationsTask;

#[async_trait]
impl Task for DelegationsTask {
    fn name(&self) -> &str {
        NAME
    }

    fn dependencies(&self) -> Vec<String> {
        vec![validators::NAME.to_string()]
    }

    async fn run(&self, ctx: &FetchContext, deps: Vec<Payload>) -> TaskOutput {
        let resolved = match deps.first() {
            Some(payload) if !payload.is_absent() => payload
                .as_validators()
                .expect("delegations task wired to a non-validators payload")
                .clone(),
            _ => HashMap::new(),
        };

        let calls = ctx.chains.iter().flat_map(|chain| {
            let known = resolved
                .get(chain.rpc.chain())
                .map(|v| v.as_slice())
                .unwrap_or(&[]);

            known.iter().map(move |validator| {
                let address = validator.address.clone();
                async move {
                    let path = format!(
                        "/cosmos/staking/v1beta1/validators/{address}/delegations\
                         ?pagination.limit=1&pagination.count_total=true"
                    );
                    let reply = chain.rpc.get::<DelegationsResponse>(QUERY_KIND, &path).await;
                    (chain.rpc.chain().to_string(), address, reply)
                }
            })
        });

        let mut per_chain: HashMap<String, DelegationCounts> = HashMap::new();
        let mut outcomes: Vec<QueryOutcome> = Vec::new();
        let mut attempted = false;

        for (chain, address, reply) in join_all(calls).await {
            let Some((result, outcome)) = reply else {
                continue;
            };
            attempted = true;

            match result {
                Ok(response) => {
                    let total = response.pagination.total.parse().unwrap_or(0);
                    per_chain.entry(chain).or_default().insert(address, total);
                }
                Err(err) => {
                    error!(chain = %chain, url = %outcome.url, %err, "counting delegations failed");
                }
            }

            outcomes.push(outcome);
        }

        if !attempted {
            return TaskOutput::absent();
        }
        TaskOutput::new(Payload::Delegations(per_chain), outcomes)
    }
}
