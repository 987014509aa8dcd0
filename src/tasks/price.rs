// src/tasks/price.rs

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::error;

use crate::dag::{Task, TaskOutput};
use crate::state::Payload;
use crate::tasks::FetchContext;

pub const NAME: &str = "price";

const QUERY_KIND: &str = "price";

/// CoinGecko simple-price shape: currency id -> { "usd": price }.
type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

/// Fetches USD prices for every priced chain token in a single call.
///
/// The price API sends no block-height header, so the facade's staleness
/// guard never fires for this source.
pub struct PriceTask;

#[async_trait]
impl Task for PriceTask {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, ctx: &FetchContext, _deps: Vec<Payload>) -> TaskOutput {
        let Some(api) = ctx.price_api.as_ref() else {
            return TaskOutput::absent();
        };

        let mut ids: Vec<&str> = ctx
            .chains
            .iter()
            .filter_map(|chain| chain.currency.as_deref())
            .collect();
        ids.sort_unstable();
        ids.dedup();

        if ids.is_empty() {
            return TaskOutput::absent();
        }

        let path = format!(
            "/api/v3/simple/price?ids={}&vs_currencies=usd",
            ids.join(",")
        );

        let Some((result, outcome)) = api.get::<SimplePriceResponse>(QUERY_KIND, &path).await
        else {
            return TaskOutput::absent();
        };

        let mut prices: HashMap<String, f64> = HashMap::new();
        match result {
            Ok(response) => {
                for (id, quotes) in response {
                    if let Some(usd) = quotes.get("usd") {
                        prices.insert(id, *usd);
                    }
                }
            }
            Err(err) => {
                error!(url = %outcome.url, %err, "fetching token prices failed");
            }
        }

        TaskOutput::new(Payload::Prices(prices), vec![outcome])
    }
}
