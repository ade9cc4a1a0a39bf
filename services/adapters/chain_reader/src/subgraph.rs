//! Bulk pool discovery through the DEX subgraph

use crate::error::SubgraphError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const POOLS_QUERY: &str = r#"
query pools($skip: Int!, $first: Int!) {
  pools(skip: $skip, first: $first, orderBy: totalValueLockedUSD, orderDirection: desc) {
    id
    deployer
    totalValueLockedUSD
    token0 { id }
    token1 { id }
  }
}"#;

const POOLS_QUERY_AT_BLOCK: &str = r#"
query pools($skip: Int!, $first: Int!, $block: Int!) {
  pools(skip: $skip, first: $first, orderBy: totalValueLockedUSD, orderDirection: desc, block: { number: $block }) {
    id
    deployer
    totalValueLockedUSD
    token0 { id }
    token1 { id }
  }
}"#;

/// Token reference as returned by the subgraph
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SubgraphToken {
    pub id: String,
}

/// One pool row as returned by the subgraph. Addresses and TVL stay as the
/// raw strings the dataset serves; the registry validates them.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SubgraphPool {
    pub id: String,
    #[serde(default)]
    pub deployer: Option<String>,
    #[serde(rename = "totalValueLockedUSD", default)]
    pub total_value_locked_usd: String,
    pub token0: SubgraphToken,
    pub token1: SubgraphToken,
}

/// Paginated access to the indexed pool dataset
#[async_trait]
pub trait SubgraphClient: Send + Sync {
    /// Fetch one page of pools ordered by TVL descending, as of `block` when
    /// given and the latest indexed block otherwise.
    async fn query_pools(
        &self,
        skip: usize,
        first: usize,
        block: Option<u64>,
    ) -> Result<Vec<SubgraphPool>, SubgraphError>;
}

/// `SubgraphClient` over GraphQL-on-HTTP
pub struct HttpSubgraph {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpSubgraph {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }

    fn request_body(skip: usize, first: usize, block: Option<u64>) -> Value {
        match block {
            Some(number) => json!({
                "query": POOLS_QUERY_AT_BLOCK,
                "variables": { "skip": skip, "first": first, "block": number },
            }),
            None => json!({
                "query": POOLS_QUERY,
                "variables": { "skip": skip, "first": first },
            }),
        }
    }

    async fn post(&self, body: &Value) -> Result<Value, SubgraphError> {
        let response = self
            .client
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| SubgraphError::Transport(e.to_string()))?;

        response
            .json::<Value>()
            .await
            .map_err(|e| SubgraphError::Decode(e.to_string()))
    }
}

/// Turn a GraphQL response envelope into pool rows or a classified error
pub fn parse_pools_response(
    response: Value,
    block: Option<u64>,
) -> Result<Vec<SubgraphPool>, SubgraphError> {
    if let Some(errors) = response.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| e.to_string())
                })
                .collect();
            return Err(SubgraphError::from_graph_errors(messages, block));
        }
    }

    let pools = response
        .get("data")
        .and_then(|data| data.get("pools"))
        .cloned()
        .ok_or_else(|| SubgraphError::Decode("response has no data.pools".to_string()))?;

    serde_json::from_value(pools).map_err(|e| SubgraphError::Decode(e.to_string()))
}

#[async_trait]
impl SubgraphClient for HttpSubgraph {
    async fn query_pools(
        &self,
        skip: usize,
        first: usize,
        block: Option<u64>,
    ) -> Result<Vec<SubgraphPool>, SubgraphError> {
        let body = Self::request_body(skip, first, block);
        debug!("Querying subgraph pools skip={} first={} block={:?}", skip, first, block);

        let response = tokio::time::timeout(self.timeout, self.post(&body))
            .await
            .map_err(|_| SubgraphError::Timeout(self.timeout.as_millis() as u64))??;

        parse_pools_response(response, block)
    }
}
