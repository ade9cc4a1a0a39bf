//! Typed failures of the remote collaborators

use dex::DecodingError;
use thiserror::Error;

/// Batched `eth_call` failures
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("RPC transport error: {0}")]
    Transport(String),

    #[error("Batch call timed out after {0}ms")]
    Timeout(u64),

    #[error("Failed to decode batch response: {0}")]
    Decode(#[from] DecodingError),

    #[error("Batch returned {got} results for {expected} calls")]
    LengthMismatch { expected: usize, got: usize },
}

/// Subgraph query failures
#[derive(Debug, Error)]
pub enum SubgraphError {
    /// The requested block is not indexed yet; callers may retry at latest
    #[error("Block {0} not yet indexed by subgraph")]
    BlockNotIndexed(u64),

    #[error("Subgraph transport error: {0}")]
    Transport(String),

    #[error("Subgraph query timed out after {0}ms")]
    Timeout(u64),

    #[error("Subgraph returned errors: {}", .0.join("; "))]
    Graph(Vec<String>),

    #[error("Unexpected subgraph response: {0}")]
    Decode(String),
}

impl SubgraphError {
    /// Classify a list of GraphQL error messages for a query pinned at `block`
    pub fn from_graph_errors(messages: Vec<String>, block: Option<u64>) -> Self {
        match block {
            Some(number) if messages.iter().any(|m| reports_missing_block(m)) => {
                SubgraphError::BlockNotIndexed(number)
            }
            _ => SubgraphError::Graph(messages),
        }
    }
}

fn reports_missing_block(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("missing block")
        || message.contains("not yet available")
        || message.contains("has only indexed up to block")
}
