//! Pool state errors

use chain_reader::{ReaderError, SubgraphError};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Bulk pool load failed at offset {skip}: {source}")]
    BulkLoad {
        skip: usize,
        #[source]
        source: SubgraphError,
    },

    #[error("Page size must be non-zero")]
    InvalidPageSize,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Reader(#[from] ReaderError),

    #[error("Pool view call {0} reverted")]
    CallFailed(&'static str),

    #[error("Failed to decode {call}: {reason}")]
    Decode { call: &'static str, reason: String },
}
