//! Remote reader for the liquidity view
//!
//! Two collaborators sit behind traits so the registry, synchronizer and
//! sampler can be driven by in-memory doubles in tests:
//!
//! - [`RemoteReader`]: batched read-only calls at a block height
//! - [`SubgraphClient`]: paginated bulk pool discovery
//!
//! Every remote request is bounded by a timeout and failures are reported
//! through typed errors.

pub mod error;
pub mod multicall;
pub mod subgraph;

pub use error::{ReaderError, SubgraphError};
pub use multicall::{Call, CallResult, RemoteReader, Web3Multicall};
pub use subgraph::{
    parse_pools_response, HttpSubgraph, SubgraphClient, SubgraphPool, SubgraphToken,
};
