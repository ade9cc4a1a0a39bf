//! # Pool State - Registry, Synchronizers and Live Routing
//!
//! ## Purpose
//!
//! Maintains a best-effort-fresh view of Algebra Integral pools: which pools
//! exist for a token pair, and what each tracked pool's price, tick and
//! liquidity currently look like.
//!
//! ## Architecture Role
//!
//! ```text
//! Subgraph pages ──▶ [PoolRegistry] ◀── factory Pool/CustomPool logs
//!                          │                      ▲
//!                          ▼                      │
//!                   pair lookups           [LogRouter] ◀── [LiveFeed] (eth_subscribe)
//!                                                 │
//! Multicall views ──▶ [PoolStateSynchronizer] ◀───┘ Swap/Mint/Burn/Collect logs
//! ```
//!
//! ## Consistency
//!
//! - Registry and summaries are single-writer and published as whole `Arc`
//!   values, so concurrent readers never see partial updates.
//! - Remote failures degrade to documented fallbacks (latest-block retry,
//!   default summary with `SyncStatus::Unknown`) instead of errors.
//! - Incremental state may miss events across reconnect gaps; callers that
//!   need strong freshness call `resync`.

pub mod error;
pub mod feed;
pub mod live;
pub mod registry;
pub mod synchronizer;
pub mod types;

pub use error::{RegistryError, SyncError};
pub use feed::{LogRouter, Routed};
pub use live::{Backoff, LiveFeed};
pub use registry::{pool_from_subgraph, PoolRegistry, MAX_PAGE_SIZE};
pub use synchronizer::{apply_event, PoolStateSynchronizer};
pub use types::{Pool, PoolStateSummary, SyncStatus, Token};
