//! Service defaults
//!
//! Default values shared by the configuration structs and the binaries.

/// Zero address, used for the shared (deployer-less) pool type and for
/// contract addresses that have not been configured
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Network defaults
pub mod network {
    /// Polygon mainnet
    pub const CHAIN_ID: u64 = 137;

    pub const RPC_URL: &str = "http://127.0.0.1:8545";
    pub const WS_URL: &str = "ws://127.0.0.1:8546";
}

/// Registry defaults
pub mod registry {
    /// Subgraph page size cap
    pub const PAGE_SIZE: usize = 1000;

    /// Bulk dataset query timeout (milliseconds)
    pub const SUBGRAPH_TIMEOUT_MS: u64 = 30_000;
}

/// Quoter defaults
pub mod quoter {
    /// Chunk sample points per request, on top of the unit sample
    pub const CHUNKS_COUNT: usize = 10;

    /// Batched quote call timeout (milliseconds)
    pub const MULTICALL_TIMEOUT_MS: u64 = 10_000;

    /// Linear fallback rate, 1:1 after decimal normalisation
    pub const FALLBACK_RATE_NUM: u64 = 1;
    pub const FALLBACK_RATE_DEN: u64 = 1;

    pub const DEX_KEY: &str = "algebraintegral";
}

/// Live feed defaults
pub mod feed {
    /// Reconnection backoff base (milliseconds)
    pub const BASE_BACKOFF_MS: u64 = 1_000;

    /// Reconnection backoff cap (milliseconds)
    pub const MAX_BACKOFF_MS: u64 = 30_000;

    /// Maximum reconnection attempts
    pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;
}
