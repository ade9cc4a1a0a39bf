//! Core pool types shared by the registry, synchronizer and sampler

use serde::{Deserialize, Serialize};
use web3::types::{Address, U256};

/// ERC-20 token reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub decimals: u8,
}

impl Token {
    pub fn new(address: Address, decimals: u8) -> Self {
        Self { address, decimals }
    }

    /// One whole token in base units, `10^decimals`; `None` when that
    /// exceeds 256 bits
    pub fn unit(&self) -> Option<U256> {
        U256::from(10u64).checked_pow(U256::from(self.decimals))
    }
}

/// One liquidity venue for a token pair
///
/// `deployer` distinguishes otherwise identical pool variants; the zero
/// address denotes the shared pool type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    #[serde(default)]
    pub deployer: Address,
    /// Advisory, used only for ranking
    #[serde(default)]
    pub tvl_usd: f64,
}

impl Pool {
    pub fn new(address: Address, token0: Address, token1: Address, deployer: Address) -> Self {
        Self {
            address,
            token0,
            token1,
            deployer,
            tvl_usd: 0.0,
        }
    }

    pub fn with_tvl(mut self, tvl_usd: f64) -> Self {
        self.tvl_usd = sanitize_tvl(tvl_usd);
        self
    }

    /// Check if pool contains a specific token
    pub fn contains_token(&self, token: Address) -> bool {
        self.token0 == token || self.token1 == token
    }

    /// Pair match in either orientation
    pub fn matches_pair(&self, token_a: Address, token_b: Address) -> bool {
        (self.token0 == token_a && self.token1 == token_b)
            || (self.token0 == token_b && self.token1 == token_a)
    }

    pub fn is_custom(&self) -> bool {
        !self.deployer.is_zero()
    }

    /// `<dex_key>_<token0>_<token1>_<deployer>`, lower-case hex
    pub fn identifier(&self, dex_key: &str) -> String {
        format!(
            "{}_{:?}_{:?}_{:?}",
            dex_key.to_lowercase(),
            self.token0,
            self.token1,
            self.deployer
        )
    }
}

/// TVL must be a finite non-negative number
pub fn sanitize_tvl(tvl_usd: f64) -> f64 {
    if tvl_usd.is_finite() && tvl_usd > 0.0 {
        tvl_usd
    } else {
        0.0
    }
}

/// Mirrored view of one pool's mutable on-chain state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStateSummary {
    /// Square-root price, Q64.96
    pub price: U256,
    pub liquidity: u128,
    pub tick: i32,
    pub fee_growth0: U256,
    pub fee_growth1: U256,
}

/// Freshness of a synchronizer's summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    /// No resync has completed yet
    Uninitialized,
    /// Last resync succeeded at `block` (`None` = latest); events applied since
    Synced { block: Option<u64> },
    Resyncing,
    /// Resync failed or an event could not be reconciled; needs a resync
    Unknown,
}

impl SyncStatus {
    pub fn is_stale(&self) -> bool {
        matches!(self, SyncStatus::Uninitialized | SyncStatus::Unknown)
    }
}
