//! Service Configuration Module
//!
//! Loads the liquidity service configuration from a TOML file with
//! `LIQUIDITY_`-prefixed environment overrides. Every section has defaults,
//! so a partial file (or none at all) is valid input to `load`.

use crate::service::{self, ZERO_ADDRESS};
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};
use web3::types::Address;

/// Default configuration file, optional
pub const DEFAULT_CONFIG_PATH: &str = "config/liquidity.toml";

/// Main service configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ServiceConfig {
    pub network: NetworkConfig,
    pub registry: RegistryConfig,
    pub quoter: QuoterConfig,
    pub feed: FeedConfig,
    pub logging: LoggingConfig,
}

/// Endpoints and contract addresses
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub rpc_url: String,
    pub ws_url: String,
    pub subgraph_url: String,
    pub multicall_address: String,
    pub quoter_address: String,
    pub factory_address: String,
}

/// Pool registry settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RegistryConfig {
    pub page_size: usize,
    pub subgraph_timeout_ms: u64,
    /// Installed when the bulk load fails
    pub seed_pools: Vec<SeedPool>,
}

/// Fallback pool entry
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SeedPool {
    pub address: String,
    pub token0: String,
    pub token1: String,
    #[serde(default)]
    pub deployer: Option<String>,
    #[serde(default)]
    pub tvl_usd: f64,
}

/// Quote sampler settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct QuoterConfig {
    pub chunks_count: usize,
    pub multicall_timeout_ms: u64,
    pub fallback_rate_num: u64,
    pub fallback_rate_den: u64,
    pub dex_key: String,
}

/// Live feed reconnection settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct FeedConfig {
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub max_reconnect_attempts: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: service::network::CHAIN_ID,
            rpc_url: service::network::RPC_URL.to_string(),
            ws_url: service::network::WS_URL.to_string(),
            subgraph_url: String::new(),
            multicall_address: ZERO_ADDRESS.to_string(),
            quoter_address: ZERO_ADDRESS.to_string(),
            factory_address: ZERO_ADDRESS.to_string(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            page_size: service::registry::PAGE_SIZE,
            subgraph_timeout_ms: service::registry::SUBGRAPH_TIMEOUT_MS,
            seed_pools: Vec::new(),
        }
    }
}

impl Default for QuoterConfig {
    fn default() -> Self {
        Self {
            chunks_count: service::quoter::CHUNKS_COUNT,
            multicall_timeout_ms: service::quoter::MULTICALL_TIMEOUT_MS,
            fallback_rate_num: service::quoter::FALLBACK_RATE_NUM,
            fallback_rate_den: service::quoter::FALLBACK_RATE_DEN,
            dex_key: service::quoter::DEX_KEY.to_string(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_backoff_ms: service::feed::BASE_BACKOFF_MS,
            max_backoff_ms: service::feed::MAX_BACKOFF_MS,
            max_reconnect_attempts: service::feed::MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl NetworkConfig {
    pub fn multicall(&self) -> Result<Address> {
        parse_address("network.multicall_address", &self.multicall_address)
    }

    pub fn quoter(&self) -> Result<Address> {
        parse_address("network.quoter_address", &self.quoter_address)
    }

    pub fn factory(&self) -> Result<Address> {
        parse_address("network.factory_address", &self.factory_address)
    }
}

impl SeedPool {
    /// Parsed `(address, token0, token1, deployer)`; a missing deployer is
    /// the zero address
    pub fn addresses(&self) -> Result<(Address, Address, Address, Address)> {
        let deployer = match self.deployer.as_deref() {
            None | Some("") => Address::zero(),
            Some(value) => parse_address("seed_pools.deployer", value)?,
        };

        Ok((
            parse_address("seed_pools.address", &self.address)?,
            parse_address("seed_pools.token0", &self.token0)?,
            parse_address("seed_pools.token1", &self.token1)?,
            deployer,
        ))
    }
}

impl ServiceConfig {
    /// Load configuration from `path` (or the optional default file) with
    /// environment overrides, then expand `${VAR}` references in URLs.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let builder = match path {
            Some(path) => {
                info!("Loading configuration from {:?}", path);
                Config::builder().add_source(File::from(path).required(true))
            }
            None => Config::builder().add_source(File::with_name(DEFAULT_CONFIG_PATH).required(false)),
        };

        // Override with environment variables (LIQUIDITY_ prefix)
        let config = builder
            .add_source(
                Environment::with_prefix("LIQUIDITY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut config: ServiceConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.expand_env_vars()?;

        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Expand environment variables in endpoint URLs
    pub fn expand_env_vars(&mut self) -> Result<()> {
        let network = &mut self.network;
        for (name, value) in [
            ("rpc_url", &mut network.rpc_url),
            ("ws_url", &mut network.ws_url),
            ("subgraph_url", &mut network.subgraph_url),
        ] {
            let expanded = shellexpand::env(value.as_str())
                .with_context(|| format!("Failed to expand network.{}", name))?
                .into_owned();
            *value = expanded;
        }
        Ok(())
    }

    /// Reject settings the services cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.registry.page_size == 0 {
            bail!("registry.page_size must be non-zero");
        }
        if self.quoter.chunks_count == 0 {
            bail!("quoter.chunks_count must be non-zero");
        }
        if self.quoter.fallback_rate_den == 0 {
            bail!("quoter.fallback_rate_den must be non-zero");
        }
        if self.network.subgraph_url.is_empty() {
            bail!("network.subgraph_url is not configured");
        }

        let multicall = self.network.multicall()?;
        let quoter = self.network.quoter()?;
        self.network.factory()?;
        if multicall.is_zero() || quoter.is_zero() {
            bail!("network.multicall_address and network.quoter_address must be configured");
        }

        for seed in &self.registry.seed_pools {
            seed.addresses()
                .with_context(|| format!("invalid seed pool {}", seed.address))?;
        }

        Ok(())
    }

    /// Serialize back to TOML, e.g. to dump the effective configuration
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

fn parse_address(field: &str, value: &str) -> Result<Address> {
    Address::from_str(value.trim())
        .with_context(|| format!("{} is not a valid address: {:?}", field, value))
}

/// Convenience function to load and validate configuration
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let config = ServiceConfig::load(path)?;
    config.validate()?;
    Ok(config)
}
