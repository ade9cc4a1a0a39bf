//! # Liquidity Service Configuration
//!
//! Typed configuration for the pool registry, state synchronizers, live feed
//! and quote sampler, loaded from TOML with environment overrides.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use liquidity_config::ServiceConfig;
//!
//! let config = ServiceConfig::load(None)?;
//! config.validate()?;
//! let chunks = config.quoter.chunks_count;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Environment variables use the `LIQUIDITY_` prefix with `__` between
//! nested keys, e.g. `LIQUIDITY_QUOTER__CHUNKS_COUNT=20`.

pub mod service;
pub mod service_config;

pub use service_config::{
    load_config, FeedConfig, LoggingConfig, NetworkConfig, QuoterConfig, RegistryConfig,
    SeedPool, ServiceConfig,
};
