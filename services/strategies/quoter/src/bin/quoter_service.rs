//! Quoter Service Binary
//!
//! Loads the pool registry, prices one pair across an evenly spaced amount
//! vector and prints the result as JSON. With `--follow` it then keeps the
//! candidate pools' state current from the live log feed until interrupted.

use anyhow::{anyhow, Context, Result};
use chain_reader::{HttpSubgraph, RemoteReader, Web3Multicall};
use clap::Parser;
use liquidity_config::ServiceConfig;
use pool_state::{Backoff, LiveFeed, LogRouter, Pool, PoolRegistry, Token};
use quoter::{PriceRequest, QuoteSampler, QuotingService, SamplerConfig, Side};
use std::{path::PathBuf, str::FromStr, sync::Arc, time::Duration};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use web3::types::{Address, U256};

#[derive(Parser)]
#[command(name = "quoter_service")]
#[command(about = "Sampled price curves for Algebra Integral pools")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,

    #[arg(long)]
    token_in: Option<String>,

    #[arg(long, default_value_t = 18)]
    token_in_decimals: u8,

    #[arg(long)]
    token_out: Option<String>,

    #[arg(long, default_value_t = 18)]
    token_out_decimals: u8,

    /// Largest amount to price, in base units
    #[arg(long, default_value = "1000000000000000000")]
    amount: String,

    /// Number of points in the amount vector, including zero
    #[arg(long, default_value_t = 11)]
    points: usize,

    #[arg(long, value_enum, default_value_t = CliSide::Sell)]
    side: CliSide,

    /// Pin reads to a block height
    #[arg(long)]
    block: Option<u64>,

    /// Keep candidate pools synchronized from the live log feed
    #[arg(long)]
    follow: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CliSide {
    Sell,
    Buy,
}

impl From<CliSide> for Side {
    fn from(side: CliSide) -> Self {
        match side {
            CliSide::Sell => Side::Sell,
            CliSide::Buy => Side::Buy,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ServiceConfig::load(args.config.as_deref())?;
    if args.dump_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    // Initialize logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🚀 Starting Algebra quoter service");
    config.validate()?;

    let reader: Arc<dyn RemoteReader> = Arc::new(Web3Multicall::new(
        &config.network.rpc_url,
        config.network.multicall()?,
        Duration::from_millis(config.quoter.multicall_timeout_ms),
    )?);
    let subgraph = Arc::new(HttpSubgraph::new(
        config.network.subgraph_url.clone(),
        Duration::from_millis(config.registry.subgraph_timeout_ms),
    ));

    let registry = Arc::new(PoolRegistry::new(subgraph, config.registry.page_size)?);
    load_registry(&registry, &config, args.block).await?;

    let sampler = QuoteSampler::new(
        reader.clone(),
        SamplerConfig {
            quoter: config.network.quoter()?,
            chunks_count: config.quoter.chunks_count,
            fallback_rate_num: config.quoter.fallback_rate_num,
            fallback_rate_den: config.quoter.fallback_rate_den,
            dex_key: config.quoter.dex_key.clone(),
        },
    );
    let service = QuotingService::new(registry.clone(), sampler);

    let (Some(token_in), Some(token_out)) = (args.token_in.as_deref(), args.token_out.as_deref())
    else {
        info!("No pair given, registry holds {} pools", registry.len());
        return Ok(());
    };
    let token_in = parse_address("--token-in", token_in)?;
    let token_out = parse_address("--token-out", token_out)?;

    let max_amount = U256::from_dec_str(&args.amount)
        .map_err(|e| anyhow!("invalid --amount {:?}: {:?}", args.amount, e))?;
    let mut request = PriceRequest::new(
        Token::new(token_in, args.token_in_decimals),
        Token::new(token_out, args.token_out_decimals),
        amount_vector(max_amount, args.points),
        args.side.into(),
    );
    if let Some(block) = args.block {
        request = request.at_block(block);
    }

    match service.get_prices(&request, None).await {
        Some(prices) => println!("{}", serde_json::to_string_pretty(&prices)?),
        None => warn!("No prices for {:?} -> {:?}", token_in, token_out),
    }

    if !args.follow {
        return Ok(());
    }

    let router = Arc::new(LogRouter::new(registry.clone(), config.network.factory()?));
    for pool in registry.get_available_pools_for_pair(token_in, token_out, None) {
        router.track(pool.address);
    }

    let feed = LiveFeed::new(
        config.network.ws_url.clone(),
        router,
        reader,
        Backoff {
            base_ms: config.feed.base_backoff_ms,
            max_ms: config.feed.max_backoff_ms,
            max_attempts: config.feed.max_reconnect_attempts,
        },
    );

    tokio::select! {
        result = feed.run() => {
            if let Err(e) = &result {
                error!("🔥 Live feed stopped: {:#}", e);
            }
            result?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("📡 Received shutdown signal");
        }
    }

    Ok(())
}

/// Bulk-load the registry, falling back to the configured seed pools
async fn load_registry(
    registry: &PoolRegistry,
    config: &ServiceConfig,
    block: Option<u64>,
) -> Result<()> {
    match registry.initialize(block).await {
        Ok(count) => {
            info!("✅ Loaded {} pools", count);
            Ok(())
        }
        Err(e) => {
            error!("❌ Pool bulk load failed: {}", e);

            let mut seeds = Vec::with_capacity(config.registry.seed_pools.len());
            for seed in &config.registry.seed_pools {
                let (address, token0, token1, deployer) = seed
                    .addresses()
                    .with_context(|| format!("invalid seed pool {}", seed.address))?;
                seeds.push(Pool::new(address, token0, token1, deployer).with_tvl(seed.tvl_usd));
            }

            warn!("Falling back to {} configured seed pools", seeds.len());
            registry.seed(seeds);
            Ok(())
        }
    }
}

fn parse_address(flag: &str, value: &str) -> Result<Address> {
    Address::from_str(value.trim()).with_context(|| format!("{} is not a valid address", flag))
}

/// `points` amounts evenly spaced from zero to `max_amount`
fn amount_vector(max_amount: U256, points: usize) -> Vec<U256> {
    if points < 2 {
        return vec![max_amount];
    }
    let steps = U256::from(points - 1);
    (0..points)
        .map(|i| max_amount / steps * U256::from(i) + max_amount % steps * U256::from(i) / steps)
        .collect()
}
