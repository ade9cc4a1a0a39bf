//! Pool Registry
//!
//! Append-only set of known pools fed from two origins: paginated bulk loads
//! from the subgraph and factory creation logs from the live feed. Readers
//! take an `Arc` snapshot; writers publish a whole new vector, so a reader
//! never observes a half-applied update.
//!
//! Duplicate entries (the same pool seen by both origins) are tolerated.
//! Pair lookups return every match and consumers treat repeats as harmless.

use crate::error::RegistryError;
use crate::types::{sanitize_tvl, Pool};
use chain_reader::{SubgraphClient, SubgraphError, SubgraphPool};
use dex::{decode_factory_event, FactoryEvent};
use parking_lot::{Mutex, RwLock};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use web3::types::{Address, Log};

/// Subgraph page size cap
pub const MAX_PAGE_SIZE: usize = 1000;

struct Published {
    generation: u64,
    pools: Arc<Vec<Pool>>,
    /// Generation of the last wholesale replacement (load or seed)
    base_generation: u64,
    /// Pools installed by that replacement; later entries were appended
    base_len: usize,
}

/// Address index derived from one published generation
#[derive(Default)]
struct AddressIndex {
    generation: Option<u64>,
    positions: HashMap<Address, usize>,
}

pub struct PoolRegistry {
    subgraph: Arc<dyn SubgraphClient>,
    page_size: usize,
    published: RwLock<Published>,
    index: Mutex<AddressIndex>,
}

impl PoolRegistry {
    pub fn new(subgraph: Arc<dyn SubgraphClient>, page_size: usize) -> Result<Self, RegistryError> {
        if page_size == 0 {
            return Err(RegistryError::InvalidPageSize);
        }

        Ok(Self {
            subgraph,
            page_size: page_size.min(MAX_PAGE_SIZE),
            published: RwLock::new(Published {
                generation: 0,
                pools: Arc::new(Vec::new()),
                base_generation: 0,
                base_len: 0,
            }),
            index: Mutex::new(AddressIndex::default()),
        })
    }

    /// Full paginated bulk load as of `block` (`None` = latest indexed).
    ///
    /// Pages are fetched in order until a short page. If the dataset has not
    /// indexed `block` yet, the page is retried once against latest and the
    /// remaining pages stay on latest. Any other failure aborts the load and
    /// leaves the registry untouched. Returns the number of loaded pools.
    pub async fn initialize(&self, block: Option<u64>) -> Result<usize, RegistryError> {
        let (start_base, start_len) = {
            let published = self.published.read();
            (published.base_generation, published.pools.len())
        };
        let mut pinned = block;
        let mut loaded = Vec::new();
        let mut skip = 0;

        loop {
            let page = match self.subgraph.query_pools(skip, self.page_size, pinned).await {
                Ok(page) => page,
                Err(SubgraphError::BlockNotIndexed(number)) if pinned.is_some() => {
                    warn!(
                        "Block {} not yet indexed by subgraph, loading pools at latest instead",
                        number
                    );
                    pinned = None;
                    self.subgraph
                        .query_pools(skip, self.page_size, None)
                        .await
                        .map_err(|source| RegistryError::BulkLoad { skip, source })?
                }
                Err(source) => return Err(RegistryError::BulkLoad { skip, source }),
            };

            let full_page = page.len() == self.page_size;
            debug!("Fetched {} pools at offset {}", page.len(), skip);
            loaded.extend(page.iter().filter_map(pool_from_subgraph));

            if !full_page {
                break;
            }
            skip += self.page_size;
        }

        let count = loaded.len();
        self.replace(count, |current| {
            // keep pools appended by events while the load was in flight,
            // or since a replacement that landed in the meantime
            let appended_from = if current.base_generation == start_base {
                start_len
            } else {
                current.base_len
            };
            loaded.extend(current.pools.iter().skip(appended_from).cloned());
            loaded
        });

        info!("Pool registry loaded {} pools (block {:?})", count, pinned);
        Ok(count)
    }

    /// Replace the pool set with a caller-provided one
    pub fn seed(&self, pools: Vec<Pool>) {
        let count = pools.len();
        self.replace(count, |_| pools);
        info!("Pool registry seeded with {} pools", count);
    }

    /// Append one pool
    pub fn append(&self, pool: Pool) {
        let mut published = self.published.write();
        let mut next = Vec::with_capacity(published.pools.len() + 1);
        next.extend_from_slice(&published.pools);
        next.push(pool);
        published.pools = Arc::new(next);
        published.generation += 1;
    }

    /// Apply a factory log. Returns the appended pool, if any.
    pub fn apply_factory_log(&self, log: &Log) -> Option<Pool> {
        let pool = match decode_factory_event(log) {
            Ok(FactoryEvent::PoolCreated {
                token0,
                token1,
                pool,
            }) => Pool::new(pool, token0, token1, Address::zero()),
            Ok(FactoryEvent::CustomPoolCreated {
                deployer,
                token0,
                token1,
                pool,
            }) => Pool::new(pool, token0, token1, deployer),
            Ok(FactoryEvent::Unknown) => {
                debug!("Ignoring non-creation factory log from {:?}", log.address);
                return None;
            }
            Err(e) => {
                warn!("Dropping malformed factory log from {:?}: {}", log.address, e);
                return None;
            }
        };

        info!(
            "New pool {:?} ({:?}/{:?}, deployer {:?})",
            pool.address, pool.token0, pool.token1, pool.deployer
        );
        self.append(pool.clone());
        Some(pool)
    }

    /// All known pools for a pair in either orientation, TVL descending.
    ///
    /// The registry holds only the latest view; `_block` does not select a
    /// historical state.
    pub fn get_available_pools_for_pair(
        &self,
        token_a: Address,
        token_b: Address,
        _block: Option<u64>,
    ) -> Vec<Pool> {
        let snapshot = self.snapshot();
        let mut pools: Vec<Pool> = snapshot
            .iter()
            .filter(|pool| pool.matches_pair(token_a, token_b))
            .cloned()
            .collect();
        sort_by_tvl(&mut pools);
        pools
    }

    /// Highest-TVL pools containing `token`
    pub fn top_pools_for_token(&self, token: Address, limit: usize) -> Vec<Pool> {
        let snapshot = self.snapshot();
        let mut pools: Vec<Pool> = snapshot
            .iter()
            .filter(|pool| pool.contains_token(token))
            .cloned()
            .collect();
        sort_by_tvl(&mut pools);
        pools.truncate(limit);
        pools
    }

    /// Lookup by pool address; the first entry wins when duplicated
    pub fn find_by_address(&self, address: Address) -> Option<Pool> {
        let (generation, pools) = {
            let published = self.published.read();
            (published.generation, published.pools.clone())
        };

        let mut index = self.index.lock();
        if index.generation != Some(generation) {
            index.positions.clear();
            for (position, pool) in pools.iter().enumerate() {
                index.positions.entry(pool.address).or_insert(position);
            }
            index.generation = Some(generation);
        }

        index
            .positions
            .get(&address)
            .and_then(|position| pools.get(*position))
            .cloned()
    }

    /// Current pool set
    pub fn snapshot(&self) -> Arc<Vec<Pool>> {
        self.published.read().pools.clone()
    }

    pub fn len(&self) -> usize {
        self.published.read().pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Publish a new pool set whose first `base_len` entries come from a
    /// bulk load or seed
    fn replace<F>(&self, base_len: usize, build: F)
    where
        F: FnOnce(&Published) -> Vec<Pool>,
    {
        let mut published = self.published.write();
        let next = build(&published);
        published.pools = Arc::new(next);
        published.generation += 1;
        published.base_generation = published.generation;
        published.base_len = base_len;
    }
}

fn sort_by_tvl(pools: &mut [Pool]) {
    // stable: equal TVL keeps registry order
    pools.sort_by(|a, b| b.tvl_usd.partial_cmp(&a.tvl_usd).unwrap_or(Ordering::Equal));
}

/// Convert a subgraph row, skipping rows with unparsable addresses
pub fn pool_from_subgraph(row: &SubgraphPool) -> Option<Pool> {
    let parse = |value: &str| Address::from_str(value.trim()).ok();

    let (address, token0, token1) = match (
        parse(&row.id),
        parse(&row.token0.id),
        parse(&row.token1.id),
    ) {
        (Some(address), Some(token0), Some(token1)) => (address, token0, token1),
        _ => {
            warn!("Skipping subgraph pool with malformed addresses: {}", row.id);
            return None;
        }
    };

    let deployer = match row.deployer.as_deref() {
        None | Some("") => Address::zero(),
        Some(value) => match parse(value) {
            Some(deployer) => deployer,
            None => {
                warn!("Skipping subgraph pool {} with malformed deployer", row.id);
                return None;
            }
        },
    };

    let tvl_usd = row.total_value_locked_usd.parse::<f64>().unwrap_or(0.0);

    Some(Pool {
        address,
        token0,
        token1,
        deployer,
        tvl_usd: sanitize_tvl(tvl_usd),
    })
}
