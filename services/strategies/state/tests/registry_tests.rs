//! Registry bulk-load behaviour against a scripted subgraph

use async_trait::async_trait;
use chain_reader::{SubgraphClient, SubgraphError, SubgraphPool, SubgraphToken};
use parking_lot::Mutex;
use pool_state::{Pool, PoolRegistry, RegistryError};
use std::sync::Arc;
use web3::types::Address;

/// In-memory subgraph: serves `pools` in order, knows blocks up to
/// `indexed_up_to`, optionally fails at one offset.
struct ScriptedSubgraph {
    pools: Vec<SubgraphPool>,
    indexed_up_to: u64,
    fail_at_skip: Option<usize>,
    calls: Mutex<Vec<(usize, usize, Option<u64>)>>,
}

impl ScriptedSubgraph {
    fn new(count: usize) -> Self {
        let pools = (0..count)
            .map(|i| SubgraphPool {
                id: format!("{:#042x}", 0x1000 + i),
                deployer: None,
                total_value_locked_usd: format!("{}", (count - i) * 10),
                token0: SubgraphToken {
                    id: format!("{:#042x}", 1 + i % 3),
                },
                token1: SubgraphToken {
                    id: format!("{:#042x}", 10),
                },
            })
            .collect();

        Self {
            pools,
            indexed_up_to: u64::MAX,
            fail_at_skip: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(usize, usize, Option<u64>)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl SubgraphClient for ScriptedSubgraph {
    async fn query_pools(
        &self,
        skip: usize,
        first: usize,
        block: Option<u64>,
    ) -> Result<Vec<SubgraphPool>, SubgraphError> {
        self.calls.lock().push((skip, first, block));

        if self.fail_at_skip == Some(skip) {
            return Err(SubgraphError::Transport("connection reset".to_string()));
        }
        if let Some(number) = block {
            if number > self.indexed_up_to {
                return Err(SubgraphError::BlockNotIndexed(number));
            }
        }

        Ok(self.pools.iter().skip(skip).take(first).cloned().collect())
    }
}

fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

#[tokio::test]
async fn paginates_until_short_page() {
    let subgraph = Arc::new(ScriptedSubgraph::new(25));
    let registry = PoolRegistry::new(subgraph.clone(), 10).unwrap();

    let loaded = registry.initialize(Some(500)).await.unwrap();

    assert_eq!(loaded, 25);
    assert_eq!(registry.len(), 25);
    assert_eq!(
        subgraph.calls(),
        vec![(0, 10, Some(500)), (10, 10, Some(500)), (20, 10, Some(500))]
    );
}

#[tokio::test]
async fn exact_multiple_needs_one_empty_page() {
    let subgraph = Arc::new(ScriptedSubgraph::new(20));
    let registry = PoolRegistry::new(subgraph.clone(), 10).unwrap();

    assert_eq!(registry.initialize(None).await.unwrap(), 20);
    assert_eq!(subgraph.calls().len(), 3);
}

#[tokio::test]
async fn unindexed_block_falls_back_to_latest_once() {
    let mut scripted = ScriptedSubgraph::new(15);
    scripted.indexed_up_to = 100;
    let subgraph = Arc::new(scripted);
    let registry = PoolRegistry::new(subgraph.clone(), 10).unwrap();

    let loaded = registry.initialize(Some(200)).await.unwrap();

    assert_eq!(loaded, 15);
    assert_eq!(
        subgraph.calls(),
        vec![(0, 10, Some(200)), (0, 10, None), (10, 10, None)]
    );
}

#[tokio::test]
async fn failure_leaves_previous_pools_intact() {
    let mut scripted = ScriptedSubgraph::new(30);
    scripted.fail_at_skip = Some(10);
    let registry = PoolRegistry::new(Arc::new(scripted), 10).unwrap();

    let seed = vec![Pool::new(addr(0xfeed), addr(1), addr(10), Address::zero()).with_tvl(1.0)];
    registry.seed(seed.clone());

    let err = registry.initialize(Some(1)).await.unwrap_err();
    assert!(matches!(err, RegistryError::BulkLoad { skip: 10, .. }));
    assert_eq!(registry.snapshot().as_slice(), seed.as_slice());
}

#[tokio::test]
async fn loaded_pools_answer_pair_queries_by_tvl() {
    let registry = PoolRegistry::new(Arc::new(ScriptedSubgraph::new(9)), 1000).unwrap();
    registry.initialize(Some(1)).await.unwrap();

    let pools = registry.get_available_pools_for_pair(addr(10), addr(1), Some(1));
    assert_eq!(pools.len(), 3);
    assert!(pools.windows(2).all(|w| w[0].tvl_usd >= w[1].tvl_usd));
    assert!(pools.iter().all(|p| p.matches_pair(addr(1), addr(10))));

    assert!(registry
        .get_available_pools_for_pair(addr(1), addr(2), Some(1))
        .is_empty());
}

#[tokio::test]
async fn reload_replaces_seed() {
    let registry = PoolRegistry::new(Arc::new(ScriptedSubgraph::new(4)), 1000).unwrap();
    registry.seed(vec![Pool::new(addr(0xfeed), addr(1), addr(10), Address::zero())]);

    registry.initialize(None).await.unwrap();

    assert_eq!(registry.len(), 4);
    assert!(registry.find_by_address(addr(0xfeed)).is_none());
    assert!(registry.find_by_address(addr(0x1000)).is_some());
}

type Hook = Box<dyn FnOnce() + Send>;

/// Runs `during_load` before answering the first page
struct InterleavedSubgraph {
    inner: ScriptedSubgraph,
    during_load: Mutex<Option<Hook>>,
}

#[async_trait]
impl SubgraphClient for InterleavedSubgraph {
    async fn query_pools(
        &self,
        skip: usize,
        first: usize,
        block: Option<u64>,
    ) -> Result<Vec<SubgraphPool>, SubgraphError> {
        let hook = self.during_load.lock().take();
        if let Some(hook) = hook {
            hook();
        }
        self.inner.query_pools(skip, first, block).await
    }
}

#[tokio::test]
async fn load_keeps_appends_made_after_a_concurrent_seed() {
    let subgraph = Arc::new(InterleavedSubgraph {
        inner: ScriptedSubgraph::new(5),
        during_load: Mutex::new(None),
    });
    let registry = Arc::new(PoolRegistry::new(subgraph.clone(), 1000).unwrap());
    registry.seed(vec![
        Pool::new(addr(0xa1), addr(1), addr(10), Address::zero()),
        Pool::new(addr(0xa2), addr(1), addr(10), Address::zero()),
        Pool::new(addr(0xa3), addr(1), addr(10), Address::zero()),
    ]);
    registry.append(Pool::new(addr(0xa4), addr(2), addr(10), Address::zero()));

    // a shorter seed lands mid-load, followed by a factory-created pool
    let during = registry.clone();
    *subgraph.during_load.lock() = Some(Box::new(move || {
        during.seed(vec![Pool::new(addr(0xb1), addr(1), addr(10), Address::zero())]);
        during.append(Pool::new(addr(0xb2), addr(3), addr(10), Address::zero()));
    }));

    assert_eq!(registry.initialize(None).await.unwrap(), 5);

    assert_eq!(registry.len(), 6);
    assert!(registry.find_by_address(addr(0xb2)).is_some());
    assert!(registry.find_by_address(addr(0xb1)).is_none());
    assert!(registry.find_by_address(addr(0xa4)).is_none());
}

#[tokio::test]
async fn load_keeps_appends_made_while_in_flight() {
    let subgraph = Arc::new(InterleavedSubgraph {
        inner: ScriptedSubgraph::new(5),
        during_load: Mutex::new(None),
    });
    let registry = Arc::new(PoolRegistry::new(subgraph.clone(), 1000).unwrap());
    registry.seed(vec![Pool::new(addr(0xa1), addr(1), addr(10), Address::zero())]);

    let during = registry.clone();
    *subgraph.during_load.lock() = Some(Box::new(move || {
        during.append(Pool::new(addr(0xb2), addr(3), addr(10), Address::zero()));
    }));

    registry.initialize(None).await.unwrap();

    assert_eq!(registry.len(), 6);
    assert!(registry.find_by_address(addr(0xb2)).is_some());
    assert!(registry.find_by_address(addr(0xa1)).is_none());
}
