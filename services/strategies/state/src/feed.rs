//! Live log routing
//!
//! Factory logs extend the registry, tracked pool logs go to their
//! synchronizer. Logs are routed in arrival order and nothing is reordered
//! or batched.

use crate::registry::PoolRegistry;
use crate::synchronizer::PoolStateSynchronizer;
use crate::types::Pool;
use chain_reader::RemoteReader;
use dashmap::DashMap;
use dex::{factory_event_signatures, pool_event_signatures};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info};
use web3::types::{Address, Filter, FilterBuilder, Log};

/// Where a routed log ended up
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    /// Factory log that created a pool
    NewPool(Pool),
    /// Factory log without a creation
    Factory,
    /// Applied to a tracked pool; `changed` is false when the summary held
    Pool { pool: Address, changed: bool },
    /// Not from the factory or a tracked pool
    Dropped,
}

pub struct LogRouter {
    registry: Arc<PoolRegistry>,
    factory: Address,
    synchronizers: DashMap<Address, Arc<PoolStateSynchronizer>>,
}

impl LogRouter {
    pub fn new(registry: Arc<PoolRegistry>, factory: Address) -> Self {
        Self {
            registry,
            factory,
            synchronizers: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<PoolRegistry> {
        &self.registry
    }

    /// Start tracking a pool; returns the existing synchronizer if tracked
    pub fn track(&self, pool: Address) -> Arc<PoolStateSynchronizer> {
        self.synchronizers
            .entry(pool)
            .or_insert_with(|| {
                debug!("Tracking pool {:?}", pool);
                Arc::new(PoolStateSynchronizer::new(pool))
            })
            .clone()
    }

    pub fn synchronizer(&self, pool: Address) -> Option<Arc<PoolStateSynchronizer>> {
        self.synchronizers.get(&pool).map(|entry| entry.clone())
    }

    pub fn tracked_pools(&self) -> Vec<Address> {
        self.synchronizers.iter().map(|entry| *entry.key()).collect()
    }

    pub fn route(&self, log: &Log) -> Routed {
        if log.address == self.factory {
            return match self.registry.apply_factory_log(log) {
                Some(pool) => Routed::NewPool(pool),
                None => Routed::Factory,
            };
        }

        match self.synchronizer(log.address) {
            Some(sync) => Routed::Pool {
                pool: log.address,
                changed: sync.handle_log(log),
            },
            None => Routed::Dropped,
        }
    }

    /// Log filter covering the factory and every tracked pool
    pub fn subscription_filter(&self) -> Filter {
        let mut addresses = vec![self.factory];
        addresses.extend(self.tracked_pools());

        let mut topics: Vec<_> = pool_event_signatures().to_vec();
        topics.extend(factory_event_signatures());

        FilterBuilder::default()
            .address(addresses)
            .topics(Some(topics), None, None, None)
            .build()
    }

    /// Resync every tracked pool; returns how many came back synced
    pub async fn resync_all(&self, reader: &dyn RemoteReader, block: Option<u64>) -> usize {
        let synchronizers: Vec<_> = self
            .synchronizers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let total = synchronizers.len();
        join_all(synchronizers.iter().map(|sync| sync.resync(reader, block))).await;

        let synced = synchronizers.iter().filter(|sync| !sync.is_stale()).count();
        info!("Resynced {}/{} tracked pools", synced, total);
        synced
    }
}
