//! Registry-backed quoting entry points

use crate::sampler::QuoteSampler;
use crate::types::{PoolPrices, PriceRequest};
use futures::future::join_all;
use pool_state::{Pool, PoolRegistry};
use std::sync::Arc;
use tracing::debug;
use web3::types::Address;

pub struct QuotingService {
    registry: Arc<PoolRegistry>,
    sampler: QuoteSampler,
}

impl QuotingService {
    pub fn new(registry: Arc<PoolRegistry>, sampler: QuoteSampler) -> Self {
        Self { registry, sampler }
    }

    pub fn registry(&self) -> &Arc<PoolRegistry> {
        &self.registry
    }

    pub fn sampler(&self) -> &QuoteSampler {
        &self.sampler
    }

    /// Price one pair through every known pool for it.
    ///
    /// `limit_pools` restricts the candidates to the given pool identifiers
    /// (compared case-insensitively).
    pub async fn get_prices(
        &self,
        request: &PriceRequest,
        limit_pools: Option<&[String]>,
    ) -> Option<Vec<PoolPrices>> {
        let token_in = request.token_in.address;
        let token_out = request.token_out.address;
        if token_in == token_out {
            return None;
        }

        let mut pools =
            self.registry
                .get_available_pools_for_pair(token_in, token_out, request.block);

        if let Some(limit) = limit_pools {
            let dex_key = &self.sampler.config().dex_key;
            pools.retain(|pool| {
                let identifier = pool.identifier(dex_key);
                limit.iter().any(|id| id.eq_ignore_ascii_case(&identifier))
            });
        }

        if pools.is_empty() {
            debug!("No pools for {:?} -> {:?}", token_in, token_out);
            return None;
        }

        debug!(
            "Sampling {} pools for {:?} -> {:?}",
            pools.len(),
            token_in,
            token_out
        );
        self.sampler.sample(request, &pools).await
    }

    /// Price several pairs concurrently; a failing pair only affects its own
    /// slot in the result.
    pub async fn get_prices_many(&self, requests: &[PriceRequest]) -> Vec<Option<Vec<PoolPrices>>> {
        join_all(requests.iter().map(|request| self.get_prices(request, None))).await
    }

    /// Highest-TVL pools containing `token`
    pub fn top_pools(&self, token: Address, limit: usize) -> Vec<Pool> {
        self.registry.top_pools_for_token(token, limit)
    }
}
