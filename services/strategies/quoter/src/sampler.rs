//! Quote Sampler
//!
//! Prices an arbitrary amount vector through a set of pools with a fixed
//! number of on-chain quotes per pool: one unit-amount quote plus
//! `chunks_count` points spread across the requested range. All quotes for
//! all pools go out as one multicall batch and the full vector is then
//! reconstructed by interpolation.

use crate::fees::{deduct_fee, gross_up, mul_div};
use crate::interpolation::SampleCurve;
use crate::types::{PoolPrices, PoolRoute, PriceRequest, Side};
use chain_reader::{Call, CallResult, RemoteReader};
use dex::abi::quoter::{decode_quote, encode_quote};
use dex::QuoteKind;
use pool_state::Pool;
use std::sync::Arc;
use tracing::{debug, error, warn};
use web3::types::{Address, U256};

/// Sampler settings
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// QuoterV2 contract
    pub quoter: Address,
    pub chunks_count: usize,
    /// Linear fallback rate, applied after decimal normalisation
    pub fallback_rate_num: u64,
    pub fallback_rate_den: u64,
    /// Prefix of pool identifiers in results
    pub dex_key: String,
}

impl SamplerConfig {
    pub fn new(quoter: Address) -> Self {
        Self {
            quoter,
            chunks_count: 10,
            fallback_rate_num: 1,
            fallback_rate_den: 1,
            dex_key: "algebraintegral".to_string(),
        }
    }
}

/// Pick `chunks` amounts spread across `amounts`, stepping by
/// `max((len - 1) / chunks, 1)` and never past the last entry
pub fn select_sample_amounts(amounts: &[U256], chunks: usize) -> Vec<U256> {
    if amounts.is_empty() || chunks == 0 {
        return Vec::new();
    }

    let last = amounts.len() - 1;
    let width = (last / chunks).max(1);
    (1..=chunks)
        .map(|i| amounts[(i * width).min(last)])
        .collect()
}

/// Whole-token units of the amount and price tokens
#[derive(Debug, Clone, Copy)]
struct Units {
    amount: U256,
    price: U256,
}

pub struct QuoteSampler {
    reader: Arc<dyn RemoteReader>,
    config: SamplerConfig,
}

impl QuoteSampler {
    pub fn new(reader: Arc<dyn RemoteReader>, config: SamplerConfig) -> Self {
        Self { reader, config }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Price `request` through each of `pools`.
    ///
    /// Returns `None` for unsupported requests (same token on both sides,
    /// buy side with a source transfer fee, nothing to price) and when the
    /// batch call itself fails. Individual reverted quotes become zero; if
    /// every quote reverts the linear fallback rate is used instead.
    pub async fn sample(&self, request: &PriceRequest, pools: &[Pool]) -> Option<Vec<PoolPrices>> {
        let token_in = request.token_in.address;
        let token_out = request.token_out.address;
        let fees = request.transfer_fees;

        if token_in == token_out {
            debug!("Refusing to quote {:?} against itself", token_in);
            return None;
        }
        if request.side == Side::Buy && fees.src_dex_fee > 0 {
            debug!("Buy quotes with a source transfer fee are not supported");
            return None;
        }
        if pools.is_empty() || request.amounts.is_empty() || self.config.chunks_count == 0 {
            return None;
        }
        let (Some(amount_unit), Some(price_unit)) =
            (request.amount_token().unit(), request.price_token().unit())
        else {
            debug!(
                "Token decimals {} / {} exceed 256-bit units",
                request.token_in.decimals, request.token_out.decimals
            );
            return None;
        };
        let units = Units {
            amount: amount_unit,
            price: price_unit,
        };

        let chunk_amounts = select_sample_amounts(&request.amounts, self.config.chunks_count);
        let mut sample_amounts = Vec::with_capacity(chunk_amounts.len() + 1);
        sample_amounts.push(units.amount);
        sample_amounts.extend_from_slice(&chunk_amounts);

        let query_amounts: Vec<U256> = sample_amounts
            .iter()
            .map(|amount| self.query_amount(request, *amount))
            .collect();

        let kind = match request.side {
            Side::Sell => QuoteKind::ExactInput,
            Side::Buy => QuoteKind::ExactOutput,
        };

        // (pool, sample) -> position in the batch; zero amounts are not fetched
        let mut calls = Vec::new();
        let mut slots = Vec::with_capacity(pools.len());
        for pool in pools {
            let mut pool_slots = Vec::with_capacity(query_amounts.len());
            for amount in &query_amounts {
                if amount.is_zero() {
                    pool_slots.push(None);
                    continue;
                }
                let data = match encode_quote(kind, token_in, token_out, pool.deployer, *amount) {
                    Ok(data) => data,
                    Err(e) => {
                        error!("Failed to encode quote for pool {:?}: {}", pool.address, e);
                        return None;
                    }
                };
                pool_slots.push(Some(calls.len()));
                calls.push(Call::new(self.config.quoter, data));
            }
            slots.push(pool_slots);
        }

        let total_calls = calls.len();
        let results = match self.reader.aggregate(calls, request.block).await {
            Ok(results) => results,
            Err(e) => {
                error!(
                    "Quote batch of {} calls for {:?} -> {:?} failed: {}",
                    total_calls, token_in, token_out, e
                );
                return None;
            }
        };

        if results.len() != total_calls {
            warn!(
                "Quote batch returned {} results for {} calls",
                results.len(),
                total_calls
            );
        }

        // slots the reader did not answer count as failed
        let outputs: Vec<Option<U256>> = (0..total_calls)
            .map(|index| results.get(index).and_then(|result| decode_result(kind, result)))
            .collect();
        let failed = outputs.iter().filter(|output| output.is_none()).count();
        let use_fallback = total_calls > 0 && failed == total_calls;

        if use_fallback {
            error!(
                "All {} quotes for {:?} -> {:?} failed, using linear fallback",
                total_calls, token_in, token_out
            );
        } else if failed > 0 {
            warn!(
                "{}/{} quotes for {:?} -> {:?} failed, zeroing those samples",
                failed, total_calls, token_in, token_out
            );
        }

        let prices = pools
            .iter()
            .zip(slots)
            .map(|(pool, pool_slots)| {
                let sampled: Vec<U256> = pool_slots
                    .iter()
                    .zip(&query_amounts)
                    .map(|(slot, amount)| {
                        let output = match slot {
                            None => U256::zero(),
                            Some(_) if use_fallback => self.linear_fallback(request.side, units, *amount),
                            Some(index) => outputs.get(*index).copied().flatten().unwrap_or_default(),
                        };
                        self.settle_output(request, output)
                    })
                    .collect();

                self.pool_prices(request, pool, &sample_amounts, &sampled)
            })
            .collect();

        Some(prices)
    }

    /// Amount sent to the quoter for a sample
    fn query_amount(&self, request: &PriceRequest, amount: U256) -> U256 {
        match request.side {
            Side::Sell => deduct_fee(amount, request.transfer_fees.src_dex_fee),
            Side::Buy => gross_up(amount, request.transfer_fees.dest_dex_fee),
        }
    }

    /// Output as received by the caller
    fn settle_output(&self, request: &PriceRequest, output: U256) -> U256 {
        match request.side {
            Side::Sell => deduct_fee(output, request.transfer_fees.dest_dex_fee),
            Side::Buy => output,
        }
    }

    /// Fixed-rate estimate used when no quote succeeded
    fn linear_fallback(&self, side: Side, units: Units, amount: U256) -> U256 {
        let num = U256::from(self.config.fallback_rate_num);
        let den = U256::from(self.config.fallback_rate_den);

        let (rate_num, rate_den) = match side {
            Side::Sell => (num, den),
            Side::Buy => (den, num),
        };
        mul_div(mul_div(amount, rate_num, rate_den), units.price, units.amount)
    }

    fn pool_prices(
        &self,
        request: &PriceRequest,
        pool: &Pool,
        sample_amounts: &[U256],
        sampled: &[U256],
    ) -> PoolPrices {
        // the unit sample is the per-unit rate, not a curve point
        let curve = SampleCurve::new(
            sample_amounts
                .iter()
                .copied()
                .zip(sampled.iter().copied())
                .skip(1),
        );

        PoolPrices {
            unit: sampled.first().copied().unwrap_or_default(),
            prices: curve.evaluate(&request.amounts),
            pool: PoolRoute {
                address: pool.address,
                token_in: request.token_in.address,
                token_out: request.token_out.address,
                deployer: pool.deployer,
                identifier: pool.identifier(&self.config.dex_key),
            },
            fee_on_transfer: !request.transfer_fees.is_empty(),
        }
    }
}

fn decode_result(kind: QuoteKind, result: &CallResult) -> Option<U256> {
    if !result.success {
        return None;
    }
    decode_quote(kind, &result.return_data).ok()
}
