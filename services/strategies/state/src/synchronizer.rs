//! Pool State Synchronizer
//!
//! One instance per tracked pool. The summary is replaced wholesale by a
//! resync and patched by events in arrival order. Every update publishes a
//! new `Arc<PoolStateSummary>`, so readers only ever see complete summaries.
//!
//! ```text
//! Uninitialized ──resync──▶ Resyncing ──ok──▶ Synced ◀──events──┐
//!                               │                 └──────────────┘
//!                               └──fail──▶ Unknown ◀── liquidity underflow
//! ```

use crate::error::SyncError;
use crate::types::{PoolStateSummary, SyncStatus};
use chain_reader::{Call, CallResult, ReaderError, RemoteReader};
use dex::abi::algebra;
use dex::abi::events::{safe_u256_to_tick, safe_u256_to_u128};
use dex::{decode_pool_event, PoolEvent};
use ethabi::{ParamType, Token};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};
use web3::types::{Address, Log, U256};

struct SyncedState {
    summary: Arc<PoolStateSummary>,
    status: SyncStatus,
    /// Block of the last successful resync; logs at or below it are
    /// already part of the summary
    resynced_at: Option<u64>,
}

/// Result of applying one event, with the underflow flag the pure
/// `apply_event` contract does not carry
struct Transition {
    summary: Option<PoolStateSummary>,
    liquidity_underflow: bool,
}

pub struct PoolStateSynchronizer {
    pool: Address,
    state: RwLock<SyncedState>,
}

impl PoolStateSynchronizer {
    pub fn new(pool: Address) -> Self {
        Self {
            pool,
            state: RwLock::new(SyncedState {
                summary: Arc::new(PoolStateSummary::default()),
                status: SyncStatus::Uninitialized,
                resynced_at: None,
            }),
        }
    }

    pub fn pool(&self) -> Address {
        self.pool
    }

    pub fn summary(&self) -> Arc<PoolStateSummary> {
        self.state.read().summary.clone()
    }

    pub fn status(&self) -> SyncStatus {
        self.state.read().status
    }

    /// True when the summary should not be trusted without a resync
    pub fn is_stale(&self) -> bool {
        self.status().is_stale()
    }

    /// Replace the summary with one batched read of the pool views.
    ///
    /// On any remote or decoding failure the default summary is published
    /// and the synchronizer moves to `Unknown`; no error reaches the caller.
    pub async fn resync(
        &self,
        reader: &dyn RemoteReader,
        block: Option<u64>,
    ) -> Arc<PoolStateSummary> {
        self.state.write().status = SyncStatus::Resyncing;

        let (summary, status, resynced_at) = match self.read_summary(reader, block).await {
            Ok(summary) => {
                debug!(
                    "Resynced pool {:?}: tick={} liquidity={}",
                    self.pool, summary.tick, summary.liquidity
                );
                (summary, SyncStatus::Synced { block }, block)
            }
            Err(e) => {
                warn!("Resync of pool {:?} failed, state unknown: {}", self.pool, e);
                (PoolStateSummary::default(), SyncStatus::Unknown, None)
            }
        };

        let summary = Arc::new(summary);
        let mut state = self.state.write();
        state.summary = summary.clone();
        state.status = status;
        state.resynced_at = resynced_at;
        summary
    }

    /// Apply one live log to the owned summary. Logs for other pools, and
    /// logs from blocks the last resync already read, are ignored. Returns
    /// true when the summary changed.
    pub fn handle_log(&self, log: &Log) -> bool {
        if log.address != self.pool {
            return false;
        }

        let mut state = self.state.write();
        if let (Some(number), Some(resynced)) = (log.block_number, state.resynced_at) {
            if number.as_u64() <= resynced {
                debug!(
                    "Skipping log from block {} on pool {:?}, resynced at {}",
                    number, self.pool, resynced
                );
                return false;
            }
        }
        let transition = transition(log, &state.summary);

        if transition.liquidity_underflow && state.status != SyncStatus::Unknown {
            info!("Pool {:?} marked unknown until next resync", self.pool);
            state.status = SyncStatus::Unknown;
        }

        match transition.summary {
            Some(next) if next != *state.summary => {
                state.summary = Arc::new(next);
                if let SyncStatus::Synced { block } = &mut state.status {
                    if let Some(number) = log.block_number {
                        *block = Some(number.as_u64());
                    }
                }
                true
            }
            _ => false,
        }
    }

    async fn read_summary(
        &self,
        reader: &dyn RemoteReader,
        block: Option<u64>,
    ) -> Result<PoolStateSummary, SyncError> {
        let calls = vec![
            view_call(self.pool, algebra::global_state_function())?,
            view_call(self.pool, algebra::liquidity_function())?,
            view_call(self.pool, algebra::total_fee_growth0_function())?,
            view_call(self.pool, algebra::total_fee_growth1_function())?,
        ];

        let results = reader.aggregate(calls, block).await?;
        let [global_state, liquidity, fee_growth0, fee_growth1] =
            <[CallResult; 4]>::try_from(results).map_err(|results| {
                SyncError::Reader(ReaderError::LengthMismatch {
                    expected: 4,
                    got: results.len(),
                })
            })?;

        let global = decode_words(
            "globalState",
            &global_state,
            &[ParamType::Uint(160), ParamType::Int(24)],
        )?;
        let liquidity = decode_words("liquidity", &liquidity, &[ParamType::Uint(128)])?;
        let fee_growth0 =
            decode_words("totalFeeGrowth0Token", &fee_growth0, &[ParamType::Uint(256)])?;
        let fee_growth1 =
            decode_words("totalFeeGrowth1Token", &fee_growth1, &[ParamType::Uint(256)])?;

        Ok(PoolStateSummary {
            price: uint("globalState", &global, 0)?,
            tick: safe_u256_to_tick(int("globalState", &global, 1)?),
            liquidity: safe_u256_to_u128(uint("liquidity", &liquidity, 0)?).map_err(|e| {
                SyncError::Decode {
                    call: "liquidity",
                    reason: e.to_string(),
                }
            })?,
            fee_growth0: uint("totalFeeGrowth0Token", &fee_growth0, 0)?,
            fee_growth1: uint("totalFeeGrowth1Token", &fee_growth1, 0)?,
        })
    }
}

/// Apply one decoded log to `current`.
///
/// Returns `None` for logs that are not pool events. Recognized events that
/// fail to decode return `current` unchanged. Trade fields that are absent
/// or malformed keep their prior values.
pub fn apply_event(log: &Log, current: &PoolStateSummary) -> Option<PoolStateSummary> {
    transition(log, current).summary
}

fn transition(log: &Log, current: &PoolStateSummary) -> Transition {
    let event = match decode_pool_event(log) {
        Ok(event) => event,
        Err(e) => {
            warn!("Malformed pool log from {:?}, keeping state: {}", log.address, e);
            return Transition {
                summary: Some(current.clone()),
                liquidity_underflow: false,
            };
        }
    };

    let mut liquidity_underflow = false;
    let summary = match event {
        PoolEvent::Unknown => None,
        PoolEvent::Trade(trade) => Some(PoolStateSummary {
            price: trade.price.unwrap_or(current.price),
            tick: trade.tick.unwrap_or(current.tick),
            ..current.clone()
        }),
        PoolEvent::LiquidityAdded(change) => Some(PoolStateSummary {
            liquidity: current.liquidity.saturating_add(change.liquidity_delta),
            ..current.clone()
        }),
        PoolEvent::LiquidityRemoved(change) => {
            let liquidity = match current.liquidity.checked_sub(change.liquidity_delta) {
                Some(liquidity) => liquidity,
                None => {
                    warn!(
                        "Burn of {} exceeds tracked liquidity {} on pool {:?}, clamping to zero",
                        change.liquidity_delta, current.liquidity, log.address
                    );
                    liquidity_underflow = true;
                    0
                }
            };
            Some(PoolStateSummary {
                liquidity,
                ..current.clone()
            })
        }
        // accumulators move only through resync
        PoolEvent::FeesCollected(_) => Some(current.clone()),
    };

    Transition {
        summary,
        liquidity_underflow,
    }
}

fn view_call(pool: Address, function: ethabi::Function) -> Result<Call, SyncError> {
    let data = function.encode_input(&[]).map_err(|e| SyncError::Decode {
        call: "encode",
        reason: e.to_string(),
    })?;
    Ok(Call::new(pool, data))
}

fn decode_words(
    call: &'static str,
    result: &CallResult,
    types: &[ParamType],
) -> Result<Vec<Token>, SyncError> {
    if !result.success {
        return Err(SyncError::CallFailed(call));
    }
    ethabi::decode(types, &result.return_data).map_err(|e| SyncError::Decode {
        call,
        reason: e.to_string(),
    })
}

fn uint(call: &'static str, tokens: &[Token], index: usize) -> Result<U256, SyncError> {
    tokens
        .get(index)
        .cloned()
        .and_then(Token::into_uint)
        .ok_or_else(|| SyncError::Decode {
            call,
            reason: format!("missing uint output {}", index),
        })
}

fn int(call: &'static str, tokens: &[Token], index: usize) -> Result<U256, SyncError> {
    tokens
        .get(index)
        .cloned()
        .and_then(Token::into_int)
        .ok_or_else(|| SyncError::Decode {
            call,
            reason: format!("missing int output {}", index),
        })
}
