//! ABI definitions and decoding for Algebra Integral
//!
//! - Pool and factory event definitions with closed-set decoders
//! - Pool view functions read during a state resync
//! - QuoterV2 single-hop quote calls
//! - Multicall2 `tryAggregate` batching

pub mod algebra;
pub mod events;
pub mod multicall;
pub mod quoter;

pub use events::{
    classify_pool_log, decode_factory_event, decode_pool_event, DecodingError, FactoryEvent,
    FeesCollected, LiquidityChange, PoolEvent, PoolEventKind, TradeEvent,
};
pub use quoter::QuoteKind;

/// Event signatures for a pool-log subscription, as JSON-RPC topic strings
pub fn subscription_topics() -> Vec<String> {
    crate::event_signatures::pool_event_signatures()
        .iter()
        .chain(crate::event_signatures::factory_event_signatures().iter())
        .map(|sig| crate::event_signatures::to_hex_string(*sig))
        .collect()
}
