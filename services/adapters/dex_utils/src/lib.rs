//! Algebra Integral DEX library
//!
//! Canonical ABIs, event signatures and decoders shared by the registry,
//! the state synchronizer and the quote sampler.
//!
//! # Architecture
//!
//! ```text
//! dex_utils/
//! ├── abi/
//! │   ├── algebra.rs    # Pool/factory events and pool views
//! │   ├── events.rs     # Classification and decoders
//! │   ├── multicall.rs  # tryAggregate batching
//! │   └── quoter.rs     # QuoterV2 single-hop quotes
//! └── event_signatures.rs
//! ```

pub mod abi;
pub mod event_signatures;

pub use abi::{
    classify_pool_log, decode_factory_event, decode_pool_event, subscription_topics,
    DecodingError, FactoryEvent, FeesCollected, LiquidityChange, PoolEvent, PoolEventKind,
    QuoteKind, TradeEvent,
};

pub use event_signatures::{
    factory_event_signatures, pool_event_signatures, to_hex_string, ALGEBRA_BURN,
    ALGEBRA_COLLECT, ALGEBRA_CUSTOM_POOL, ALGEBRA_MINT, ALGEBRA_POOL, ALGEBRA_SWAP,
};
