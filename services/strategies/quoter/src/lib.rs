//! # Algebra Quote Sampler
//!
//! Approximates full price curves for Algebra Integral pools from a small
//! number of on-chain quotes.
//!
//! ```text
//! PriceRequest ──▶ QuotingService ──pools──▶ QuoteSampler
//!                        │                        │
//!                  PoolRegistry            one multicall batch
//!                                                 │
//!                                    (unit + chunk samples per pool)
//!                                                 │
//!                                       SampleCurve interpolation
//!                                                 ▼
//!                                         Vec<PoolPrices>
//! ```
//!
//! For `N` pools and `chunks_count = C` the sampler issues exactly
//! `N * (C + 1)` quote calls, minus any zero-amount samples, regardless of
//! how many amounts were requested.

pub mod fees;
pub mod interpolation;
pub mod sampler;
pub mod service;
pub mod types;

pub use interpolation::SampleCurve;
pub use sampler::{select_sample_amounts, QuoteSampler, SamplerConfig};
pub use service::QuotingService;
pub use types::{PoolPrices, PoolRoute, PriceRequest, Side, TransferFees, BPS_DENOMINATOR};
