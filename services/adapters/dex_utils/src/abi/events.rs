//! Pool and factory event classification and decoding
//!
//! Logs are classified by `topics[0]` into a closed set of kinds before any
//! payload decoding happens, so an unrecognized log never reaches a decoder.
//! Liquidity and collect events are decoded strictly through ethabi. Swap
//! payloads are decoded word by word so that a single malformed field does
//! not discard the others.

use super::algebra;
use crate::event_signatures::{
    ALGEBRA_BURN, ALGEBRA_COLLECT, ALGEBRA_CUSTOM_POOL, ALGEBRA_MINT, ALGEBRA_POOL,
    ALGEBRA_SWAP,
};
use ethabi::{Event, RawLog, Token};
use web3::types::{Address, Log, U256};

/// Tick bounds shared by all concentrated-liquidity pools
pub const MIN_TICK: i32 = -887272;
pub const MAX_TICK: i32 = 887272;

/// Error types for ABI decoding
#[derive(Debug, thiserror::Error)]
pub enum DecodingError {
    #[error("Unknown event signature: {0}")]
    UnknownEventSignature(String),

    #[error("ABI parsing failed: {0}")]
    AbiParsingError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Value overflow: {value} exceeds u128::MAX")]
    ValueOverflow { value: String },
}

/// Recognized pool event kinds, selected from the log topic alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolEventKind {
    Trade,
    LiquidityAdded,
    LiquidityRemoved,
    FeesCollected,
    Unknown,
}

/// Swap payload fields that drive pool state. `None` marks a field that was
/// absent or malformed in the log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeEvent {
    pub price: Option<U256>,
    pub liquidity: Option<u128>,
    pub tick: Option<i32>,
}

/// Mint or burn of a position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidityChange {
    pub owner: Address,
    pub bottom_tick: i32,
    pub top_tick: i32,
    pub liquidity_delta: u128,
    pub amount0: U256,
    pub amount1: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeesCollected {
    pub owner: Address,
    pub recipient: Address,
    pub bottom_tick: i32,
    pub top_tick: i32,
    pub amount0: u128,
    pub amount1: u128,
}

/// Decoded pool event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    Trade(TradeEvent),
    LiquidityAdded(LiquidityChange),
    LiquidityRemoved(LiquidityChange),
    FeesCollected(FeesCollected),
    Unknown,
}

/// Decoded factory event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactoryEvent {
    /// Shared pool type, no deployer
    PoolCreated {
        token0: Address,
        token1: Address,
        pool: Address,
    },
    /// Deployer-parameterized pool type
    CustomPoolCreated {
        deployer: Address,
        token0: Address,
        token1: Address,
        pool: Address,
    },
    Unknown,
}

/// Classify a pool log by its event signature
pub fn classify_pool_log(log: &Log) -> PoolEventKind {
    match log.topics.first() {
        Some(topic) if *topic == ALGEBRA_SWAP => PoolEventKind::Trade,
        Some(topic) if *topic == ALGEBRA_MINT => PoolEventKind::LiquidityAdded,
        Some(topic) if *topic == ALGEBRA_BURN => PoolEventKind::LiquidityRemoved,
        Some(topic) if *topic == ALGEBRA_COLLECT => PoolEventKind::FeesCollected,
        _ => PoolEventKind::Unknown,
    }
}

/// Decode a pool log. Unrecognized signatures yield `PoolEvent::Unknown`,
/// recognized but malformed payloads yield an error.
pub fn decode_pool_event(log: &Log) -> Result<PoolEvent, DecodingError> {
    match classify_pool_log(log) {
        PoolEventKind::Trade => TradeDecoder::decode(log).map(PoolEvent::Trade),
        PoolEventKind::LiquidityAdded => {
            LiquidityDecoder::decode_mint(log).map(PoolEvent::LiquidityAdded)
        }
        PoolEventKind::LiquidityRemoved => {
            LiquidityDecoder::decode_burn(log).map(PoolEvent::LiquidityRemoved)
        }
        PoolEventKind::FeesCollected => {
            LiquidityDecoder::decode_collect(log).map(PoolEvent::FeesCollected)
        }
        PoolEventKind::Unknown => Ok(PoolEvent::Unknown),
    }
}

/// Decode a factory log into a pool creation
pub fn decode_factory_event(log: &Log) -> Result<FactoryEvent, DecodingError> {
    match log.topics.first() {
        Some(topic) if *topic == ALGEBRA_POOL => {
            let params = parse(&algebra::pool_created_event(), log)?;
            Ok(FactoryEvent::PoolCreated {
                token0: address_param(&params, 0, "token0")?,
                token1: address_param(&params, 1, "token1")?,
                pool: address_param(&params, 2, "pool")?,
            })
        }
        Some(topic) if *topic == ALGEBRA_CUSTOM_POOL => {
            let params = parse(&algebra::custom_pool_created_event(), log)?;
            Ok(FactoryEvent::CustomPoolCreated {
                deployer: address_param(&params, 0, "deployer")?,
                token0: address_param(&params, 1, "token0")?,
                token1: address_param(&params, 2, "token1")?,
                pool: address_param(&params, 3, "pool")?,
            })
        }
        _ => Ok(FactoryEvent::Unknown),
    }
}

fn parse(event: &Event, log: &Log) -> Result<Vec<Token>, DecodingError> {
    let raw_log = RawLog {
        topics: log.topics.clone(),
        data: log.data.0.clone(),
    };

    event
        .parse_log(raw_log)
        .map(|decoded| decoded.params.into_iter().map(|p| p.value).collect())
        .map_err(|e| DecodingError::AbiParsingError(e.to_string()))
}

fn address_param(params: &[Token], index: usize, name: &str) -> Result<Address, DecodingError> {
    params
        .get(index)
        .cloned()
        .and_then(Token::into_address)
        .ok_or_else(|| DecodingError::MissingField(name.to_string()))
}

fn uint_param(params: &[Token], index: usize, name: &str) -> Result<U256, DecodingError> {
    params
        .get(index)
        .cloned()
        .and_then(Token::into_uint)
        .ok_or_else(|| DecodingError::MissingField(name.to_string()))
}

fn tick_param(params: &[Token], index: usize, name: &str) -> Result<i32, DecodingError> {
    params
        .get(index)
        .cloned()
        .and_then(Token::into_int)
        .map(safe_u256_to_tick)
        .ok_or_else(|| DecodingError::MissingField(name.to_string()))
}

/// Lenient decoder for Swap payloads
pub struct TradeDecoder;

impl TradeDecoder {
    const PRICE_WORD: usize = 2;
    const LIQUIDITY_WORD: usize = 3;
    const TICK_WORD: usize = 4;

    /// Decode the state-bearing fields of a Swap log. Fails only when none of
    /// price, liquidity and tick can be read.
    pub fn decode(log: &Log) -> Result<TradeEvent, DecodingError> {
        let data = &log.data.0;
        let word = |index: usize| data.get(index * 32..(index + 1) * 32);

        let trade = TradeEvent {
            price: word(Self::PRICE_WORD).and_then(word_to_uint160),
            liquidity: word(Self::LIQUIDITY_WORD).and_then(word_to_u128),
            tick: word(Self::TICK_WORD).and_then(word_to_tick),
        };

        if trade.price.is_none() && trade.liquidity.is_none() && trade.tick.is_none() {
            return Err(DecodingError::AbiParsingError(format!(
                "swap payload of {} bytes has no readable state fields",
                data.len()
            )));
        }

        Ok(trade)
    }
}

/// Strict decoder for Mint, Burn and Collect
pub struct LiquidityDecoder;

impl LiquidityDecoder {
    pub fn decode_mint(log: &Log) -> Result<LiquidityChange, DecodingError> {
        let params = parse(&algebra::mint_event(), log)?;
        let liquidity = uint_param(&params, 4, "liquidityAmount")?;

        Ok(LiquidityChange {
            owner: address_param(&params, 1, "owner")?,
            bottom_tick: tick_param(&params, 2, "bottomTick")?,
            top_tick: tick_param(&params, 3, "topTick")?,
            liquidity_delta: safe_u256_to_u128(liquidity)?,
            amount0: uint_param(&params, 5, "amount0")?,
            amount1: uint_param(&params, 6, "amount1")?,
        })
    }

    pub fn decode_burn(log: &Log) -> Result<LiquidityChange, DecodingError> {
        let params = parse(&algebra::burn_event(), log)?;
        let liquidity = uint_param(&params, 3, "liquidityAmount")?;

        Ok(LiquidityChange {
            owner: address_param(&params, 0, "owner")?,
            bottom_tick: tick_param(&params, 1, "bottomTick")?,
            top_tick: tick_param(&params, 2, "topTick")?,
            liquidity_delta: safe_u256_to_u128(liquidity)?,
            amount0: uint_param(&params, 4, "amount0")?,
            amount1: uint_param(&params, 5, "amount1")?,
        })
    }

    pub fn decode_collect(log: &Log) -> Result<FeesCollected, DecodingError> {
        let params = parse(&algebra::collect_event(), log)?;

        Ok(FeesCollected {
            owner: address_param(&params, 0, "owner")?,
            recipient: address_param(&params, 1, "recipient")?,
            bottom_tick: tick_param(&params, 2, "bottomTick")?,
            top_tick: tick_param(&params, 3, "topTick")?,
            amount0: safe_u256_to_u128(uint_param(&params, 4, "amount0")?)?,
            amount1: safe_u256_to_u128(uint_param(&params, 5, "amount1")?)?,
        })
    }
}

/// Safely convert U256 to u128 with overflow detection
pub fn safe_u256_to_u128(value: U256) -> Result<u128, DecodingError> {
    if value > U256::from(u128::MAX) {
        return Err(DecodingError::ValueOverflow {
            value: format!("{}", value),
        });
    }
    Ok(value.as_u128())
}

/// Interpret an ABI `int24` token (two's complement in a U256) as a tick,
/// clamped to the valid tick range.
pub fn safe_u256_to_tick(value: U256) -> i32 {
    // low 32 bits carry the sign-extended int24
    let tick = value.low_u64() as u32 as i32;
    tick.clamp(MIN_TICK, MAX_TICK)
}

fn word_to_uint160(word: &[u8]) -> Option<U256> {
    if word[..12].iter().any(|b| *b != 0) {
        return None;
    }
    Some(U256::from_big_endian(word))
}

fn word_to_u128(word: &[u8]) -> Option<u128> {
    if word[..16].iter().any(|b| *b != 0) {
        return None;
    }
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&word[16..]);
    Some(u128::from_be_bytes(bytes))
}

/// Strict int24 word decoding: the upper bytes must be a clean sign
/// extension and the value must lie inside the tick range.
fn word_to_tick(word: &[u8]) -> Option<i32> {
    let mut low = [0u8; 4];
    low.copy_from_slice(&word[28..]);
    let value = i32::from_be_bytes(low);

    let extension = if value < 0 { 0xff } else { 0x00 };
    if word[..28].iter().any(|b| *b != extension) {
        return None;
    }

    (MIN_TICK..=MAX_TICK).contains(&value).then_some(value)
}
