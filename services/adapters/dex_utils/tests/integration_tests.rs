//! Integration tests for the Algebra ABI library
//!
//! Decodes logs shaped like the ones an Integral pool and factory emit,
//! plus fuzzed swap payloads.

use dex::abi::{algebra, multicall, quoter};
use dex::*;
use ethabi::Token;
use proptest::prelude::*;
use web3::types::{Bytes, Log, H160, H256, U256};

/// Create a test log with given topics and data
fn create_test_log(address: H160, topics: Vec<H256>, data: Vec<u8>) -> Log {
    Log {
        address,
        topics,
        data: Bytes(data),
        block_hash: None,
        block_number: Some(50_000_000u64.into()),
        transaction_hash: None,
        transaction_index: None,
        log_index: Some(3u64.into()),
        transaction_log_index: None,
        log_type: None,
        removed: Some(false),
    }
}

/// Create H160 from hex string (for addresses)
fn h160_from_hex(hex: &str) -> H160 {
    let bytes = hex::decode(hex.trim_start_matches("0x")).unwrap();
    let mut result = [0u8; 20];
    result[20 - bytes.len()..].copy_from_slice(&bytes);
    H160(result)
}

fn int_word(value: i64) -> U256 {
    if value >= 0 {
        U256::from(value as u64)
    } else {
        U256::MAX - U256::from((-value - 1) as u64)
    }
}

#[test]
fn test_realistic_swap_decoding() {
    let pool = h160_from_hex("0x3f5228d0e7d75467366be7de2c31d0d098ba2c23");
    let price = U256::from_dec_str("1971202426521381442048713621831").unwrap();

    let data = ethabi::encode(&[
        Token::Int(int_word(-1_000_000_000_000_000_000)),
        Token::Int(int_word(2_350_000_000)),
        Token::Uint(price),
        Token::Uint(U256::from(811_366_302_120_394_583u64)),
        Token::Int(int_word(-193_512)),
    ]);
    let log = create_test_log(
        pool,
        vec![
            ALGEBRA_SWAP,
            H256::from(H160::from_low_u64_be(1)),
            H256::from(H160::from_low_u64_be(2)),
        ],
        data,
    );

    assert_eq!(classify_pool_log(&log), PoolEventKind::Trade);
    match decode_pool_event(&log).unwrap() {
        PoolEvent::Trade(trade) => {
            assert_eq!(trade.price, Some(price));
            assert_eq!(trade.liquidity, Some(811_366_302_120_394_583u128));
            assert_eq!(trade.tick, Some(-193_512));
        }
        other => panic!("expected trade, got {:?}", other),
    }
}

#[test]
fn test_collect_decoding() {
    let data = ethabi::encode(&[
        Token::Address(H160::from_low_u64_be(0xbeef)),
        Token::Uint(U256::from(12u64)),
        Token::Uint(U256::from(34u64)),
    ]);
    let mut bottom = [0xffu8; 32];
    bottom[28..].copy_from_slice(&(-120i32).to_be_bytes());
    let mut top = [0u8; 32];
    top[28..].copy_from_slice(&120i32.to_be_bytes());

    let log = create_test_log(
        H160::from_low_u64_be(0x10),
        vec![
            ALGEBRA_COLLECT,
            H256::from(H160::from_low_u64_be(0xcafe)),
            H256(bottom),
            H256(top),
        ],
        data,
    );

    match decode_pool_event(&log).unwrap() {
        PoolEvent::FeesCollected(fees) => {
            assert_eq!(fees.recipient, H160::from_low_u64_be(0xbeef));
            assert_eq!(fees.bottom_tick, -120);
            assert_eq!(fees.top_tick, 120);
            assert_eq!((fees.amount0, fees.amount1), (12, 34));
        }
        other => panic!("expected collect, got {:?}", other),
    }
}

#[test]
fn test_unrelated_log_is_unknown() {
    let transfer: H256 = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        .parse()
        .unwrap();
    let log = create_test_log(H160::zero(), vec![transfer], vec![0u8; 32]);

    assert_eq!(decode_pool_event(&log).unwrap(), PoolEvent::Unknown);
    assert_eq!(decode_factory_event(&log).unwrap(), FactoryEvent::Unknown);
}

#[test]
fn test_subscription_topics_cover_pool_and_factory_events() {
    let topics = subscription_topics();
    assert_eq!(topics.len(), 6);
    assert!(topics.contains(&to_hex_string(ALGEBRA_SWAP)));
    assert!(topics.contains(&to_hex_string(ALGEBRA_CUSTOM_POOL)));
    assert!(topics.iter().all(|t| t.starts_with("0x") && t.len() == 66));
}

#[test]
fn test_quote_batch_round_trip() {
    let quoter_address = H160::from_low_u64_be(0x9999);
    let calldata = quoter::encode_quote(
        QuoteKind::ExactInput,
        H160::from_low_u64_be(1),
        H160::from_low_u64_be(2),
        H160::zero(),
        U256::from(10u64).pow(U256::from(18u64)),
    )
    .unwrap();

    let batch = multicall::encode_try_aggregate(&[(quoter_address, calldata)]).unwrap();
    assert!(batch.len() > 4);

    let quote_return = ethabi::encode(&[
        Token::Uint(U256::from(2_000_000u64)),
        Token::Uint(U256::from(10u64).pow(U256::from(18u64))),
        Token::Uint(U256::one() << 96),
        Token::Uint(U256::from(1u64)),
        Token::Uint(U256::from(80_000u64)),
        Token::Uint(U256::from(100u64)),
    ]);
    let aggregate_output = ethabi::encode(&[Token::Array(vec![
        Token::Tuple(vec![Token::Bool(true), Token::Bytes(quote_return)]),
        Token::Tuple(vec![Token::Bool(false), Token::Bytes(vec![0x08, 0xc3, 0x79, 0xa0])]),
    ])]);

    let results = multicall::decode_try_aggregate(&aggregate_output).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0].0);
    assert!(!results[1].0);

    let amount = quoter::decode_quote(QuoteKind::ExactInput, &results[0].1).unwrap();
    assert_eq!(amount, U256::from(2_000_000u64));
    assert!(quoter::decode_quote(QuoteKind::ExactInput, &results[1].1).is_err());
}

#[test]
fn test_global_state_decodes_leading_words() {
    let output = ethabi::encode(&[
        Token::Uint(U256::one() << 96),
        Token::Int(int_word(-5)),
        Token::Uint(U256::from(500u64)),
        Token::Uint(U256::from(0u64)),
        Token::Uint(U256::from(0u64)),
        Token::Bool(true),
    ]);

    let tokens = algebra::global_state_function()
        .decode_output(&output)
        .unwrap();
    assert_eq!(tokens[0].clone().into_uint(), Some(U256::one() << 96));
}

proptest! {
    #[test]
    fn swap_decoding_never_panics(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let log = create_test_log(H160::zero(), vec![ALGEBRA_SWAP], data);
        let _ = decode_pool_event(&log);
    }

    #[test]
    fn swap_tick_round_trips_inside_range(tick in -887272i32..=887272) {
        let data = ethabi::encode(&[
            Token::Int(U256::zero()),
            Token::Int(U256::zero()),
            Token::Uint(U256::one() << 96),
            Token::Uint(U256::from(1u64)),
            Token::Int(int_word(tick as i64)),
        ]);
        let log = create_test_log(H160::zero(), vec![ALGEBRA_SWAP], data);
        match decode_pool_event(&log).unwrap() {
            PoolEvent::Trade(trade) => prop_assert_eq!(trade.tick, Some(tick)),
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    }
}
