//! Sampling behaviour against a scripted quoter

use async_trait::async_trait;
use chain_reader::{
    Call, CallResult, ReaderError, RemoteReader, SubgraphClient, SubgraphError, SubgraphPool,
};
use ethabi::Token as AbiToken;
use parking_lot::Mutex;
use pool_state::{Pool, PoolRegistry, Token};
use quoter::{
    PriceRequest, QuoteSampler, QuotingService, SamplerConfig, Side, TransferFees,
};
use std::sync::Arc;
use web3::types::{Address, U256};

const E18: u64 = 1_000_000_000_000_000_000;

type Curve = fn(U256) -> U256;

/// `n * 10^18` without going through `u64`
fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(E18)
}

/// Answers quoter calls from a pricing function of the quoted amount.
/// Calls for amounts in `failing` revert; `transport_down` fails the batch.
struct ScriptedQuoter {
    curve: Curve,
    failing: Vec<U256>,
    failing_deployer: Option<Address>,
    transport_down: bool,
    /// Answer only the first `n` calls of a batch
    answered: Option<usize>,
    batches: Mutex<Vec<Vec<Call>>>,
}

impl ScriptedQuoter {
    fn new(curve: Curve) -> Self {
        Self {
            curve,
            failing: Vec::new(),
            failing_deployer: None,
            transport_down: false,
            answered: None,
            batches: Mutex::new(Vec::new()),
        }
    }

    fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().iter().map(Vec::len).collect()
    }

    fn quoted_amounts(&self) -> Vec<U256> {
        self.batches
            .lock()
            .iter()
            .flatten()
            .map(|call| call_word(call, 3))
            .collect()
    }
}

fn call_word(call: &Call, index: usize) -> U256 {
    let start = 4 + index * 32;
    U256::from_big_endian(&call.data[start..start + 32])
}

fn call_deployer(call: &Call) -> Address {
    let start = 4 + 2 * 32;
    Address::from_slice(&call.data[start + 12..start + 32])
}

fn quote_return(amount: U256) -> Vec<u8> {
    ethabi::encode(&[
        AbiToken::Uint(amount),
        AbiToken::Uint(amount),
        AbiToken::Uint(U256::from(1u64) << 96),
        AbiToken::Uint(1u64.into()),
        AbiToken::Uint(80_000u64.into()),
        AbiToken::Uint(100u64.into()),
    ])
}

#[async_trait]
impl RemoteReader for ScriptedQuoter {
    async fn aggregate(
        &self,
        calls: Vec<Call>,
        _block: Option<u64>,
    ) -> Result<Vec<CallResult>, ReaderError> {
        self.batches.lock().push(calls.clone());
        if self.transport_down {
            return Err(ReaderError::Transport("connection refused".to_string()));
        }

        let answered = self.answered.unwrap_or(calls.len());
        Ok(calls
            .iter()
            .take(answered)
            .map(|call| {
                let amount = call_word(call, 3);
                let reverted = self.failing.contains(&amount)
                    || self.failing_deployer == Some(call_deployer(call));
                if reverted {
                    CallResult::failed()
                } else {
                    CallResult::ok(quote_return((self.curve)(amount)))
                }
            })
            .collect())
    }

    async fn block_number(&self) -> Result<u64, ReaderError> {
        Ok(1)
    }
}

struct NoSubgraph;

#[async_trait]
impl SubgraphClient for NoSubgraph {
    async fn query_pools(
        &self,
        _skip: usize,
        _first: usize,
        _block: Option<u64>,
    ) -> Result<Vec<SubgraphPool>, SubgraphError> {
        Ok(Vec::new())
    }
}

fn double(amount: U256) -> U256 {
    amount * 2
}

fn always_revert(_: U256) -> U256 {
    U256::zero()
}

/// Concave: `a * 1e18 / (a + 1e18)`
fn saturating_curve(amount: U256) -> U256 {
    amount * U256::from(E18) / (amount + U256::from(E18))
}

fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

fn weth() -> Token {
    Token::new(addr(0xaa), 18)
}

fn usdc() -> Token {
    Token::new(addr(0xbb), 6)
}

fn pool(n: u64, deployer: Address) -> Pool {
    Pool::new(addr(n), weth().address, usdc().address, deployer)
}

/// `0, 1e18, ..., 10e18`
fn whole_amounts() -> Vec<U256> {
    (0..=10u64).map(ether).collect()
}

fn sampler(reader: Arc<ScriptedQuoter>) -> QuoteSampler {
    QuoteSampler::new(reader, SamplerConfig::new(addr(0x9000)))
}

fn sell(amounts: Vec<U256>) -> PriceRequest {
    PriceRequest::new(weth(), usdc(), amounts, Side::Sell)
}

#[tokio::test]
async fn eleven_point_request_uses_one_call_per_sample() {
    let reader = Arc::new(ScriptedQuoter::new(double));
    let result = sampler(reader.clone())
        .sample(&sell(whole_amounts()), &[pool(1, Address::zero())])
        .await
        .unwrap();

    assert_eq!(reader.batch_sizes(), vec![11]);
    assert_eq!(result.len(), 1);

    let prices = &result[0];
    assert_eq!(prices.unit, ether(2));
    assert_eq!(prices.prices.len(), 11);
    assert_eq!(prices.prices[0], U256::zero());
    for (amount, price) in whole_amounts().iter().zip(&prices.prices) {
        assert_eq!(*price, *amount * 2);
    }
    assert!(!prices.fee_on_transfer);
    assert_eq!(prices.pool.address, addr(1));
    assert_eq!(prices.pool.token_in, weth().address);
    assert!(prices.pool.identifier.starts_with("algebraintegral_"));
}

#[tokio::test]
async fn call_count_does_not_grow_with_request_length() {
    let reader = Arc::new(ScriptedQuoter::new(saturating_curve));
    let amounts: Vec<U256> = (0..=500u64).map(|i| U256::from(i) * U256::from(E18 / 50)).collect();
    let pools = [pool(1, Address::zero()), pool(2, addr(0xde))];

    let result = sampler(reader.clone()).sample(&sell(amounts.clone()), &pools).await.unwrap();

    // one batch, (chunks + 1) quotes per pool
    assert_eq!(reader.batch_sizes(), vec![22]);
    assert_eq!(result.len(), 2);
    for prices in &result {
        assert_eq!(prices.prices.len(), amounts.len());
        assert!(prices.prices.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(prices.prices[0], U256::zero());
    }
    assert_eq!(result[1].pool.deployer, addr(0xde));
}

#[tokio::test]
async fn sample_points_follow_the_requested_vector() {
    let reader = Arc::new(ScriptedQuoter::new(double));
    let amounts: Vec<U256> = (0..=100u64).map(U256::from).collect();

    sampler(reader.clone())
        .sample(&sell(amounts), &[pool(1, Address::zero())])
        .await
        .unwrap();

    let mut expected = vec![U256::from(E18)];
    expected.extend((1..=10u64).map(|i| U256::from(i * 10)));
    assert_eq!(reader.quoted_amounts(), expected);
}

#[tokio::test]
async fn zero_sample_amounts_are_not_quoted() {
    let reader = Arc::new(ScriptedQuoter::new(double));
    let amounts = vec![U256::zero(), U256::from(E18)];

    let result = sampler(reader.clone())
        .sample(&sell(amounts), &[pool(1, Address::zero())])
        .await
        .unwrap();

    // unit + ten clamped chunk points, all at the last entry
    assert_eq!(reader.batch_sizes(), vec![11]);
    assert_eq!(result[0].prices, vec![U256::zero(), ether(2)]);

    let reader = Arc::new(ScriptedQuoter::new(double));
    let result = sampler(reader.clone())
        .sample(&sell(vec![U256::zero()]), &[pool(1, Address::zero())])
        .await
        .unwrap();
    assert_eq!(reader.batch_sizes(), vec![1]);
    assert_eq!(result[0].prices, vec![U256::zero()]);
}

#[tokio::test]
async fn total_failure_uses_linear_fallback() {
    let reader = Arc::new(ScriptedQuoter {
        failing_deployer: Some(Address::zero()),
        ..ScriptedQuoter::new(always_revert)
    });

    let result = sampler(reader)
        .sample(&sell(whole_amounts()), &[pool(1, Address::zero())])
        .await
        .unwrap();

    // 1:1 rate normalised from 18 to 6 decimals
    let prices = &result[0];
    assert_eq!(prices.unit, U256::from(1_000_000u64));
    assert_eq!(prices.prices[0], U256::zero());
    for (i, price) in prices.prices.iter().enumerate() {
        assert_eq!(*price, U256::from(i as u64 * 1_000_000));
    }
}

#[tokio::test]
async fn buy_side_fallback_inverts_the_rate() {
    let reader = Arc::new(ScriptedQuoter {
        failing_deployer: Some(Address::zero()),
        ..ScriptedQuoter::new(always_revert)
    });
    let mut config = SamplerConfig::new(addr(0x9000));
    config.fallback_rate_num = 2;
    config.fallback_rate_den = 1;

    // buy 0..=10 USDC, pay WETH
    let amounts: Vec<U256> = (0..=10u64).map(|i| U256::from(i * 1_000_000)).collect();
    let request = PriceRequest::new(weth(), usdc(), amounts, Side::Buy);

    let result = QuoteSampler::new(reader, config)
        .sample(&request, &[pool(1, Address::zero())])
        .await
        .unwrap();

    // 1 USDC at 2 USDC per WETH costs 0.5 WETH
    assert_eq!(result[0].unit, U256::from(E18 / 2));
    assert_eq!(result[0].prices[10], ether(5));
}

#[tokio::test]
async fn partial_failure_zeroes_only_failed_samples() {
    let reader = Arc::new(ScriptedQuoter {
        failing: vec![ether(5)],
        ..ScriptedQuoter::new(double)
    });

    let result = sampler(reader)
        .sample(&sell(whole_amounts()), &[pool(1, Address::zero())])
        .await
        .unwrap();

    let prices = &result[0].prices;
    assert_eq!(prices[4], ether(8));
    assert_eq!(prices[5], U256::zero());
    assert_eq!(prices[6], ether(12));
    assert_eq!(result[0].unit, ether(2));
}

#[tokio::test]
async fn failures_in_one_pool_leave_the_other_intact() {
    let custom = addr(0xde);
    let reader = Arc::new(ScriptedQuoter {
        failing_deployer: Some(custom),
        ..ScriptedQuoter::new(double)
    });

    let result = sampler(reader)
        .sample(&sell(whole_amounts()), &[pool(1, Address::zero()), pool(2, custom)])
        .await
        .unwrap();

    assert_eq!(result[0].prices[10], ether(20));
    assert!(result[1].prices.iter().all(|price| price.is_zero()));
    assert!(result[1].unit.is_zero());
}

#[tokio::test]
async fn unanswered_calls_count_as_failed() {
    let reader = Arc::new(ScriptedQuoter {
        answered: Some(6),
        ..ScriptedQuoter::new(double)
    });

    let result = sampler(reader)
        .sample(&sell(whole_amounts()), &[pool(1, Address::zero())])
        .await
        .unwrap();

    // unit + first five chunk points answered, the rest is zero
    let prices = &result[0].prices;
    assert_eq!(prices[5], ether(10));
    assert!(prices[6..].iter().all(|price| price.is_zero()));
}

#[tokio::test]
async fn empty_answer_uses_linear_fallback() {
    let reader = Arc::new(ScriptedQuoter {
        answered: Some(0),
        ..ScriptedQuoter::new(double)
    });

    let result = sampler(reader)
        .sample(&sell(whole_amounts()), &[pool(1, Address::zero())])
        .await
        .unwrap();

    assert_eq!(result[0].unit, U256::from(1_000_000u64));
    assert_eq!(result[0].prices[10], U256::from(10_000_000u64));
}

#[tokio::test]
async fn unrepresentable_decimals_return_none() {
    let reader = Arc::new(ScriptedQuoter::new(double));
    let sampler = sampler(reader.clone());
    let pools = [pool(1, Address::zero())];
    let amounts = vec![U256::zero(), U256::one()];

    let huge_in = PriceRequest::new(Token::new(weth().address, 80), usdc(), amounts.clone(), Side::Sell);
    assert!(sampler.sample(&huge_in, &pools).await.is_none());

    let huge_out = PriceRequest::new(weth(), Token::new(usdc().address, u8::MAX), amounts, Side::Buy);
    assert!(sampler.sample(&huge_out, &pools).await.is_none());

    assert!(reader.batch_sizes().is_empty());
}

#[tokio::test]
async fn transport_failure_returns_none() {
    let reader = Arc::new(ScriptedQuoter {
        transport_down: true,
        ..ScriptedQuoter::new(double)
    });

    let result = sampler(reader.clone())
        .sample(&sell(whole_amounts()), &[pool(1, Address::zero())])
        .await;

    assert!(result.is_none());
    assert_eq!(reader.batch_sizes(), vec![11]);
}

#[tokio::test]
async fn unsupported_requests_make_no_calls() {
    let reader = Arc::new(ScriptedQuoter::new(double));
    let sampler = sampler(reader.clone());
    let pools = [pool(1, Address::zero())];

    let same_token = PriceRequest::new(weth(), weth(), whole_amounts(), Side::Sell);
    assert!(sampler.sample(&same_token, &pools).await.is_none());

    let taxed_buy = PriceRequest::new(weth(), usdc(), whole_amounts(), Side::Buy).with_fees(
        TransferFees {
            src_dex_fee: 100,
            ..TransferFees::default()
        },
    );
    assert!(sampler.sample(&taxed_buy, &pools).await.is_none());

    assert!(sampler.sample(&sell(Vec::new()), &pools).await.is_none());
    assert!(sampler.sample(&sell(whole_amounts()), &[]).await.is_none());

    assert!(reader.batch_sizes().is_empty());
}

#[tokio::test]
async fn sell_fees_shrink_query_and_output() {
    let reader = Arc::new(ScriptedQuoter::new(double));
    let request = sell(whole_amounts()).with_fees(TransferFees {
        src_dex_fee: 100,
        dest_dex_fee: 50,
        ..TransferFees::default()
    });

    let result = sampler(reader.clone())
        .sample(&request, &[pool(1, Address::zero())])
        .await
        .unwrap();

    // 1e18 in, 1% kept by the source token, 0.5% by the destination token
    assert_eq!(reader.quoted_amounts()[0], U256::from(E18 / 100 * 99));
    assert_eq!(result[0].unit, U256::from(1_970_100_000_000_000_000u64));
    assert_eq!(result[0].prices[1], U256::from(1_970_100_000_000_000_000u64));
    assert!(result[0].fee_on_transfer);
}

#[tokio::test]
async fn buy_fee_grosses_up_the_quoted_output() {
    let reader = Arc::new(ScriptedQuoter::new(double));
    let amounts: Vec<U256> = (0..=10u64).map(|i| U256::from(i * 990_000)).collect();
    let request = PriceRequest::new(weth(), usdc(), amounts, Side::Buy).with_fees(TransferFees {
        dest_dex_fee: 100,
        ..TransferFees::default()
    });

    let result = sampler(reader.clone())
        .sample(&request, &[pool(1, Address::zero())])
        .await
        .unwrap();

    // receiving 990_000 net requires 1_000_000 out of the pool
    let quoted = reader.quoted_amounts();
    assert_eq!(quoted[1], U256::from(1_000_000u64));
    assert_eq!(result[0].prices[1], U256::from(2_000_000u64));
}

fn service(reader: Arc<ScriptedQuoter>, pools: Vec<Pool>) -> QuotingService {
    let registry = Arc::new(PoolRegistry::new(Arc::new(NoSubgraph), 1000).unwrap());
    registry.seed(pools);
    QuotingService::new(registry, sampler(reader))
}

#[tokio::test]
async fn service_resolves_pools_in_either_orientation() {
    let reader = Arc::new(ScriptedQuoter::new(double));
    let reversed = Pool::new(addr(3), usdc().address, weth().address, Address::zero());
    let service = service(
        reader.clone(),
        vec![pool(1, Address::zero()).with_tvl(10.0), reversed.with_tvl(50.0)],
    );

    let result = service.get_prices(&sell(whole_amounts()), None).await.unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].pool.address, addr(3));
    assert_eq!(reader.batch_sizes(), vec![22]);
}

#[tokio::test]
async fn service_limits_pools_by_identifier() {
    let reader = Arc::new(ScriptedQuoter::new(double));
    let wanted = pool(2, addr(0xde));
    let service = service(reader.clone(), vec![pool(1, Address::zero()), wanted.clone()]);

    let limit = vec![wanted.identifier("AlgebraIntegral").to_uppercase()];
    let result = service.get_prices(&sell(whole_amounts()), Some(&limit)).await.unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].pool.address, addr(2));

    let unknown = vec!["algebraintegral_nothing".to_string()];
    assert!(service.get_prices(&sell(whole_amounts()), Some(&unknown)).await.is_none());
}

#[tokio::test]
async fn pairs_are_priced_independently() {
    let reader = Arc::new(ScriptedQuoter::new(double));
    let service = service(reader, vec![pool(1, Address::zero())]);

    let unknown_pair = PriceRequest::new(Token::new(addr(0xcc), 18), usdc(), whole_amounts(), Side::Sell);
    let results = service
        .get_prices_many(&[sell(whole_amounts()), unknown_pair, sell(Vec::new())])
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().map(Vec::len), Some(1));
    assert!(results[1].is_none());
    assert!(results[2].is_none());
}

#[tokio::test]
async fn top_pools_rank_by_tvl() {
    let reader = Arc::new(ScriptedQuoter::new(double));
    let service = service(
        reader,
        vec![
            pool(1, Address::zero()).with_tvl(5.0),
            pool(2, Address::zero()).with_tvl(500.0),
            pool(3, Address::zero()).with_tvl(50.0),
        ],
    );

    let top: Vec<Address> = service.top_pools(usdc().address, 2).iter().map(|p| p.address).collect();
    assert_eq!(top, vec![addr(2), addr(3)]);
}
