//! Request and result types for price sampling

use pool_state::Token;
use serde::{Deserialize, Serialize};
use web3::types::{Address, U256};

/// Basis-point denominator for transfer fees
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Amounts are inputs of `token_in`; prices are outputs of `token_out`
    Sell,
    /// Amounts are outputs of `token_out`; prices are required inputs of `token_in`
    Buy,
}

/// Fee-on-transfer parameters, in basis points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFees {
    pub src_fee: u16,
    pub dest_fee: u16,
    /// Deducted from the source token on its way into the pool
    pub src_dex_fee: u16,
    /// Deducted from the destination token on its way out of the pool
    pub dest_dex_fee: u16,
}

impl TransferFees {
    pub fn is_empty(&self) -> bool {
        self.src_fee == 0 && self.dest_fee == 0 && self.src_dex_fee == 0 && self.dest_dex_fee == 0
    }
}

/// One pair to price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRequest {
    pub token_in: Token,
    pub token_out: Token,
    pub amounts: Vec<U256>,
    pub side: Side,
    #[serde(default)]
    pub transfer_fees: TransferFees,
    #[serde(default)]
    pub block: Option<u64>,
}

impl PriceRequest {
    pub fn new(token_in: Token, token_out: Token, amounts: Vec<U256>, side: Side) -> Self {
        Self {
            token_in,
            token_out,
            amounts,
            side,
            transfer_fees: TransferFees::default(),
            block: None,
        }
    }

    pub fn with_fees(mut self, transfer_fees: TransferFees) -> Self {
        self.transfer_fees = transfer_fees;
        self
    }

    pub fn at_block(mut self, block: u64) -> Self {
        self.block = Some(block);
        self
    }

    /// Token the requested amounts are denominated in
    pub fn amount_token(&self) -> Token {
        match self.side {
            Side::Sell => self.token_in,
            Side::Buy => self.token_out,
        }
    }

    /// Token the quoted prices are denominated in
    pub fn price_token(&self) -> Token {
        match self.side {
            Side::Sell => self.token_out,
            Side::Buy => self.token_in,
        }
    }
}

/// Route through one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRoute {
    pub address: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub deployer: Address,
    pub identifier: String,
}

/// Interpolated prices through one pool, aligned with the requested amounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolPrices {
    /// Quote for one whole unit of the amount token
    pub unit: U256,
    pub prices: Vec<U256>,
    pub pool: PoolRoute,
    pub fee_on_transfer: bool,
}
