//! Algebra Integral QuoterV2 ABI
//!
//! Quotes are read-only simulations executed through `eth_call`; both
//! single-hop entry points take a params tuple
//! `(tokenIn, tokenOut, deployer, amount, limitSqrtPrice)` and return
//! `(amountOut, amountIn, sqrtPriceX96After, initializedTicksCrossed, gasEstimate, fee)`.

use super::events::DecodingError;
use ethabi::{Function, Param, ParamType, StateMutability, Token};
use web3::types::{Address, U256};

/// Which quoter entry point to call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteKind {
    /// Fixed input amount, quote the output
    ExactInput,
    /// Fixed output amount, quote the required input
    ExactOutput,
}

fn param(name: &str, kind: ParamType) -> Param {
    Param {
        name: name.to_string(),
        kind,
        internal_type: None,
    }
}

fn params_tuple() -> ParamType {
    ParamType::Tuple(vec![
        ParamType::Address,
        ParamType::Address,
        ParamType::Address,
        ParamType::Uint(256),
        ParamType::Uint(160),
    ])
}

#[allow(deprecated)]
fn quote_function(name: &str) -> Function {
    Function {
        name: name.to_string(),
        inputs: vec![param("params", params_tuple())],
        outputs: vec![
            param("amountOut", ParamType::Uint(256)),
            param("amountIn", ParamType::Uint(256)),
            param("sqrtPriceX96After", ParamType::Uint(160)),
            param("initializedTicksCrossed", ParamType::Uint(32)),
            param("gasEstimate", ParamType::Uint(256)),
            param("fee", ParamType::Uint(16)),
        ],
        constant: None,
        state_mutability: StateMutability::NonPayable,
    }
}

/// `quoteExactInputSingle(QuoteExactInputSingleParams)`
pub fn quote_exact_input_single() -> Function {
    quote_function("quoteExactInputSingle")
}

/// `quoteExactOutputSingle(QuoteExactOutputSingleParams)`
pub fn quote_exact_output_single() -> Function {
    quote_function("quoteExactOutputSingle")
}

/// Build calldata for one single-hop quote. A zero `limitSqrtPrice` means
/// no price limit.
pub fn encode_quote(
    kind: QuoteKind,
    token_in: Address,
    token_out: Address,
    deployer: Address,
    amount: U256,
) -> Result<Vec<u8>, DecodingError> {
    let function = match kind {
        QuoteKind::ExactInput => quote_exact_input_single(),
        QuoteKind::ExactOutput => quote_exact_output_single(),
    };

    function
        .encode_input(&[Token::Tuple(vec![
            Token::Address(token_in),
            Token::Address(token_out),
            Token::Address(deployer),
            Token::Uint(amount),
            Token::Uint(U256::zero()),
        ])])
        .map_err(|e| DecodingError::AbiParsingError(e.to_string()))
}

/// Extract the quoted amount: `amountOut` for exact-input quotes, `amountIn`
/// for exact-output quotes.
pub fn decode_quote(kind: QuoteKind, return_data: &[u8]) -> Result<U256, DecodingError> {
    let words = ethabi::decode(
        &[ParamType::Uint(256), ParamType::Uint(256)],
        return_data,
    )
    .map_err(|e| DecodingError::AbiParsingError(e.to_string()))?;

    let index = match kind {
        QuoteKind::ExactInput => 0,
        QuoteKind::ExactOutput => 1,
    };

    words
        .get(index)
        .cloned()
        .and_then(Token::into_uint)
        .ok_or_else(|| DecodingError::MissingField(
            if index == 0 { "amountOut" } else { "amountIn" }.to_string(),
        ))
}
