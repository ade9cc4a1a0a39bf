//! Multicall2 `tryAggregate` ABI
//!
//! One `eth_call` carries a whole batch; with `requireSuccess = false` each
//! inner call reports its own success flag instead of reverting the batch.

use super::events::DecodingError;
use ethabi::{Function, Param, ParamType, StateMutability, Token};
use web3::types::Address;

fn param(name: &str, kind: ParamType) -> Param {
    Param {
        name: name.to_string(),
        kind,
        internal_type: None,
    }
}

/// `tryAggregate(bool requireSuccess, (address target, bytes callData)[] calls)
///     returns ((bool success, bytes returnData)[])`
#[allow(deprecated)]
pub fn try_aggregate_function() -> Function {
    Function {
        name: "tryAggregate".to_string(),
        inputs: vec![
            param("requireSuccess", ParamType::Bool),
            param(
                "calls",
                ParamType::Array(Box::new(ParamType::Tuple(vec![
                    ParamType::Address,
                    ParamType::Bytes,
                ]))),
            ),
        ],
        outputs: vec![param(
            "returnData",
            ParamType::Array(Box::new(ParamType::Tuple(vec![
                ParamType::Bool,
                ParamType::Bytes,
            ]))),
        )],
        constant: None,
        state_mutability: StateMutability::NonPayable,
    }
}

/// Encode a non-reverting batch of `(target, calldata)` pairs
pub fn encode_try_aggregate(calls: &[(Address, Vec<u8>)]) -> Result<Vec<u8>, DecodingError> {
    let calls = calls
        .iter()
        .map(|(target, data)| Token::Tuple(vec![Token::Address(*target), Token::Bytes(data.clone())]))
        .collect();

    try_aggregate_function()
        .encode_input(&[Token::Bool(false), Token::Array(calls)])
        .map_err(|e| DecodingError::AbiParsingError(e.to_string()))
}

/// Decode `tryAggregate` output into positionally aligned `(success, returnData)`
pub fn decode_try_aggregate(output: &[u8]) -> Result<Vec<(bool, Vec<u8>)>, DecodingError> {
    let mut tokens = try_aggregate_function()
        .decode_output(output)
        .map_err(|e| DecodingError::AbiParsingError(e.to_string()))?;

    let results = match tokens.pop() {
        Some(Token::Array(results)) => results,
        _ => return Err(DecodingError::MissingField("returnData".to_string())),
    };

    results
        .into_iter()
        .map(|entry| match entry {
            Token::Tuple(mut fields) if fields.len() == 2 => {
                let data = fields.pop().and_then(Token::into_bytes);
                let success = fields.pop().and_then(Token::into_bool);
                match (success, data) {
                    (Some(success), Some(data)) => Ok((success, data)),
                    _ => Err(DecodingError::MissingField("result".to_string())),
                }
            }
            _ => Err(DecodingError::MissingField("result".to_string())),
        })
        .collect()
}
