//! Batched read-only calls through a Multicall2 contract
//!
//! A whole batch is one `eth_call` to `tryAggregate(false, calls)`, so every
//! inner call reports its own success flag and a reverting quote never
//! poisons the rest of the batch.

use crate::error::ReaderError;
use async_trait::async_trait;
use dex::abi::multicall::{decode_try_aggregate, encode_try_aggregate};
use std::time::Duration;
use tracing::debug;
use web3::transports::Http;
use web3::types::{Address, BlockId, BlockNumber, Bytes, CallRequest};
use web3::Web3;

/// One read-only call in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub target: Address,
    pub data: Vec<u8>,
}

impl Call {
    pub fn new(target: Address, data: Vec<u8>) -> Self {
        Self { target, data }
    }
}

/// Outcome of one call, aligned with its position in the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResult {
    pub success: bool,
    pub return_data: Vec<u8>,
}

impl CallResult {
    pub fn ok(return_data: Vec<u8>) -> Self {
        Self {
            success: true,
            return_data,
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            return_data: Vec::new(),
        }
    }
}

/// Executes batches of read-only calls against the chain
#[async_trait]
pub trait RemoteReader: Send + Sync {
    /// Execute `calls` as one logical request, as of `block` when given and
    /// latest otherwise. The result is positionally aligned with `calls`.
    async fn aggregate(
        &self,
        calls: Vec<Call>,
        block: Option<u64>,
    ) -> Result<Vec<CallResult>, ReaderError>;

    /// Current head block number
    async fn block_number(&self) -> Result<u64, ReaderError>;
}

/// `RemoteReader` backed by a Multicall2 deployment over HTTP JSON-RPC
pub struct Web3Multicall {
    web3: Web3<Http>,
    multicall: Address,
    timeout: Duration,
}

impl Web3Multicall {
    pub fn new(rpc_url: &str, multicall: Address, timeout: Duration) -> Result<Self, ReaderError> {
        let transport = Http::new(rpc_url).map_err(|e| ReaderError::Transport(e.to_string()))?;
        Ok(Self {
            web3: Web3::new(transport),
            multicall,
            timeout,
        })
    }

    fn block_id(block: Option<u64>) -> BlockId {
        match block {
            Some(number) => BlockId::Number(BlockNumber::Number(number.into())),
            None => BlockId::Number(BlockNumber::Latest),
        }
    }
}

#[async_trait]
impl RemoteReader for Web3Multicall {
    async fn aggregate(
        &self,
        calls: Vec<Call>,
        block: Option<u64>,
    ) -> Result<Vec<CallResult>, ReaderError> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let expected = calls.len();
        let pairs: Vec<(Address, Vec<u8>)> =
            calls.into_iter().map(|call| (call.target, call.data)).collect();
        let data = encode_try_aggregate(&pairs)?;

        let request = CallRequest {
            to: Some(self.multicall),
            data: Some(Bytes(data)),
            ..Default::default()
        };

        debug!("Issuing multicall batch of {} calls at {:?}", expected, block);

        let output = tokio::time::timeout(
            self.timeout,
            self.web3.eth().call(request, Some(Self::block_id(block))),
        )
        .await
        .map_err(|_| ReaderError::Timeout(self.timeout.as_millis() as u64))?
        .map_err(|e| ReaderError::Transport(e.to_string()))?;

        let results = decode_try_aggregate(&output.0)?;
        if results.len() != expected {
            return Err(ReaderError::LengthMismatch {
                expected,
                got: results.len(),
            });
        }

        Ok(results
            .into_iter()
            .map(|(success, return_data)| CallResult {
                success,
                return_data,
            })
            .collect())
    }

    async fn block_number(&self) -> Result<u64, ReaderError> {
        let number = tokio::time::timeout(self.timeout, self.web3.eth().block_number())
            .await
            .map_err(|_| ReaderError::Timeout(self.timeout.as_millis() as u64))?
            .map_err(|e| ReaderError::Transport(e.to_string()))?;
        Ok(number.as_u64())
    }
}
