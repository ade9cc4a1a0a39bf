//! Algebra Integral Event Signature Constants
//!
//! keccak256 hashes of the canonical Solidity event definitions, used as
//! `topics[0]` for subscription filters and log classification. Every
//! constant is checked against the ethabi definition in the tests below.
//!
//! Integral reuses the Uniswap V3 layouts for Swap, Mint and Burn, so those
//! topics coincide with the V3 ones. Collect carries a different parameter
//! order and the factory emits its own `Pool`/`CustomPool` events.

use web3::types::H256;

// =============================================================================
// Pool Event Signatures
// =============================================================================

/// Algebra Swap event signature
/// `Swap(address indexed sender, address indexed recipient, int256 amount0, int256 amount1, uint160 price, uint128 liquidity, int24 tick)`
/// keccak256("Swap(address,address,int256,int256,uint160,uint128,int24)")
pub const ALGEBRA_SWAP: H256 = H256([
    0xc4, 0x20, 0x79, 0xf9, 0x4a, 0x63, 0x50, 0xd7, 0xe6, 0x23, 0x5f, 0x29, 0x17, 0x49, 0x24, 0xf9,
    0x28, 0xcc, 0x2a, 0xc8, 0x18, 0xeb, 0x64, 0xfe, 0xd8, 0x00, 0x4e, 0x11, 0x5f, 0xbc, 0xca, 0x67,
]);

/// Algebra Mint event signature
/// keccak256("Mint(address,address,int24,int24,uint128,uint256,uint256)")
pub const ALGEBRA_MINT: H256 = H256([
    0x7a, 0x53, 0x08, 0x0b, 0xa4, 0x14, 0x15, 0x8b, 0xe7, 0xec, 0x69, 0xb9, 0x87, 0xb5, 0xfb, 0x7d,
    0x07, 0xde, 0xe1, 0x01, 0xfe, 0x85, 0x48, 0x8f, 0x08, 0x53, 0xae, 0x16, 0x23, 0x9d, 0x0b, 0xde,
]);

/// Algebra Burn event signature
/// keccak256("Burn(address,int24,int24,uint128,uint256,uint256)")
pub const ALGEBRA_BURN: H256 = H256([
    0x0c, 0x39, 0x6c, 0xd9, 0x89, 0xa3, 0x9f, 0x44, 0x59, 0xb5, 0xfa, 0x1a, 0xed, 0x6a, 0x9a, 0x8d,
    0xcd, 0xbc, 0x45, 0x90, 0x8a, 0xcf, 0xd6, 0x7e, 0x02, 0x8c, 0xd5, 0x68, 0xda, 0x98, 0x98, 0x2c,
]);

/// Algebra Collect event signature
/// `Collect(address indexed owner, address recipient, int24 indexed bottomTick, int24 indexed topTick, uint128 amount0, uint128 amount1)`
/// keccak256("Collect(address,address,int24,int24,uint128,uint128)")
pub const ALGEBRA_COLLECT: H256 = H256([
    0x70, 0x93, 0x53, 0x38, 0xe6, 0x97, 0x75, 0x45, 0x6a, 0x85, 0xdd, 0xef, 0x22, 0x6c, 0x39, 0x5f,
    0xb6, 0x68, 0xb6, 0x3f, 0xa0, 0x11, 0x5f, 0x5f, 0x20, 0x61, 0x0b, 0x38, 0x8e, 0x6c, 0xa9, 0xc0,
]);

// =============================================================================
// Factory Event Signatures
// =============================================================================

/// Algebra factory Pool event signature
/// keccak256("Pool(address,address,address)")
pub const ALGEBRA_POOL: H256 = H256([
    0x91, 0xcc, 0xaa, 0x7a, 0x27, 0x81, 0x30, 0xb6, 0x51, 0x68, 0xc3, 0xa0, 0xc8, 0xd3, 0xbc, 0xae,
    0x84, 0xcf, 0x5e, 0x43, 0x70, 0x43, 0x42, 0xbd, 0x3e, 0xc0, 0xb5, 0x9e, 0x59, 0xc0, 0x36, 0xdb,
]);

/// Algebra factory CustomPool event signature
/// keccak256("CustomPool(address,address,address,address)")
pub const ALGEBRA_CUSTOM_POOL: H256 = H256([
    0x8a, 0x5f, 0x03, 0x0f, 0x5f, 0xc1, 0x3b, 0x04, 0xa1, 0xe4, 0xef, 0x7c, 0x47, 0x17, 0x7e, 0x3d,
    0x76, 0xb0, 0xe8, 0x0e, 0x1d, 0x9b, 0xe9, 0x84, 0x3d, 0xb3, 0x7c, 0xaa, 0x5b, 0x7b, 0x9b, 0x8f,
]);

// =============================================================================
// Utility Functions
// =============================================================================

/// Pool events that move tracked state, for log subscriptions
pub const fn pool_event_signatures() -> [H256; 4] {
    [ALGEBRA_SWAP, ALGEBRA_MINT, ALGEBRA_BURN, ALGEBRA_COLLECT]
}

/// Factory events announcing new pools
pub const fn factory_event_signatures() -> [H256; 2] {
    [ALGEBRA_POOL, ALGEBRA_CUSTOM_POOL]
}

/// Convert H256 to hex string for JSON-RPC use
pub fn to_hex_string(hash: H256) -> String {
    format!("0x{:x}", hash)
}
