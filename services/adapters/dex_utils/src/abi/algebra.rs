//! Algebra Integral pool and factory ABIs
//!
//! Event layouts match the Integral pool contracts. The pool view functions
//! are the ones read by a full state resync.

use ethabi::{Event, EventParam, Function, Param, ParamType, StateMutability};

fn indexed(name: &str, kind: ParamType) -> EventParam {
    EventParam {
        name: name.to_string(),
        kind,
        indexed: true,
    }
}

fn plain(name: &str, kind: ParamType) -> EventParam {
    EventParam {
        name: name.to_string(),
        kind,
        indexed: false,
    }
}

fn output(name: &str, kind: ParamType) -> Param {
    Param {
        name: name.to_string(),
        kind,
        internal_type: None,
    }
}

#[allow(deprecated)]
fn view_function(name: &str, outputs: Vec<Param>) -> Function {
    Function {
        name: name.to_string(),
        inputs: vec![],
        outputs,
        constant: None,
        state_mutability: StateMutability::View,
    }
}

/// Algebra Swap event ABI definition
/// event Swap(address indexed sender, address indexed recipient, int256 amount0, int256 amount1, uint160 price, uint128 liquidity, int24 tick)
pub fn swap_event() -> Event {
    Event {
        name: "Swap".to_string(),
        inputs: vec![
            indexed("sender", ParamType::Address),
            indexed("recipient", ParamType::Address),
            plain("amount0", ParamType::Int(256)),
            plain("amount1", ParamType::Int(256)),
            plain("price", ParamType::Uint(160)),
            plain("liquidity", ParamType::Uint(128)),
            plain("tick", ParamType::Int(24)),
        ],
        anonymous: false,
    }
}

/// Algebra Mint event ABI definition
/// event Mint(address sender, address indexed owner, int24 indexed bottomTick, int24 indexed topTick, uint128 liquidityAmount, uint256 amount0, uint256 amount1)
pub fn mint_event() -> Event {
    Event {
        name: "Mint".to_string(),
        inputs: vec![
            plain("sender", ParamType::Address),
            indexed("owner", ParamType::Address),
            indexed("bottomTick", ParamType::Int(24)),
            indexed("topTick", ParamType::Int(24)),
            plain("liquidityAmount", ParamType::Uint(128)),
            plain("amount0", ParamType::Uint(256)),
            plain("amount1", ParamType::Uint(256)),
        ],
        anonymous: false,
    }
}

/// Algebra Burn event ABI definition
/// event Burn(address indexed owner, int24 indexed bottomTick, int24 indexed topTick, uint128 liquidityAmount, uint256 amount0, uint256 amount1)
pub fn burn_event() -> Event {
    Event {
        name: "Burn".to_string(),
        inputs: vec![
            indexed("owner", ParamType::Address),
            indexed("bottomTick", ParamType::Int(24)),
            indexed("topTick", ParamType::Int(24)),
            plain("liquidityAmount", ParamType::Uint(128)),
            plain("amount0", ParamType::Uint(256)),
            plain("amount1", ParamType::Uint(256)),
        ],
        anonymous: false,
    }
}

/// Algebra Collect event ABI definition
/// event Collect(address indexed owner, address recipient, int24 indexed bottomTick, int24 indexed topTick, uint128 amount0, uint128 amount1)
pub fn collect_event() -> Event {
    Event {
        name: "Collect".to_string(),
        inputs: vec![
            indexed("owner", ParamType::Address),
            plain("recipient", ParamType::Address),
            indexed("bottomTick", ParamType::Int(24)),
            indexed("topTick", ParamType::Int(24)),
            plain("amount0", ParamType::Uint(128)),
            plain("amount1", ParamType::Uint(128)),
        ],
        anonymous: false,
    }
}

/// Factory event for pools of the shared (deployer-less) type
/// event Pool(address indexed token0, address indexed token1, address pool)
pub fn pool_created_event() -> Event {
    Event {
        name: "Pool".to_string(),
        inputs: vec![
            indexed("token0", ParamType::Address),
            indexed("token1", ParamType::Address),
            plain("pool", ParamType::Address),
        ],
        anonymous: false,
    }
}

/// Factory event for deployer-parameterized pools
/// event CustomPool(address indexed deployer, address indexed token0, address indexed token1, address pool)
pub fn custom_pool_created_event() -> Event {
    Event {
        name: "CustomPool".to_string(),
        inputs: vec![
            indexed("deployer", ParamType::Address),
            indexed("token0", ParamType::Address),
            indexed("token1", ParamType::Address),
            plain("pool", ParamType::Address),
        ],
        anonymous: false,
    }
}

/// `globalState()`. Only the leading `(price, tick)` words are decoded, the
/// trailing fee/plugin fields differ between Integral releases.
pub fn global_state_function() -> Function {
    view_function(
        "globalState",
        vec![
            output("price", ParamType::Uint(160)),
            output("tick", ParamType::Int(24)),
            output("lastFee", ParamType::Uint(16)),
            output("pluginConfig", ParamType::Uint(8)),
            output("communityFee", ParamType::Uint(16)),
            output("unlocked", ParamType::Bool),
        ],
    )
}

/// `liquidity()` - currently active in-range liquidity
pub fn liquidity_function() -> Function {
    view_function("liquidity", vec![output("", ParamType::Uint(128))])
}

/// `totalFeeGrowth0Token()`
pub fn total_fee_growth0_function() -> Function {
    view_function("totalFeeGrowth0Token", vec![output("", ParamType::Uint(256))])
}

/// `totalFeeGrowth1Token()`
pub fn total_fee_growth1_function() -> Function {
    view_function("totalFeeGrowth1Token", vec![output("", ParamType::Uint(256))])
}
