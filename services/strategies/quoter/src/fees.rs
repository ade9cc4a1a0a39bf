//! Fixed-point helpers for transfer fees and rate conversion

use crate::types::BPS_DENOMINATOR;
use ethereum_types::U512;
use web3::types::U256;

/// `a * b / den` with a 512-bit intermediate, saturating at `U256::MAX`.
/// A zero denominator yields zero.
pub fn mul_div(a: U256, b: U256, den: U256) -> U256 {
    if den.is_zero() {
        return U256::zero();
    }
    let quotient = a.full_mul(b) / U512::from(den);
    U256::try_from(quotient).unwrap_or(U256::MAX)
}

/// Amount left after deducting `fee_bps`
pub fn deduct_fee(amount: U256, fee_bps: u16) -> U256 {
    let fee = u64::from(fee_bps).min(BPS_DENOMINATOR);
    mul_div(
        amount,
        U256::from(BPS_DENOMINATOR - fee),
        U256::from(BPS_DENOMINATOR),
    )
}

/// Amount that must be sent so that `amount` remains after `fee_bps`
pub fn gross_up(amount: U256, fee_bps: u16) -> U256 {
    let fee = u64::from(fee_bps).min(BPS_DENOMINATOR);
    if fee == BPS_DENOMINATOR {
        return if amount.is_zero() { U256::zero() } else { U256::MAX };
    }
    mul_div(
        amount,
        U256::from(BPS_DENOMINATOR),
        U256::from(BPS_DENOMINATOR - fee),
    )
}
