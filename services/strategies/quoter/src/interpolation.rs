//! Piecewise-linear price curve through sampled quotes

use crate::fees::mul_div;
use web3::types::U256;

/// Sampled `(amount, output)` points with strictly increasing amounts,
/// anchored at `(0, 0)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleCurve {
    points: Vec<(U256, U256)>,
}

impl SampleCurve {
    /// Build from samples in amount order. Zero amounts and amounts that do
    /// not increase are skipped; the anchor is never fetched remotely.
    pub fn new(samples: impl IntoIterator<Item = (U256, U256)>) -> Self {
        let mut points = vec![(U256::zero(), U256::zero())];
        for (amount, output) in samples {
            let last = points[points.len() - 1].0;
            if amount > last {
                points.push((amount, output));
            }
        }
        Self { points }
    }

    pub fn points(&self) -> &[(U256, U256)] {
        &self.points
    }

    /// Output at `amount`. Exact sample hits return the sampled value,
    /// amounts past the last sample extrapolate along the last segment,
    /// never below zero.
    pub fn value_at(&self, amount: U256) -> U256 {
        if amount.is_zero() || self.points.len() < 2 {
            return U256::zero();
        }

        let upper = self
            .points
            .iter()
            .position(|(x, _)| *x >= amount)
            .unwrap_or(self.points.len() - 1);

        let (x1, y1) = self.points[upper];
        if x1 == amount {
            return y1;
        }
        let (x0, y0) = self.points[upper - 1];
        interpolate(x0, y0, x1, y1, amount)
    }

    pub fn evaluate(&self, amounts: &[U256]) -> Vec<U256> {
        amounts.iter().map(|amount| self.value_at(*amount)).collect()
    }
}

/// Point on the line through `(x0, y0)` and `(x1, y1)` at `x >= x0`
fn interpolate(x0: U256, y0: U256, x1: U256, y1: U256, x: U256) -> U256 {
    let run = x1 - x0;
    let offset = x - x0;
    if y1 >= y0 {
        y0.saturating_add(mul_div(y1 - y0, offset, run))
    } else {
        y0.saturating_sub(mul_div(y0 - y1, offset, run))
    }
}
