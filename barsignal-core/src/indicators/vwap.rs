//! Cumulative volume-weighted average price of close.
//!
//! VWAP[t] = sum(close * volume, 0..=t) / sum(volume, 0..=t)
//!
//! Accumulates from the first bar fed, not over a rolling window. While the
//! cumulative volume is zero the ratio is undefined; such bars carry the last
//! defined VWAP forward, and stay NaN if none exists yet.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Default)]
pub struct Vwap;

impl Vwap {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        "vwap"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut result = Vec::with_capacity(bars.len());
        let mut cum_price_volume = 0.0;
        let mut cum_volume = 0.0;
        let mut last = f64::NAN;

        for bar in bars {
            cum_price_volume += bar.close * bar.volume;
            cum_volume += bar.volume;

            if cum_volume != 0.0 {
                let vwap = cum_price_volume / cum_volume;
                if !vwap.is_nan() {
                    last = vwap;
                }
            }
            result.push(last);
        }

        result
    }
}
