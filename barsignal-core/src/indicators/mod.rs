//! Technical indicators used by the signal pipeline.
//!
//! Indicators are pure functions: bar history in, numeric series out. Every
//! implementation is causal (the value at bar t depends only on bars 0..=t)
//! and returns a series of the same length as its input with `f64::NAN`
//! during warm-up.
//!
//! Multi-line indicators (Bollinger, ADX) are exposed as separate named
//! instances per line, keeping the single-series `Indicator` trait unchanged.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod rolling;
pub mod rsi;
pub mod vwap;

pub use adx::{Adx, DirectionalLine};
pub use atr::Atr;
pub use bollinger::{bollinger_width, Bollinger, BollingerBand};
pub use ema::Ema;
pub use rsi::Rsi;
pub use vwap::Vwap;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Column name (e.g., "ema_50", "atr").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Which family of indicator definitions the pipeline uses.
///
/// Two generations of the strategy disagree on how EMA, RSI, ATR and the
/// Bollinger deviation are computed. Both are kept and selected here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorVariant {
    /// SMA-seeded EMA, Wilder RSI, Wilder ATR over true range, population
    /// standard deviation.
    #[default]
    Wilder,
    /// EMA recursive from the first close, rolling-sum RSI, mean high-low
    /// range as ATR, sample standard deviation.
    Simple,
}

impl std::str::FromStr for IndicatorVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wilder" => Ok(IndicatorVariant::Wilder),
            "simple" => Ok(IndicatorVariant::Simple),
            other => Err(format!("unknown indicator variant '{other}' (expected wilder|simple)")),
        }
    }
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLCV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: i as i64,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Build bars from explicit (open, high, low, close) tuples with unit volume.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            timestamp: i as i64,
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
