//! Reproducible synthetic OHLCV series.
//!
//! A geometric random walk whose drift flips sign every `regime_len` bars,
//! so the series alternates between up and down trends and the engine sees
//! entries in both directions. Same seed, same bars.

use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::Bar;

/// 2023-11-14T22:13:20Z
const START_TIMESTAMP_MS: i64 = 1_700_000_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSeries {
    pub seed: u64,
    pub bars: usize,
    pub start_price: f64,
    /// Per-bar log drift during an up regime (negated in down regimes).
    pub drift: f64,
    /// Per-bar log return standard deviation.
    pub volatility: f64,
    pub regime_len: usize,
    /// Spacing between bar timestamps.
    pub interval: Duration,
}

impl SyntheticSeries {
    pub fn new(seed: u64, bars: usize) -> Self {
        Self {
            seed,
            bars,
            start_price: 100.0,
            drift: 0.004,
            volatility: 0.01,
            regime_len: 150,
            interval: Duration::minutes(1),
        }
    }

    pub fn generate(&self) -> Vec<Bar> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let regime_len = self.regime_len.max(1);
        let mut prev_close = self.start_price;
        let step_ms = self.interval.num_milliseconds();
        let mut bars = Vec::with_capacity(self.bars);

        for i in 0..self.bars {
            let direction = if (i / regime_len) % 2 == 0 { 1.0 } else { -1.0 };
            let ret = direction * self.drift + self.volatility * standard_normal(&mut rng);

            let open = prev_close;
            let close = open * ret.exp();
            let wick_up = (self.volatility * standard_normal(&mut rng)).abs() * 0.5;
            let wick_down = (self.volatility * standard_normal(&mut rng)).abs() * 0.5;
            let high = open.max(close) * (1.0 + wick_up);
            let low = open.min(close) * (1.0 - wick_down);
            let volume = 1_000.0 + rng.gen::<f64>() * 9_000.0;

            bars.push(Bar {
                timestamp: START_TIMESTAMP_MS + i as i64 * step_ms,
                open,
                high,
                low,
                close,
                volume,
            });
            prev_close = close;
        }

        bars
    }
}

/// Box-Muller draw from N(0, 1).
fn standard_normal(rng: &mut StdRng) -> f64 {
    // 1 - gen() lies in (0, 1], keeping ln finite
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}
