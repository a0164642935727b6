//! Exponential Moving Average (EMA) of close.
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (span + 1).
//!
//! Two seedings:
//! - `Ema::new`: EMA[span-1] = SMA of the first `span` closes. Lookback: span - 1.
//! - `Ema::recursive`: EMA[0] = close[0], defined from the first bar. Lookback: 0.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seed {
    Sma,
    FirstValue,
}

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    seed: Seed,
    name: String,
}

impl Ema {
    /// SMA-seeded EMA.
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            seed: Seed::Sma,
            name: format!("ema_{span}"),
        }
    }

    /// EMA seeded with the first close, valid from bar 0.
    pub fn recursive(span: usize) -> Self {
        Self {
            seed: Seed::FirstValue,
            ..Self::new(span)
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.seed {
            Seed::Sma => self.span.saturating_sub(1),
            Seed::FirstValue => 0,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        match self.seed {
            Seed::Sma => ema_of_series(&closes, self.span),
            Seed::FirstValue => recursive_ema_of_series(&closes, self.span),
        }
    }
}

/// SMA-seeded EMA of an arbitrary series.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n < span || span == 0 {
        return result;
    }

    let alpha = 2.0 / (span as f64 + 1.0);

    let mut sum = 0.0;
    for &v in values.iter().take(span) {
        if v.is_nan() {
            return result;
        }
        sum += v;
    }
    let seed = sum / span as f64;
    result[span - 1] = seed;

    let mut prev = seed;
    for i in span..n {
        if values[i].is_nan() {
            // once tainted, every later value is NaN
            return result;
        }
        let ema = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = ema;
        prev = ema;
    }

    result
}

/// EMA seeded with the first value of the series.
pub fn recursive_ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n == 0 || span == 0 || values[0].is_nan() {
        return result;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev = values[0];
    result[0] = prev;

    for i in 1..n {
        if values[i].is_nan() {
            return result;
        }
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = prev;
    }

    result
}
