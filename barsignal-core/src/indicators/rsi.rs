//! Relative Strength Index (RSI).
//!
//! RSI = 100 - 100 / (1 + gain / loss)
//!
//! - `Rsi::wilder`: Wilder-smoothed average gain and loss. Lookback: period.
//! - `Rsi::rolling`: summed gains over summed losses of the close-to-close
//!   changes inside a rolling window of `period` closes. Lookback: period - 1.
//!
//! Edge cases: loss == 0 gives 100, gain == 0 gives 0. A window with no
//! movement at all is 0/0 and stays NaN, so that bar has no RSI.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RsiMethod {
    Wilder,
    Rolling,
}

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    method: RsiMethod,
}

impl Rsi {
    pub fn wilder(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            method: RsiMethod::Wilder,
        }
    }

    pub fn rolling(period: usize) -> Self {
        assert!(period >= 2, "rolling RSI needs a window of at least 2 closes");
        Self {
            period,
            method: RsiMethod::Rolling,
        }
    }

    fn compute_wilder(&self, closes: &[f64]) -> Vec<f64> {
        let n = closes.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period + 1 {
            return result;
        }

        let changes = changes(closes);

        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for &ch in &changes[1..=self.period] {
            if ch.is_nan() {
                return result;
            }
            if ch > 0.0 {
                avg_gain += ch;
            } else {
                avg_loss -= ch;
            }
        }
        avg_gain /= self.period as f64;
        avg_loss /= self.period as f64;

        result[self.period] = rsi_from_averages(avg_gain, avg_loss);

        let alpha = 1.0 / self.period as f64;
        for i in (self.period + 1)..n {
            if changes[i].is_nan() {
                return result;
            }

            let gain = changes[i].max(0.0);
            let loss = (-changes[i]).max(0.0);

            avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;

            result[i] = rsi_from_averages(avg_gain, avg_loss);
        }

        result
    }

    fn compute_rolling(&self, closes: &[f64]) -> Vec<f64> {
        let n = closes.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        let changes = changes(closes);

        for i in (self.period - 1)..n {
            // a window of `period` closes holds period-1 changes
            let window = &changes[i + 2 - self.period..=i];
            if window.iter().any(|c| c.is_nan()) {
                continue;
            }
            let gains: f64 = window.iter().map(|c| c.max(0.0)).sum();
            let losses: f64 = window.iter().map(|c| (-c).max(0.0)).sum();
            result[i] = rsi_from_averages(gains, losses);
        }

        result
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn lookback(&self) -> usize {
        match self.method {
            RsiMethod::Wilder => self.period,
            RsiMethod::Rolling => self.period - 1,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        match self.method {
            RsiMethod::Wilder => self.compute_wilder(&closes),
            RsiMethod::Rolling => self.compute_rolling(&closes),
        }
    }
}

/// Close-to-close changes; index 0 is NaN.
fn changes(closes: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; closes.len()];
    for i in 1..closes.len() {
        out[i] = closes[i] - closes[i - 1];
    }
    out
}

fn rsi_from_averages(gain: f64, loss: f64) -> f64 {
    if loss == 0.0 && gain == 0.0 {
        f64::NAN
    } else if loss == 0.0 {
        100.0
    } else if gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + gain / loss)
    }
}
