//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! Three bands (separate Indicator instances):
//! - Middle: SMA(close, period)
//! - Upper: middle + mult * stddev(close, period)
//! - Lower: middle - mult * stddev(close, period)
//!
//! Population stddev by default; `sample()` switches to n-1.
//! Lookback: period - 1.

use super::rolling::{rolling_mean, rolling_std};
use super::Indicator;
use crate::domain::Bar;

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

impl BollingerBand {
    fn column(self) -> &'static str {
        match self {
            BollingerBand::Upper => "bb_upper",
            BollingerBand::Middle => "bb_mid",
            BollingerBand::Lower => "bb_lower",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    ddof: usize,
}

impl Bollinger {
    fn with_band(period: usize, multiplier: f64, band: BollingerBand) -> Self {
        assert!(period >= 2, "Bollinger period must be >= 2");
        Self {
            period,
            multiplier,
            band,
            ddof: 0,
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Upper)
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Middle)
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Lower)
    }

    /// Use the sample standard deviation (n-1 denominator).
    pub fn sample(mut self) -> Self {
        self.ddof = 1;
        self
    }

    pub fn band(&self) -> BollingerBand {
        self.band
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        self.band.column()
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let middle = rolling_mean(&closes, self.period);

        let sign = match self.band {
            BollingerBand::Middle => return middle,
            BollingerBand::Upper => 1.0,
            BollingerBand::Lower => -1.0,
        };

        let stddev = rolling_std(&closes, self.period, self.ddof);
        middle
            .iter()
            .zip(&stddev)
            .map(|(m, s)| m + sign * self.multiplier * s)
            .collect()
    }
}

/// Normalized band width: (upper - lower) / middle.
///
/// A zero middle band yields NaN instead of an infinite width.
pub fn bollinger_width(upper: &[f64], lower: &[f64], middle: &[f64]) -> Vec<f64> {
    upper
        .iter()
        .zip(lower)
        .zip(middle)
        .map(|((u, l), m)| if *m == 0.0 { f64::NAN } else { (u - l) / m })
        .collect()
}
