//! Volatility in price units, used to size stop and target distances.
//!
//! `Atr::wilder` smooths the true range (largest of the bar range and the
//! gaps to the previous close) with alpha = 1/period. The first bar has no
//! previous close and is left out of the seed, so the first value lands at
//! index `period`.
//!
//! `Atr::range_mean` is the rolling mean of high - low over `period` bars.

use super::rolling::rolling_mean;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AtrMethod {
    Wilder,
    RangeMean,
}

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    method: AtrMethod,
}

impl Atr {
    pub fn wilder(period: usize) -> Self {
        assert!(period > 0, "atr period must be positive");
        Self {
            period,
            method: AtrMethod::Wilder,
        }
    }

    pub fn range_mean(period: usize) -> Self {
        assert!(period > 0, "atr period must be positive");
        Self {
            period,
            method: AtrMethod::RangeMean,
        }
    }
}

/// Per-bar true range. Bar 0 has no previous close and uses its own range;
/// a NaN in any input leaves that slot NaN.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let Some(first) = bars.first() else {
        return Vec::new();
    };

    std::iter::once(first.high - first.low)
        .chain(bars.windows(2).map(|w| {
            let (prev_close, bar) = (w[0].close, &w[1]);
            let gap_high = (bar.high - prev_close).abs();
            let gap_low = (bar.low - prev_close).abs();
            if gap_high.is_nan() || gap_low.is_nan() || bar.high.is_nan() || bar.low.is_nan() {
                f64::NAN
            } else {
                (bar.high - bar.low).max(gap_high).max(gap_low)
            }
        }))
        .collect()
}

/// Wilder smoothing (alpha = 1/period), seeded with the mean of the first
/// run of `period` consecutive finite values. Output stays NaN from the
/// first gap after the seed onward.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return result;
    }

    let mut run = 0usize;
    let mut seed_end = None;
    for (i, v) in values.iter().enumerate() {
        if v.is_nan() {
            run = 0;
            continue;
        }
        run += 1;
        if run == period {
            seed_end = Some(i + 1);
            break;
        }
    }

    let Some(seed_end) = seed_end else {
        return result;
    };

    let mut smoothed = values[seed_end - period..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = smoothed;

    let alpha = (period as f64).recip();
    for (slot, &value) in result[seed_end..].iter_mut().zip(&values[seed_end..]) {
        if value.is_nan() {
            break;
        }
        smoothed += alpha * (value - smoothed);
        *slot = smoothed;
    }

    result
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        "atr"
    }

    fn lookback(&self) -> usize {
        match self.method {
            AtrMethod::Wilder => self.period,
            AtrMethod::RangeMean => self.period.saturating_sub(1),
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        match self.method {
            AtrMethod::Wilder => {
                let mut tr = true_range(bars);
                // TR[0] has no previous close; start the seed at TR[1]
                if !tr.is_empty() {
                    tr[0] = f64::NAN;
                }
                wilder_smooth(&tr, self.period)
            }
            AtrMethod::RangeMean => {
                let ranges: Vec<f64> = bars.iter().map(|b| b.high - b.low).collect();
                rolling_mean(&ranges, self.period)
            }
        }
    }
}
