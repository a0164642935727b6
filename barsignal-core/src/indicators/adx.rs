//! ADX: Average Directional Index (Wilder), with its +DI and -DI lines.
//!
//! Steps:
//! 1. Compute +DM and -DM from consecutive bars
//! 2. Smooth +DM, -DM, and TR using Wilder smoothing (alpha = 1/period)
//! 3. +DI = 100 * smoothed(+DM) / smoothed(TR)
//! 4. -DI = 100 * smoothed(-DM) / smoothed(TR)
//! 5. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 6. ADX = Wilder-smoothed DX
//!
//! Lookback: period for the DI lines, 2 * period - 1 for ADX.
//! A zero smoothed TR reports both DI lines as 0 rather than NaN.

use super::atr::{true_range, wilder_smooth};
use super::Indicator;
use crate::domain::Bar;

/// Which output line of the directional movement system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionalLine {
    Adx,
    PlusDi,
    MinusDi,
}

/// All three directional series for one bar history.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalSeries {
    pub adx: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    line: DirectionalLine,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        Self::line(period, DirectionalLine::Adx)
    }

    pub fn line(period: usize, line: DirectionalLine) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self { period, line }
    }

    /// All three lines at once; the pipeline uses this instead of three
    /// separate `compute` calls.
    pub fn series(&self, bars: &[Bar]) -> DirectionalSeries {
        directional_series(bars, self.period)
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        match self.line {
            DirectionalLine::Adx => "adx",
            DirectionalLine::PlusDi => "plus_di",
            DirectionalLine::MinusDi => "minus_di",
        }
    }

    fn lookback(&self) -> usize {
        match self.line {
            DirectionalLine::Adx => 2 * self.period - 1,
            DirectionalLine::PlusDi | DirectionalLine::MinusDi => self.period,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let series = self.series(bars);
        match self.line {
            DirectionalLine::Adx => series.adx,
            DirectionalLine::PlusDi => series.plus_di,
            DirectionalLine::MinusDi => series.minus_di,
        }
    }
}

/// Compute ADX, +DI and -DI in one pass over the bars.
fn directional_series(bars: &[Bar], period: usize) -> DirectionalSeries {
    let n = bars.len();
    let mut out = DirectionalSeries {
        adx: vec![f64::NAN; n],
        plus_di: vec![f64::NAN; n],
        minus_di: vec![f64::NAN; n],
    };

    if n < 2 || period == 0 {
        return out;
    }

    let mut plus_dm = vec![f64::NAN; n];
    let mut minus_dm = vec![f64::NAN; n];

    for i in 1..n {
        let up_move = bars[i].high - bars[i - 1].high;
        let down_move = bars[i - 1].low - bars[i].low;

        if up_move.is_nan() || down_move.is_nan() {
            continue;
        }

        plus_dm[i] = if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        };
        minus_dm[i] = if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        };
    }

    // align TR with the DM series, which start at bar 1
    let mut tr = true_range(bars);
    tr[0] = f64::NAN;

    let smooth_tr = wilder_smooth(&tr, period);
    let smooth_plus_dm = wilder_smooth(&plus_dm, period);
    let smooth_minus_dm = wilder_smooth(&minus_dm, period);

    let mut dx = vec![f64::NAN; n];
    for i in 0..n {
        if smooth_tr[i].is_nan() || smooth_plus_dm[i].is_nan() || smooth_minus_dm[i].is_nan() {
            continue;
        }

        let (plus_di, minus_di) = if smooth_tr[i] > 0.0 {
            (
                100.0 * smooth_plus_dm[i] / smooth_tr[i],
                100.0 * smooth_minus_dm[i] / smooth_tr[i],
            )
        } else {
            (0.0, 0.0)
        };
        out.plus_di[i] = plus_di;
        out.minus_di[i] = minus_di;

        let di_sum = plus_di + minus_di;
        dx[i] = if di_sum == 0.0 {
            0.0
        } else {
            100.0 * (plus_di - minus_di).abs() / di_sum
        };
    }

    out.adx = wilder_smooth(&dx, period);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_bars;

    fn trending_bars(n: usize, step: f64) -> Vec<Bar> {
        let data: Vec<_> = (0..n)
            .map(|i| {
                let base = 100.0 + i as f64 * step;
                (base - 1.0, base + 3.0, base - 3.0, base + 2.0)
            })
            .collect();
        make_ohlc_bars(&data)
    }

    #[test]
    fn adx_bounds() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0),
            (106.0, 107.0, 98.0, 99.0),
            (99.0, 103.0, 97.0, 101.0),
            (101.0, 106.0, 100.0, 105.0),
            (105.0, 110.0, 103.0, 108.0),
            (108.0, 112.0, 106.0, 110.0),
            (110.0, 111.0, 104.0, 105.0),
            (105.0, 109.0, 103.0, 107.0),
            (107.0, 113.0, 105.0, 112.0),
        ]);
        let series = directional_series(&bars, 3);

        for (i, &v) in series.adx.iter().enumerate() {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v), "ADX out of bounds at bar {i}: {v}");
            }
        }
    }

    #[test]
    fn uptrend_has_dominant_plus_di() {
        let bars = trending_bars(30, 5.0);
        let series = directional_series(&bars, 5);
        let last = bars.len() - 1;
        assert!(series.plus_di[last] > series.minus_di[last]);
        assert!(series.adx[last] > 20.0, "ADX should be elevated, got {}", series.adx[last]);
    }

    #[test]
    fn downtrend_has_dominant_minus_di() {
        let bars = trending_bars(30, -2.0);
        let series = directional_series(&bars, 5);
        let last = bars.len() - 1;
        assert!(series.minus_di[last] > series.plus_di[last]);
    }

    #[test]
    fn warmup_matches_lookback() {
        let bars = trending_bars(20, 1.0);
        for line in [DirectionalLine::Adx, DirectionalLine::PlusDi, DirectionalLine::MinusDi] {
            let adx = Adx::line(4, line);
            let result = adx.compute(&bars);
            let first = result.iter().position(|v| !v.is_nan()).unwrap();
            assert_eq!(first, adx.lookback(), "{}", adx.name());
        }
    }

    #[test]
    fn flat_range_reports_zero_di() {
        let bars = make_ohlc_bars(&[(10.0, 10.0, 10.0, 10.0); 8]);
        let series = directional_series(&bars, 3);
        assert_eq!(series.plus_di[7], 0.0);
        assert_eq!(series.minus_di[7], 0.0);
        assert_eq!(series.adx[7], 0.0);
    }

    #[test]
    fn series_matches_per_line_compute() {
        let bars = trending_bars(25, 1.5);
        let series = Adx::new(4).series(&bars);
        let plus = Adx::line(4, DirectionalLine::PlusDi).compute(&bars);
        for (a, b) in series.plus_di.iter().zip(&plus) {
            assert!(a == b || (a.is_nan() && b.is_nan()));
        }
    }

    #[test]
    fn adx_too_few_bars() {
        let bars = make_ohlc_bars(&[(100.0, 105.0, 95.0, 102.0)]);
        assert!(Adx::new(3).compute(&bars).iter().all(|v| v.is_nan()));
    }
}
