//! Indicator pipeline.
//!
//! All indicators are computed once over the full series before the state
//! machine runs. Independent indicators run in parallel; each one walks the
//! bars in order, so no value can see a later bar.

use std::panic::{self, AssertUnwindSafe};

use crate::domain::Bar;
use crate::engine::BarSnapshot;
use crate::indicators::{
    bollinger_width, Adx, Atr, Bollinger, Ema, Indicator, IndicatorVariant, Rsi, Vwap,
};

pub const EMA_FAST_SPAN: usize = 50;
pub const EMA_SLOW_SPAN: usize = 200;
pub const BB_PERIOD: usize = 20;
pub const BB_STD_MULT: f64 = 2.0;
pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const ADX_PERIOD: usize = 14;

/// Indicator columns in output order.
pub const COLUMNS: [&str; 12] = [
    "ema_50", "ema_200", "bb_mid", "bb_upper", "bb_lower", "bb_width", "vwap", "rsi", "atr",
    "adx", "plus_di", "minus_di",
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndicatorError {
    #[error("non-finite {field} at bar {index}")]
    NonFiniteInput { index: usize, field: &'static str },

    #[error("indicator '{name}' produced {actual} values for {expected} bars")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("indicator computation panicked: {0}")]
    Panicked(String),
}

/// Precomputed indicator series, one value per bar.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    pub ema_50: Vec<f64>,
    pub ema_200: Vec<f64>,
    pub bb_mid: Vec<f64>,
    pub bb_upper: Vec<f64>,
    pub bb_lower: Vec<f64>,
    pub bb_width: Vec<f64>,
    pub vwap: Vec<f64>,
    pub rsi: Vec<f64>,
    pub atr: Vec<f64>,
    pub adx: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
}

impl IndicatorFrame {
    /// Named series in `COLUMNS` order.
    pub fn columns(&self) -> [(&'static str, &[f64]); 12] {
        [
            ("ema_50", &self.ema_50),
            ("ema_200", &self.ema_200),
            ("bb_mid", &self.bb_mid),
            ("bb_upper", &self.bb_upper),
            ("bb_lower", &self.bb_lower),
            ("bb_width", &self.bb_width),
            ("vwap", &self.vwap),
            ("rsi", &self.rsi),
            ("atr", &self.atr),
            ("adx", &self.adx),
            ("plus_di", &self.plus_di),
            ("minus_di", &self.minus_di),
        ]
    }

    pub fn len(&self) -> usize {
        self.ema_50.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The machine's inputs for bar `index`, or `None` if any required
    /// indicator is undefined there.
    pub fn snapshot(&self, index: usize, bar: &Bar) -> Option<BarSnapshot> {
        let snap = BarSnapshot {
            close: bar.close,
            high: bar.high,
            low: bar.low,
            ema_fast: *self.ema_50.get(index)?,
            ema_slow: *self.ema_200.get(index)?,
            vwap: *self.vwap.get(index)?,
            bb_width: *self.bb_width.get(index)?,
            adx: *self.adx.get(index)?,
            plus_di: *self.plus_di.get(index)?,
            minus_di: *self.minus_di.get(index)?,
            rsi: *self.rsi.get(index)?,
            atr: *self.atr.get(index)?,
        };

        let required = [
            snap.ema_fast,
            snap.ema_slow,
            snap.vwap,
            snap.bb_width,
            snap.adx,
            snap.plus_di,
            snap.minus_di,
            snap.rsi,
            snap.atr,
        ];
        if required.iter().any(|v| v.is_nan()) {
            None
        } else {
            Some(snap)
        }
    }

    /// First bar at which every required indicator is defined.
    pub fn first_complete_index(&self, bars: &[Bar]) -> Option<usize> {
        bars.iter()
            .enumerate()
            .position(|(i, bar)| self.snapshot(i, bar).is_some())
    }

    /// Scatter the columns onto `len` rows; row `rows[i]` takes value `i`,
    /// every other row is NaN.
    pub(crate) fn spread(&self, rows: &[usize], len: usize) -> IndicatorFrame {
        let spread = |series: &[f64]| {
            let mut out = vec![f64::NAN; len];
            for (&row, &value) in rows.iter().zip(series) {
                out[row] = value;
            }
            out
        };

        IndicatorFrame {
            ema_50: spread(&self.ema_50),
            ema_200: spread(&self.ema_200),
            bb_mid: spread(&self.bb_mid),
            bb_upper: spread(&self.bb_upper),
            bb_lower: spread(&self.bb_lower),
            bb_width: spread(&self.bb_width),
            vwap: spread(&self.vwap),
            rsi: spread(&self.rsi),
            atr: spread(&self.atr),
            adx: spread(&self.adx),
            plus_di: spread(&self.plus_di),
            minus_di: spread(&self.minus_di),
        }
    }

    fn check_lengths(&self, expected: usize) -> Result<(), IndicatorError> {
        for (name, series) in self.columns() {
            if series.len() != expected {
                return Err(IndicatorError::LengthMismatch {
                    name,
                    expected,
                    actual: series.len(),
                });
            }
        }
        Ok(())
    }
}

/// Computes the fixed indicator set for one variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorPipeline {
    variant: IndicatorVariant,
}

impl IndicatorPipeline {
    pub fn new(variant: IndicatorVariant) -> Self {
        Self { variant }
    }

    pub fn variant(&self) -> IndicatorVariant {
        self.variant
    }

    /// Compute every indicator over `bars`.
    ///
    /// Infinite inputs are rejected up front; a panic inside any indicator is
    /// caught and reported as `IndicatorError::Panicked`.
    pub fn compute(&self, bars: &[Bar]) -> Result<IndicatorFrame, IndicatorError> {
        if let Some((index, field)) = bars
            .iter()
            .enumerate()
            .find_map(|(i, b)| b.non_finite_field().map(|f| (i, f)))
        {
            return Err(IndicatorError::NonFiniteInput { index, field });
        }

        let frame = panic::catch_unwind(AssertUnwindSafe(|| self.compute_parallel(bars)))
            .map_err(|payload| IndicatorError::Panicked(panic_message(payload.as_ref())))?;

        frame.check_lengths(bars.len())?;
        Ok(frame)
    }

    fn ema(&self, span: usize) -> Ema {
        match self.variant {
            IndicatorVariant::Wilder => Ema::new(span),
            IndicatorVariant::Simple => Ema::recursive(span),
        }
    }

    fn band(&self, band: Bollinger) -> Bollinger {
        match self.variant {
            IndicatorVariant::Wilder => band,
            IndicatorVariant::Simple => band.sample(),
        }
    }

    fn rsi(&self) -> Rsi {
        match self.variant {
            IndicatorVariant::Wilder => Rsi::wilder(RSI_PERIOD),
            IndicatorVariant::Simple => Rsi::rolling(RSI_PERIOD),
        }
    }

    fn atr(&self) -> Atr {
        match self.variant {
            IndicatorVariant::Wilder => Atr::wilder(ATR_PERIOD),
            IndicatorVariant::Simple => Atr::range_mean(ATR_PERIOD),
        }
    }

    fn compute_parallel(&self, bars: &[Bar]) -> IndicatorFrame {
        let bands = || {
            let band = |b: Bollinger| self.band(b).compute(bars);
            (
                band(Bollinger::middle(BB_PERIOD, BB_STD_MULT)),
                band(Bollinger::upper(BB_PERIOD, BB_STD_MULT)),
                band(Bollinger::lower(BB_PERIOD, BB_STD_MULT)),
            )
        };

        let (((ema_50, ema_200), ((bb_mid, bb_upper, bb_lower), vwap)), ((rsi, atr), directional)) =
            rayon::join(
                || {
                    rayon::join(
                        || {
                            rayon::join(
                                || self.ema(EMA_FAST_SPAN).compute(bars),
                                || self.ema(EMA_SLOW_SPAN).compute(bars),
                            )
                        },
                        || rayon::join(bands, || Vwap::new().compute(bars)),
                    )
                },
                || {
                    rayon::join(
                        || rayon::join(|| self.rsi().compute(bars), || self.atr().compute(bars)),
                        || Adx::new(ADX_PERIOD).series(bars),
                    )
                },
            );

        let bb_width = bollinger_width(&bb_upper, &bb_lower, &bb_mid);

        IndicatorFrame {
            ema_50,
            ema_200,
            bb_mid,
            bb_upper,
            bb_lower,
            bb_width,
            vwap,
            rsi,
            atr,
            adx: directional.adx,
            plus_di: directional.plus_di,
            minus_di: directional.minus_di,
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
