//! Bar: the fundamental market data unit.

use serde::{Deserialize, Serialize};

/// One OHLCV row of the input series.
///
/// `timestamp` is an ordering key only: epoch milliseconds when the source
/// table carries a time column, otherwise the row number. Indicators never
/// read it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns true if any OHLCV field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// Returns the first OHLCV field holding an infinite value, if any.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ]
        .into_iter()
        .find(|(_, v)| v.is_infinite())
        .map(|(name, _)| name)
    }
}
