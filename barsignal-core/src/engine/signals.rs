//! Entry predicates.
//!
//! A long or short signal needs five filters to agree on the same bar:
//! trend (fast vs slow EMA), price vs VWAP, Bollinger width above the floor,
//! ADX above the threshold with the matching DI line on top, and RSI past
//! its (asymmetric) entry threshold.

use serde::{Deserialize, Serialize};

use super::config::SignalConfig;
use crate::domain::Direction;

/// Per-bar inputs read by the state machine. Every field is defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarSnapshot {
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub vwap: f64,
    pub bb_width: f64,
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
    pub rsi: f64,
    pub atr: f64,
}

/// Outcome of the entry predicates for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntrySignals {
    pub long: bool,
    pub short: bool,
}

impl EntrySignals {
    /// The firing direction, long first. Both predicates cannot hold on the
    /// same bar since they require opposite EMA orderings.
    pub fn direction(self) -> Option<Direction> {
        if self.long {
            Some(Direction::Long)
        } else if self.short {
            Some(Direction::Short)
        } else {
            None
        }
    }

    pub fn fires(self, direction: Direction) -> bool {
        match direction {
            Direction::Long => self.long,
            Direction::Short => self.short,
        }
    }
}

pub fn entry_signals(bar: &BarSnapshot, config: &SignalConfig) -> EntrySignals {
    let volatile = bar.bb_width > config.min_bb_width;
    let trending = bar.adx > config.adx_threshold;

    let long = bar.ema_fast > bar.ema_slow
        && bar.close > bar.vwap
        && volatile
        && trending
        && bar.plus_di > bar.minus_di
        && bar.rsi >= config.rsi_long_entry;

    let short = bar.ema_fast < bar.ema_slow
        && bar.close < bar.vwap
        && volatile
        && trending
        && bar.minus_di > bar.plus_di
        && bar.rsi <= config.rsi_short_entry;

    EntrySignals { long, short }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{bearish, bullish};
    use super::*;

    #[test]
    fn bullish_bar_fires_long_only() {
        let s = entry_signals(&bullish(100.0), &SignalConfig::default());
        assert!(s.long);
        assert!(!s.short);
        assert_eq!(s.direction(), Some(Direction::Long));
    }

    #[test]
    fn bearish_bar_fires_short_only() {
        let s = entry_signals(&bearish(100.0), &SignalConfig::default());
        assert_eq!(s, EntrySignals { long: false, short: true });
        assert!(s.fires(Direction::Short));
    }

    #[test]
    fn each_filter_can_veto_a_long() {
        let config = SignalConfig::default();
        let vetoes: [fn(&mut BarSnapshot); 6] = [
            |b| b.ema_fast = 99.0,
            |b| b.vwap = b.close + 0.5,
            |b| b.bb_width = 0.015,
            |b| b.adx = 28.0,
            |b| b.minus_di = 31.0,
            |b| b.rsi = 54.9,
        ];
        for veto in vetoes {
            let mut bar = bullish(100.0);
            veto(&mut bar);
            assert!(!entry_signals(&bar, &config).long, "{bar:?}");
        }
    }

    #[test]
    fn rsi_thresholds_are_inclusive() {
        let config = SignalConfig::default();
        let mut long = bullish(100.0);
        long.rsi = config.rsi_long_entry;
        assert!(entry_signals(&long, &config).long);

        let mut short = bearish(100.0);
        short.rsi = config.rsi_short_entry;
        assert!(entry_signals(&short, &config).short);
    }

    #[test]
    fn neutral_bar_fires_nothing() {
        let mut bar = bullish(100.0);
        bar.ema_fast = bar.ema_slow;
        assert_eq!(entry_signals(&bar, &SignalConfig::default()).direction(), None);
    }
}
