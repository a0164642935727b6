//! Position accumulator threaded through the bar fold.

use super::config::{SignalConfig, TrendExit};
use super::ratchet::TrailingStop;
use super::signals::BarSnapshot;
use crate::domain::{Direction, ExitReason, Levels, Side};

/// The single position carried from bar to bar.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    #[default]
    Flat,
    Open(OpenPosition),
}

impl Position {
    pub fn side(&self) -> Side {
        match self {
            Position::Flat => Side::Flat,
            Position::Open(open) => open.direction.into(),
        }
    }

    /// Levels in effect, undefined when flat.
    pub fn levels(&self) -> Levels {
        match self {
            Position::Flat => Levels::undefined(),
            Position::Open(open) => open.levels(),
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenPosition {
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub trailing_stop: TrailingStop,
}

impl OpenPosition {
    /// Enter at `close` with stop and target `atr` multiples away.
    /// The trailing stop starts at the stop-loss.
    pub fn enter(direction: Direction, close: f64, atr: f64, config: &SignalConfig) -> Self {
        let sign = direction.signum();
        let stop_loss = close - sign * atr * config.atr_mult_sl;
        let take_profit = close + sign * atr * config.atr_mult_tp;
        Self {
            direction,
            entry_price: close,
            stop_loss,
            take_profit,
            trailing_stop: TrailingStop::new(direction, stop_loss),
        }
    }

    pub fn levels(&self) -> Levels {
        Levels {
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            trailing_stop: self.trailing_stop.level(),
        }
    }

    /// First exit condition hit on this bar, checked in priority order:
    /// trailing stop, stop-loss, take-profit, trend flip.
    pub fn exit_reason(&self, bar: &BarSnapshot, trend_exit: TrendExit) -> Option<ExitReason> {
        if self.trailing_stop.is_breached(bar.high, bar.low) {
            return Some(ExitReason::TrailingStop);
        }

        let (stop_hit, target_hit) = match self.direction {
            Direction::Long => (bar.low <= self.stop_loss, bar.high >= self.take_profit),
            Direction::Short => (bar.high >= self.stop_loss, bar.low <= self.take_profit),
        };
        if stop_hit {
            return Some(ExitReason::StopLoss);
        }
        if target_hit {
            return Some(ExitReason::TakeProfit);
        }

        if self.trend_turned(bar, trend_exit) {
            return Some(ExitReason::TrendFlip);
        }
        None
    }

    fn trend_turned(&self, bar: &BarSnapshot, trend_exit: TrendExit) -> bool {
        match (trend_exit, self.direction) {
            (TrendExit::EmaCross, Direction::Long) => bar.ema_fast < bar.ema_slow,
            (TrendExit::EmaCross, Direction::Short) => bar.ema_fast > bar.ema_slow,
            (TrendExit::PriceCross, Direction::Long) => {
                bar.close < bar.ema_fast || bar.close < bar.vwap
            }
            (TrendExit::PriceCross, Direction::Short) => {
                bar.close > bar.ema_fast || bar.close > bar.vwap
            }
        }
    }
}
