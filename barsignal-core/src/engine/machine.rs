//! Per-bar signal state machine.
//!
//! States: Flat, Long, Short. Each bar runs, in order:
//! 1. Undefined indicators: Hold, levels unchanged, position untouched
//! 2. Exit check (trailing stop, stop-loss, take-profit, trend flip);
//!    an exit closes the position and skips entry logic for the bar.
//!    A trend flip on a bar where the opposite entry fires is left to step 4.
//! 3. Trailing stop ratchet toward close -/+ ATR * atr_mult_sl
//! 4. Entry, or reversal when enabled
//! 5. Levels recorded from the post-bar position

use log::debug;

use super::config::SignalConfig;
use super::signals::{entry_signals, BarSnapshot, EntrySignals};
use super::state::{OpenPosition, Position};
use crate::domain::{Decision, Direction, ExitReason, Side, TradeType};

#[derive(Debug, Clone)]
pub struct SignalMachine {
    config: SignalConfig,
}

impl SignalMachine {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn entry_signals(&self, bar: &BarSnapshot) -> EntrySignals {
        entry_signals(bar, &self.config)
    }

    /// Advance one bar. `None` means at least one required indicator is
    /// undefined on this bar.
    pub fn step(&self, position: Position, bar: Option<&BarSnapshot>) -> (Position, Decision) {
        let Some(bar) = bar else {
            return (position, hold(&position));
        };

        let atr = self.effective_atr(bar.atr);
        let signals = self.entry_signals(bar);

        let position = match position {
            Position::Flat => Position::Flat,
            Position::Open(mut open) => {
                // an opposite entry signal goes to the reversal rule, not the trend exit
                let opposed = signals.fires(open.direction.opposite());
                let exit = open
                    .exit_reason(bar, self.config.trend_exit)
                    .filter(|reason| !(opposed && *reason == ExitReason::TrendFlip));

                if let Some(reason) = exit {
                    debug!(
                        "exit {:?} at {:.4} (entered {:.4}): {reason}",
                        open.direction, bar.close, open.entry_price
                    );
                    let decision = Decision {
                        action: TradeType::Close,
                        levels: open.levels(),
                        side: Side::Flat,
                        exit_reason: Some(reason),
                    };
                    return (Position::Flat, decision);
                }
                open.trailing_stop.trail(bar.close, atr * self.config.atr_mult_sl);
                Position::Open(open)
            }
        };

        let entry = match position {
            Position::Flat => signals.direction().map(|direction| match direction {
                Direction::Long => (direction, TradeType::Long),
                Direction::Short => (direction, TradeType::Short),
            }),
            Position::Open(open) if self.config.allow_reversals => {
                let flipped = open.direction.opposite();
                signals.fires(flipped).then(|| match flipped {
                    Direction::Long => (flipped, TradeType::ReverseLong),
                    Direction::Short => (flipped, TradeType::ReverseShort),
                })
            }
            Position::Open(_) => None,
        };

        let Some((direction, action)) = entry else {
            return (position, hold(&position));
        };

        let opened = Position::Open(OpenPosition::enter(direction, bar.close, atr, &self.config));
        debug!("{action} at {:.4}", bar.close);
        let decision = Decision {
            action,
            levels: opened.levels(),
            side: opened.side(),
            exit_reason: None,
        };
        (opened, decision)
    }

    /// Fold the machine over a bar sequence, starting flat.
    pub fn run<'a, I>(&self, bars: I) -> Vec<Decision>
    where
        I: IntoIterator<Item = Option<&'a BarSnapshot>>,
    {
        bars.into_iter()
            .scan(Position::Flat, |position, bar| {
                let (next, decision) = self.step(*position, bar);
                *position = next;
                Some(decision)
            })
            .collect()
    }

    fn effective_atr(&self, atr: f64) -> f64 {
        if atr == 0.0 {
            self.config.atr_floor
        } else {
            atr
        }
    }
}

fn hold(position: &Position) -> Decision {
    Decision {
        action: TradeType::Hold,
        levels: position.levels(),
        side: position.side(),
        exit_reason: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::signals::fixtures::{bearish, bullish};

    fn machine(allow_reversals: bool) -> SignalMachine {
        SignalMachine::new(SignalConfig {
            allow_reversals,
            ..SignalConfig::default()
        })
    }

    fn open_long(machine: &SignalMachine) -> Position {
        let (position, decision) = machine.step(Position::Flat, Some(&bullish(100.0)));
        assert_eq!(decision.action, TradeType::Long);
        position
    }

    fn open_short(machine: &SignalMachine) -> Position {
        let (position, decision) = machine.step(Position::Flat, Some(&bearish(100.0)));
        assert_eq!(decision.action, TradeType::Short);
        position
    }

    #[test]
    fn flat_entry_sets_levels() {
        let m = machine(false);
        let (position, decision) = m.step(Position::Flat, Some(&bullish(100.0)));
        assert_eq!(decision.side, Side::Long);
        assert_eq!(decision.levels.stop_loss, 95.0);
        assert_eq!(decision.levels.take_profit, 106.0);
        assert_eq!(decision.levels.trailing_stop, 95.0);
        assert_eq!(position.levels(), decision.levels);
    }

    #[test]
    fn undefined_bar_holds_and_keeps_levels() {
        let m = machine(false);
        let position = open_long(&m);
        let (next, decision) = m.step(position, None);
        assert_eq!(next, position);
        assert_eq!(decision.action, TradeType::Hold);
        assert_eq!(decision.levels, position.levels());

        let (_, flat) = m.step(Position::Flat, None);
        assert!(flat.levels.is_undefined());
    }

    #[test]
    fn hold_in_position_ratchets_trailing_stop() {
        let m = machine(false);
        let position = open_long(&m);
        // close 104, atr 2, mult 2.5 -> candidate 99
        let (position, decision) = m.step(position, Some(&bullish(104.0)));
        assert_eq!(decision.action, TradeType::Hold);
        assert_eq!(decision.levels.trailing_stop, 99.0);
        assert_eq!(decision.levels.stop_loss, 95.0);

        // pull back: candidate 97.5 is looser, level stays
        let (_, decision) = m.step(position, Some(&bullish(102.5)));
        assert_eq!(decision.levels.trailing_stop, 99.0);
    }

    #[test]
    fn close_reports_pre_exit_levels() {
        let m = machine(false);
        let position = open_long(&m);
        let mut bar = bullish(101.0);
        bar.low = 94.0;
        let (next, decision) = m.step(position, Some(&bar));
        assert!(next.is_flat());
        assert_eq!(decision.action, TradeType::Close);
        assert_eq!(decision.side, Side::Flat);
        assert_eq!(decision.exit_reason, Some(ExitReason::TrailingStop));
        assert_eq!(decision.levels, position.levels());
    }

    #[test]
    fn no_entry_on_exit_bar() {
        let m = machine(true);
        let position = open_short(&m);
        // bullish bar also crosses the short stop: exit wins, no re-entry
        let (next, decision) = m.step(position, Some(&bullish(106.0)));
        assert_eq!(decision.action, TradeType::Close);
        assert!(next.is_flat());
    }

    #[test]
    fn opposite_signal_without_reversals_holds() {
        let m = machine(false);
        let position = open_short(&m);
        let (next, decision) = m.step(position, Some(&bullish(100.0)));
        assert_eq!(decision.action, TradeType::Hold);
        assert_eq!(decision.side, Side::Short);
        assert_eq!(next.side(), Side::Short);
        assert_eq!(decision.levels.stop_loss, 105.0);
    }

    #[test]
    fn opposite_signal_with_reversals_flips() {
        let m = machine(true);
        let position = open_short(&m);
        let (next, decision) = m.step(position, Some(&bullish(100.0)));
        assert_eq!(decision.action, TradeType::ReverseLong);
        assert_eq!(decision.side, Side::Long);
        assert_eq!(decision.levels.stop_loss, 95.0);
        assert_eq!(decision.levels.take_profit, 106.0);
        assert_eq!(decision.levels.trailing_stop, 95.0);
        assert_eq!(next.side(), Side::Long);

        let (_, decision) = m.step(next, Some(&bearish(100.0)));
        assert_eq!(decision.action, TradeType::ReverseShort);
    }

    #[test]
    fn trend_flip_without_signal_closes() {
        let m = machine(true);
        let position = open_short(&m);
        let mut bar = bullish(100.0);
        bar.adx = 10.0;
        assert!(!m.entry_signals(&bar).long);
        let (next, decision) = m.step(position, Some(&bar));
        assert_eq!(decision.action, TradeType::Close);
        assert_eq!(decision.exit_reason, Some(ExitReason::TrendFlip));
        assert!(next.is_flat());
    }

    #[test]
    fn same_direction_signal_while_open_holds() {
        let m = machine(true);
        let position = open_long(&m);
        let (_, decision) = m.step(position, Some(&bullish(101.0)));
        assert_eq!(decision.action, TradeType::Hold);
        assert_eq!(decision.side, Side::Long);
    }

    #[test]
    fn zero_atr_uses_floor() {
        let m = machine(false);
        let mut bar = bullish(100.0);
        bar.atr = 0.0;
        let (_, decision) = m.step(Position::Flat, Some(&bar));
        assert_eq!(decision.action, TradeType::Long);
        assert!(decision.levels.stop_loss < 100.0);
        assert!((decision.levels.stop_loss - (100.0 - 0.0001 * 2.5)).abs() < 1e-12);
    }

    #[test]
    fn run_folds_from_flat() {
        let m = machine(false);
        let bars = [bullish(100.0), bullish(104.0)];
        let decisions = m.run([None, Some(&bars[0]), Some(&bars[1])]);
        let actions: Vec<_> = decisions.iter().map(|d| d.action).collect();
        assert_eq!(actions, [TradeType::Hold, TradeType::Long, TradeType::Hold]);
        assert!(decisions[0].levels.is_undefined());
        assert_eq!(decisions[2].levels.trailing_stop, 99.0);
    }
}
