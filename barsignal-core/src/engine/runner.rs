//! Full-series entry point: indicators, then the bar fold.

use std::fmt;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::config::SignalConfig;
use super::machine::SignalMachine;
use crate::domain::{Bar, Decision, Side, TradeType};
use crate::pipeline::{IndicatorFrame, IndicatorPipeline};

/// Degraded-run conditions. The output is still complete (all Hold).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// Fewer cleaned bars than `min_bars`; indicators were not computed.
    InsufficientData { bars: usize, required: usize },
    /// Indicator computation failed; carries the cause.
    IndicatorFailure { reason: String },
    /// Indicators never became defined on the same bar.
    NoValidStart,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::InsufficientData { bars, required } => write!(
                f,
                "insufficient data: {bars} bars, at least {required} required; all bars held"
            ),
            Notice::IndicatorFailure { reason } => {
                write!(f, "indicator computation failed ({reason}); all bars held")
            }
            Notice::NoValidStart => {
                write!(f, "no bar has every indicator defined; all bars held")
            }
        }
    }
}

/// Result of one engine run. `decisions` has one entry per input bar.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    pub decisions: Vec<Decision>,
    /// `None` when indicators were skipped or failed.
    pub indicators: Option<IndicatorFrame>,
    /// First bar the machine evaluated.
    pub start_index: Option<usize>,
    pub notice: Option<Notice>,
}

impl EngineOutput {
    fn all_hold(len: usize, indicators: Option<IndicatorFrame>, notice: Notice) -> Self {
        warn!("{notice}");
        Self {
            decisions: vec![Decision::flat_hold(); len],
            indicators,
            start_index: None,
            notice: Some(notice),
        }
    }

    /// Place a run over a subset of rows back onto `len` rows. Rows missing
    /// from `rows` hold whatever the previous row held.
    fn spread(self, rows: &[usize], len: usize) -> Self {
        let mut slots: Vec<Option<Decision>> = vec![None; len];
        for (&row, decision) in rows.iter().zip(self.decisions) {
            slots[row] = Some(decision);
        }

        let mut decisions: Vec<Decision> = Vec::with_capacity(len);
        for slot in slots {
            let decision = slot.unwrap_or_else(|| carried(decisions.last()));
            decisions.push(decision);
        }

        Self {
            decisions,
            indicators: self.indicators.map(|frame| frame.spread(rows, len)),
            start_index: self.start_index.and_then(|start| rows.get(start).copied()),
            notice: self.notice,
        }
    }
}

fn carried(previous: Option<&Decision>) -> Decision {
    match previous {
        Some(d) if d.side != Side::Flat => Decision {
            action: TradeType::Hold,
            levels: d.levels,
            side: d.side,
            exit_reason: None,
        },
        _ => Decision::flat_hold(),
    }
}

#[derive(Debug, Clone)]
pub struct SignalEngine {
    pipeline: IndicatorPipeline,
    machine: SignalMachine,
}

impl SignalEngine {
    pub fn new(config: SignalConfig) -> Self {
        Self {
            pipeline: IndicatorPipeline::new(config.indicator_variant),
            machine: SignalMachine::new(config),
        }
    }

    pub fn config(&self) -> &SignalConfig {
        self.machine.config()
    }

    /// Run over time-ordered bars.
    ///
    /// Void bars (any NaN field) are set aside before the `min_bars` check
    /// and the indicator pass; each one is reported as a Hold that carries
    /// the position it falls in, with NaN indicator values.
    pub fn run(&self, bars: &[Bar]) -> EngineOutput {
        let rows: Vec<usize> = (0..bars.len()).filter(|&i| !bars[i].is_void()).collect();
        if rows.len() == bars.len() {
            return self.run_clean(bars);
        }

        info!("skipping {} void bars of {}", bars.len() - rows.len(), bars.len());
        let clean: Vec<Bar> = rows.iter().map(|&i| bars[i]).collect();
        self.run_clean(&clean).spread(&rows, bars.len())
    }

    fn run_clean(&self, bars: &[Bar]) -> EngineOutput {
        let required = self.config().min_bars;
        if bars.len() < required {
            return EngineOutput::all_hold(
                bars.len(),
                None,
                Notice::InsufficientData {
                    bars: bars.len(),
                    required,
                },
            );
        }

        let frame = match self.pipeline.compute(bars) {
            Ok(frame) => frame,
            Err(e) => {
                return EngineOutput::all_hold(
                    bars.len(),
                    None,
                    Notice::IndicatorFailure {
                        reason: e.to_string(),
                    },
                )
            }
        };

        let Some(start) = frame.first_complete_index(bars) else {
            return EngineOutput::all_hold(bars.len(), Some(frame), Notice::NoValidStart);
        };

        let snapshots: Vec<_> = bars[start..]
            .iter()
            .enumerate()
            .map(|(offset, bar)| frame.snapshot(start + offset, bar))
            .collect();

        let mut decisions = vec![Decision::flat_hold(); start];
        decisions.extend(self.machine.run(snapshots.iter().map(Option::as_ref)));

        let entries = decisions
            .iter()
            .filter(|d| d.action.opens_position())
            .count();
        info!(
            "evaluated {} of {} bars from index {start}: {entries} entries",
            bars.len() - start,
            bars.len()
        );

        EngineOutput {
            decisions,
            indicators: Some(frame),
            start_index: Some(start),
            notice: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::SyntheticSeries;

    #[test]
    fn short_series_is_all_hold() {
        let bars = SyntheticSeries::new(7, 150).generate();
        let output = SignalEngine::new(SignalConfig::default()).run(&bars);
        assert_eq!(output.decisions.len(), 150);
        assert!(output.indicators.is_none());
        assert_eq!(
            output.notice,
            Some(Notice::InsufficientData {
                bars: 150,
                required: 200
            })
        );
        assert!(output
            .decisions
            .iter()
            .all(|d| d.action == TradeType::Hold && d.levels.is_undefined()));
    }

    #[test]
    fn infinite_price_degrades_to_hold() {
        let mut bars = SyntheticSeries::new(7, 260).generate();
        bars[30].close = f64::INFINITY;
        let output = SignalEngine::new(SignalConfig::default()).run(&bars);
        assert!(matches!(output.notice, Some(Notice::IndicatorFailure { .. })));
        assert_eq!(output.decisions.len(), 260);
        assert!(output.decisions.iter().all(|d| d.action == TradeType::Hold));
    }

    #[test]
    fn warmup_bars_are_flat_hold() {
        let bars = SyntheticSeries::new(7, 400).generate();
        let output = SignalEngine::new(SignalConfig::default()).run(&bars);
        assert_eq!(output.notice, None);
        assert_eq!(output.start_index, Some(199));
        assert!(output.decisions[..199]
            .iter()
            .all(|d| d.action == TradeType::Hold && d.levels.is_undefined()));
    }

    #[test]
    fn zero_volume_series_has_no_valid_start() {
        let mut bars = SyntheticSeries::new(7, 220).generate();
        for bar in &mut bars {
            bar.volume = 0.0;
        }
        let output = SignalEngine::new(SignalConfig::default()).run(&bars);
        assert_eq!(output.notice, Some(Notice::NoValidStart));
        assert!(output.indicators.is_some());
        assert_eq!(output.start_index, None);
    }

    #[test]
    fn notice_serializes_with_kind_tag() {
        let json = serde_json::to_string(&Notice::NoValidStart).unwrap();
        assert_eq!(json, r#"{"kind":"no_valid_start"}"#);
    }

    #[test]
    fn carried_hold_keeps_open_side_and_levels() {
        let open = Decision {
            action: TradeType::Long,
            levels: crate::domain::Levels {
                stop_loss: 95.0,
                take_profit: 106.0,
                trailing_stop: 97.0,
            },
            side: Side::Long,
            exit_reason: None,
        };
        let held = carried(Some(&open));
        assert_eq!(held.action, TradeType::Hold);
        assert_eq!(held.side, Side::Long);
        assert_eq!(held.levels, open.levels);

        let flat = carried(None);
        assert_eq!(flat.side, Side::Flat);
        assert!(flat.levels.is_undefined());
    }

    #[test]
    fn void_bar_gets_nan_indicators() {
        let mut bars = SyntheticSeries::new(7, 300).generate();
        bars[120].open = f64::NAN;
        let output = SignalEngine::new(SignalConfig::default()).run(&bars);
        let frame = output.indicators.unwrap();
        assert_eq!(frame.len(), 300);
        assert!(frame.vwap[120].is_nan());
        assert!(!frame.vwap[121].is_nan());
        // one bar set aside pushes the start back by one row
        assert_eq!(output.start_index, Some(200));
    }
}
