//! Run fingerprinting and summaries.
//!
//! - `DecisionFingerprint`: BLAKE3 over every decision; equal fingerprints
//!   mean byte-identical decision columns.
//! - `RunSummary`: per-action counts and identity of a run, for the CLI and
//!   JSON output.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Decision, Side, TradeType};
use crate::engine::{EngineOutput, Notice, SignalConfig};

/// Content hash of a decision sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecisionFingerprint(pub String);

impl DecisionFingerprint {
    pub fn from_decisions(decisions: &[Decision]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(decisions.len() as u64).to_le_bytes());
        for d in decisions {
            hasher.update(d.action.as_str().as_bytes());
            hasher.update(&[side_tag(d.side)]);
            for level in [d.levels.stop_loss, d.levels.take_profit, d.levels.trailing_stop] {
                hasher.update(&canonical_bits(level).to_le_bytes());
            }
            match d.exit_reason {
                Some(reason) => hasher.update(reason.as_str().as_bytes()),
                None => hasher.update(b"-"),
            };
        }
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DecisionFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// every NaN hashes the same
fn canonical_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

fn side_tag(side: Side) -> u8 {
    match side {
        Side::Flat => 0,
        Side::Long => 1,
        Side::Short => 2,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub bars: usize,
    pub start_index: Option<usize>,
    /// Count per action text, every action present (zero if unused).
    pub actions: BTreeMap<String, usize>,
    /// Positions closed, by exit or by reversal.
    pub round_trips: usize,
    pub final_side: Side,
    pub notice: Option<Notice>,
    pub config_hash: String,
    pub fingerprint: DecisionFingerprint,
}

impl RunSummary {
    pub fn new(output: &EngineOutput, config: &SignalConfig) -> Self {
        let mut actions: BTreeMap<String, usize> = TradeType::ALL
            .iter()
            .map(|t| (t.as_str().to_string(), 0))
            .collect();
        for d in &output.decisions {
            *actions.entry(d.action.as_str().to_string()).or_default() += 1;
        }

        let round_trips = output
            .decisions
            .iter()
            .filter(|d| d.action == TradeType::Close || d.action.is_reversal())
            .count();

        Self {
            bars: output.decisions.len(),
            start_index: output.start_index,
            actions,
            round_trips,
            final_side: output.decisions.last().map_or(Side::Flat, |d| d.side),
            notice: output.notice.clone(),
            config_hash: config.config_hash(),
            fingerprint: DecisionFingerprint::from_decisions(&output.decisions),
        }
    }

    pub fn count(&self, action: TradeType) -> usize {
        self.actions.get(action.as_str()).copied().unwrap_or(0)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "bars:        {}", self.bars)?;
        match self.start_index {
            Some(start) => writeln!(f, "start index: {start}")?,
            None => writeln!(f, "start index: -")?,
        }
        for (action, count) in &self.actions {
            writeln!(f, "{action:<14} {count}")?;
        }
        writeln!(f, "round trips: {}", self.round_trips)?;
        writeln!(f, "final side:  {:?}", self.final_side)?;
        writeln!(f, "config:      {}", self.config_hash)?;
        write!(f, "fingerprint: {}", self.fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExitReason, Levels};

    fn long_then_close() -> Vec<Decision> {
        let levels = Levels {
            stop_loss: 95.0,
            take_profit: 106.0,
            trailing_stop: 95.0,
        };
        vec![
            Decision::flat_hold(),
            Decision {
                action: TradeType::Long,
                levels,
                side: Side::Long,
                exit_reason: None,
            },
            Decision {
                action: TradeType::Close,
                levels,
                side: Side::Flat,
                exit_reason: Some(ExitReason::TakeProfit),
            },
        ]
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let a = DecisionFingerprint::from_decisions(&long_then_close());
        let b = DecisionFingerprint::from_decisions(&long_then_close());
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn fingerprint_sees_level_changes() {
        let mut changed = long_then_close();
        changed[1].levels.trailing_stop = 95.5;
        assert_ne!(
            DecisionFingerprint::from_decisions(&long_then_close()),
            DecisionFingerprint::from_decisions(&changed)
        );
    }

    #[test]
    fn fingerprint_sees_exit_reason() {
        let mut changed = long_then_close();
        changed[2].exit_reason = Some(ExitReason::StopLoss);
        assert_ne!(
            DecisionFingerprint::from_decisions(&long_then_close()),
            DecisionFingerprint::from_decisions(&changed)
        );
    }

    #[test]
    fn summary_counts_actions() {
        let output = EngineOutput {
            decisions: long_then_close(),
            indicators: None,
            start_index: Some(0),
            notice: None,
        };
        let summary = RunSummary::new(&output, &SignalConfig::default());
        assert_eq!(summary.bars, 3);
        assert_eq!(summary.count(TradeType::Hold), 1);
        assert_eq!(summary.count(TradeType::Long), 1);
        assert_eq!(summary.count(TradeType::ReverseShort), 0);
        assert_eq!(summary.actions.len(), 6);
        assert_eq!(summary.round_trips, 1);
        assert_eq!(summary.final_side, Side::Flat);

        let json = summary.to_json().unwrap();
        assert!(json.contains("\"round_trips\": 1"));
        assert!(json.contains(summary.fingerprint.as_str()));
    }
}
