//! Per-bar trade decisions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::position::{Levels, Side};

/// The six actions the state machine can stamp on a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeType {
    Long,
    Short,
    ReverseLong,
    ReverseShort,
    Close,
    Hold,
}

impl TradeType {
    pub const ALL: [TradeType; 6] = [
        TradeType::Long,
        TradeType::Short,
        TradeType::ReverseLong,
        TradeType::ReverseShort,
        TradeType::Close,
        TradeType::Hold,
    ];

    /// Text form written to the `trade_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            TradeType::Long => "LONG",
            TradeType::Short => "SHORT",
            TradeType::ReverseLong => "REVERSE_LONG",
            TradeType::ReverseShort => "REVERSE_SHORT",
            TradeType::Close => "CLOSE",
            TradeType::Hold => "HOLD",
        }
    }

    /// True for every action that leaves a fresh position open.
    pub fn opens_position(self) -> bool {
        match self {
            TradeType::Long
            | TradeType::Short
            | TradeType::ReverseLong
            | TradeType::ReverseShort => true,
            TradeType::Close | TradeType::Hold => false,
        }
    }

    /// True only for same-bar flips.
    pub fn is_reversal(self) -> bool {
        match self {
            TradeType::ReverseLong | TradeType::ReverseShort => true,
            TradeType::Long | TradeType::Short | TradeType::Close | TradeType::Hold => false,
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown trade type: {0}")]
pub struct ParseTradeTypeError(String);

impl FromStr for TradeType {
    type Err = ParseTradeTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TradeType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseTradeTypeError(s.to_string()))
    }
}

/// Why an open position was closed. Variants are listed in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    TrailingStop,
    StopLoss,
    TakeProfit,
    TrendFlip,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::TrailingStop => "trailing_stop",
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::TrendFlip => "trend_flip",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the state machine for a single bar.
///
/// `levels` are the levels in effect after the bar, except on `Close` bars
/// where they are the levels of the position that was just closed.
/// `side` is the position side after the bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: TradeType,
    pub levels: Levels,
    pub side: Side,
    pub exit_reason: Option<ExitReason>,
}

impl Decision {
    /// `Hold` with undefined levels and no position (warm-up and degraded rows).
    pub fn flat_hold() -> Self {
        Self {
            action: TradeType::Hold,
            levels: Levels::undefined(),
            side: Side::Flat,
            exit_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_type_text_roundtrip() {
        for t in TradeType::ALL {
            assert_eq!(t.as_str().parse::<TradeType>().unwrap(), t);
        }
        assert_eq!("reverse_long".parse::<TradeType>().unwrap(), TradeType::ReverseLong);
        assert!("FLIP".parse::<TradeType>().is_err());
    }

    #[test]
    fn trade_type_serializes_as_column_text() {
        let json = serde_json::to_string(&TradeType::ReverseShort).unwrap();
        assert_eq!(json, "\"REVERSE_SHORT\"");
    }

    #[test]
    fn only_entries_open_positions() {
        let opening: Vec<_> = TradeType::ALL
            .into_iter()
            .filter(|t| t.opens_position())
            .collect();
        assert_eq!(opening.len(), 4);
        assert!(!TradeType::Close.opens_position());
        assert!(TradeType::ReverseLong.is_reversal());
        assert!(!TradeType::Long.is_reversal());
    }

    #[test]
    fn flat_hold_has_nan_levels() {
        let d = Decision::flat_hold();
        assert_eq!(d.action, TradeType::Hold);
        assert!(d.levels.is_undefined());
        assert_eq!(d.side, Side::Flat);
    }
}
