//! Signal configuration.
//!
//! Every option has a baked-in default; a TOML file may override any subset.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorVariant;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Trend-weakening exit rule for an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendExit {
    /// Fast EMA crosses the slow EMA against the position.
    #[default]
    EmaCross,
    /// Close crosses the fast EMA or VWAP against the position.
    PriceCross,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalConfig {
    /// Stop distance in ATR units. Also sets the trailing distance.
    pub atr_mult_sl: f64,
    /// Target distance in ATR units.
    pub atr_mult_tp: f64,
    /// Bollinger width floor; narrower bands are treated as sideways.
    pub min_bb_width: f64,
    pub adx_threshold: f64,
    /// Long entries need RSI at or above this.
    pub rsi_long_entry: f64,
    /// Short entries need RSI at or below this.
    pub rsi_short_entry: f64,
    /// Flip an open position on an opposite signal in the same bar.
    pub allow_reversals: bool,
    /// Cleaned bars required before indicators are computed at all.
    pub min_bars: usize,
    /// Stands in for an ATR of exactly zero.
    pub atr_floor: f64,
    pub indicator_variant: IndicatorVariant,
    pub trend_exit: TrendExit,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            atr_mult_sl: 2.5,
            atr_mult_tp: 3.0,
            min_bb_width: 0.015,
            adx_threshold: 28.0,
            rsi_long_entry: 55.0,
            rsi_short_entry: 45.0,
            allow_reversals: false,
            min_bars: 200,
            atr_floor: 0.0001,
            indicator_variant: IndicatorVariant::Wilder,
            trend_exit: TrendExit::EmaCross,
        }
    }
}

impl SignalConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("atr_mult_sl", self.atr_mult_sl)?;
        positive("atr_mult_tp", self.atr_mult_tp)?;
        positive("atr_floor", self.atr_floor)?;
        non_negative("min_bb_width", self.min_bb_width)?;
        percent("adx_threshold", self.adx_threshold)?;
        percent("rsi_long_entry", self.rsi_long_entry)?;
        percent("rsi_short_entry", self.rsi_short_entry)?;

        if self.min_bars == 0 {
            return Err(ConfigError::Invalid {
                field: "min_bars",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Stable hash of every option value.
    pub fn config_hash(&self) -> String {
        let canonical = serde_json::json!({
            "adx_threshold": self.adx_threshold,
            "allow_reversals": self.allow_reversals,
            "atr_floor": self.atr_floor,
            "atr_mult_sl": self.atr_mult_sl,
            "atr_mult_tp": self.atr_mult_tp,
            "indicator_variant": self.indicator_variant,
            "min_bars": self.min_bars,
            "min_bb_width": self.min_bb_width,
            "rsi_long_entry": self.rsi_long_entry,
            "rsi_short_entry": self.rsi_short_entry,
            "trend_exit": self.trend_exit,
        });
        blake3::hash(canonical.to_string().as_bytes())
            .to_hex()
            .to_string()
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be a positive number, got {value}"),
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be >= 0, got {value}"),
        })
    }
}

fn percent(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be within 0..=100, got {value}"),
        })
    }
}
