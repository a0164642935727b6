//! Table boundary: a Polars DataFrame in, the same table plus decision
//! columns out.
//!
//! Column names are matched case-insensitively. Rows with a missing or NaN
//! required field are dropped before the engine sees the series; the
//! returned frame holds only the rows that were evaluated.

use std::collections::HashSet;

use log::info;
use polars::prelude::*;

use crate::domain::{Bar, Decision};
use crate::engine::{EngineOutput, Notice, SignalConfig, SignalEngine};
use crate::fingerprint::{DecisionFingerprint, RunSummary};

pub const REQUIRED_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// Canonical name of the optional ordering column.
pub const TIME_COLUMN: &str = "timestamp";

const TIME_ALIASES: [&str; 3] = ["datetime", "date", "time"];

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("missing required column: '{0}'")]
    MissingColumn(String),

    #[error("column '{0}' appears more than once after normalization")]
    DuplicateColumn(String),

    #[error(transparent)]
    Frame(#[from] PolarsError),
}

/// Augmented table and run metadata.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub frame: DataFrame,
    pub notice: Option<Notice>,
    pub fingerprint: DecisionFingerprint,
    pub summary: RunSummary,
}

/// Trim and lower-case column names, fold `vol` into `volume`, and name the
/// first time-like column `timestamp`.
pub fn normalize_columns(df: &mut DataFrame) -> Result<(), EngineError> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(df.width());

    for name in df.get_column_names() {
        let mut normalized = name.trim().to_lowercase();
        if normalized == "vol" {
            normalized = "volume".to_string();
        }
        if !seen.insert(normalized.clone()) {
            return Err(EngineError::DuplicateColumn(normalized));
        }
        names.push(normalized);
    }

    if !seen.contains(TIME_COLUMN) {
        if let Some(alias) = names
            .iter_mut()
            .find(|n| TIME_ALIASES.contains(&n.as_str()))
        {
            *alias = TIME_COLUMN.to_string();
        }
    }

    df.set_column_names(names.iter().map(String::as_str))?;
    Ok(())
}

/// Run the engine over a bar table.
///
/// Fails only when a required column is absent (before any computation) or
/// the table cannot be read as numbers. Every other condition yields a full
/// table and, when degraded, a notice.
pub fn run_frame(df: &DataFrame, config: &SignalConfig) -> Result<FrameOutput, EngineError> {
    let mut df = df.clone();
    normalize_columns(&mut df)?;

    let present: HashSet<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !present.contains(**c)) {
        return Err(EngineError::MissingColumn(missing.to_string()));
    }

    for name in REQUIRED_COLUMNS {
        let cast = df.column(name)?.cast(&DataType::Float64)?;
        df.with_column(cast)?;
    }

    let (df, bars) = drop_void_rows(df)?;

    let engine = SignalEngine::new(config.clone());
    let output = engine.run(&bars);
    let summary = RunSummary::new(&output, config);
    let frame = append_outputs(df, &output)?;

    Ok(FrameOutput {
        frame,
        notice: output.notice,
        fingerprint: summary.fingerprint.clone(),
        summary,
    })
}

/// Drop rows whose bar is void (a null or NaN required field), keeping the
/// table and the bars row-aligned.
fn drop_void_rows(df: DataFrame) -> Result<(DataFrame, Vec<Bar>), EngineError> {
    let mut bars = frame_to_bars(&df)?;
    let keep: Vec<bool> = bars.iter().map(|b| !b.is_void()).collect();

    let dropped = keep.iter().filter(|k| !**k).count();
    if dropped == 0 {
        return Ok((df, bars));
    }
    info!("dropped {dropped} of {} rows with missing price or volume", df.height());
    bars.retain(|b| !b.is_void());
    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    Ok((df.filter(&mask)?, bars))
}

/// Read bars from a frame with Float64 required columns; nulls read as NaN.
pub fn frame_to_bars(df: &DataFrame) -> Result<Vec<Bar>, EngineError> {
    let timestamps = timestamps(df)?;
    let column = |name: &str| -> Result<Vec<f64>, EngineError> {
        Ok(df
            .column(name)?
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    };

    let open = column("open")?;
    let high = column("high")?;
    let low = column("low")?;
    let close = column("close")?;
    let volume = column("volume")?;

    Ok((0..df.height())
        .map(|i| Bar {
            timestamp: timestamps[i],
            open: open[i],
            high: high[i],
            low: low[i],
            close: close[i],
            volume: volume[i],
        })
        .collect())
}

/// Epoch milliseconds from the time column, or the row number when there is
/// none (or it is not temporal/integer).
fn timestamps(df: &DataFrame) -> Result<Vec<i64>, EngineError> {
    let n = df.height();
    let row_numbers = || (0..n as i64).collect::<Vec<_>>();

    let Ok(col) = df.column(TIME_COLUMN) else {
        return Ok(row_numbers());
    };

    let raw: Vec<Option<i64>> = match col.dtype() {
        DataType::Datetime(unit, _) => {
            let per_ms = match unit {
                TimeUnit::Nanoseconds => 1_000_000,
                TimeUnit::Microseconds => 1_000,
                TimeUnit::Milliseconds => 1,
            };
            let ints = col.cast(&DataType::Int64)?;
            ints.i64()?.into_iter().map(|v| v.map(|v| v / per_ms)).collect()
        }
        DataType::Date => {
            let days = col.cast(&DataType::Int32)?;
            days.i32()?
                .into_iter()
                .map(|v| v.map(|d| i64::from(d) * 86_400_000))
                .collect()
        }
        dtype if dtype.is_integer() => {
            let ints = col.cast(&DataType::Int64)?;
            ints.i64()?.into_iter().collect()
        }
        _ => return Ok(row_numbers()),
    };

    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(i, v)| v.unwrap_or(i as i64))
        .collect())
}

fn append_outputs(mut df: DataFrame, output: &EngineOutput) -> Result<DataFrame, EngineError> {
    if let Some(indicators) = &output.indicators {
        for (name, series) in indicators.columns() {
            df.with_column(Column::new(name.into(), series.to_vec()))?;
        }
    }

    let decisions = &output.decisions;
    let level = |f: fn(&Decision) -> f64| decisions.iter().map(f).collect::<Vec<f64>>();

    let trade_type: Vec<&str> = decisions.iter().map(|d| d.action.as_str()).collect();
    let exit_reason: Vec<Option<&str>> = decisions
        .iter()
        .map(|d| d.exit_reason.map(|r| r.as_str()))
        .collect();

    df.with_column(Column::new("trade_type".into(), trade_type))?;
    df.with_column(Column::new("SL".into(), level(|d| d.levels.stop_loss)))?;
    df.with_column(Column::new("TP".into(), level(|d| d.levels.take_profit)))?;
    df.with_column(Column::new("TSL".into(), level(|d| d.levels.trailing_stop)))?;
    df.with_column(Column::new("exit_reason".into(), exit_reason))?;
    Ok(df)
}

/// Build a bar table (`timestamp` as a millisecond datetime plus OHLCV).
pub fn bars_to_frame(bars: &[Bar]) -> Result<DataFrame, EngineError> {
    let field = |f: fn(&Bar) -> f64| bars.iter().map(f).collect::<Vec<f64>>();
    let timestamps: Vec<i64> = bars.iter().map(|b| b.timestamp).collect();

    Ok(DataFrame::new(vec![
        Column::new(TIME_COLUMN.into(), timestamps)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
        Column::new("open".into(), field(|b| b.open)),
        Column::new("high".into(), field(|b| b.high)),
        Column::new("low".into(), field(|b| b.low)),
        Column::new("close".into(), field(|b| b.close)),
        Column::new("volume".into(), field(|b| b.volume)),
    ])?)
}
