//! DataFrame boundary: schema enforcement, cleaning, appended columns.

use barsignal_core::engine::{Notice, SignalConfig};
use barsignal_core::frame::{bars_to_frame, run_frame, EngineError};
use barsignal_core::pipeline::COLUMNS;
use barsignal_core::synthetic::SyntheticSeries;
use polars::prelude::*;

fn synthetic_frame(n: usize) -> DataFrame {
    bars_to_frame(&SyntheticSeries::new(17, n).generate()).unwrap()
}

fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

fn floats(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect()
}

#[test]
fn missing_volume_is_a_schema_error() {
    let df = synthetic_frame(250).drop("volume").unwrap();
    let err = run_frame(&df, &SignalConfig::default()).unwrap_err();
    assert!(matches!(err, EngineError::MissingColumn(ref name) if name == "volume"));
    assert_eq!(err.to_string(), "missing required column: 'volume'");
}

#[test]
fn column_names_are_case_insensitive() {
    let mut df = synthetic_frame(260);
    df.rename("open", "Open".into()).unwrap();
    df.rename("high", "HIGH".into()).unwrap();
    df.rename("volume", "Vol".into()).unwrap();
    df.rename("timestamp", "DateTime".into()).unwrap();

    let out = run_frame(&df, &SignalConfig::default()).unwrap();
    assert_eq!(out.notice, None);
    assert_eq!(out.frame.height(), 260);
    for name in ["timestamp", "open", "high", "volume", "trade_type", "SL", "TP", "TSL"] {
        assert!(out.frame.column(name).is_ok(), "missing {name}");
    }
}

#[test]
fn output_appends_indicators_and_decisions() {
    let df = synthetic_frame(400);
    let out = run_frame(&df, &SignalConfig::default()).unwrap();

    for name in COLUMNS {
        assert_eq!(out.frame.column(name).unwrap().len(), 400, "{name}");
    }
    let trade_types = strings(&out.frame, "trade_type");
    let allowed = ["LONG", "SHORT", "REVERSE_LONG", "REVERSE_SHORT", "CLOSE", "HOLD"];
    assert!(trade_types
        .iter()
        .all(|t| t.as_deref().is_some_and(|t| allowed.contains(&t))));
    assert!(trade_types[..199].iter().all(|t| t.as_deref() == Some("HOLD")));

    let exit_reasons = strings(&out.frame, "exit_reason");
    for (action, reason) in trade_types.iter().zip(&exit_reasons) {
        assert_eq!(action.as_deref() == Some("CLOSE"), reason.is_some());
    }
    assert_eq!(out.fingerprint, out.summary.fingerprint);
    assert_eq!(out.summary.bars, 400);
}

#[test]
fn rows_with_missing_prices_are_dropped() {
    let mut df = synthetic_frame(260);
    let mut closes: Vec<Option<f64>> = floats(&df, "close").into_iter().map(Some).collect();
    closes[3] = None;
    closes[10] = Some(f64::NAN);
    df.with_column(Column::new("close".into(), closes)).unwrap();

    let out = run_frame(&df, &SignalConfig::default()).unwrap();
    assert_eq!(out.frame.height(), 258);
    assert!(floats(&out.frame, "close").iter().all(|c| c.is_finite()));
}

#[test]
fn short_table_is_held_without_indicators() {
    let df = synthetic_frame(150);
    let out = run_frame(&df, &SignalConfig::default()).unwrap();

    assert_eq!(
        out.notice,
        Some(Notice::InsufficientData {
            bars: 150,
            required: 200
        })
    );
    assert!(out.frame.column("ema_200").is_err());
    assert!(strings(&out.frame, "trade_type")
        .iter()
        .all(|t| t.as_deref() == Some("HOLD")));
    for name in ["SL", "TP", "TSL"] {
        assert!(floats(&out.frame, name).iter().all(|v| v.is_nan()), "{name}");
    }
}

#[test]
fn cleaning_counts_toward_minimum_bars() {
    let mut df = synthetic_frame(201);
    let mut volumes: Vec<Option<f64>> = floats(&df, "volume").into_iter().map(Some).collect();
    volumes[0] = None;
    volumes[1] = None;
    df.with_column(Column::new("volume".into(), volumes)).unwrap();

    let out = run_frame(&df, &SignalConfig::default()).unwrap();
    assert!(matches!(
        out.notice,
        Some(Notice::InsufficientData { bars: 199, .. })
    ));
}

#[test]
fn text_prices_that_do_not_parse_are_dropped() {
    let df = df!(
        "open" => ["1.0", "x"],
        "high" => ["2.0", "2.0"],
        "low" => ["0.5", "0.5"],
        "close" => ["1.5", "1.5"],
        "volume" => ["10", "10"],
    )
    .unwrap();
    let config = SignalConfig {
        min_bars: 1,
        ..SignalConfig::default()
    };
    let out = run_frame(&df, &config).unwrap();
    assert_eq!(out.frame.height(), 1);
}
