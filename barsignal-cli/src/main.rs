//! barsignal CLI: run the signal engine over a bar table, generate
//! synthetic series, print the default configuration.
//!
//! Commands:
//! - `run` reads a CSV or Parquet table, appends indicator and decision
//!   columns, prints the run summary and optionally writes the result
//! - `synth` writes a reproducible synthetic OHLCV series
//! - `config` prints the effective configuration as TOML

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use barsignal_core::engine::SignalConfig;
use barsignal_core::fingerprint::RunSummary;
use barsignal_core::frame::{bars_to_frame, run_frame};
use barsignal_core::indicators::IndicatorVariant;
use barsignal_core::synthetic::SyntheticSeries;
use clap::{Parser, Subcommand};
use log::info;
use polars::prelude::*;

#[derive(Parser)]
#[command(
    name = "barsignal",
    about = "barsignal: bar-by-bar trend signals with stop, target and trailing levels"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine over a CSV or Parquet bar table.
    Run {
        /// Input table (.csv or .parquet).
        #[arg(long)]
        input: PathBuf,

        /// Write the augmented table here (.csv or .parquet).
        #[arg(long)]
        output: Option<PathBuf>,

        /// Path to a TOML config file. Defaults apply to missing keys.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Flip directly between long and short on an opposite signal.
        #[arg(long, default_value_t = false)]
        allow_reversals: bool,

        /// Indicator formulas: wilder or simple.
        #[arg(long)]
        variant: Option<IndicatorVariant>,

        /// Print the summary as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write a synthetic OHLCV series.
    Synth {
        /// Number of bars.
        #[arg(long, default_value_t = 1_000)]
        bars: usize,

        /// RNG seed. Same seed, same series.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Bars per trend regime before the drift flips sign.
        #[arg(long)]
        regime_len: Option<usize>,

        /// Minutes between bars.
        #[arg(long, default_value_t = 1)]
        interval_minutes: i64,

        /// Output file (.csv or .parquet).
        #[arg(long)]
        output: PathBuf,
    },
    /// Print the effective configuration as TOML.
    Config {
        /// Load and validate this file instead of printing the defaults.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            output,
            config,
            allow_reversals,
            variant,
            json,
        } => run_cmd(
            &input,
            output.as_deref(),
            config.as_deref(),
            allow_reversals,
            variant,
            json,
        ),
        Commands::Synth {
            bars,
            seed,
            regime_len,
            interval_minutes,
            output,
        } => run_synth(bars, seed, regime_len, interval_minutes, &output),
        Commands::Config { config } => run_config(config.as_deref()),
    }
}

fn run_cmd(
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
    allow_reversals: bool,
    variant: Option<IndicatorVariant>,
    json: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    // flags override the file
    if allow_reversals {
        config.allow_reversals = true;
    }
    if let Some(variant) = variant {
        config.indicator_variant = variant;
    }

    let df = read_table(input)?;
    info!("loaded {} rows from {}", df.height(), input.display());

    let mut result = run_frame(&df, &config)?;
    println!("{}", render_summary(&result.summary, json)?);

    if let Some(path) = output {
        write_table(&mut result.frame, path)?;
        println!("Output written to: {}", path.display());
    }

    Ok(())
}

fn render_summary(summary: &RunSummary, json: bool) -> Result<String> {
    if json {
        Ok(summary.to_json()?)
    } else {
        Ok(summary.to_string())
    }
}

fn run_synth(
    bars: usize,
    seed: u64,
    regime_len: Option<usize>,
    interval_minutes: i64,
    output: &Path,
) -> Result<()> {
    if interval_minutes <= 0 {
        bail!("--interval-minutes must be positive, got {interval_minutes}");
    }

    let mut series = SyntheticSeries::new(seed, bars);
    series.interval = chrono::Duration::minutes(interval_minutes);
    if let Some(regime_len) = regime_len {
        series.regime_len = regime_len;
    }

    let mut df = bars_to_frame(&series.generate())?;
    write_table(&mut df, output)?;
    println!("{bars} bars (seed {seed}) written to: {}", output.display());
    Ok(())
}

fn run_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    print!("{}", config.to_toml()?);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SignalConfig> {
    match path {
        Some(path) => SignalConfig::from_file(path)
            .with_context(|| format!("invalid config {}", path.display())),
        None => Ok(SignalConfig::default()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableFormat {
    Csv,
    Parquet,
}

fn table_format(path: &Path) -> Result<TableFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("csv") => Ok(TableFormat::Csv),
        Some("parquet") | Some("pq") => Ok(TableFormat::Parquet),
        _ => bail!(
            "unsupported file type '{}': expected .csv or .parquet",
            path.display()
        ),
    }
}

fn read_table(path: &Path) -> Result<DataFrame> {
    let df = match table_format(path)? {
        TableFormat::Csv => CsvReadOptions::default()
            .with_has_header(true)
            .map_parse_options(|opts| opts.with_try_parse_dates(true))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()
            .with_context(|| format!("failed to read {}", path.display()))?,
        TableFormat::Parquet => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            ParquetReader::new(file)
                .finish()
                .with_context(|| format!("failed to read {}", path.display()))?
        }
    };
    Ok(df)
}

fn write_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    let format = table_format(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    match format {
        TableFormat::Csv => CsvWriter::new(&mut file).include_header(true).finish(df)?,
        TableFormat::Parquet => {
            ParquetWriter::new(file).finish(df)?;
        }
    }
    Ok(())
}
