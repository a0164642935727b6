//! Signal engine: a left-to-right fold over precomputed indicators.
//!
//! The position is an explicit accumulator passed into and returned from
//! each `SignalMachine::step`. `SignalEngine` wraps the pipeline and the fold
//! and turns degraded inputs into an all-Hold output with a `Notice`.

pub mod config;
pub mod machine;
pub mod ratchet;
pub mod runner;
pub mod signals;
pub mod state;

pub use config::{ConfigError, SignalConfig, TrendExit};
pub use machine::SignalMachine;
pub use ratchet::TrailingStop;
pub use runner::{EngineOutput, Notice, SignalEngine};
pub use signals::{entry_signals, BarSnapshot, EntrySignals};
pub use state::{OpenPosition, Position};
