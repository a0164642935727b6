//! barsignal core: indicator pipeline and per-bar signal state machine.
//!
//! - Domain types (bars, trade actions, sides, risk levels)
//! - Causal indicators (EMA, Bollinger, VWAP, RSI, ATR, ADX/DI) in two variants
//! - Indicator pipeline computing the fixed column set in parallel
//! - Signal state machine folding a position accumulator over the bars
//! - DataFrame boundary, run fingerprinting, synthetic series

pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod frame;
pub mod indicators;
pub mod pipeline;
pub mod synthetic;

pub use domain::{Bar, Decision, Direction, ExitReason, Levels, Side, TradeType};
pub use engine::{EngineOutput, Notice, SignalConfig, SignalEngine, SignalMachine};
pub use frame::{run_frame, EngineError, FrameOutput};
pub use pipeline::{IndicatorError, IndicatorFrame, IndicatorPipeline};
