//! Domain types for barsignal

pub mod bar;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use position::{Direction, Levels, Side};
pub use trade::{Decision, ExitReason, ParseTradeTypeError, TradeType};
