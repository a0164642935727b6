/// Trailing stop ratchet.
///
/// **Core Rule:** the trailing stop may tighten, never loosen, even when ATR
/// expands after a favorable move.
use crate::domain::Direction;

/// Trailing stop level for one open position.
///
/// - Long positions: the level can only rise
/// - Short positions: the level can only fall
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailingStop {
    level: f64,
    direction: Direction,
}

impl TrailingStop {
    /// Start the ratchet at `initial_level` (the entry stop-loss).
    pub fn new(direction: Direction, initial_level: f64) -> Self {
        Self {
            level: initial_level,
            direction,
        }
    }

    /// Offer a candidate level; keeps whichever is tighter.
    ///
    /// Returns the level in effect afterwards.
    ///
    /// # Example
    /// ```
    /// use barsignal_core::domain::Direction;
    /// use barsignal_core::engine::TrailingStop;
    ///
    /// let mut stop = TrailingStop::new(Direction::Long, 95.0);
    ///
    /// // Tightening: 95 -> 100 (allowed)
    /// assert_eq!(stop.apply(100.0), 100.0);
    ///
    /// // Loosening: 100 -> 90 (blocked)
    /// assert_eq!(stop.apply(90.0), 100.0);
    /// ```
    pub fn apply(&mut self, proposed: f64) -> f64 {
        if proposed.is_nan() {
            return self.level;
        }
        self.level = match self.direction {
            Direction::Long => self.level.max(proposed),
            Direction::Short => self.level.min(proposed),
        };
        self.level
    }

    /// Candidate level `distance` away from `close` on the losing side.
    pub fn trail(&mut self, close: f64, distance: f64) -> f64 {
        self.apply(close - self.direction.signum() * distance)
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the bar's extreme touched the stop.
    pub fn is_breached(&self, high: f64, low: f64) -> bool {
        match self.direction {
            Direction::Long => low <= self.level,
            Direction::Short => high >= self.level,
        }
    }
}
