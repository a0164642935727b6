use serde::{Deserialize, Serialize};

/// Position side reported per bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Flat,
    Long,
    Short,
}

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }

    /// +1.0 for long, -1.0 for short. Multiplies a distance into a
    /// price offset in the favorable direction.
    pub fn signum(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl From<Direction> for Side {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Long => Side::Long,
            Direction::Short => Side::Short,
        }
    }
}

/// Risk levels attached to a bar. All NaN when no position is reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Levels {
    pub stop_loss: f64,
    pub take_profit: f64,
    pub trailing_stop: f64,
}

impl Levels {
    pub fn undefined() -> Self {
        Self {
            stop_loss: f64::NAN,
            take_profit: f64::NAN,
            trailing_stop: f64::NAN,
        }
    }

    pub fn is_undefined(&self) -> bool {
        self.stop_loss.is_nan() && self.take_profit.is_nan() && self.trailing_stop.is_nan()
    }
}

impl Default for Levels {
    fn default() -> Self {
        Self::undefined()
    }
}
