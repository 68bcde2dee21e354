use serde::{Deserialize, Serialize};

/// Change of a rating against its value 24 hours earlier.
///
/// `baseline` is `None` when no snapshot old enough exists; `change` is then
/// zero but must not be read as "no movement".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RatingDelta {
    pub current: f64,
    pub baseline: Option<f64>,
    pub change: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl RatingDelta {
    pub fn new(current: f64, baseline: Option<f64>) -> Self {
        let change = baseline.map(|b| current - b).unwrap_or(0.0);
        Self { current, baseline, change }
    }

    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn direction(&self) -> Direction {
        if self.change > 0.0 {
            Direction::Up
        } else if self.change < 0.0 {
            Direction::Down
        } else {
            Direction::Flat
        }
    }
}
