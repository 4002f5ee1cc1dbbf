use serde::{Deserialize, Serialize};
use std::fmt;

/// One cell of the routing grid: planar position plus layer index.
///
/// Coordinates are signed so that a neighbor one step off the board edge is
/// representable and can be rejected by a bounds check instead of wrapping.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Location {
    pub x: i32,
    pub y: i32,
    pub layer: i32,
}

impl Location {
    pub const fn new(x: i32, y: i32, layer: i32) -> Self {
        Self { x, y, layer }
    }

    pub fn with_layer(self, layer: i32) -> Self {
        Self { layer, ..self }
    }

    pub fn manhattan_distance(&self, other: &Location) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn same_xy(&self, other: &Location) -> bool {
        self.x == other.x && self.y == other.y
    }

    /// True when `other` is a single planar step or a pure layer change away.
    pub fn is_adjacent(&self, other: &Location) -> bool {
        if self.layer == other.layer {
            self.manhattan_distance(other) == 1
        } else {
            self.same_xy(other)
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, L{})", self.x, self.y, self.layer)
    }
}
