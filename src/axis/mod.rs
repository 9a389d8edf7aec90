//! Per-axis motion control.
//!
//! One [`AxisController`] is constructed per table axis at startup and lives
//! for the process lifetime, shared by the dispatcher, jog monitors, and the
//! self-test sequencer.

use std::fmt;

pub mod controller;
pub mod sequence;

pub use controller::{AxisController, Direction};
pub use sequence::{CoilPattern, SequenceIndex, ALL_ENERGIZED, DE_ENERGIZED, HALF_STEP_SEQUENCE};

/// One independently controlled motion dimension of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The X axis (feedback on the configured x channel).
    X,
    /// The Y axis (feedback on the configured y channel).
    Y,
}

impl Axis {
    /// The lowercase axis name used on the external command surface.
    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
        }
    }

    /// Parse an external axis name. Anything other than `"x"` or `"y"`
    /// is unknown.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
