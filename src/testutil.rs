//! Shared helpers for in-crate unit tests.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::axis::{Axis, AxisController};
use crate::config::{AxisConfig, SeekConfig};
use crate::error::HardwareError;
use crate::feedback::PositionSource;
use crate::hal::{AnalogReader, AxisPins, SystemPower};

/// Output pin that accepts every write and remembers nothing.
pub struct NullPin;

impl ErrorType for NullPin {
    type Error = Infallible;
}

impl OutputPin for NullPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

/// Frozen position feedback.
pub struct FixedFeedback {
    x: f64,
    y: f64,
}

impl FixedFeedback {
    pub fn at(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl PositionSource for FixedFeedback {
    fn position(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

/// ADC stand-in for the `None` case; never constructed.
pub struct NeverAdc;

impl AnalogReader for NeverAdc {
    fn read_voltage(&mut self, _channel: u8) -> Result<f64, HardwareError> {
        unreachable!("NeverAdc is only used as a turbofish target for None")
    }
}

/// Counts reboot requests instead of rebooting.
#[derive(Default)]
pub struct RecordingPower {
    reboots: AtomicUsize,
}

impl RecordingPower {
    pub fn reboot_count(&self) -> usize {
        self.reboots.load(Ordering::SeqCst)
    }
}

impl SystemPower for RecordingPower {
    fn reboot(&self) {
        self.reboots.fetch_add(1, Ordering::SeqCst);
    }
}

/// Build an axis controller over null pins and the given feedback.
pub fn test_controller<S>(
    axis: Axis,
    feedback: S,
    config: &AxisConfig,
    seek: &SeekConfig,
) -> AxisController<NullPin>
where
    S: PositionSource + 'static,
{
    AxisController::new(
        axis,
        AxisPins::new(NullPin, NullPin, NullPin, NullPin),
        Arc::new(feedback),
        config,
        seek,
    )
    .expect("null pins cannot fail")
}
