//! Hardware seams.
//!
//! The controller talks to hardware exclusively through the types in this
//! module: coil and indicator outputs are embedded-hal 1.0 [`OutputPin`]s,
//! the analog feedback board is an [`AnalogReader`], and the reboot
//! collaborator is a [`SystemPower`]. Everything behind these seams is
//! assumed correct and is mocked in tests.

use embedded_hal::digital::OutputPin;

use crate::axis::CoilPattern;
use crate::error::HardwareError;

/// The four winding outputs of one axis, in sequence-table order
/// (A, A', B, B').
pub struct AxisPins<P> {
    /// Phase A winding.
    pub a: P,
    /// Phase A' winding.
    pub a_bar: P,
    /// Phase B winding.
    pub b: P,
    /// Phase B' winding.
    pub b_bar: P,
}

impl<P> AxisPins<P> {
    /// Bundle four coil pins.
    pub fn new(a: P, a_bar: P, b: P, b_bar: P) -> Self {
        Self { a, a_bar, b, b_bar }
    }
}

/// Drives the four windings of one stepper from a [`CoilPattern`].
pub struct CoilDriver<P: OutputPin> {
    pins: AxisPins<P>,
}

impl<P: OutputPin> CoilDriver<P> {
    /// Create a driver over four bound coil pins.
    pub fn new(pins: AxisPins<P>) -> Self {
        Self { pins }
    }

    /// Write one pattern to all four windings.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Pin`] if any pin write fails; the pins
    /// written before the failure keep their new state.
    pub fn apply(&mut self, pattern: CoilPattern) -> Result<(), HardwareError> {
        let bits = pattern.bits();
        set(&mut self.pins.a, bits[0])?;
        set(&mut self.pins.a_bar, bits[1])?;
        set(&mut self.pins.b, bits[2])?;
        set(&mut self.pins.b_bar, bits[3])?;
        Ok(())
    }
}

fn set<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), HardwareError> {
    let result = if high { pin.set_high() } else { pin.set_low() };
    result.map_err(|_| HardwareError::Pin)
}

/// Analog feedback reader, one voltage per channel.
///
/// Implemented by the ADC board driver. The board may be absent at startup;
/// callers pass `None` and the tracker runs in degraded mode.
pub trait AnalogReader {
    /// Read the voltage on one ADC channel.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Adc`] if the read fails. The tracker logs
    /// the failure and keeps the last stored value.
    fn read_voltage(&mut self, channel: u8) -> Result<f64, HardwareError>;
}

/// System power collaborator used by the `restart` command.
pub trait SystemPower: Send + Sync {
    /// Reboot the host. Called from a dispatch thread after the configured
    /// restart delay.
    fn reboot(&self);
}
