//! Simulated table hardware shared by the integration tests.
//!
//! `SimMotor` models one axis: it records winding writes, decodes coil
//! pattern transitions back into steps, and derives a feedback position
//! from the net step count. That closes the loop end to end without any
//! real GPIO or ADC.

#![allow(dead_code)]

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use xy_table_motion::axis::{Axis, HALF_STEP_SEQUENCE};
use xy_table_motion::{AnalogReader, AxisPins, HardwareError, PositionSource, SystemPower};

/// One simulated axis motor.
///
/// Every coil mutation in the driver writes all four pins, so the sim
/// decodes one pattern per four observed writes. Transient states inside
/// a group (which can momentarily spell a neighboring pattern) are never
/// inspected.
pub struct SimMotor {
    state: Mutex<SimWindings>,
    steps: AtomicI64,
    volts_per_step: f64,
}

struct SimWindings {
    coils: [bool; 4],
    writes: u64,
    last_index: u8,
}

impl SimMotor {
    /// Create a motor whose feedback moves `volts_per_step` per half-step.
    pub fn new(volts_per_step: f64) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SimWindings {
                coils: [false; 4],
                writes: 0,
                // The controller starts at sequence index 0
                last_index: 0,
            }),
            steps: AtomicI64::new(0),
            volts_per_step,
        })
    }

    /// The four coil pins of this motor, in (A, A', B, B') order.
    pub fn pins(self: &Arc<Self>) -> AxisPins<SimPin> {
        AxisPins::new(
            SimPin::new(0, self),
            SimPin::new(1, self),
            SimPin::new(2, self),
            SimPin::new(3, self),
        )
    }

    /// Net steps moved since construction (forward positive).
    pub fn net_steps(&self) -> i64 {
        self.steps.load(Ordering::SeqCst)
    }

    /// Feedback position derived from the net step count.
    pub fn position_volts(&self) -> f64 {
        self.net_steps() as f64 * self.volts_per_step
    }

    /// Current winding state.
    pub fn coil_state(&self) -> [bool; 4] {
        self.state.lock().unwrap().coils
    }

    /// Whether all windings are off.
    pub fn is_de_energized(&self) -> bool {
        self.coil_state() == [false; 4]
    }

    fn on_write(&self, coil: usize, high: bool) {
        let mut state = self.state.lock().unwrap();
        state.coils[coil] = high;
        state.writes += 1;
        // Decode only on pattern-apply boundaries (every 4th write)
        if state.writes % 4 != 0 {
            return;
        }
        // De-energized and all-energized are rest states, not sequence
        // positions
        let bits = state.coils;
        let Some(index) = HALF_STEP_SEQUENCE.iter().position(|p| p.bits() == bits) else {
            return;
        };
        let index = index as u8;
        match (index + 8 - state.last_index) % 8 {
            0 => return,
            1 => {
                self.steps.fetch_add(1, Ordering::SeqCst);
            }
            7 => {
                self.steps.fetch_sub(1, Ordering::SeqCst);
            }
            d => panic!("non-adjacent pattern transition of {} half-steps", d),
        }
        state.last_index = index;
    }
}

/// One winding output of a [`SimMotor`].
#[derive(Clone)]
pub struct SimPin {
    coil: usize,
    motor: Arc<SimMotor>,
}

impl SimPin {
    fn new(coil: usize, motor: &Arc<SimMotor>) -> Self {
        Self {
            coil,
            motor: Arc::clone(motor),
        }
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.motor.on_write(self.coil, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.motor.on_write(self.coil, true);
        Ok(())
    }
}

/// Direct (lag-free) feedback over a pair of simulated motors.
pub struct SimFeedback {
    pub x: Arc<SimMotor>,
    pub y: Arc<SimMotor>,
}

impl PositionSource for SimFeedback {
    fn position(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x.position_volts(),
            Axis::Y => self.y.position_volts(),
        }
    }
}

/// ADC board stand-in reporting motor positions as raw voltages.
pub struct SimAdc {
    pub x: Arc<SimMotor>,
    pub y: Arc<SimMotor>,
    pub x_channel: u8,
    pub y_channel: u8,
    pub voltage_offset: f64,
}

impl AnalogReader for SimAdc {
    fn read_voltage(&mut self, channel: u8) -> Result<f64, HardwareError> {
        if channel == self.x_channel {
            Ok(self.voltage_offset + self.x.position_volts())
        } else if channel == self.y_channel {
            Ok(self.voltage_offset + self.y.position_volts())
        } else {
            Err(HardwareError::Adc(format!("no channel {}", channel)))
        }
    }
}

/// Active-low panel button with a shared level flag.
#[derive(Clone, Default)]
pub struct SimButton {
    pressed: Arc<AtomicBool>,
}

impl SimButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self) {
        self.pressed.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.pressed.store(false, Ordering::SeqCst);
    }
}

impl ErrorType for SimButton {
    type Error = Infallible;
}

impl InputPin for SimButton {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(!self.pressed.load(Ordering::SeqCst))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.pressed.load(Ordering::SeqCst))
    }
}

/// Output pin that accepts every write. Used for the panel indicator.
pub struct NullOutput;

impl ErrorType for NullOutput {
    type Error = Infallible;
}

impl OutputPin for NullOutput {
    fn set_low(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

/// Reboot collaborator that does nothing.
pub struct NullPower;

impl SystemPower for NullPower {
    fn reboot(&self) {}
}

/// Poll `cond` every couple of milliseconds until it holds or `timeout`
/// elapses; returns whether it held.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}
