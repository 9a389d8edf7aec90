//! Closed-loop demo against a simulated table.
//!
//! No hardware required: simulated coil pins decode the half-step sequence
//! back into a position, which an ADC stand-in feeds to the tracker.
//!
//! Run with `RUST_LOG=info cargo run --example sim_table`.

use std::convert::Infallible;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use embedded_hal::digital::{ErrorType, OutputPin};
use log::warn;
use serde_json::json;

use xy_table_motion::axis::HALF_STEP_SEQUENCE;
use xy_table_motion::config::{
    AxesConfig, AxisConfig, DispatchConfig, FeedbackConfig, SeekConfig, SystemConfig,
};
use xy_table_motion::{AnalogReader, AxisPins, HardwareError, SystemPower, TableSystem};

const VOLTS_PER_STEP: f64 = 1.0 / 64.0;

/// One simulated motor: decodes coil writes back into a step count.
/// Every driver mutation writes all four pins, so a pattern is decoded
/// once per four observed writes.
struct SimMotor {
    state: Mutex<([bool; 4], u64, u8)>,
    steps: AtomicI64,
}

impl SimMotor {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(([false; 4], 0, 0)),
            steps: AtomicI64::new(0),
        })
    }

    fn pins(self: &Arc<Self>) -> AxisPins<SimPin> {
        let pin = |coil| SimPin {
            coil,
            motor: Arc::clone(self),
        };
        AxisPins::new(pin(0), pin(1), pin(2), pin(3))
    }

    fn position_volts(&self) -> f64 {
        self.steps.load(Ordering::SeqCst) as f64 * VOLTS_PER_STEP
    }

    fn on_write(&self, coil: usize, high: bool) {
        let (coils, writes, last_index) = &mut *self.state.lock().unwrap();
        coils[coil] = high;
        *writes += 1;
        if *writes % 4 != 0 {
            return;
        }
        if let Some(index) = HALF_STEP_SEQUENCE.iter().position(|p| p.bits() == *coils) {
            let index = index as u8;
            match (index + 8 - *last_index) % 8 {
                1 => {
                    self.steps.fetch_add(1, Ordering::SeqCst);
                }
                7 => {
                    self.steps.fetch_sub(1, Ordering::SeqCst);
                }
                _ => return,
            }
            *last_index = index;
        }
    }
}

struct SimPin {
    coil: usize,
    motor: Arc<SimMotor>,
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

struct SimAdc {
    x: Arc<SimMotor>,
    y: Arc<SimMotor>,
    voltage_offset: f64,
}

impl AnalogReader for SimAdc {
    fn read_voltage(&mut self, channel: u8) -> Result<f64, HardwareError> {
        match channel {
            1 => Ok(self.voltage_offset + self.x.position_volts()),
            5 => Ok(self.voltage_offset + self.y.position_volts()),
            other => Err(HardwareError::Adc(format!("no channel {}", other))),
        }
    }
}

struct DemoPower;

impl SystemPower for DemoPower {
    fn reboot(&self) {
        warn!("restart requested, ignored in the demo");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let axis = AxisConfig {
        pulse_width_ms: 2,
        slow_step_pause_ms: 5,
        ..Default::default()
    };
    let config = SystemConfig {
        axes: AxesConfig {
            x: axis.clone(),
            y: axis,
        },
        feedback: FeedbackConfig {
            sample_period_ms: 2,
            ..Default::default()
        },
        seek: SeekConfig {
            settle_pause_ms: 5,
            ..Default::default()
        },
        dispatch: DispatchConfig {
            delay_ms: 100,
            ..Default::default()
        },
        ..Default::default()
    };

    let x = SimMotor::new();
    let y = SimMotor::new();
    let adc = SimAdc {
        x: Arc::clone(&x),
        y: Arc::clone(&y),
        voltage_offset: config.feedback.voltage_offset,
    };
    let table = TableSystem::new(config, x.pins(), y.pins(), Some(adc), Arc::new(DemoPower))?;

    table.parse_control("xmoveto", &json!(0.5))?;
    table.parse_control("ymove", &json!(24))?;
    wait_for_idle(&table);
    println!("after first commands: {}", serde_json::to_string(&table.api_status())?);

    table.parse_control("xmoveto", &json!(-0.25))?;
    wait_for_idle(&table);
    println!("after return seek:   {}", serde_json::to_string(&table.http_status())?);

    Ok(())
}

fn wait_for_idle(table: &TableSystem<SimPin>) {
    // Cover the dispatch settle window, then poll the moving flags.
    thread::sleep(Duration::from_millis(200));
    while table.x_axis().is_moving() || table.y_axis().is_moving() {
        thread::sleep(Duration::from_millis(10));
    }
}
