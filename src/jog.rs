//! Manual jog inputs.
//!
//! Four panel buttons (axis+/axis- per axis) drive an axis directly while
//! held, overriding automated motion. Each input gets its own monitor
//! thread that polls the pin at the configured period (the software stand-in
//! for hardware edge detection with debounce). On a press the monitor bumps
//! the axis generation, so an in-flight automated seek cancels exactly as a
//! new command would cancel it, then steps coarsely until release.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use embedded_hal::digital::{InputPin, OutputPin};
use log::{error, info};
use parking_lot::Mutex;

use crate::axis::{AxisController, Direction};
use crate::config::JogConfig;
use crate::error::{CommandError, HardwareError, Result};

/// Front-panel busy/ready output shared by all jog monitors.
///
/// Driven low while any button is held, restored high on release. The table
/// also drives it at startup (low while initializing, high when ready).
pub struct Indicator<Q: OutputPin> {
    pin: Arc<Mutex<Q>>,
}

impl<Q: OutputPin> Clone for Indicator<Q> {
    fn clone(&self) -> Self {
        Self {
            pin: Arc::clone(&self.pin),
        }
    }
}

impl<Q: OutputPin> Indicator<Q> {
    /// Wrap the indicator output pin.
    pub fn new(pin: Q) -> Self {
        Self {
            pin: Arc::new(Mutex::new(pin)),
        }
    }

    /// Drive the indicator low (busy).
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Pin`] if the write fails.
    pub fn set_busy(&self) -> std::result::Result<(), HardwareError> {
        self.pin.lock().set_low().map_err(|_| HardwareError::Pin)
    }

    /// Drive the indicator high (ready).
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Pin`] if the write fails.
    pub fn set_ready(&self) -> std::result::Result<(), HardwareError> {
        self.pin.lock().set_high().map_err(|_| HardwareError::Pin)
    }
}

/// The four jog inputs, active low.
pub struct JogInputs<I> {
    /// X axis toward the upper limit.
    pub x_forward: I,
    /// X axis toward the lower limit.
    pub x_backward: I,
    /// Y axis toward the upper limit.
    pub y_forward: I,
    /// Y axis toward the lower limit.
    pub y_backward: I,
}

impl<I> JogInputs<I> {
    /// Bundle the four jog input pins.
    pub fn new(x_forward: I, x_backward: I, y_forward: I, y_backward: I) -> Self {
        Self {
            x_forward,
            x_backward,
            y_forward,
            y_backward,
        }
    }
}

/// Owns the four jog monitor threads.
pub struct ManualJogController {
    monitors: Vec<JoinHandle<()>>,
}

impl ManualJogController {
    /// Spawn one monitor per jog input.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Command`] if a monitor thread cannot be
    /// spawned.
    pub fn spawn<P, I, Q>(
        x: &Arc<AxisController<P>>,
        y: &Arc<AxisController<P>>,
        inputs: JogInputs<I>,
        indicator: Indicator<Q>,
        config: &JogConfig,
    ) -> Result<Self>
    where
        P: OutputPin + Send + 'static,
        I: InputPin + Send + 'static,
        Q: OutputPin + Send + 'static,
    {
        let monitors = vec![
            spawn_monitor(Arc::clone(x), inputs.x_forward, Direction::Forward, indicator.clone(), config)?,
            spawn_monitor(Arc::clone(x), inputs.x_backward, Direction::Backward, indicator.clone(), config)?,
            spawn_monitor(Arc::clone(y), inputs.y_forward, Direction::Forward, indicator.clone(), config)?,
            spawn_monitor(Arc::clone(y), inputs.y_backward, Direction::Backward, indicator, config)?,
        ];
        Ok(Self { monitors })
    }

    /// Number of live monitor threads.
    pub fn monitor_count(&self) -> usize {
        self.monitors.iter().filter(|m| !m.is_finished()).count()
    }
}

fn spawn_monitor<P, I, Q>(
    axis: Arc<AxisController<P>>,
    mut input: I,
    direction: Direction,
    indicator: Indicator<Q>,
    config: &JogConfig,
) -> Result<JoinHandle<()>>
where
    P: OutputPin + Send + 'static,
    I: InputPin + Send + 'static,
    Q: OutputPin + Send + 'static,
{
    let poll_period = config.poll_period();
    let step_period = config.step_period();
    let name = format!(
        "{}-jog-{}",
        axis.axis(),
        match direction {
            Direction::Forward => "fwd",
            Direction::Backward => "back",
        }
    );

    thread::Builder::new()
        .name(name)
        .spawn(move || loop {
            match input.is_low() {
                Ok(false) => thread::sleep(poll_period),
                Ok(true) => {
                    info!("{} jog engaged ({:?})", axis.axis(), direction);
                    let _ = indicator.set_busy();
                    // Supersede any automated motion before taking control
                    axis.interrupt();

                    loop {
                        match input.is_low() {
                            Ok(true) => {
                                let stepped = match direction {
                                    Direction::Forward => axis.step_forward(false),
                                    Direction::Backward => axis.step_backward(false),
                                };
                                if let Err(e) = stepped {
                                    error!("{} jog step failed: {}", axis.axis(), e);
                                    break;
                                }
                                thread::sleep(step_period);
                            }
                            Ok(false) => break,
                            Err(_) => {
                                error!("{} jog input read failed, monitor exiting", axis.axis());
                                axis.stop();
                                let _ = indicator.set_ready();
                                return;
                            }
                        }
                    }

                    axis.stop();
                    let _ = indicator.set_ready();
                    info!("{} jog released", axis.axis());
                }
                Err(_) => {
                    error!("{} jog input read failed, monitor exiting", axis.axis());
                    return;
                }
            }
        })
        .map_err(|e| CommandError::Spawn(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::Axis;
    use crate::config::{AxisConfig, SeekConfig};
    use crate::testutil::{test_controller, FixedFeedback, NullPin};
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Input pin backed by a shared level flag (true = pressed/low).
    #[derive(Clone)]
    struct SharedInput {
        pressed: Arc<AtomicBool>,
    }

    impl embedded_hal::digital::ErrorType for SharedInput {
        type Error = Infallible;
    }

    impl InputPin for SharedInput {
        fn is_high(&mut self) -> std::result::Result<bool, Infallible> {
            Ok(!self.pressed.load(Ordering::SeqCst))
        }

        fn is_low(&mut self) -> std::result::Result<bool, Infallible> {
            Ok(self.pressed.load(Ordering::SeqCst))
        }
    }

    fn fast_jog_config() -> JogConfig {
        JogConfig {
            poll_period_ms: 1,
            step_period_ms: 1,
        }
    }

    #[test]
    fn test_press_steps_until_release_then_stops() {
        let axis_cfg = AxisConfig {
            pulse_width_ms: 0,
            ..Default::default()
        };
        let x = Arc::new(test_controller(
            Axis::X,
            FixedFeedback::at(0.0, 0.0),
            &axis_cfg,
            &SeekConfig::default(),
        ));
        let y = Arc::new(test_controller(
            Axis::Y,
            FixedFeedback::at(0.0, 0.0),
            &axis_cfg,
            &SeekConfig::default(),
        ));

        let pressed = Arc::new(AtomicBool::new(false));
        let inputs = JogInputs::new(
            SharedInput {
                pressed: Arc::clone(&pressed),
            },
            SharedInput {
                pressed: Arc::new(AtomicBool::new(false)),
            },
            SharedInput {
                pressed: Arc::new(AtomicBool::new(false)),
            },
            SharedInput {
                pressed: Arc::new(AtomicBool::new(false)),
            },
        );

        let jog = ManualJogController::spawn(
            &x,
            &y,
            inputs,
            Indicator::new(NullPin),
            &fast_jog_config(),
        )
        .unwrap();
        assert_eq!(jog.monitor_count(), 4);

        pressed.store(true, Ordering::SeqCst);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..25 {
            seen.insert(x.sequence_index());
            thread::sleep(Duration::from_millis(2));
        }
        pressed.store(false, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));

        // The index moved while the button was held
        assert!(seen.len() > 1, "observed indices: {:?}", seen);
        // interrupt() on press plus stop() on release
        assert_eq!(x.generation(), 2);
        assert!(!x.is_moving());
        // The other axis was never touched
        assert_eq!(y.generation(), 0);
        assert_eq!(jog.monitor_count(), 4);
    }
}
