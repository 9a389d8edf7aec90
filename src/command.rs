//! External command surface.
//!
//! Validates `(item, command)` pairs from the web/API layer and routes them
//! to the right axis controller. Motion items are executed on an independent
//! thread after a fixed settle delay; a rapid burst of commands therefore
//! collapses to the last one, because every scheduled command bumps the axis
//! generation when it finally runs and supersedes the ones before it.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use embedded_hal::digital::OutputPin;
use log::{debug, error, info, warn};
use serde_json::Value;

use crate::axis::{Axis, AxisController};
use crate::config::DispatchConfig;
use crate::error::{CommandError, Result};
use crate::hal::SystemPower;

/// A validated external command.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlRequest {
    /// Open-loop move by a signed step count.
    Move {
        /// Target axis.
        axis: Axis,
        /// Signed step budget.
        steps: i64,
    },
    /// Closed-loop seek to a feedback-voltage target.
    MoveTo {
        /// Target axis.
        axis: Axis,
        /// Seek target in feedback volts.
        target: f64,
    },
    /// Reboot the host after the restart delay.
    Restart,
}

/// Parse an `(item, command)` pair from the external surface.
///
/// Returns `Ok(None)` for unknown items (they are ignored, not errors).
///
/// # Errors
///
/// Returns [`CommandError::BadPayload`] when the payload has the wrong
/// type or shape for the item.
pub fn parse_request(item: &str, command: &Value) -> std::result::Result<Option<ControlRequest>, CommandError> {
    let request = match item {
        "xmove" | "ymove" => {
            let steps = command.as_i64().ok_or_else(|| CommandError::BadPayload {
                item: item.to_string(),
                expected: "an integer step count",
            })?;
            let axis = if item == "xmove" { Axis::X } else { Axis::Y };
            ControlRequest::Move { axis, steps }
        }
        "xmoveto" | "ymoveto" => {
            let target = command.as_f64().ok_or_else(|| CommandError::BadPayload {
                item: item.to_string(),
                expected: "a numeric seek target",
            })?;
            let axis = if item == "xmoveto" { Axis::X } else { Axis::Y };
            ControlRequest::MoveTo { axis, target }
        }
        "restart" => {
            if command.as_str() != Some("pi") {
                return Err(CommandError::BadPayload {
                    item: item.to_string(),
                    expected: "the string \"pi\"",
                });
            }
            ControlRequest::Restart
        }
        _ => return Ok(None),
    };
    Ok(Some(request))
}

/// Routes validated commands to axis controllers on delayed worker threads.
pub struct CommandDispatcher<P: OutputPin + Send + 'static> {
    x: Arc<AxisController<P>>,
    y: Arc<AxisController<P>>,
    power: Arc<dyn SystemPower>,
    delay: Duration,
    restart_delay: Duration,
}

impl<P: OutputPin + Send + 'static> CommandDispatcher<P> {
    /// Create a dispatcher over the two axis controllers and the reboot
    /// collaborator.
    pub fn new(
        x: Arc<AxisController<P>>,
        y: Arc<AxisController<P>>,
        power: Arc<dyn SystemPower>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            x,
            y,
            power,
            delay: config.delay(),
            restart_delay: config.restart_delay(),
        }
    }

    fn controller(&self, axis: Axis) -> &Arc<AxisController<P>> {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    /// Validate and schedule one command.
    ///
    /// Motion items run after the settle delay on a named thread; unknown
    /// items are ignored; malformed payloads are logged and rejected.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Command`] for a malformed payload or a
    /// failed thread spawn. Neither is fatal to the caller.
    pub fn dispatch(&self, item: &str, command: &Value) -> Result<()> {
        info!("{} : {}", item, command);

        let request = match parse_request(item, command) {
            Ok(Some(request)) => request,
            Ok(None) => {
                debug!("ignoring unknown command item '{}'", item);
                return Ok(());
            }
            Err(e) => {
                error!("rejected command: {}", e);
                return Err(e.into());
            }
        };

        match request {
            ControlRequest::Move { axis, steps } => {
                let controller = Arc::clone(self.controller(axis));
                self.schedule(format!("{}move", axis), self.delay, move || {
                    controller.move_steps(steps);
                })
            }
            ControlRequest::MoveTo { axis, target } => {
                let controller = Arc::clone(self.controller(axis));
                self.schedule(format!("{}moveto", axis), self.delay, move || {
                    controller.move_to(target);
                })
            }
            ControlRequest::Restart => {
                warn!(
                    "Restart command received: system will restart in {} seconds",
                    self.restart_delay.as_secs()
                );
                let power = Arc::clone(&self.power);
                self.schedule("restart".to_string(), self.restart_delay, move || {
                    warn!("System is restarting now");
                    power.reboot();
                })
            }
        }
    }

    /// Run `task` on a named thread after `delay`.
    fn schedule<F>(&self, name: String, delay: Duration, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        thread::Builder::new()
            .name(name)
            .spawn(move || {
                thread::sleep(delay);
                task();
            })
            .map(|_| ())
            .map_err(|e| CommandError::Spawn(e.to_string()).into())
    }
}
