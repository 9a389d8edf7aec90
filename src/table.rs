//! Table system facade.
//!
//! Wires the tracker, the two axis controllers, the dispatcher, and the
//! self-test sequencer together from one configuration, and exposes the
//! small surface the web/API layer consumes: status snapshots, the command
//! entry point, and the self-test trigger.

use std::sync::Arc;

use embedded_hal::digital::{InputPin, OutputPin};
use log::info;
use serde::Serialize;
use serde_json::Value;

use crate::axis::{Axis, AxisController};
use crate::command::CommandDispatcher;
use crate::config::{validate_config, SystemConfig};
use crate::error::Result;
use crate::feedback::{PositionSource, PositionTracker};
use crate::hal::{AnalogReader, AxisPins, SystemPower};
use crate::jog::{Indicator, JogInputs, ManualJogController};
use crate::selftest::SelfTestSequencer;

/// Position snapshot for the status web page, rounded to 4 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HttpStatus {
    /// X position in feedback volts.
    pub xpos: f64,
    /// Y position in feedback volts.
    pub ypos: f64,
}

/// Status snapshot for programmatic polling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ApiStatus {
    /// X position in feedback volts.
    pub xpos: f64,
    /// Whether a motion loop currently owns the X axis.
    pub xmoving: bool,
    /// Y position in feedback volts.
    pub ypos: f64,
    /// Whether a motion loop currently owns the Y axis.
    pub ymoving: bool,
}

/// The complete two-axis table controller.
///
/// Constructed once at process start; every collaborator (dispatcher, jog
/// monitors, self-test) receives explicit `Arc` handles to the axis
/// controllers rather than reaching for globals.
pub struct TableSystem<P: OutputPin + Send + 'static> {
    config: SystemConfig,
    tracker: Arc<PositionTracker>,
    x: Arc<AxisController<P>>,
    y: Arc<AxisController<P>>,
    dispatcher: CommandDispatcher<P>,
    selftest: SelfTestSequencer<P>,
}

impl<P: OutputPin + Send + 'static> TableSystem<P> {
    /// Build and start the controller.
    ///
    /// Validates the configuration, starts position sampling (degraded mode
    /// if `adc` is `None`), binds both axes' coil pins, and stops both axes
    /// so the table comes up de-energized.
    ///
    /// # Errors
    ///
    /// Returns a configuration error from validation, or a hardware error
    /// if a coil pin cannot be driven at setup time.
    pub fn new<R>(
        config: SystemConfig,
        x_pins: AxisPins<P>,
        y_pins: AxisPins<P>,
        adc: Option<R>,
        power: Arc<dyn SystemPower>,
    ) -> Result<Self>
    where
        R: AnalogReader + Send + 'static,
    {
        validate_config(&config)?;
        info!("xy controller started");

        let tracker = Arc::new(PositionTracker::new());
        tracker.start(adc, &config.feedback);

        let feedback: Arc<dyn PositionSource> = Arc::clone(&tracker) as Arc<dyn PositionSource>;
        let x = Arc::new(AxisController::new(
            Axis::X,
            x_pins,
            Arc::clone(&feedback),
            &config.axes.x,
            &config.seek,
        )?);
        let y = Arc::new(AxisController::new(
            Axis::Y,
            y_pins,
            feedback,
            &config.axes.y,
            &config.seek,
        )?);
        x.stop();
        y.stop();

        let dispatcher =
            CommandDispatcher::new(Arc::clone(&x), Arc::clone(&y), power, &config.dispatch);
        let selftest =
            SelfTestSequencer::new(Arc::clone(&x), Arc::clone(&y), config.selftest.clone());

        info!("xy controller ready");
        Ok(Self {
            config,
            tracker,
            x,
            y,
            dispatcher,
            selftest,
        })
    }

    /// Attach the four jog inputs and the front-panel indicator.
    ///
    /// The indicator is driven high (ready) once the monitors are running.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Command`] if a monitor thread cannot be
    /// spawned.
    pub fn spawn_jog<I, Q>(&self, inputs: JogInputs<I>, indicator_pin: Q) -> Result<ManualJogController>
    where
        I: InputPin + Send + 'static,
        Q: OutputPin + Send + 'static,
    {
        let indicator = Indicator::new(indicator_pin);
        let jog = ManualJogController::spawn(
            &self.x,
            &self.y,
            inputs,
            indicator.clone(),
            &self.config.jog,
        )?;
        let _ = indicator.set_ready();
        Ok(jog)
    }

    /// Position snapshot for the status page, rounded to 4 decimals.
    pub fn http_status(&self) -> HttpStatus {
        HttpStatus {
            xpos: round4(self.tracker.position(Axis::X)),
            ypos: round4(self.tracker.position(Axis::Y)),
        }
    }

    /// Status snapshot for the programmatic API.
    pub fn api_status(&self) -> ApiStatus {
        ApiStatus {
            xpos: self.tracker.position(Axis::X),
            xmoving: self.x.is_moving(),
            ypos: self.tracker.position(Axis::Y),
            ymoving: self.y.is_moving(),
        }
    }

    /// Command entry point for the web/API layer. See
    /// [`CommandDispatcher::dispatch`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Command`] for malformed payloads; unknown
    /// items are ignored.
    pub fn parse_control(&self, item: &str, command: &Value) -> Result<()> {
        self.dispatcher.dispatch(item, command)
    }

    /// Trigger the diagnostic self-test script.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Command`] if the test thread cannot be
    /// spawned.
    pub fn run_self_test(&self) -> Result<()> {
        self.selftest.run()
    }

    /// The position tracker (for `location` lookups by axis name).
    pub fn tracker(&self) -> &Arc<PositionTracker> {
        &self.tracker
    }

    /// The X axis controller.
    pub fn x_axis(&self) -> &Arc<AxisController<P>> {
        &self.x
    }

    /// The Y axis controller.
    pub fn y_axis(&self) -> &Arc<AxisController<P>> {
        &self.y
    }

    /// The validated system configuration.
    pub fn config(&self) -> &SystemConfig {
        &self.config
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
