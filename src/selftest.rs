//! Scripted self-test.
//!
//! Exercises both axes' windings and slow-stepping behavior without any
//! external command input. Purely diagnostic: there is no return value, the
//! result is observed through the logs and the front panel.

use std::sync::Arc;
use std::thread;

use embedded_hal::digital::OutputPin;
use log::{error, info};

use crate::axis::AxisController;
use crate::config::SelfTestConfig;
use crate::error::{CommandError, Result};

/// Runs the fixed diagnostic script on both axes.
pub struct SelfTestSequencer<P: OutputPin + Send + 'static> {
    x: Arc<AxisController<P>>,
    y: Arc<AxisController<P>>,
    config: SelfTestConfig,
}

impl<P: OutputPin + Send + 'static> SelfTestSequencer<P> {
    /// Create a sequencer over the two axis controllers.
    pub fn new(
        x: Arc<AxisController<P>>,
        y: Arc<AxisController<P>>,
        config: SelfTestConfig,
    ) -> Self {
        Self { x, y, config }
    }

    /// Stop both axes, then run the test script on its own thread after the
    /// configured start delay.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Command`] if the test thread cannot be
    /// spawned.
    pub fn run(&self) -> Result<()> {
        info!("Stopping both motors prior to testing");
        self.x.stop();
        self.y.stop();
        info!(
            "Starting test sequence in {} seconds",
            self.config.start_delay().as_secs()
        );

        let x = Arc::clone(&self.x);
        let y = Arc::clone(&self.y);
        let config = self.config.clone();
        thread::Builder::new()
            .name("selftest".to_string())
            .spawn(move || {
                thread::sleep(config.start_delay());
                info!("Self test started ************************************");
                exercise_axis(&x, &config);
                exercise_axis(&y, &config);
                info!("Self test ended ************************************");
            })
            .map(|_| ())
            .map_err(|e| CommandError::Spawn(e.to_string()).into())
    }
}

/// One axis worth of the script: hold all windings on, hold them off, then
/// step slowly forward and backward with pauses in between.
fn exercise_axis<P: OutputPin + Send>(axis: &AxisController<P>, config: &SelfTestConfig) {
    let hold = config.hold();
    info!("Starting channel {} tests", axis.axis());

    info!(
        "Setting all {} channels to 1 for {} seconds",
        axis.axis(),
        hold.as_secs()
    );
    if let Err(e) = axis.energize_all() {
        error!("{} self test aborted, winding write failed: {}", axis.axis(), e);
        return;
    }
    thread::sleep(hold);

    info!(
        "Setting all {} channels to 0 for {} seconds",
        axis.axis(),
        hold.as_secs()
    );
    if let Err(e) = axis.de_energize() {
        error!("{} self test aborted, winding write failed: {}", axis.axis(), e);
        return;
    }
    thread::sleep(hold);

    info!("step {} {} steps forward", axis.axis(), config.slow_steps);
    axis.move_slow(config.slow_steps);
    let _ = axis.de_energize();
    thread::sleep(hold);

    info!("step {} {} steps backward", axis.axis(), config.slow_steps);
    axis.move_slow(-config.slow_steps);
    let _ = axis.de_energize();
    thread::sleep(hold);

    info!("Finished channel {} tests", axis.axis());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::Axis;
    use crate::config::{AxisConfig, SeekConfig};
    use crate::testutil::{test_controller, FixedFeedback};
    use std::time::Duration;

    #[test]
    fn test_script_steps_both_axes_and_leaves_them_idle() {
        let axis_cfg = AxisConfig {
            pulse_width_ms: 0,
            slow_step_pause_ms: 0,
            ..Default::default()
        };
        let seek_cfg = SeekConfig::default();
        let x = Arc::new(test_controller(
            Axis::X,
            FixedFeedback::at(0.0, 0.0),
            &axis_cfg,
            &seek_cfg,
        ));
        let y = Arc::new(test_controller(
            Axis::Y,
            FixedFeedback::at(0.0, 0.0),
            &axis_cfg,
            &seek_cfg,
        ));
        let config = SelfTestConfig {
            start_delay_ms: 0,
            hold_ms: 0,
            slow_steps: 10,
        };

        let sequencer = SelfTestSequencer::new(Arc::clone(&x), Arc::clone(&y), config);
        sequencer.run().unwrap();

        thread::sleep(Duration::from_millis(200));
        // stop() at entry, then one slow move each way
        assert_eq!(x.generation(), 3);
        assert_eq!(y.generation(), 3);
        // +10 then -10 steps return the index to where it started
        assert_eq!(x.sequence_index(), 0);
        assert_eq!(y.sequence_index(), 0);
        assert!(!x.is_moving());
        assert!(!y.is_moving());
    }
}
