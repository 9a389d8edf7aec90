//! Per-axis motion controller.
//!
//! Owns the coil driver and sequence index for one axis and implements the
//! motion state machine: open-loop stepping, bounded closed-loop seeking
//! with one-step overshoot correction, and generation-counter cancellation.
//!
//! Cancellation model: every new motion command (and every `stop`) bumps the
//! axis generation counter; an in-flight motion loop re-checks the counter on
//! each iteration and exits once superseded. This gives "last command wins"
//! semantics without a global lock; two loops may overlap for at most one
//! step pulse before the stale one observes the mismatch.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use embedded_hal::digital::OutputPin;
use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::config::{AxisConfig, SeekConfig};
use crate::error::{HardwareError, Result};
use crate::feedback::PositionSource;
use crate::hal::{AxisPins, CoilDriver};

use super::sequence::{CoilPattern, SequenceIndex, ALL_ENERGIZED, DE_ENERGIZED};
use super::Axis;

/// Step direction along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward the upper travel limit.
    Forward,
    /// Toward the lower travel limit.
    Backward,
}

impl Direction {
    /// The opposite direction.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Stepping state guarded by the coil lock: the sequence index and the
/// winding outputs always change together.
struct CoilState<P: OutputPin> {
    driver: CoilDriver<P>,
    index: SequenceIndex,
}

/// Closed-loop controller for one table axis.
///
/// Constructed once at startup and shared by `Arc` across the dispatcher,
/// jog monitors, and self-test sequencer. All methods take `&self`; the
/// moving flag and generation counter are atomics, and coil access is
/// serialized by an internal lock.
pub struct AxisController<P: OutputPin + Send> {
    axis: Axis,
    coils: Mutex<CoilState<P>>,
    feedback: Arc<dyn PositionSource>,
    lower_limit: f64,
    upper_limit: f64,
    pulse_width: Duration,
    slow_step_pause: Duration,
    seek: SeekConfig,
    moving: AtomicBool,
    generation: AtomicU64,
}

impl<P: OutputPin + Send> AxisController<P> {
    /// Bind the four coil pins for this axis and de-energize them.
    ///
    /// # Errors
    ///
    /// A pin failure here is a setup-time fatal condition and is returned
    /// as [`crate::Error::Hardware`], unlike pin failures inside motion
    /// loops which are logged and handled locally.
    pub fn new(
        axis: Axis,
        pins: AxisPins<P>,
        feedback: Arc<dyn PositionSource>,
        config: &AxisConfig,
        seek: &SeekConfig,
    ) -> Result<Self> {
        let mut driver = CoilDriver::new(pins);
        driver.apply(DE_ENERGIZED)?;

        Ok(Self {
            axis,
            coils: Mutex::new(CoilState {
                driver,
                index: SequenceIndex::default(),
            }),
            feedback,
            lower_limit: config.lower_limit,
            upper_limit: config.upper_limit,
            pulse_width: config.pulse_width(),
            slow_step_pause: config.slow_step_pause(),
            seek: seek.clone(),
            moving: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        })
    }

    /// The axis this controller drives.
    #[inline]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Whether a motion loop currently owns this axis.
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.moving.load(Ordering::SeqCst)
    }

    /// Current generation counter value.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Current sequence index, for diagnostics.
    pub fn sequence_index(&self) -> u8 {
        self.coils.lock().index.value()
    }

    /// The pattern at the current sequence index, for diagnostics.
    pub fn current_pattern(&self) -> CoilPattern {
        self.coils.lock().index.pattern()
    }

    /// Advance one step toward the upper limit.
    ///
    /// Returns `Ok(true)` if a step was emitted, `Ok(false)` if it was
    /// suppressed at the travel limit (a silent no-op by design of the
    /// command surface).
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Pin`] if a coil write fails.
    pub fn step_forward(&self, fine: bool) -> std::result::Result<bool, HardwareError> {
        self.step(Direction::Forward, fine)
    }

    /// Retreat one step toward the lower limit. See [`step_forward`].
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Pin`] if a coil write fails.
    ///
    /// [`step_forward`]: Self::step_forward
    pub fn step_backward(&self, fine: bool) -> std::result::Result<bool, HardwareError> {
        self.step(Direction::Backward, fine)
    }

    /// Emit one step: bump the sequence index, assert the pattern for one
    /// pulse width, then de-energize unless `fine`. A fine step leaves the
    /// windings energized so the motor holds position.
    ///
    /// The coil lock is held for the whole pulse, so concurrent loops on
    /// the same axis serialize at step granularity.
    fn step(&self, direction: Direction, fine: bool) -> std::result::Result<bool, HardwareError> {
        let position = self.feedback.position(self.axis);
        let within_travel = match direction {
            Direction::Forward => position < self.upper_limit,
            Direction::Backward => position > self.lower_limit,
        };
        if !within_travel {
            return Ok(false);
        }

        let mut coils = self.coils.lock();
        let pattern = match direction {
            Direction::Forward => coils.index.advance(),
            Direction::Backward => coils.index.retreat(),
        };
        coils.driver.apply(pattern)?;
        thread::sleep(self.pulse_width);
        if !fine {
            coils.driver.apply(DE_ENERGIZED)?;
        }
        Ok(true)
    }

    /// Stop the axis: supersede any in-flight motion, clear the moving
    /// flag, de-energize the windings, and log the table position.
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.halt();
    }

    /// Cancel any in-flight motion without touching the windings.
    ///
    /// Used by the manual jog path before it takes control of the axis, so
    /// an automated seek is superseded exactly as a new command would
    /// supersede it.
    pub fn interrupt(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Shared termination path for motion loops: clears the moving flag and
    /// de-energizes without bumping the generation, so each command
    /// increments the counter exactly once.
    fn halt(&self) {
        self.moving.store(false, Ordering::SeqCst);
        if let Err(e) = self.coils.lock().driver.apply(DE_ENERGIZED) {
            error!("{} failed to de-energize windings: {}", self.axis, e);
        }
        info!(
            "{} stopped, x = {:.4}, y = {:.4}",
            self.axis,
            self.feedback.position(Axis::X),
            self.feedback.position(Axis::Y)
        );
    }

    /// Halt only if this loop still owns the axis; a superseding command
    /// manages its own moving flag and windings.
    fn finish(&self, my_gen: u64) {
        if self.generation() == my_gen {
            self.halt();
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Open-loop move of `steps` (sign gives direction) at full speed,
    /// with a `2 x pulse_width` pause between steps.
    ///
    /// Runs until the budget is exhausted, the moving flag is cleared, or a
    /// newer command supersedes this one; `steps == 0` stops immediately.
    pub fn move_steps(&self, steps: i64) {
        let my_gen = self.next_generation();
        self.moving.store(true, Ordering::SeqCst);

        let mut remaining = steps;
        while remaining != 0 && self.is_moving() && self.generation() == my_gen {
            let result = if remaining > 0 {
                remaining -= 1;
                self.step_forward(false)
            } else {
                remaining += 1;
                self.step_backward(false)
            };
            if let Err(e) = result {
                error!("{} step failed, aborting move: {}", self.axis, e);
                break;
            }
            thread::sleep(self.pulse_width * 2);
        }
        self.finish(my_gen);
    }

    /// Slow open-loop move with fine (holding) steps and the configured
    /// slow-step pause, so the winding sequence is externally observable.
    /// Used by the self-test script.
    pub fn move_slow(&self, steps: i64) {
        let my_gen = self.next_generation();
        self.moving.store(true, Ordering::SeqCst);

        let mut remaining = steps;
        while remaining != 0 && self.is_moving() && self.generation() == my_gen {
            let result = if remaining > 0 {
                remaining -= 1;
                self.step_forward(true)
            } else {
                remaining += 1;
                self.step_backward(true)
            };
            match result {
                Ok(_) => debug!("{} slow step pattern {:?}", self.axis, self.current_pattern()),
                Err(e) => {
                    error!("{} step failed, aborting slow move: {}", self.axis, e);
                    break;
                }
            }
            thread::sleep(self.slow_step_pause);
        }
        self.finish(my_gen);
    }

    /// Closed-loop seek to `target` in the feedback-voltage domain.
    ///
    /// Targets outside the travel limits are ignored (no motion, no error).
    /// The seek direction is fixed from the entry delta so feedback noise
    /// cannot reverse it mid-seek. Inside the fine threshold the seek takes
    /// single fine steps and corrects a detected overshoot with one fine
    /// step back; the iteration budget guards against targets the motor
    /// cannot reach.
    // Exact float comparison is intentional: the loop condition mirrors the
    // feedback domain, and termination normally comes from the overshoot
    // correction or the iteration guard rather than exact equality.
    #[allow(clippy::float_cmp)]
    pub fn move_to(&self, target: f64) {
        let my_gen = self.next_generation();
        if target < self.lower_limit || target > self.upper_limit {
            warn!(
                "{} seek target {} outside [{}, {}], ignored",
                self.axis, target, self.lower_limit, self.upper_limit
            );
            return;
        }
        self.moving.store(true, Ordering::SeqCst);

        let delta = target - self.feedback.position(self.axis);
        let direction = if delta > 0.0 {
            Direction::Forward
        } else {
            Direction::Backward
        };

        let mut iterations: u32 = 0;
        while self.feedback.position(self.axis) != target && self.generation() == my_gen {
            iterations += 1;
            if iterations > self.seek.max_iterations {
                warn!("{} step counter overrun at {} iterations", self.axis, iterations);
                self.halt();
                return;
            }

            let position = self.feedback.position(self.axis);
            let result = if (target - position).abs() < self.seek.fine_threshold {
                let fine = self.step(direction, true);
                let position = self.feedback.position(self.axis);
                info!(
                    "recheck stepper {} position {:.4} - target {}",
                    self.axis, position, target
                );
                let overshot = match direction {
                    Direction::Forward => position > target,
                    Direction::Backward => position < target,
                };
                if fine.is_ok() && overshot {
                    if let Err(e) = self.step(direction.opposite(), true) {
                        error!("{} overshoot correction failed: {}", self.axis, e);
                    }
                    info!(
                        "{} at {:.4} just passed {} so stepped back 1, iterations = {}",
                        self.axis,
                        self.feedback.position(self.axis),
                        target,
                        iterations
                    );
                    self.halt();
                    return;
                }
                fine
            } else {
                self.step(direction, false)
            };
            if let Err(e) = result {
                error!("{} step failed, abandoning seek: {}", self.axis, e);
                self.halt();
                return;
            }

            // Slow the stepping rate near the target to avoid overshoot.
            let remaining = (target - self.feedback.position(self.axis)).abs();
            if remaining > self.seek.settle_epsilon {
                thread::sleep(self.pulse_width * 2);
            } else {
                thread::sleep(self.seek.settle_pause());
            }
        }

        // Normal completion (or supersession): the newest command owns the
        // moving flag, so only clear it if that is still us.
        if self.generation() == my_gen {
            self.moving.store(false, Ordering::SeqCst);
        }
    }

    /// Energize all four windings. Self-test only.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Pin`] if a coil write fails.
    pub fn energize_all(&self) -> std::result::Result<(), HardwareError> {
        self.coils.lock().driver.apply(ALL_ENERGIZED)
    }

    /// De-energize all four windings without changing any other state.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Pin`] if a coil write fails.
    pub fn de_energize(&self) -> std::result::Result<(), HardwareError> {
        self.coils.lock().driver.apply(DE_ENERGIZED)
    }
}
