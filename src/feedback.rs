//! Analog position feedback.
//!
//! A [`PositionTracker`] samples the two feedback channels on a background
//! thread and holds the latest per-axis position estimate. Axis controllers
//! read through the [`PositionSource`] seam so tests can substitute a
//! simulated table.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use log::{error, warn};

use crate::axis::Axis;
use crate::config::FeedbackConfig;
use crate::hal::AnalogReader;

/// Sentinel returned by [`PositionTracker::location`] for an unknown axis
/// name. Callers must treat it as "axis unknown", not as a real position.
pub const UNKNOWN_AXIS: f64 = -99.99;

/// Read-side seam for position feedback.
///
/// Implemented by [`PositionTracker`] in production and by simulated
/// feedback sources in tests.
pub trait PositionSource: Send + Sync {
    /// Latest position estimate for one axis, in feedback volts.
    fn position(&self, axis: Axis) -> f64;
}

/// Latest X/Y position estimate, continuously overwritten by the sampler
/// thread. No history is retained.
///
/// The two axes are independent scalars stored in atomic bit-cells, so
/// concurrent readers never observe a torn value. If the ADC board is
/// absent the tracker never starts sampling and both positions stay at
/// their last stored value (0 by default), a degraded-operation mode
/// rather than a failure.
pub struct PositionTracker {
    x: AtomicU64,
    y: AtomicU64,
}

impl PositionTracker {
    /// Create a tracker with both axes at 0.0.
    pub fn new() -> Self {
        Self {
            x: AtomicU64::new(0f64.to_bits()),
            y: AtomicU64::new(0f64.to_bits()),
        }
    }

    /// Start the perpetual sampling loop.
    ///
    /// With `Some(reader)`, spawns a named thread that reads both channels
    /// every sample period and stores `voltage - voltage_offset` per axis,
    /// exiting when the tracker is dropped. Read failures are logged and
    /// the last value kept.
    ///
    /// With `None` the tracker logs a warning and never samples; nothing
    /// is reported back to callers.
    pub fn start<R>(self: &Arc<Self>, reader: Option<R>, config: &FeedbackConfig)
    where
        R: AnalogReader + Send + 'static,
    {
        let Some(mut reader) = reader else {
            warn!("no ADC board found, position feedback frozen");
            return;
        };

        let config = config.clone();
        let weak = Arc::downgrade(self);
        let spawned = thread::Builder::new()
            .name("position-tracker".into())
            .spawn(move || loop {
                let Some(tracker) = weak.upgrade() else {
                    break;
                };
                match reader.read_voltage(config.x_channel) {
                    Ok(v) => tracker.store(Axis::X, v - config.voltage_offset),
                    Err(e) => warn!("x feedback read failed: {}", e),
                }
                match reader.read_voltage(config.y_channel) {
                    Ok(v) => tracker.store(Axis::Y, v - config.voltage_offset),
                    Err(e) => warn!("y feedback read failed: {}", e),
                }
                drop(tracker);
                thread::sleep(config.sample_period());
            });
        if let Err(e) = spawned {
            error!("failed to start position sampler: {}", e);
        }
    }

    fn store(&self, axis: Axis, value: f64) {
        self.cell(axis).store(value.to_bits(), Ordering::Relaxed);
    }

    fn cell(&self, axis: Axis) -> &AtomicU64 {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    /// Latest stored position for one axis, in feedback volts.
    pub fn position(&self, axis: Axis) -> f64 {
        f64::from_bits(self.cell(axis).load(Ordering::Relaxed))
    }

    /// Position lookup by external axis name: `"x"` or `"y"` return the
    /// stored value, anything else returns [`UNKNOWN_AXIS`].
    pub fn location(&self, axis_name: &str) -> f64 {
        match Axis::from_name(axis_name) {
            Some(axis) => self.position(axis),
            None => UNKNOWN_AXIS,
        }
    }
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionSource for PositionTracker {
    fn position(&self, axis: Axis) -> f64 {
        PositionTracker::position(self, axis)
    }
}
