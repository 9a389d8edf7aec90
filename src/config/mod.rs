//! Configuration module for xy-table-motion.
//!
//! Provides types for loading and validating table configuration from TOML
//! files (or pre-parsed strings). Every field carries a default matching the
//! production table, so `SystemConfig::default()` is a working configuration.

mod loader;
mod validation;

use std::time::Duration;

use serde::Deserialize;

pub use loader::{load_config, parse_config};
pub use validation::validate_config;

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Per-axis motion settings.
    pub axes: AxesConfig,

    /// Analog feedback sampling settings.
    pub feedback: FeedbackConfig,

    /// Closed-loop seek tuning.
    pub seek: SeekConfig,

    /// Command dispatch delays.
    pub dispatch: DispatchConfig,

    /// Self-test script timing.
    pub selftest: SelfTestConfig,

    /// Manual jog input settings.
    pub jog: JogConfig,
}

/// The two axis configurations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    /// X axis settings.
    pub x: AxisConfig,
    /// Y axis settings.
    pub y: AxisConfig,
}

/// Motion settings for one axis.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AxisConfig {
    /// Lower travel limit in feedback volts.
    pub lower_limit: f64,

    /// Upper travel limit in feedback volts.
    pub upper_limit: f64,

    /// Coil energize time per step, in milliseconds.
    pub pulse_width_ms: u64,

    /// Inter-step pause for slow (diagnostic) moves, in milliseconds.
    pub slow_step_pause_ms: u64,
}

impl AxisConfig {
    /// Coil pulse width as a [`Duration`].
    pub fn pulse_width(&self) -> Duration {
        Duration::from_millis(self.pulse_width_ms)
    }

    /// Slow-move inter-step pause as a [`Duration`].
    pub fn slow_step_pause(&self) -> Duration {
        Duration::from_millis(self.slow_step_pause_ms)
    }
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            lower_limit: -2.1,
            upper_limit: 2.1,
            pulse_width_ms: 25,
            slow_step_pause_ms: 1000,
        }
    }
}

/// Analog feedback sampling settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// ADC channel carrying the X axis feedback voltage.
    pub x_channel: u8,

    /// ADC channel carrying the Y axis feedback voltage.
    pub y_channel: u8,

    /// Sampling period in milliseconds.
    pub sample_period_ms: u64,

    /// Offset subtracted from the raw voltage (position = raw - offset).
    pub voltage_offset: f64,
}

impl FeedbackConfig {
    /// Sampling period as a [`Duration`].
    pub fn sample_period(&self) -> Duration {
        Duration::from_millis(self.sample_period_ms)
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            x_channel: 1,
            y_channel: 5,
            sample_period_ms: 250,
            voltage_offset: 2.5,
        }
    }
}

/// Closed-loop seek tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeekConfig {
    /// Error band (volts) inside which the seek switches to fine steps.
    pub fine_threshold: f64,

    /// Error band (volts) inside which the stepping rate slows to the
    /// settle pause.
    pub settle_epsilon: f64,

    /// Inter-step pause near the target, in milliseconds.
    pub settle_pause_ms: u64,

    /// Runaway-seek guard: the seek aborts after this many iterations.
    pub max_iterations: u32,
}

impl SeekConfig {
    /// Near-target inter-step pause as a [`Duration`].
    pub fn settle_pause(&self) -> Duration {
        Duration::from_millis(self.settle_pause_ms)
    }
}

impl Default for SeekConfig {
    fn default() -> Self {
        Self {
            fine_threshold: 0.1,
            settle_epsilon: 0.05,
            settle_pause_ms: 300,
            max_iterations: 8000,
        }
    }
}

/// Command dispatch delays.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Settle window between receiving a motion command and executing it,
    /// in milliseconds.
    pub delay_ms: u64,

    /// Delay before a requested system restart, in milliseconds.
    pub restart_delay_ms: u64,
}

impl DispatchConfig {
    /// Command settle window as a [`Duration`].
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Restart delay as a [`Duration`].
    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1000,
            restart_delay_ms: 15000,
        }
    }
}

/// Self-test script timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelfTestConfig {
    /// Delay between requesting the self-test and starting it, in
    /// milliseconds.
    pub start_delay_ms: u64,

    /// How long each energize/de-energize phase holds, in milliseconds.
    pub hold_ms: u64,

    /// Step count for the slow forward/backward exercise.
    pub slow_steps: i64,
}

impl SelfTestConfig {
    /// Start delay as a [`Duration`].
    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    /// Phase hold time as a [`Duration`].
    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }
}

impl Default for SelfTestConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: 10000,
            hold_ms: 5000,
            slow_steps: 10,
        }
    }
}

/// Manual jog input settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JogConfig {
    /// Input polling period while idle, in milliseconds. Stands in for the
    /// edge-detect debounce interval.
    pub poll_period_ms: u64,

    /// Step cadence while a jog button is held, in milliseconds.
    pub step_period_ms: u64,
}

impl JogConfig {
    /// Idle polling period as a [`Duration`].
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }

    /// Held-button step cadence as a [`Duration`].
    pub fn step_period(&self) -> Duration {
        Duration::from_millis(self.step_period_ms)
    }
}

impl Default for JogConfig {
    fn default() -> Self {
        Self {
            poll_period_ms: 10,
            step_period_ms: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_production_table() {
        let config = SystemConfig::default();

        assert_eq!(config.axes.x.lower_limit, -2.1);
        assert_eq!(config.axes.x.upper_limit, 2.1);
        assert_eq!(config.axes.x.pulse_width_ms, 25);
        assert_eq!(config.feedback.x_channel, 1);
        assert_eq!(config.feedback.y_channel, 5);
        assert_eq!(config.feedback.sample_period_ms, 250);
        assert_eq!(config.feedback.voltage_offset, 2.5);
        assert_eq!(config.seek.max_iterations, 8000);
        assert_eq!(config.dispatch.delay_ms, 1000);
        assert_eq!(config.selftest.slow_steps, 10);
    }

    #[test]
    fn test_duration_accessors() {
        let config = SystemConfig::default();

        assert_eq!(config.axes.x.pulse_width(), Duration::from_millis(25));
        assert_eq!(config.seek.settle_pause(), Duration::from_millis(300));
        assert_eq!(config.dispatch.restart_delay(), Duration::from_secs(15));
        assert_eq!(config.selftest.start_delay(), Duration::from_secs(10));
    }
}
