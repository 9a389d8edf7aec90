//! Cross-field configuration validation.

use crate::error::{ConfigError, Result};

use super::{AxisConfig, SystemConfig};

/// Validate a complete system configuration.
///
/// Checks every constraint that TOML deserialization cannot express:
/// limit ordering, non-zero timing values, seek threshold ordering, and
/// feedback channel distinctness.
///
/// # Errors
///
/// Returns the first [`ConfigError`] found.
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    validate_axis("x", &config.axes.x)?;
    validate_axis("y", &config.axes.y)?;

    let seek = &config.seek;
    if seek.settle_epsilon <= 0.0 || seek.settle_epsilon >= seek.fine_threshold {
        return Err(ConfigError::InvalidSeekThresholds {
            fine: seek.fine_threshold,
            settle: seek.settle_epsilon,
        }
        .into());
    }
    if seek.max_iterations == 0 {
        return Err(ConfigError::ZeroIterationBudget.into());
    }

    if config.feedback.sample_period_ms == 0 {
        return Err(ConfigError::ZeroSamplePeriod.into());
    }
    if config.feedback.x_channel == config.feedback.y_channel {
        return Err(ConfigError::DuplicateChannels(config.feedback.x_channel).into());
    }

    if config.jog.step_period_ms == 0 {
        return Err(ConfigError::ZeroJogStepPeriod.into());
    }

    Ok(())
}

fn validate_axis(name: &'static str, axis: &AxisConfig) -> Result<()> {
    if axis.lower_limit >= axis.upper_limit {
        return Err(ConfigError::InvalidLimits {
            axis: name,
            lower: axis.lower_limit,
            upper: axis.upper_limit,
        }
        .into());
    }
    if axis.pulse_width_ms == 0 {
        return Err(ConfigError::ZeroPulseWidth(name).into());
    }
    Ok(())
}
