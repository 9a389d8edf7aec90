//! # xy-table-motion
//!
//! Closed-loop control for a two-axis stepper-motor positioning table with
//! analog position feedback.
//!
//! ## Features
//!
//! - **Closed-loop seeking**: target positions in the feedback-voltage domain
//!   with explicit one-step overshoot correction
//! - **embedded-hal 1.0**: coil and indicator outputs are `OutputPin`, jog
//!   inputs are `InputPin`
//! - **Last command wins**: a per-axis generation counter supersedes stale
//!   in-flight motion without a global lock
//! - **Degraded mode**: a missing ADC freezes feedback but never fails startup
//! - **Configuration-driven**: every timing literal and threshold lives in a
//!   TOML-backed [`SystemConfig`] with production defaults
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use xy_table_motion::{AxisPins, SystemConfig, TableSystem};
//!
//! let config = SystemConfig::default();
//! let table = TableSystem::new(
//!     config,
//!     AxisPins::new(xa, xa_bar, xb, xb_bar),
//!     AxisPins::new(ya, ya_bar, yb, yb_bar),
//!     Some(adc),
//!     Arc::new(power),
//! )?;
//!
//! // Seek the X axis to +1.5 volts of feedback after the settle delay.
//! table.parse_control("xmoveto", &serde_json::json!(1.5))?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod axis;
pub mod command;
pub mod config;
pub mod error;
pub mod feedback;
pub mod hal;
pub mod jog;
pub mod selftest;
pub mod table;

#[cfg(test)]
mod testutil;

// Re-exports for ergonomic API
pub use axis::{Axis, AxisController, CoilPattern, Direction, SequenceIndex};
pub use command::{parse_request, CommandDispatcher, ControlRequest};
pub use config::{load_config, parse_config, validate_config, SystemConfig};
pub use error::{CommandError, ConfigError, Error, HardwareError, Result};
pub use feedback::{PositionSource, PositionTracker, UNKNOWN_AXIS};
pub use hal::{AnalogReader, AxisPins, CoilDriver, SystemPower};
pub use jog::{Indicator, JogInputs, ManualJogController};
pub use selftest::SelfTestSequencer;
pub use table::{ApiStatus, HttpStatus, TableSystem};
