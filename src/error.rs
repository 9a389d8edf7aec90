//! Error types for xy-table-motion.
//!
//! Provides unified error handling across configuration, hardware access,
//! and the external command surface.

use std::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for all table-motion operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Hardware collaborator error
    Hardware(HardwareError),
    /// External command surface error
    Command(CommandError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(String),
    /// File I/O error while loading configuration
    IoError(String),
    /// Invalid axis travel limits (lower must be < upper)
    InvalidLimits {
        /// Axis the limits belong to ("x" or "y")
        axis: &'static str,
        /// Lower travel limit in feedback volts
        lower: f64,
        /// Upper travel limit in feedback volts
        upper: f64,
    },
    /// Pulse width must be non-zero
    ZeroPulseWidth(&'static str),
    /// Seek thresholds out of order (settle epsilon must be < fine threshold, both > 0)
    InvalidSeekThresholds {
        /// Fine-step threshold in feedback volts
        fine: f64,
        /// Settle epsilon in feedback volts
        settle: f64,
    },
    /// Seek iteration budget must be non-zero
    ZeroIterationBudget,
    /// Feedback sample period must be non-zero
    ZeroSamplePeriod,
    /// The two feedback channels must be distinct
    DuplicateChannels(u8),
    /// Jog step period must be non-zero
    ZeroJogStepPeriod,
}

/// Hardware collaborator errors.
#[derive(Debug, Clone, PartialEq)]
pub enum HardwareError {
    /// GPIO pin operation failed
    Pin,
    /// ADC voltage read failed
    Adc(String),
}

/// Errors from the external command surface.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// Command payload has the wrong type or shape
    BadPayload {
        /// The command item the payload belonged to
        item: String,
        /// What the parser expected to find
        expected: &'static str,
    },
    /// A dispatch thread could not be spawned
    Spawn(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Hardware(e) => write!(f, "Hardware error: {}", e),
            Error::Command(e) => write!(f, "Command error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
            ConfigError::InvalidLimits { axis, lower, upper } => {
                write!(f, "Invalid {} limits: lower ({}) must be < upper ({})", axis, lower, upper)
            }
            ConfigError::ZeroPulseWidth(axis) => {
                write!(f, "Pulse width for axis {} must be > 0", axis)
            }
            ConfigError::InvalidSeekThresholds { fine, settle } => {
                write!(
                    f,
                    "Invalid seek thresholds: settle epsilon ({}) must be > 0 and < fine threshold ({})",
                    settle, fine
                )
            }
            ConfigError::ZeroIterationBudget => write!(f, "Seek iteration budget must be > 0"),
            ConfigError::ZeroSamplePeriod => write!(f, "Feedback sample period must be > 0"),
            ConfigError::DuplicateChannels(ch) => {
                write!(f, "Feedback channels must be distinct, both set to {}", ch)
            }
            ConfigError::ZeroJogStepPeriod => write!(f, "Jog step period must be > 0"),
        }
    }
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareError::Pin => write!(f, "GPIO pin operation failed"),
            HardwareError::Adc(msg) => write!(f, "ADC read failed: {}", msg),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::BadPayload { item, expected } => {
                write!(f, "Bad payload for '{}': expected {}", item, expected)
            }
            CommandError::Spawn(msg) => write!(f, "Failed to spawn dispatch thread: {}", msg),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<HardwareError> for Error {
    fn from(e: HardwareError) -> Self {
        Error::Hardware(e)
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Error::Command(e)
    }
}

impl std::error::Error for Error {}

impl std::error::Error for ConfigError {}

impl std::error::Error for HardwareError {}

impl std::error::Error for CommandError {}
