//! Error kinds surfaced by the sequencing core
//!
//! Every error here is locally recoverable. `Sequencer::reset` always
//! returns the core to `Idle`.

use core::fmt;

/// A step cannot be started with the current recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationError {
    /// No step in the recipe is enabled
    NoStepEnabled,
    /// Every enabled step already completed in this run
    NoStepPending,
    /// Step number outside 1..=8
    InvalidStep(u8),
    /// Requested step is disabled
    StepDisabled(u8),
    /// Requested step already completed in this run
    StepAlreadyDone(u8),
    /// Configured duration is zero
    ZeroDuration(u8),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::NoStepEnabled => f.write_str("no step is enabled"),
            ConfigurationError::NoStepPending => {
                f.write_str("all enabled steps are done; reset to run again")
            }
            ConfigurationError::InvalidStep(n) => write!(f, "step {} does not exist", n),
            ConfigurationError::StepDisabled(n) => write!(f, "step {} is disabled", n),
            ConfigurationError::StepAlreadyDone(n) => write!(f, "step {} is already done", n),
            ConfigurationError::ZeroDuration(n) => write!(f, "step {} has no duration", n),
        }
    }
}

/// A stored field value is outside its operating range
///
/// The value is kept; the flag tells the operator it needs correcting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Target temperature outside the thermostat range (or not a number)
    Temperature,
    /// Stirrer speed outside the supported range
    Rpm,
    /// Dosing volume negative or above the pump limit
    DosingVolume,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Temperature => f.write_str("temperature out of range"),
            ValidationError::Rpm => f.write_str("stirrer speed out of range"),
            ValidationError::DosingVolume => f.write_str("dosing volume out of range"),
        }
    }
}
