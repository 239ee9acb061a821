//! Recipe type definitions
//!
//! A recipe is a fixed table of eight steps. Steps are numbered 1..=8 in
//! every public API; step number 0 means "no step".

use crate::error::ValidationError;

/// Number of steps in a recipe
pub const MAX_STEPS: usize = 8;

/// Highest valid step number
pub const LAST_STEP: u8 = MAX_STEPS as u8;

/// Duration limits
pub const MAX_DURATION_HOURS: u8 = 99;
pub const MIN_DURATION_MINUTES: u8 = 1;
pub const MAX_DURATION_MINUTES: u8 = 59;

/// Thermostat working range (°C)
pub const MIN_TEMPERATURE_C: f32 = -90.0;
pub const MAX_TEMPERATURE_C: f32 = 300.0;

/// Highest stirrer speed the overhead stirrer accepts
pub const MAX_RPM: u16 = 2000;

/// Largest volume the dosing pump delivers per step (mL)
pub const MAX_DOSING_VOLUME_ML: f32 = 1000.0;

/// Temperature channel a step regulates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TempChannel {
    /// Reactor (process) temperature
    #[default]
    Tr,
    /// Jacket temperature
    Tj,
}

impl TempChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            TempChannel::Tr => "TR",
            TempChannel::Tj => "TJ",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "TR" | "tr" | "Tr" => Some(TempChannel::Tr),
            "TJ" | "tj" | "Tj" => Some(TempChannel::Tj),
            _ => None,
        }
    }

    pub fn is_jacket(self) -> bool {
        self == TempChannel::Tj
    }
}

/// When a step's countdown begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimingMode {
    /// Countdown starts as soon as the step activates
    #[default]
    Run,
    /// Countdown starts once the measured temperature reaches the target
    Wait,
}

impl TimingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TimingMode::Run => "Run",
            TimingMode::Wait => "Wait",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "Run" | "run" | "RUN" => Some(TimingMode::Run),
            "Wait" | "wait" | "WAIT" => Some(TimingMode::Wait),
            _ => None,
        }
    }
}

/// Per-step lamp shown to the operator and persisted for recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionStatus {
    #[default]
    Wait,
    Run,
    Done,
}

impl CompletionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CompletionStatus::Wait => "Wait",
            CompletionStatus::Run => "Run",
            CompletionStatus::Done => "Done",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "Wait" => Some(CompletionStatus::Wait),
            "Run" => Some(CompletionStatus::Run),
            "Done" => Some(CompletionStatus::Done),
            _ => None,
        }
    }
}

/// One recipe step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Step takes part in the run
    pub enabled: bool,
    /// Setpoint in °C
    pub target_temperature: f32,
    /// Channel the setpoint and threshold apply to
    pub target_channel: TempChannel,
    /// Stirrer speed
    pub target_rpm: u16,
    /// Dosing volume in mL
    pub dosing_volume: f32,
    /// Hours part of the hold time (0..=99)
    pub duration_hours: u8,
    /// Minutes part of the hold time (1..=59)
    pub duration_minutes: u8,
    /// Timed or threshold-gated
    pub timing_mode: TimingMode,
    /// Lamp state
    pub status: CompletionStatus,
}

impl Default for Step {
    fn default() -> Self {
        Self {
            enabled: false,
            target_temperature: 20.0,
            target_channel: TempChannel::Tr,
            target_rpm: 0,
            dosing_volume: 0.0,
            duration_hours: 0,
            duration_minutes: MIN_DURATION_MINUTES,
            timing_mode: TimingMode::Run,
            status: CompletionStatus::Wait,
        }
    }
}

impl Step {
    /// Hold time in seconds
    pub fn duration_s(&self) -> u32 {
        self.duration_hours as u32 * 3600 + self.duration_minutes as u32 * 60
    }

    /// Fields currently outside their operating range
    pub fn validation_errors(&self) -> heapless::Vec<ValidationError, 3> {
        let mut errors = heapless::Vec::new();
        if !temperature_in_range(self.target_temperature) {
            let _ = errors.push(ValidationError::Temperature);
        }
        if self.target_rpm > MAX_RPM {
            let _ = errors.push(ValidationError::Rpm);
        }
        if !dosing_in_range(self.dosing_volume) {
            let _ = errors.push(ValidationError::DosingVolume);
        }
        errors
    }
}

pub(crate) fn temperature_in_range(celsius: f32) -> bool {
    celsius.is_finite() && (MIN_TEMPERATURE_C..=MAX_TEMPERATURE_C).contains(&celsius)
}

pub(crate) fn dosing_in_range(volume_ml: f32) -> bool {
    volume_ml.is_finite() && (0.0..=MAX_DOSING_VOLUME_ML).contains(&volume_ml)
}

/// Clamp an hours value into 0..=99
pub fn clamp_hours(hours: i64) -> u8 {
    hours.clamp(0, MAX_DURATION_HOURS as i64) as u8
}

/// Clamp a minutes value into 1..=59
///
/// The one-minute floor applies even when hours are set.
pub fn clamp_minutes(minutes: i64) -> u8 {
    minutes.clamp(MIN_DURATION_MINUTES as i64, MAX_DURATION_MINUTES as i64) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_step_is_one_minute() {
        let step = Step::default();
        assert!(!step.enabled);
        assert_eq!(step.duration_s(), 60);
    }

    #[test]
    fn test_duration_seconds() {
        let step = Step {
            duration_hours: 2,
            duration_minutes: 30,
            ..Default::default()
        };
        assert_eq!(step.duration_s(), 9000);
    }

    #[test]
    fn test_clamp_limits() {
        assert_eq!(clamp_hours(-4), 0);
        assert_eq!(clamp_hours(150), 99);
        assert_eq!(clamp_minutes(0), 1);
        assert_eq!(clamp_minutes(75), 59);
        assert_eq!(clamp_minutes(12), 12);
    }

    #[test]
    fn test_validation_flags_each_field() {
        let step = Step {
            target_temperature: 420.0,
            target_rpm: 5000,
            dosing_volume: -1.0,
            ..Default::default()
        };
        let errors = step.validation_errors();
        assert_eq!(
            &errors[..],
            &[
                ValidationError::Temperature,
                ValidationError::Rpm,
                ValidationError::DosingVolume
            ]
        );
        assert!(Step::default().validation_errors().is_empty());
    }

    #[test]
    fn test_enum_text_forms() {
        assert_eq!(TempChannel::parse("tj"), Some(TempChannel::Tj));
        assert_eq!(TempChannel::parse("jacket"), None);
        assert_eq!(TimingMode::parse(TimingMode::Wait.as_str()), Some(TimingMode::Wait));
        assert_eq!(
            CompletionStatus::parse(CompletionStatus::Done.as_str()),
            Some(CompletionStatus::Done)
        );
    }
}
