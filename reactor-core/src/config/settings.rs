//! Key/value settings contract
//!
//! Recipes persist through a flat string key/value document. Keys are
//! `<section>.<field>`, e.g. `step3.target_rpm` or `recipe.auto_mode`.
//! The backend decides the on-disk format.

use core::fmt::Write;

use heapless::String;

/// Maximum key length
pub const MAX_KEY_LEN: usize = 40;

/// Maximum value length
pub const MAX_VALUE_LEN: usize = 32;

pub type SettingKey = String<MAX_KEY_LEN>;
pub type SettingValue = String<MAX_VALUE_LEN>;

pub const KEY_RECIPE_NAME: &str = "recipe.name";
pub const KEY_AUTO_MODE: &str = "recipe.auto_mode";
pub const KEY_PEER_CHANNEL: &str = "thermostat.peer_channel";

/// Settings persistence backend
///
/// `read` returns `None` for missing keys. `write` persists immediately.
pub trait SettingsStore {
    /// Error type for write operations
    type Error: core::fmt::Debug;

    /// Read a value by key
    fn read(&self, key: &str) -> Option<SettingValue>;

    /// Write a value by key
    fn write(&mut self, key: &str, value: &str) -> Result<(), Self::Error>;
}

/// Per-step fields stored under `step<N>.`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepField {
    Enabled,
    TargetTemperature,
    TargetChannel,
    TargetRpm,
    DosingVolume,
    DurationHours,
    DurationMinutes,
    TimingMode,
    Status,
}

impl StepField {
    pub const ALL: [StepField; 9] = [
        StepField::Enabled,
        StepField::TargetTemperature,
        StepField::TargetChannel,
        StepField::TargetRpm,
        StepField::DosingVolume,
        StepField::DurationHours,
        StepField::DurationMinutes,
        StepField::TimingMode,
        StepField::Status,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StepField::Enabled => "enabled",
            StepField::TargetTemperature => "target_temperature",
            StepField::TargetChannel => "target_channel",
            StepField::TargetRpm => "target_rpm",
            StepField::DosingVolume => "dosing_volume",
            StepField::DurationHours => "duration_hours",
            StepField::DurationMinutes => "duration_minutes",
            StepField::TimingMode => "timing_mode",
            StepField::Status => "status",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.name() == name)
    }
}

/// Build the key for a step field
pub fn step_key(step: u8, field: StepField) -> SettingKey {
    let mut key = String::new();
    // Longest key is "step8.duration_minutes", well under MAX_KEY_LEN
    let _ = write!(key, "step{}.{}", step, field.name());
    key
}

/// Format any displayable value as a setting value
pub fn format_value(value: impl core::fmt::Display) -> SettingValue {
    let mut text = String::new();
    if write!(text, "{}", value).is_err() {
        text.clear();
    }
    text
}

/// Format a float, switching to exponent form when the decimal form is too long
pub fn format_float(value: f32) -> SettingValue {
    let mut text = String::new();
    if write!(text, "{}", value).is_err() {
        text.clear();
        // An f32 in exponent form is at most 15 characters
        let _ = write!(text, "{:e}", value);
    }
    text
}

/// Parse a stored boolean ("true"/"false", "1"/"0")
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "true" | "1" | "on" => Some(true),
        "false" | "0" | "off" => Some(false),
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_key_format() {
        assert_eq!(step_key(3, StepField::TargetRpm).as_str(), "step3.target_rpm");
        assert_eq!(
            step_key(8, StepField::DurationMinutes).as_str(),
            "step8.duration_minutes"
        );
    }

    #[test]
    fn test_field_names_parse_back() {
        for field in StepField::ALL {
            assert_eq!(StepField::parse(field.name()), Some(field));
        }
        assert_eq!(StepField::parse("colour"), None);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(50.5f32).as_str(), "50.5");
        assert_eq!(format_value(true).as_str(), "true");
    }

    #[test]
    fn test_format_float_falls_back_to_exponent() {
        assert_eq!(format_float(65.5).as_str(), "65.5");
        assert_eq!(format_float(1e38).as_str(), "1e38");
        assert_eq!(format_float(-1e-35).as_str(), "-1e-35");
        assert_eq!(format_float(f32::MAX).as_str().parse::<f32>(), Ok(f32::MAX));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool(" true "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
