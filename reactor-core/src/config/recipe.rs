//! Recipe store
//!
//! Holds the eight steps plus recipe-wide settings. Loaded once from the
//! settings backend at session start; every edit is written back at once.

use heapless::String;

use reactor_protocol::UnitId;

use super::settings::{
    format_float, format_value, parse_bool, step_key, SettingsStore, StepField, KEY_AUTO_MODE,
    KEY_PEER_CHANNEL, KEY_RECIPE_NAME,
};
use super::types::{
    clamp_hours, clamp_minutes, dosing_in_range, temperature_in_range, CompletionStatus, Step,
    TempChannel, TimingMode, LAST_STEP, MAX_RPM, MAX_STEPS, MIN_DURATION_MINUTES,
};
use crate::error::ValidationError;

/// Maximum recipe name length
pub const MAX_NAME_LEN: usize = 32;

/// A single field edit, as typed by the operator
///
/// Numeric fields carry raw text so parse fallbacks happen in one place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepEdit<'a> {
    Enabled(bool),
    TargetTemperature(&'a str),
    TargetChannel(TempChannel),
    TargetRpm(&'a str),
    DosingVolume(&'a str),
    DurationHours(&'a str),
    DurationMinutes(&'a str),
    TimingMode(TimingMode),
}

/// Outcome of an accepted edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCheck {
    /// Value stored and within range
    Accepted,
    /// Value stored but needs correcting before it is trusted
    Flagged(ValidationError),
}

/// Edit rejected outright
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditError<E> {
    /// Step number outside 1..=8
    InvalidStep(u8),
    /// Backend failed to persist the value
    Store(E),
}

/// Recipe: eight steps and recipe-wide settings
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    /// Free-form recipe label
    pub name: String<MAX_NAME_LEN>,
    /// Unit this session drives
    pub unit: UnitId,
    /// Channel the other unit on the link is set to
    ///
    /// Channel selection frames address both units at once, so the peer's
    /// choice has to be repeated.
    pub peer_channel: TempChannel,
    /// Advance automatically after each step
    pub auto_mode: bool,
    steps: [Step; MAX_STEPS],
}

impl Recipe {
    /// Create an empty recipe (all steps disabled)
    pub fn new(unit: UnitId) -> Self {
        Self {
            name: String::new(),
            unit,
            peer_channel: TempChannel::Tr,
            auto_mode: true,
            steps: [Step::default(); MAX_STEPS],
        }
    }

    /// Load a recipe from the settings backend
    ///
    /// Missing or unparsable keys fall back to defaults.
    pub fn load<S: SettingsStore>(unit: UnitId, store: &S) -> Self {
        let mut recipe = Self::new(unit);

        if let Some(name) = store.read(KEY_RECIPE_NAME) {
            let _ = recipe.name.push_str(&name);
        }
        if let Some(auto) = store.read(KEY_AUTO_MODE).and_then(|v| parse_bool(&v)) {
            recipe.auto_mode = auto;
        }
        if let Some(channel) = store.read(KEY_PEER_CHANNEL).and_then(|v| TempChannel::parse(&v)) {
            recipe.peer_channel = channel;
        }

        for (index, step) in recipe.steps.iter_mut().enumerate() {
            load_step(store, index as u8 + 1, step);
        }
        recipe
    }

    /// Write every field back to the backend (save-on-shutdown)
    pub fn save_all<S: SettingsStore>(&self, store: &mut S) -> Result<(), S::Error> {
        store.write(KEY_RECIPE_NAME, &self.name)?;
        store.write(KEY_AUTO_MODE, &format_value(self.auto_mode))?;
        store.write(KEY_PEER_CHANNEL, self.peer_channel.as_str())?;
        for number in 1..=LAST_STEP {
            for field in StepField::ALL {
                self.persist_field(store, number, field)?;
            }
        }
        Ok(())
    }

    /// Step by number (1..=8)
    pub fn step(&self, number: u8) -> Option<&Step> {
        let index = (number as usize).checked_sub(1)?;
        self.steps.get(index)
    }

    pub(crate) fn step_mut(&mut self, number: u8) -> Option<&mut Step> {
        let index = (number as usize).checked_sub(1)?;
        self.steps.get_mut(index)
    }

    /// Steps with their numbers
    pub fn steps(&self) -> impl Iterator<Item = (u8, &Step)> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| (index as u8 + 1, step))
    }

    /// True if at least one step is enabled
    pub fn any_enabled(&self) -> bool {
        self.steps.iter().any(|step| step.enabled)
    }

    /// Apply an operator edit and persist the resulting value
    ///
    /// Out-of-range temperature, RPM and dosing values are still stored and
    /// reported as [`FieldCheck::Flagged`].
    pub fn edit<S: SettingsStore>(
        &mut self,
        number: u8,
        edit: StepEdit<'_>,
        store: &mut S,
    ) -> Result<FieldCheck, EditError<S::Error>> {
        let step = self
            .step_mut(number)
            .ok_or(EditError::InvalidStep(number))?;

        let (field, check) = match edit {
            StepEdit::Enabled(enabled) => {
                step.enabled = enabled;
                (StepField::Enabled, FieldCheck::Accepted)
            }
            StepEdit::TargetChannel(channel) => {
                step.target_channel = channel;
                (StepField::TargetChannel, FieldCheck::Accepted)
            }
            StepEdit::TimingMode(mode) => {
                step.timing_mode = mode;
                (StepField::TimingMode, FieldCheck::Accepted)
            }
            StepEdit::DurationHours(text) => {
                // Unparsable input keeps the last stored value
                if let Some(hours) = parse_integer(text) {
                    step.duration_hours = clamp_hours(hours);
                }
                (StepField::DurationHours, FieldCheck::Accepted)
            }
            StepEdit::DurationMinutes(text) => {
                step.duration_minutes = parse_integer(text)
                    .map(clamp_minutes)
                    .unwrap_or(MIN_DURATION_MINUTES);
                (StepField::DurationMinutes, FieldCheck::Accepted)
            }
            StepEdit::TargetTemperature(text) => {
                let check = match parse_float(text) {
                    Some(celsius) => {
                        step.target_temperature = celsius;
                        range_check(temperature_in_range(celsius), ValidationError::Temperature)
                    }
                    None => FieldCheck::Flagged(ValidationError::Temperature),
                };
                (StepField::TargetTemperature, check)
            }
            StepEdit::TargetRpm(text) => {
                let check = match parse_integer(text) {
                    Some(rpm) => {
                        step.target_rpm = rpm.clamp(0, u16::MAX as i64) as u16;
                        range_check((0..=MAX_RPM as i64).contains(&rpm), ValidationError::Rpm)
                    }
                    None => FieldCheck::Flagged(ValidationError::Rpm),
                };
                (StepField::TargetRpm, check)
            }
            StepEdit::DosingVolume(text) => {
                let check = match parse_float(text) {
                    Some(volume) => {
                        step.dosing_volume = volume;
                        range_check(dosing_in_range(volume), ValidationError::DosingVolume)
                    }
                    None => FieldCheck::Flagged(ValidationError::DosingVolume),
                };
                (StepField::DosingVolume, check)
            }
        };

        self.persist_field(store, number, field)
            .map_err(EditError::Store)?;
        Ok(check)
    }

    /// Set a step's lamp and persist it
    pub(crate) fn set_status<S: SettingsStore>(
        &mut self,
        number: u8,
        status: CompletionStatus,
        store: &mut S,
    ) -> Result<(), S::Error> {
        if let Some(step) = self.step_mut(number) {
            step.status = status;
            self.persist_field(store, number, StepField::Status)?;
        }
        Ok(())
    }

    /// Change auto mode and persist it
    pub fn set_auto_mode<S: SettingsStore>(
        &mut self,
        enabled: bool,
        store: &mut S,
    ) -> Result<(), S::Error> {
        self.auto_mode = enabled;
        store.write(KEY_AUTO_MODE, &format_value(enabled))
    }

    /// Change the peer unit's channel and persist it
    pub fn set_peer_channel<S: SettingsStore>(
        &mut self,
        channel: TempChannel,
        store: &mut S,
    ) -> Result<(), S::Error> {
        self.peer_channel = channel;
        store.write(KEY_PEER_CHANNEL, channel.as_str())
    }

    fn persist_field<S: SettingsStore>(
        &self,
        store: &mut S,
        number: u8,
        field: StepField,
    ) -> Result<(), S::Error> {
        let Some(step) = self.step(number) else {
            return Ok(());
        };
        let key = step_key(number, field);
        let value = match field {
            StepField::Enabled => format_value(step.enabled),
            StepField::TargetTemperature => format_float(step.target_temperature),
            StepField::TargetChannel => format_value(step.target_channel.as_str()),
            StepField::TargetRpm => format_value(step.target_rpm),
            StepField::DosingVolume => format_float(step.dosing_volume),
            StepField::DurationHours => format_value(step.duration_hours),
            StepField::DurationMinutes => format_value(step.duration_minutes),
            StepField::TimingMode => format_value(step.timing_mode.as_str()),
            StepField::Status => format_value(step.status.as_str()),
        };
        store.write(&key, &value)
    }
}

fn load_step<S: SettingsStore>(store: &S, number: u8, step: &mut Step) {
    let read = |field| store.read(&step_key(number, field));

    if let Some(enabled) = read(StepField::Enabled).and_then(|v| parse_bool(&v)) {
        step.enabled = enabled;
    }
    if let Some(celsius) = read(StepField::TargetTemperature).and_then(|v| parse_float(&v)) {
        step.target_temperature = celsius;
    }
    if let Some(channel) = read(StepField::TargetChannel).and_then(|v| TempChannel::parse(&v)) {
        step.target_channel = channel;
    }
    if let Some(rpm) = read(StepField::TargetRpm).and_then(|v| parse_integer(&v)) {
        step.target_rpm = rpm.clamp(0, u16::MAX as i64) as u16;
    }
    if let Some(volume) = read(StepField::DosingVolume).and_then(|v| parse_float(&v)) {
        step.dosing_volume = volume;
    }
    if let Some(hours) = read(StepField::DurationHours).and_then(|v| parse_integer(&v)) {
        step.duration_hours = clamp_hours(hours);
    }
    if let Some(minutes) = read(StepField::DurationMinutes).and_then(|v| parse_integer(&v)) {
        step.duration_minutes = clamp_minutes(minutes);
    }
    if let Some(mode) = read(StepField::TimingMode).and_then(|v| TimingMode::parse(&v)) {
        step.timing_mode = mode;
    }
    if let Some(status) = read(StepField::Status).and_then(|v| CompletionStatus::parse(&v)) {
        step.status = status;
    }
}

fn parse_integer(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

fn parse_float(text: &str) -> Option<f32> {
    text.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

fn range_check(in_range: bool, error: ValidationError) -> FieldCheck {
    if in_range {
        FieldCheck::Accepted
    } else {
        FieldCheck::Flagged(error)
    }
}
