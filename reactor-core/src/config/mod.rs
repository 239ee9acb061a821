//! Recipe configuration
//!
//! Step table, recipe-wide settings and the key/value persistence contract
//! they are loaded from and saved to.

pub mod recipe;
pub mod settings;
pub mod types;

pub use recipe::{EditError, FieldCheck, Recipe, StepEdit, MAX_NAME_LEN};
pub use settings::{SettingKey, SettingValue, SettingsStore, StepField};
pub use types::*;
