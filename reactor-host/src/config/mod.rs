//! Configuration loading and persistence
//!
//! Host configuration comes from `reactor.toml` (or the embedded default);
//! the recipe lives in its own settings file that is rewritten on every edit.

pub mod loader;
pub mod settings_file;

pub use loader::{ConfigError, HostConfig, SerialConfig, SessionConfig, Unit};
pub use settings_file::{SettingsError, TomlSettings};
