//! Recipe settings file
//!
//! One TOML table per key prefix:
//!
//! ```toml
//! [recipe]
//! auto_mode = "true"
//!
//! [step1]
//! enabled = "true"
//! target_temperature = "50"
//! ```
//!
//! Every write rewrites the file through a temporary file and a rename, so a
//! crash leaves either the old or the new document.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use reactor_core::config::{SettingValue, SettingsStore};
use thiserror::Error;
use tracing::{debug, info};

type Document = BTreeMap<String, BTreeMap<String, String>>;

/// Settings file errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("settings file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to encode settings: {0}")]
    Encode(#[from] toml::ser::Error),
    /// Key without a `<section>.` prefix
    #[error("malformed settings key {0:?}")]
    InvalidKey(String),
}

/// TOML-backed [`SettingsStore`]
#[derive(Debug)]
pub struct TomlSettings {
    path: PathBuf,
    document: Document,
}

impl TomlSettings {
    /// Open a settings file; a missing file is an empty document
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let document = match fs::read_to_string(&path) {
            Ok(text) => parse_document(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No settings file, starting from defaults");
                Document::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole document to disk
    pub fn flush(&self) -> Result<(), SettingsError> {
        let text = toml::to_string(&self.document)?;
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "Settings written");
        Ok(())
    }

    /// Put back the value a failed write replaced
    fn restore(&mut self, section: &str, field: &str, previous: Option<String>) {
        let Some(fields) = self.document.get_mut(section) else {
            return;
        };
        match previous {
            Some(value) => {
                fields.insert(field.to_string(), value);
            }
            None => {
                fields.remove(field);
                if fields.is_empty() {
                    self.document.remove(section);
                }
            }
        }
    }
}

impl SettingsStore for TomlSettings {
    type Error = SettingsError;

    fn read(&self, key: &str) -> Option<SettingValue> {
        let (section, field) = key.split_once('.')?;
        let value = self.document.get(section)?.get(field)?;
        SettingValue::try_from(value.as_str()).ok()
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let (section, field) = key
            .split_once('.')
            .ok_or_else(|| SettingsError::InvalidKey(key.to_string()))?;
        let previous = self
            .document
            .entry(section.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        if previous.as_deref() == Some(value) {
            return Ok(());
        }
        if let Err(e) = self.flush() {
            // Memory must not run ahead of the file
            self.restore(section, field, previous);
            return Err(e);
        }
        Ok(())
    }
}

/// Parse a settings document, accepting unquoted scalars
fn parse_document(text: &str) -> Result<Document, SettingsError> {
    let raw: BTreeMap<String, toml::Table> = toml::from_str(text)?;
    let document = raw
        .into_iter()
        .map(|(section, table)| {
            let fields = table
                .into_iter()
                .map(|(field, value)| {
                    let text = match value {
                        toml::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (field, text)
                })
                .collect();
            (section, fields)
        })
        .collect();
    Ok(document)
}
