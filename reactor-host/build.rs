//! Build script for reactor-host
//!
//! Validates the embedded default reactor.toml at compile time.

use std::fs;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    validate_config();
}

/// Validate reactor.toml, which is compiled in as the fallback config
fn validate_config() {
    println!("cargo:rerun-if-changed=reactor.toml");

    let config_path = Path::new("reactor.toml");
    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => panic!("reactor.toml is required next to Cargo.toml: {}", e),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => panic!("Invalid TOML syntax in reactor.toml:\n{}", e),
    };

    for section in ["serial", "session"] {
        if config.get(section).and_then(|v| v.as_table()).is_none() {
            panic!("reactor.toml is missing the [{}] section", section);
        }
    }

    if let Some(unit) = config
        .get("session")
        .and_then(|s| s.get("unit"))
        .and_then(|u| u.as_str())
    {
        if unit != "A" && unit != "B" {
            panic!("reactor.toml: session.unit must be \"A\" or \"B\", got {:?}", unit);
        }
    }
}
