//! Session configuration.
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! default_max_speed = 20
//! linear_move_ms = 1000
//! strip_manufacturer = true
//! ```

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Step count assumed when a device reports none.
    pub default_max_speed: i32,
    /// Transition window for linear moves.
    pub linear_move_ms: u32,
    /// Drop the leading manufacturer token from local device names.
    pub strip_manufacturer: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_max_speed: 20,
            linear_move_ms: 1000,
            strip_manufacturer: true,
        }
    }
}

impl SessionConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Display name for a raw transport name.
    ///
    /// Multi-word names keep only their second word ("Lovense Hush" → "Hush").
    pub fn display_name(&self, raw: &str) -> String {
        if !self.strip_manufacturer {
            return raw.to_string();
        }
        let parts: Vec<&str> = raw.split(' ').collect();
        if parts.len() > 1 {
            parts[1].to_string()
        } else {
            raw.to_string()
        }
    }
}
