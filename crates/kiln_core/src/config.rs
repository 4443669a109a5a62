//! # Core Configuration
//!
//! Loaded from TOML; every field has a default so partial files work.
//!
//! ```toml
//! strict_check = true
//! process_tag = 3
//! time_zone_hours = 8
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::id::{DEFAULT_PROCESS, MASK_14BIT};

/// Settings for the pool, identifier generator and frame clock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Reject double releases in the pool.
    pub strict_check: bool,
    /// Process tag stamped into long-lived identifiers (14 bits).
    pub process_tag: u16,
    /// Time zone offset in hours used by the frame clock helpers.
    pub time_zone_hours: i32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            strict_check: cfg!(debug_assertions),
            process_tag: DEFAULT_PROCESS,
            time_zone_hours: 0,
        }
    }
}

impl CoreConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when the text is not valid TOML for this shape or a
    /// value is out of range.
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when the process tag does not fit 14 bits or the time
    /// zone is outside -12..=14.
    pub fn validate(&self) -> CoreResult<()> {
        if u64::from(self.process_tag) > MASK_14BIT {
            return Err(CoreError::InvalidConfig(format!(
                "process_tag {} does not fit in 14 bits",
                self.process_tag
            )));
        }
        if !(-12..=14).contains(&self.time_zone_hours) {
            return Err(CoreError::InvalidConfig(format!(
                "time_zone_hours {} is out of range",
                self.time_zone_hours
            )));
        }
        Ok(())
    }
}
