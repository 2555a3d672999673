//! Blur configuration with TOML file support.
//!
//! All structs use `#[serde(default)]` so partial TOML files (e.g. only
//! overriding `[blur] iterations`) work.

mod blur;

use std::path::Path;

pub use blur::{Addressing, BlurOptions, Filter, SamplerOptions};
use serde::{Deserialize, Serialize};

use crate::error::BlurError;

/// Top-level options container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Options {
    /// Blur stage parameters.
    pub blur: BlurOptions,
}

impl Options {
    /// Parse options from TOML text. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BlurError::OptionsParse`] on malformed TOML or an invalid
    /// value (e.g. an unparseable color).
    pub fn from_toml_str(content: &str) -> Result<Self, BlurError> {
        toml::from_str(content)
            .map_err(|e| BlurError::OptionsParse(e.to_string()))
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BlurError::Io`] if the file cannot be read, or
    /// [`BlurError::OptionsParse`] if it is not valid options TOML.
    pub fn load(path: &Path) -> Result<Self, BlurError> {
        let content = std::fs::read_to_string(path).map_err(BlurError::Io)?;
        let options = Self::from_toml_str(&content)?;
        log::info!("loaded blur options from {}", path.display());
        Ok(options)
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`BlurError::OptionsParse`] if serialization fails, or
    /// [`BlurError::Io`] if the file or its directory cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), BlurError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| BlurError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(BlurError::Io)?;
        }
        std::fs::write(path, content).map_err(BlurError::Io)?;
        log::info!("saved blur options to {}", path.display());
        Ok(())
    }
}
