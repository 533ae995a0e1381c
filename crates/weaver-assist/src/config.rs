//! Assistant configuration
//!
//! Read from TOML, either as top-level keys or under an `[assistant]` table:
//!
//! ```toml
//! [assistant]
//! prefix = "_woven_"
//! ```

use crate::error::{AssistError, AssistResult};
use crate::naming::{is_identifier, DEFAULT_PREFIX};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Prefix for every generated member and local name
    pub prefix: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl AssistantConfig {
    /// Parse a configuration from TOML source
    pub fn from_toml_str(source: &str) -> AssistResult<Self> {
        let mut table: toml::Table = toml::from_str(source)?;
        let config: AssistantConfig = match table.remove("assistant") {
            Some(section) => section.try_into()?,
            None => toml::Value::Table(table).try_into()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// The prefix must itself be an identifier so every generated name is one
    pub fn validate(&self) -> AssistResult<()> {
        if is_identifier(&self.prefix) {
            Ok(())
        } else {
            Err(AssistError::InvalidPrefix {
                prefix: self.prefix.clone(),
            })
        }
    }
}
