//! Configuration types for relmap.toml

use serde::{Deserialize, Serialize};
use std::path::Path;

use relmap_types::Dialect;

use crate::naming::SnakeCaseNaming;

/// Naming convention configuration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NamingConfig {
    /// Prefix prepended to root table aliases
    #[serde(default = "default_alias_prefix")]
    pub alias_prefix: String,
    /// Suffix appended to a relation column to form its foreign key
    #[serde(default = "default_foreign_key_suffix")]
    pub foreign_key_suffix: String,
    /// Separator between the two table names of a junction table
    #[serde(default = "default_pivot_separator")]
    pub pivot_separator: String,
    /// Suffix for junction table aliases
    #[serde(default = "default_pivot_alias_suffix")]
    pub pivot_alias_suffix: String,
}

fn default_alias_prefix() -> String {
    "_".to_string()
}

fn default_foreign_key_suffix() -> String {
    "_id".to_string()
}

fn default_pivot_separator() -> String {
    "_".to_string()
}

fn default_pivot_alias_suffix() -> String {
    "pivot".to_string()
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            alias_prefix: default_alias_prefix(),
            foreign_key_suffix: default_foreign_key_suffix(),
            pivot_separator: default_pivot_separator(),
            pivot_alias_suffix: default_pivot_alias_suffix(),
        }
    }
}

impl From<&NamingConfig> for SnakeCaseNaming {
    fn from(config: &NamingConfig) -> Self {
        SnakeCaseNaming {
            alias_prefix: config.alias_prefix.clone(),
            foreign_key_suffix: config.foreign_key_suffix.clone(),
            pivot_separator: config.pivot_separator.clone(),
            pivot_alias_suffix: config.pivot_alias_suffix.clone(),
        }
    }
}

/// Main configuration struct for relmap.toml
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RelmapConfig {
    /// SQL dialect (mysql, sqlite, postgresql)
    #[serde(default)]
    pub dialect: Dialect,
    /// Naming conventions
    #[serde(default)]
    pub naming: NamingConfig,
}

impl RelmapConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::parse(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Naming strategy described by this configuration
    #[must_use]
    pub fn naming_strategy(&self) -> SnakeCaseNaming {
        SnakeCaseNaming::from(&self.naming)
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(String),
    #[error("failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RelmapConfig::parse("").unwrap();
        assert_eq!(config, RelmapConfig::default());
        assert_eq!(config.dialect, Dialect::MySQL);
        assert_eq!(config.naming_strategy(), SnakeCaseNaming::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config = RelmapConfig::parse(
            r#"
dialect = "postgresql"

[naming]
alias_prefix = "t_"
foreign_key_suffix = "_ref"
"#,
        )
        .unwrap();
        assert_eq!(config.dialect, Dialect::PostgreSQL);
        assert_eq!(config.naming.alias_prefix, "t_");
        assert_eq!(config.naming.foreign_key_suffix, "_ref");
        assert_eq!(config.naming.pivot_separator, "_");
    }

    #[test]
    fn test_parse_rejects_unknown_dialect() {
        let err = RelmapConfig::parse("dialect = \"oracle\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = RelmapConfig::from_file(Path::new("/definitely/not/here/relmap.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
