//! # Library Configuration
//!
//! Options controlling how tables are materialised and indexed. Defaults are
//! strict: duplicate unique keys and unparseable typed cells are errors.
use crate::error::Result;
use std::env;
use thiserror::Error;

/// Environment variable selecting the [`DuplicateKeyPolicy`].
pub const DUPLICATE_KEYS_VAR: &str = "RUSTY_SMARTSHEET_DUPLICATE_KEYS";

/// Environment variable toggling [`Config::strict_cell_values`].
pub const STRICT_VAR: &str = "RUSTY_SMARTSHEET_STRICT";

/// Errors related to configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for '{name}'")]
    InvalidValue { name: String, value: String },
}

/// What a unique index does when two rows produce the same key.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DuplicateKeyPolicy {
    /// Fail the whole build with `DuplicateKey`.
    #[default]
    Reject,
    /// Keep the later row, logging the replaced one.
    Overwrite,
}

impl DuplicateKeyPolicy {
    /// Parses a policy name (case-insensitive).
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "REJECT" | "ERROR" | "FAIL" => Ok(Self::Reject),
            "OVERWRITE" | "LAST_WINS" | "LAST-WINS" => Ok(Self::Overwrite),
            _ => Err(ConfigError::InvalidValue {
                name: DUPLICATE_KEYS_VAR.to_owned(),
                value: name.to_owned(),
            })?,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Overwrite => "overwrite",
        }
    }
}

/// Options for building sheets, reports and their indexes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Duplicate key handling for unique indexes.
    pub duplicate_keys: DuplicateKeyPolicy,
    /// Fail on typed cells (dates, datetimes) whose value cannot be parsed.
    /// When disabled the raw text is kept.
    pub strict_cell_values: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            duplicate_keys: DuplicateKeyPolicy::default(),
            strict_cell_values: true,
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment, falling back to
    /// defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(value) = lookup(DUPLICATE_KEYS_VAR) {
            config.duplicate_keys = DuplicateKeyPolicy::parse(&value)?;
        }
        if let Some(value) = lookup(STRICT_VAR) {
            config.strict_cell_values = parse_flag(STRICT_VAR, &value)?;
        }
        Ok(config)
    }

    pub fn with_duplicate_keys(mut self, policy: DuplicateKeyPolicy) -> Self {
        self.duplicate_keys = policy;
        self
    }

    pub fn with_strict_cell_values(mut self, strict: bool) -> Self {
        self.strict_cell_values = strict;
        self
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "y" | "1" => Ok(true),
        "no" | "false" | "n" | "0" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_owned(),
            value: value.to_owned(),
        })?,
    }
}
