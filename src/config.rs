// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Reader options, loadable from TOML

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Name for the created block instead of the DEF design name
    pub block_name: Option<String>,
    pub skip_wires: bool,
    pub skip_connections: bool,
    pub skip_special_wires: bool,
    pub skip_shields: bool,
    pub skip_block_wires: bool,
    pub skip_fill_wires: bool,
    /// Keep dispatching after a rejected construct to collect more
    /// diagnostics. The import still fails.
    pub continue_on_error: bool,
}

impl ReaderOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
