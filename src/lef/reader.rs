// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use std::fs;
use std::path::Path;

use log::info;

use crate::db::{Database, Library, Tech};
use crate::error::LefError;

pub struct LefReader;

impl LefReader {
    pub fn new() -> Self {
        Self
    }

    /// Reads a LEF file; the library is named after the file stem
    pub fn read<P: AsRef<Path>>(&self, path: P) -> Result<(Tech, Library), LefError> {
        let path = path.as_ref();
        info!("Reading LEF file: {}", path.display());
        let content = fs::read_to_string(path).map_err(|source| LefError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let lib_name = path
            .file_stem()
            .map_or_else(|| "lib".to_string(), |s| s.to_string_lossy().into_owned());
        let (tech, lib) = super::parse_lef(&content, &lib_name)?;
        info!(
            "Loaded {} layers, {} vias, {} sites, {} macros",
            tech.layers.len(),
            tech.vias.len(),
            lib.sites.len(),
            lib.masters.len()
        );
        Ok((tech, lib))
    }

    /// Loads a LEF file into a fresh database
    pub fn read_database<P: AsRef<Path>>(&self, path: P) -> Result<Database, LefError> {
        let (tech, lib) = self.read(path)?;
        Ok(Database {
            tech,
            libs: vec![lib],
            chip: None,
        })
    }
}

impl Default for LefReader {
    fn default() -> Self {
        Self::new()
    }
}
