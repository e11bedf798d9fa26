// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Error types shared across the importer

use thiserror::Error;

/// Failures of the header prescan
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("Cannot read VERSION statement at line {0}")]
    Version(usize),
    #[error("Cannot read DESIGN statement at line {0}")]
    Design(usize),
    #[error("Cannot read DIVIDERCHAR statement at line {0}")]
    DividerChar(usize),
    #[error("Syntax error in BUSBITCHARS statement at line {0}")]
    BusBitChars(usize),
    #[error("DESIGN statement is missing")]
    MissingDesign,
}

/// Structural failure reported by an event source
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("Lines {first}-{last}: {msg}")]
    Syntax {
        first: usize,
        last: usize,
        msg: String,
    },
    #[error("Unexpected end of input: {0}")]
    UnexpectedEof(String),
}

impl SourceError {
    pub fn syntax(lines: (usize, usize), msg: impl Into<String>) -> Self {
        Self::Syntax {
            first: lines.0,
            last: lines.1,
            msg: msg.into(),
        }
    }
}

/// A builder was driven out of its begin/set/end protocol.
///
/// These are programming errors in the dispatching code, never user input
/// problems, and abort the whole import.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("{builder}: `{call}` called with no open entity")]
    NotOpen {
        builder: &'static str,
        call: &'static str,
    },
    #[error("{builder}: `begin` called while an entity is already open")]
    AlreadyOpen { builder: &'static str },
    #[error("{builder}: `{field}` may only be set once per entity")]
    FieldAlreadySet {
        builder: &'static str,
        field: &'static str,
    },
    #[error("{builder}: `{call}` requires a preceding `{requires}`")]
    OutOfOrder {
        builder: &'static str,
        call: &'static str,
        requires: &'static str,
    },
}

/// File-level import failure
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Cannot open DEF file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Header information missing from DEF file: {0}")]
    Header(#[from] HeaderError),
    #[error("Chip already exists")]
    ChipExists,
    #[error("DEF parser returns an error: {0}")]
    Source(#[from] SourceError),
    #[error("Internal builder protocol violation: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("Failed to read DEF file: {errors} error(s)")]
    Failed { errors: u32 },
}

/// Failures loading LEF technology/library data
#[derive(Debug, Error)]
pub enum LefError {
    #[error("Cannot open LEF file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("LEF syntax error at line {line}: {msg}")]
    Syntax { line: usize, msg: String },
}

/// Failures loading reader options
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read options file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid options: {0}")]
    Toml(#[from] toml::de::Error),
}
