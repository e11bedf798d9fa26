// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! DEF import library
//!
//! Reads DEF design files into an in-memory design database, resolving
//! every construct against the technology and cell libraries loaded from
//! LEF. See [def::reader::DefReader] for the file-level entry points.

pub mod utils;
pub mod config;
pub mod db;
pub mod def;
pub mod error;
pub mod export;
pub mod lef;

// Re-export commonly used types
pub use config::ReaderOptions;
pub use db::{Block, Database, Library, Tech};
pub use def::reader::{DefReader, ImportSummary};
pub use error::{LefError, ReadError};
pub use lef::LefReader;
