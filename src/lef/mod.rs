// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! LEF technology and library loading
//!
//! Only what the DEF importer resolves against is kept: database units,
//! layers, fixed vias, via-generate rule names, sites and macros with their
//! pin directions. Port and obstruction geometry is skipped.

pub mod lef_parser;
pub mod reader;

pub use lef_parser::parse_lef;
pub use reader::LefReader;
