// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! File-level DEF import
//!
//! [DefReader] prescans the header, creates the target block, drives an
//! [EventSource] through the builders and decides whether the file as a
//! whole succeeded. In full-build mode a failed import leaves no block
//! behind. Wire replacement cannot undo nets it already rewired, so a
//! failure there only reports.

use std::fs;
use std::path::Path;

use log::{debug, error, info, warn};

use super::builder::{Notice, Session, Severity};
use super::callbacks::{Callbacks, Outcome};
use super::header::DefHeader;
use super::parser::DefEventParser;
use super::EventSource;
use crate::config::ReaderOptions;
use crate::db::{Block, Chip, Database, Library, Tech};
use crate::error::ReadError;

/// Per-category counts of one successful import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub pins: u32,
    pub components: u32,
    pub component_terms: u32,
    pub special_nets: u32,
    pub special_net_connections: u32,
    pub nets: u32,
    pub net_connections: u32,
    pub vias: u32,
    pub rows: u32,
}

impl ImportSummary {
    fn log(&self, replace_wires: bool) {
        if replace_wires {
            info!("Processed {} special nets.", self.special_nets);
            info!("Processed {} nets.", self.nets);
            return;
        }
        info!("Created {} pins.", self.pins);
        info!(
            "Created {} components and {} component-terminals.",
            self.components, self.component_terms
        );
        info!(
            "Created {} special nets and {} connections.",
            self.special_nets, self.special_net_connections
        );
        info!(
            "Created {} nets and {} connections.",
            self.nets, self.net_connections
        );
    }
}

fn read_file<P: AsRef<Path>>(path: P) -> Result<String, ReadError> {
    let path = path.as_ref();
    info!("Reading DEF file: {}", path.display());
    fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// First `name_N` not taken among the children of `parent`
fn unique_child_name(parent: &Block, name: &str) -> String {
    (1..)
        .map(|n| format!("{name}_{n}"))
        .find(|candidate| parent.find_child(candidate).is_none())
        .unwrap_or_else(|| name.to_string())
}

pub struct DefReader {
    options: ReaderOptions,
    callbacks: Callbacks,
    notices: Vec<Notice>,
    errors: u32,
}

impl DefReader {
    pub fn new(options: ReaderOptions) -> Self {
        Self {
            options,
            callbacks: Callbacks::default(),
            notices: Vec::new(),
            errors: 0,
        }
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Diagnostics of the last import, in emission order
    pub fn diagnostics(&self) -> &[Notice] {
        &self.notices
    }

    /// Aggregated error count of the last import
    pub fn errors(&self) -> u32 {
        self.errors
    }

    fn fail(&mut self, err: ReadError) -> ReadError {
        error!("{err}");
        self.notices.push(Notice {
            severity: Severity::Error,
            message: err.to_string(),
        });
        err
    }

    fn scan_header(&mut self, text: &str) -> Result<DefHeader, ReadError> {
        DefHeader::scan(text).map_err(|e| self.fail(e.into()))
    }

    fn new_block(&self, header: &DefHeader, name: String) -> Block {
        let mut block = Block::new(name, header.hier_delimiter_or_default());
        block.bus_delimiters = header.bus_delimiters_or_default();
        block
    }

    pub fn create_chip<P: AsRef<Path>>(
        &mut self,
        db: &mut Database,
        path: P,
    ) -> Result<ImportSummary, ReadError> {
        let text = read_file(path).map_err(|e| self.fail(e))?;
        self.create_chip_from_str(db, &text)
    }

    /// Create the chip and its top block from DEF text
    pub fn create_chip_from_str(
        &mut self,
        db: &mut Database,
        text: &str,
    ) -> Result<ImportSummary, ReadError> {
        self.notices.clear();
        self.errors = 0;
        if db.chip.is_some() {
            return Err(self.fail(ReadError::ChipExists));
        }
        let header = self.scan_header(text)?;
        let name = self
            .options
            .block_name
            .clone()
            .unwrap_or_else(|| header.design.clone());
        let Database { tech, libs, chip } = db;
        let block = &mut chip.insert(Chip {
            block: self.new_block(&header, name),
        })
        .block;

        let result = self.read_events(tech, libs, block, &mut DefEventParser::new(text), false);
        if result.is_err() {
            *chip = None;
        }
        result
    }

    pub fn create_block<P: AsRef<Path>>(
        &mut self,
        tech: &Tech,
        libs: &[Library],
        parent: &mut Block,
        path: P,
    ) -> Result<ImportSummary, ReadError> {
        let text = read_file(path).map_err(|e| self.fail(e))?;
        self.create_block_from_str(tech, libs, parent, &text)
    }

    /// Create a child block of `parent` from DEF text. A name already used
    /// by a sibling gets a numeric suffix.
    pub fn create_block_from_str(
        &mut self,
        tech: &Tech,
        libs: &[Library],
        parent: &mut Block,
        text: &str,
    ) -> Result<ImportSummary, ReadError> {
        self.notices.clear();
        self.errors = 0;
        let header = self.scan_header(text)?;
        let name = self
            .options
            .block_name
            .clone()
            .unwrap_or_else(|| header.design.clone());

        let mut child = self.new_block(&header, name);
        let summary = self.read_events(tech, libs, &mut child, &mut DefEventParser::new(text), false)?;
        while let Err(mut taken) = parent.children.insert(child) {
            let renamed = unique_child_name(parent, &taken.name);
            let msg = format!(
                "Block with name \"{}\" already exists, renaming too \"{renamed}\"",
                taken.name
            );
            warn!("{msg}");
            self.notices.push(Notice {
                severity: Severity::Warning,
                message: msg,
            });
            taken.name = renamed;
            child = taken;
        }
        Ok(summary)
    }

    pub fn replace_wires<P: AsRef<Path>>(
        &mut self,
        tech: &Tech,
        libs: &[Library],
        block: &mut Block,
        path: P,
    ) -> Result<ImportSummary, ReadError> {
        let text = read_file(path).map_err(|e| self.fail(e))?;
        self.replace_wires_from_str(tech, libs, block, &text)
    }

    /// Re-read only the routing of existing nets and special nets
    pub fn replace_wires_from_str(
        &mut self,
        tech: &Tech,
        libs: &[Library],
        block: &mut Block,
        text: &str,
    ) -> Result<ImportSummary, ReadError> {
        self.notices.clear();
        self.errors = 0;
        self.read_events(tech, libs, block, &mut DefEventParser::new(text), true)
    }

    /// Drive `source` through the builders into `block`
    pub fn read_events<E: EventSource + ?Sized>(
        &mut self,
        tech: &Tech,
        libs: &[Library],
        block: &mut Block,
        source: &mut E,
        replace_wires: bool,
    ) -> Result<ImportSummary, ReadError> {
        self.callbacks
            .init(tech.dbu_per_micron, &self.options, replace_wires);
        let mut s = Session::new(tech, libs, block);
        let mut failure = None;

        while let Some(item) = source.next_event() {
            let event = match item {
                Ok(event) => event,
                Err(e) => {
                    failure = Some(ReadError::Source(e));
                    break;
                }
            };
            debug!("dispatch {}", event.kind());
            let before = self.callbacks.errors();
            let outcome = match self.callbacks.dispatch(&mut s, &event) {
                Ok(outcome) => outcome,
                Err(e) => {
                    failure = Some(ReadError::Protocol(e));
                    break;
                }
            };
            let rejected = outcome == Outcome::Rejected || self.callbacks.errors() > before;
            if rejected && !self.options.continue_on_error {
                debug!("stopping after rejected {}", event.kind());
                break;
            }
        }

        self.notices.append(&mut s.notices);
        self.errors = self.callbacks.errors();
        if let Some(err) = failure {
            return Err(self.fail(err));
        }
        if self.errors > 0 {
            let errors = self.errors;
            return Err(self.fail(ReadError::Failed { errors }));
        }

        let cb = &self.callbacks;
        let summary = ImportSummary {
            pins: cb.pins.bterm_cnt,
            components: cb.components.inst_cnt,
            component_terms: cb.components.iterm_cnt,
            special_nets: cb.snets.snet_cnt,
            special_net_connections: cb.snets.snet_iterm_cnt,
            nets: cb.nets.net_cnt,
            net_connections: cb.nets.net_iterm_cnt,
            vias: cb.vias.via_cnt,
            rows: cb.rows.row_cnt,
        };
        summary.log(replace_wires);
        Ok(summary)
    }
}

impl Default for DefReader {
    fn default() -> Self {
        Self::new(ReaderOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::builder::testutil;
    use crate::def::{DefComponent, DefEvent, DefNet};

    #[test]
    fn test_unique_child_name() {
        let mut parent = Block::new("top", '/');
        let _ = parent.children.insert(Block::new("a", '/'));
        let _ = parent.children.insert(Block::new("a_1", '/'));
        assert_eq!(unique_child_name(&parent, "a"), "a_2");
    }

    #[test]
    fn test_read_events_counts() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let events = vec![
            DefEvent::Units(1000.0),
            DefEvent::Component(DefComponent {
                id: "u1".into(),
                master: "INV".into(),
                ..Default::default()
            }),
            DefEvent::Net(DefNet {
                name: "n1".into(),
                ..Default::default()
            }),
        ];
        let mut reader = DefReader::default();
        let summary = reader
            .read_events(&tech, &libs, &mut block, &mut events.into_iter(), false)
            .unwrap();
        assert_eq!(summary.components, 1);
        assert_eq!(summary.component_terms, 4);
        assert_eq!(summary.nets, 1);
    }

    #[test]
    fn test_rejection_stops_dispatch() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let events = vec![
            DefEvent::History("x".into()),
            DefEvent::Net(DefNet {
                name: "n1".into(),
                ..Default::default()
            }),
        ];
        let mut reader = DefReader::default();
        let err = reader
            .read_events(&tech, &libs, &mut block, &mut events.into_iter(), false)
            .unwrap_err();
        assert!(matches!(err, ReadError::Failed { errors: 1 }));
        assert!(block.nets.is_empty());
    }

    #[test]
    fn test_continue_on_error_collects_more() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let events = vec![
            DefEvent::History("x".into()),
            DefEvent::Technology("t".into()),
        ];
        let mut reader = DefReader::new(ReaderOptions {
            continue_on_error: true,
            ..Default::default()
        });
        let err = reader
            .read_events(&tech, &libs, &mut block, &mut events.into_iter(), false)
            .unwrap_err();
        assert!(matches!(err, ReadError::Failed { errors: 2 }));
        assert_eq!(reader.errors(), 2);
        assert!(reader
            .diagnostics()
            .iter()
            .any(|n| n.message == "TECHNOLOGY is unsupported"));
    }
}
