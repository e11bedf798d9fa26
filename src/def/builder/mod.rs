// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Per-construct builders
//!
//! Each builder owns exactly one entity under construction. `begin` opens a
//! draft, setters refine it, `end` commits it into the block. A draft that
//! hit a user error is discarded: later setters on it are accepted and
//! ignored, and `end` closes it without committing anything.
//!
//! Calling a setter with nothing open, or `begin` while a draft is open, is a
//! [ProtocolError].

pub mod blockage;
pub mod component;
pub mod fill;
pub mod gcell;
pub mod net;
pub mod non_default_rule;
pub mod pin;
pub mod pin_props;
pub mod prop_defs;
pub mod region;
pub mod row;
pub mod snet;
pub mod tracks;
pub mod via;

use std::fmt;

use log::{error, warn};

use super::translate::UnitScale;
use super::{DefPoint, DefRect};
use crate::db::{Block, Int, Library, Point, Rect, Tech};
use crate::error::ProtocolError;

pub use blockage::BlockageBuilder;
pub use component::ComponentBuilder;
pub use fill::FillBuilder;
pub use gcell::GCellBuilder;
pub use net::NetBuilder;
pub use non_default_rule::NonDefaultRuleBuilder;
pub use pin::PinBuilder;
pub use pin_props::PinPropsBuilder;
pub use prop_defs::PropDefsBuilder;
pub use region::RegionBuilder;
pub use row::RowBuilder;
pub use snet::SNetBuilder;
pub use tracks::TracksBuilder;
pub use via::ViaBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Diagnostic retained for the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "error: {}", self.message),
            Severity::Warning => write!(f, "warning: {}", self.message),
        }
    }
}

/// Context handed to every builder call
pub struct Session<'a> {
    pub tech: &'a Tech,
    pub libs: &'a [Library],
    pub block: &'a mut Block,
    pub notices: Vec<Notice>,
}

impl<'a> Session<'a> {
    pub fn new(tech: &'a Tech, libs: &'a [Library], block: &'a mut Block) -> Self {
        Self {
            tech,
            libs,
            block,
            notices: Vec::new(),
        }
    }

    /// Record an error diagnostic; counting is up to the caller
    pub fn error(&mut self, msg: impl Into<String>) {
        let message = msg.into();
        error!("{message}");
        self.notices.push(Notice {
            severity: Severity::Error,
            message,
        });
    }

    pub fn warning(&mut self, msg: impl Into<String>) {
        let message = msg.into();
        warn!("{message}");
        self.notices.push(Notice {
            severity: Severity::Warning,
            message,
        });
    }
}

/// State shared by all builders: error counter and unit scale
#[derive(Debug, Clone, Default)]
pub struct BuilderBase {
    pub errors: u32,
    pub scale: UnitScale,
}

impl BuilderBase {
    pub fn init(&mut self, dbu_per_micron: u32) {
        self.errors = 0;
        self.scale = UnitScale::new(dbu_per_micron, 100.0);
    }

    pub fn set_units(&mut self, dbu_per_micron: u32, def_units: f64) {
        self.scale = UnitScale::new(dbu_per_micron, def_units);
    }

    pub fn dbdist(&self, value: i32) -> Int {
        self.scale.dbdist(value)
    }

    pub fn point(&self, p: DefPoint) -> Point {
        self.scale.point(p)
    }

    pub fn rect(&self, r: &DefRect) -> Rect {
        self.scale.rect(r)
    }

    pub fn error(&mut self, session: &mut Session<'_>, msg: impl Into<String>) {
        self.errors += 1;
        session.error(msg);
    }
}

/// Common surface of every builder, used by the reader for reset, unit
/// broadcast and error aggregation
pub trait Builder {
    fn base(&self) -> &BuilderBase;
    fn base_mut(&mut self) -> &mut BuilderBase;

    /// Drop all open drafts and per-file counters
    fn reset(&mut self);

    fn init(&mut self, dbu_per_micron: u32) {
        self.base_mut().init(dbu_per_micron);
        self.reset();
    }

    fn set_units(&mut self, dbu_per_micron: u32, def_units: f64) {
        self.base_mut().set_units(dbu_per_micron, def_units);
    }

    fn errors(&self) -> u32 {
        self.base().errors
    }
}

macro_rules! impl_builder {
    ($t:ty) => {
        impl $crate::def::builder::Builder for $t {
            fn base(&self) -> &$crate::def::builder::BuilderBase {
                &self.base
            }
            fn base_mut(&mut self) -> &mut $crate::def::builder::BuilderBase {
                &mut self.base
            }
            fn reset(&mut self) {
                self.reset_state();
            }
        }
    };
}
pub(crate) use impl_builder;

#[derive(Debug, Clone, PartialEq)]
enum SlotState<T> {
    Closed,
    Open(T),
    Discarded,
}

/// The single entity under construction in a builder
#[derive(Debug, Clone, PartialEq)]
pub struct Slot<T> {
    owner: &'static str,
    state: SlotState<T>,
}

impl<T> Slot<T> {
    pub fn new(owner: &'static str) -> Self {
        Self {
            owner,
            state: SlotState::Closed,
        }
    }

    pub fn begin(&mut self, draft: T) -> Result<(), ProtocolError> {
        self.ensure_closed()?;
        self.state = SlotState::Open(draft);
        Ok(())
    }

    /// Open a slot already known to be rejected
    pub fn begin_discarded(&mut self) -> Result<(), ProtocolError> {
        self.ensure_closed()?;
        self.state = SlotState::Discarded;
        Ok(())
    }

    /// Mark the open draft rejected
    pub fn discard(&mut self) {
        if !matches!(self.state, SlotState::Closed) {
            self.state = SlotState::Discarded;
        }
    }

    /// Close without committing regardless of state
    pub fn abandon(&mut self) {
        self.state = SlotState::Closed;
    }

    /// Draft to modify; `None` if discarded
    pub fn draft(&mut self, call: &'static str) -> Result<Option<&mut T>, ProtocolError> {
        match &mut self.state {
            SlotState::Closed => Err(ProtocolError::NotOpen {
                builder: self.owner,
                call,
            }),
            SlotState::Discarded => Ok(None),
            SlotState::Open(d) => Ok(Some(d)),
        }
    }

    /// Close the slot, yielding the draft unless it was discarded
    pub fn finish(&mut self) -> Result<Option<T>, ProtocolError> {
        match std::mem::replace(&mut self.state, SlotState::Closed) {
            SlotState::Closed => Err(ProtocolError::NotOpen {
                builder: self.owner,
                call: "end",
            }),
            SlotState::Discarded => Ok(None),
            SlotState::Open(d) => Ok(Some(d)),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, SlotState::Closed)
    }

    pub fn is_open(&self) -> bool {
        !self.is_closed()
    }

    pub fn is_discarded(&self) -> bool {
        matches!(self.state, SlotState::Discarded)
    }

    pub fn owner(&self) -> &'static str {
        self.owner
    }

    fn ensure_closed(&self) -> Result<(), ProtocolError> {
        if self.is_closed() {
            Ok(())
        } else {
            Err(ProtocolError::AlreadyOpen {
                builder: self.owner,
            })
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    //! Small technology and library used by builder tests

    use crate::db::{Block, Layer, LayerKind, Library, MTerm, Master, Site, Tech, TechVia};

    pub fn tech() -> Tech {
        let mut tech = Tech {
            name: "test".into(),
            dbu_per_micron: 1000,
            ..Default::default()
        };
        for (name, kind, width) in [
            ("M1", LayerKind::Routing, 140),
            ("V1", LayerKind::Cut, 0),
            ("M2", LayerKind::Routing, 200),
        ] {
            let _ = tech.layers.insert(Layer {
                name: name.into(),
                kind,
                width,
                direction: None,
            });
        }
        let _ = tech.vias.insert(TechVia {
            name: "VIA12".into(),
            layers: vec!["M1".into(), "V1".into(), "M2".into()],
        });
        tech.via_rules.push("VIAGEN12".into());
        tech
    }

    pub fn libs() -> Vec<Library> {
        let mut lib = Library {
            name: "cells".into(),
            ..Default::default()
        };
        let _ = lib.sites.insert(Site {
            name: "core".into(),
            class: Some("CORE".into()),
            width: 200,
            height: 2000,
        });
        let _ = lib.masters.insert(Master {
            name: "INV".into(),
            class: Some("CORE".into()),
            width: 600,
            height: 2000,
            pins: ["A", "Y", "VDD", "VSS"]
                .iter()
                .map(|n| MTerm {
                    name: n.to_string(),
                    ..Default::default()
                })
                .collect(),
        });
        vec![lib]
    }

    pub fn block() -> Block {
        Block::new("top", '/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_protocol() {
        let mut slot: Slot<u32> = Slot::new("row");
        assert!(matches!(
            slot.draft("property"),
            Err(ProtocolError::NotOpen { builder: "row", .. })
        ));
        slot.begin(1).unwrap();
        assert_eq!(
            slot.begin(2),
            Err(ProtocolError::AlreadyOpen { builder: "row" })
        );
        *slot.draft("set").unwrap().unwrap() += 1;
        assert_eq!(slot.finish(), Ok(Some(2)));
        assert!(slot.is_closed());
        assert!(slot.finish().is_err());
    }

    #[test]
    fn test_discarded_slot_swallows_setters() {
        let mut slot: Slot<u32> = Slot::new("row");
        slot.begin(1).unwrap();
        slot.discard();
        assert_eq!(slot.draft("set"), Ok(None));
        assert_eq!(slot.finish(), Ok(None));
        assert!(slot.is_closed());
    }

    #[test]
    fn test_notice_prefix() {
        let n = Notice {
            severity: Severity::Warning,
            message: "x".into(),
        };
        assert_eq!(n.to_string(), "warning: x");
    }

    #[test]
    fn test_base_error_counts_and_records() {
        let tech = testutil::tech();
        let libs = testutil::libs();
        let mut block = testutil::block();
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut base = BuilderBase::default();
        base.init(1000);
        base.error(&mut s, "boom");
        assert_eq!(base.errors, 1);
        assert_eq!(s.notices[0].to_string(), "error: boom");
        assert_eq!(base.dbdist(3), 30);
    }
}
