// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Text event source for DEF files
//!
//! [DefEventParser] runs the preprocessor once, then turns one logical
//! statement at a time into [DefEvent]s. A section keyword such as
//! `COMPONENTS n` switches the statement parser until its `END` line.
//! Header statements are left to the header prescan.

pub mod common;
pub mod component;
pub mod floorplan;
pub mod net;
pub mod pin;
pub mod specialnet;
pub mod via;

use std::collections::VecDeque;

use log::debug;

use self::common::{tokenize, PropKinds, Tokens};
use super::preprocessor::{preprocess, PreprocessedDef};
use super::{DefEvent, EventSource};
use crate::error::SourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Top,
    PropDefs,
    Vias,
    NonDefaultRules,
    Regions,
    Components,
    Pins,
    PinProps,
    Blockages,
    Fills,
    SpecialNets,
    Nets,
    Groups,
    /// Sections whose items are not read, only announced
    Skipped(&'static str),
}

impl Section {
    fn keyword(self) -> &'static str {
        match self {
            Self::Top => "DESIGN",
            Self::PropDefs => "PROPERTYDEFINITIONS",
            Self::Vias => "VIAS",
            Self::NonDefaultRules => "NONDEFAULTRULES",
            Self::Regions => "REGIONS",
            Self::Components => "COMPONENTS",
            Self::Pins => "PINS",
            Self::PinProps => "PINPROPERTIES",
            Self::Blockages => "BLOCKAGES",
            Self::Fills => "FILLS",
            Self::SpecialNets => "SPECIALNETS",
            Self::Nets => "NETS",
            Self::Groups => "GROUPS",
            Self::Skipped(kw) => kw,
        }
    }
}

pub struct DefEventParser {
    pre: PreprocessedDef,
    next: usize,
    section: Section,
    pending: VecDeque<DefEvent>,
    prop_kinds: PropKinds,
    finished: bool,
}

impl DefEventParser {
    pub fn new(text: &str) -> Self {
        let pre = preprocess(text);
        debug!("DEF text has {} statements", pre.lines.len());
        Self {
            pre,
            next: 0,
            section: Section::Top,
            pending: VecDeque::new(),
            prop_kinds: PropKinds::new(),
            finished: false,
        }
    }

    fn statement(&mut self, idx: usize, text: &str) -> Result<(), SourceError> {
        let lines = self.pre.line_range(idx);
        let toks = tokenize(text).map_err(|msg| SourceError::syntax(lines, msg))?;
        let mut t = Tokens::new(toks, lines);
        if t.is_done() {
            return Ok(());
        }
        if t.eat("END") {
            return self.end_section(&mut t);
        }

        let kinds = &self.prop_kinds;
        let event = match self.section {
            Section::Top => return self.top_level(&mut t),
            Section::PropDefs => {
                let def = floorplan::prop_def(&mut t)?;
                self.prop_kinds
                    .insert((def.object_type.clone(), def.name.clone()), def.data_type);
                DefEvent::PropDef(def)
            }
            Section::Vias => DefEvent::Via(via::via(&mut t)?),
            Section::NonDefaultRules => {
                DefEvent::NonDefaultRule(via::non_default_rule(&mut t, kinds)?)
            }
            Section::Regions => DefEvent::Region(floorplan::region(&mut t, kinds)?),
            Section::Components => DefEvent::Component(component::component(&mut t, kinds)?),
            Section::Pins => DefEvent::Pin(pin::pin(&mut t)?),
            Section::PinProps => DefEvent::PinProp(pin::pin_prop(&mut t, kinds)?),
            Section::Blockages => DefEvent::Blockage(floorplan::blockage(&mut t)?),
            Section::Fills => DefEvent::Fill(floorplan::fill(&mut t)?),
            Section::SpecialNets => {
                DefEvent::SpecialNet(specialnet::special_net(&mut t, kinds)?)
            }
            Section::Nets => DefEvent::Net(net::net(&mut t, kinds)?),
            Section::Groups => {
                let (name, members, group) = floorplan::group(&mut t, kinds)?;
                self.pending.push_back(DefEvent::GroupName(name));
                self.pending
                    .extend(members.into_iter().map(DefEvent::GroupMember));
                DefEvent::Group(group)
            }
            Section::Skipped(kw) => {
                debug!("skipping {kw} item at lines {}-{}", lines.0, lines.1);
                return Ok(());
            }
        };
        self.pending.push_back(event);
        Ok(())
    }

    fn enter(&mut self, section: Section, start: Option<DefEvent>) {
        debug!("entering {}", section.keyword());
        self.section = section;
        self.pending.extend(start);
    }

    fn top_level(&mut self, t: &mut Tokens<'_>) -> Result<(), SourceError> {
        let kw = t.keyword("statement")?;
        match kw.as_str() {
            "VERSION" | "DIVIDERCHAR" | "BUSBITCHARS" | "DESIGN" | "NAMESCASESENSITIVE" => {}
            "TECHNOLOGY" => {
                let name = t.word("TECHNOLOGY name")?.to_string();
                self.pending.push_back(DefEvent::Technology(name));
            }
            "UNITS" => {
                t.expect("DISTANCE")?;
                t.expect("MICRONS")?;
                let units = t.float("UNITS value")?;
                self.pending.push_back(DefEvent::Units(units));
            }
            "HISTORY" => {
                let text = t.rest();
                self.pending.push_back(DefEvent::History(text));
            }
            "DIEAREA" => {
                let points = t.points()?;
                self.pending.push_back(DefEvent::DieArea(points));
            }
            "ROW" => {
                let row = floorplan::row(t, &self.prop_kinds)?;
                self.pending.push_back(DefEvent::Row(row));
            }
            "TRACKS" => {
                let track = floorplan::tracks(t)?;
                self.pending.push_back(DefEvent::Track(track));
            }
            "GCELLGRID" => {
                let grid = floorplan::gcell_grid(t)?;
                self.pending.push_back(DefEvent::GcellGrid(grid));
            }
            "COMPONENTMASKSHIFT" => {
                let layers = component::mask_shift(t);
                self.pending.push_back(DefEvent::ComponentMaskShift(layers));
            }
            "BEGINEXT" => {
                let tag = t.word("BEGINEXT tag")?.to_string();
                self.pending.push_back(DefEvent::Extension(tag));
            }
            "PROPERTYDEFINITIONS" => self.enter(Section::PropDefs, Some(DefEvent::PropDefsStart)),
            "VIAS" => self.enter(Section::Vias, None),
            "NONDEFAULTRULES" => self.enter(Section::NonDefaultRules, None),
            "REGIONS" => self.enter(Section::Regions, None),
            "COMPONENTS" => self.enter(Section::Components, None),
            "PINS" => {
                let n = t.count("PINS count")?;
                self.enter(Section::Pins, Some(DefEvent::PinsStart(n)));
            }
            "PINPROPERTIES" => self.enter(Section::PinProps, None),
            "BLOCKAGES" => self.enter(Section::Blockages, None),
            "FILLS" => {
                let n = t.count("FILLS count")?;
                self.enter(Section::Fills, Some(DefEvent::FillsStart(n)));
            }
            "SPECIALNETS" => self.enter(Section::SpecialNets, None),
            "NETS" => self.enter(Section::Nets, None),
            "GROUPS" => self.enter(Section::Groups, None),
            "SCANCHAINS" => {
                let n = t.count("SCANCHAINS count")?;
                self.enter(Section::Skipped("SCANCHAINS"), Some(DefEvent::ScanChainsStart(n)));
            }
            "SLOTS" => {
                let n = t.count("SLOTS count")?;
                self.enter(Section::Skipped("SLOTS"), Some(DefEvent::SlotsStart(n)));
            }
            "STYLES" => {
                let n = t.count("STYLES count")?;
                self.enter(Section::Skipped("STYLES"), Some(DefEvent::StylesStart(n)));
            }
            _ => debug!("skipping unknown statement {kw}"),
        }
        Ok(())
    }

    fn end_section(&mut self, t: &mut Tokens<'_>) -> Result<(), SourceError> {
        let name = t.keyword("section name")?;
        if self.section == Section::Top && name == "DESIGN" {
            self.finished = true;
            return Ok(());
        }
        if name != self.section.keyword() {
            return Err(t.err(format!(
                "Unexpected END {name} inside {}",
                self.section.keyword()
            )));
        }
        match self.section {
            Section::PropDefs => self.pending.push_back(DefEvent::PropDefsEnd),
            Section::Pins => self.pending.push_back(DefEvent::PinsEnd),
            _ => {}
        }
        self.section = Section::Top;
        Ok(())
    }
}

impl EventSource for DefEventParser {
    fn next_event(&mut self) -> Option<Result<DefEvent, SourceError>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.finished {
                return None;
            }
            if self.next >= self.pre.lines.len() {
                self.finished = true;
                if self.section != Section::Top {
                    return Some(Err(SourceError::UnexpectedEof(format!(
                        "missing END {}",
                        self.section.keyword()
                    ))));
                }
                return None;
            }
            let idx = self.next;
            self.next += 1;
            let text = std::mem::take(&mut self.pre.lines[idx]);
            if let Err(e) = self.statement(idx, &text) {
                self.finished = true;
                self.pending.clear();
                return Some(Err(e));
            }
        }
    }
}
