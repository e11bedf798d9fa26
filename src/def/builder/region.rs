// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! REGIONS and GROUPS

use super::{impl_builder, BuilderBase, Session, Slot};
use crate::db::{Group, PropValue, Region, RegionType};
use crate::def::props::PropertySink;
use crate::def::DefRect;
use crate::error::ProtocolError;

pub struct RegionBuilder {
    base: BuilderBase,
    region: Slot<Region>,
    group: Slot<Group>,
    pub region_cnt: u32,
    pub group_cnt: u32,
}

impl Default for RegionBuilder {
    fn default() -> Self {
        Self {
            base: BuilderBase::default(),
            region: Slot::new("region"),
            group: Slot::new("group"),
            region_cnt: 0,
            group_cnt: 0,
        }
    }
}

impl_builder!(RegionBuilder);

/// Component names selected by a group member pattern. A trailing `*`
/// matches any suffix.
fn matching<'a>(names: impl Iterator<Item = &'a str>, pattern: &str) -> Vec<String> {
    match pattern.strip_suffix('*') {
        Some(prefix) => names
            .filter(|n| n.starts_with(prefix))
            .map(str::to_string)
            .collect(),
        None => names.filter(|n| *n == pattern).map(str::to_string).collect(),
    }
}

impl RegionBuilder {
    fn reset_state(&mut self) {
        self.abandon();
        self.region_cnt = 0;
        self.group_cnt = 0;
    }

    pub fn region_begin(&mut self, s: &mut Session<'_>, name: &str) -> Result<(), ProtocolError> {
        if s.block.regions.contains(name) {
            self.base.error(s, format!("Region {name} already exists"));
            return self.region.begin_discarded();
        }
        self.region.begin(Region {
            name: name.to_string(),
            ..Default::default()
        })
    }

    pub fn boundary(&mut self, rect: &DefRect) -> Result<(), ProtocolError> {
        let rect = self.base.rect(rect);
        if let Some(region) = self.region.draft("boundary")? {
            region.boundaries.push(rect);
        }
        Ok(())
    }

    pub fn kind(&mut self, kind: RegionType) -> Result<(), ProtocolError> {
        if let Some(region) = self.region.draft("kind")? {
            region.kind = Some(kind);
        }
        Ok(())
    }

    pub fn region_end(&mut self, s: &mut Session<'_>) -> Result<(), ProtocolError> {
        if let Some(region) = self.region.finish()? {
            self.region_cnt += 1;
            let _ = s.block.regions.insert(region);
        }
        Ok(())
    }

    pub fn group_begin(&mut self, s: &mut Session<'_>, name: &str) -> Result<(), ProtocolError> {
        if s.block.groups.contains(name) {
            self.base.error(s, format!("Group {name} already exists"));
            return self.group.begin_discarded();
        }
        self.group.begin(Group {
            name: name.to_string(),
            ..Default::default()
        })
    }

    pub fn member(&mut self, s: &mut Session<'_>, pattern: &str) -> Result<(), ProtocolError> {
        let Some(group) = self.group.draft("member")? else {
            return Ok(());
        };
        let found = matching(s.block.insts.iter().map(|i| i.name.as_str()), pattern);
        if found.is_empty() {
            let msg = format!("Component {pattern} of group {} not found", group.name);
            self.group.discard();
            self.base.error(s, msg);
            return Ok(());
        }
        for name in found {
            if !group.members.contains(&name) {
                group.members.push(name);
            }
        }
        Ok(())
    }

    pub fn group_region(&mut self, s: &mut Session<'_>, region: &str) -> Result<(), ProtocolError> {
        let Some(group) = self.group.draft("region")? else {
            return Ok(());
        };
        if !s.block.regions.contains(region) {
            let msg = format!("Region {region} of group {} not found", group.name);
            self.group.discard();
            self.base.error(s, msg);
            return Ok(());
        }
        group.region = Some(region.to_string());
        Ok(())
    }

    pub fn group_end(&mut self, s: &mut Session<'_>) -> Result<(), ProtocolError> {
        let Some(group) = self.group.finish()? else {
            return Ok(());
        };
        self.group_cnt += 1;
        for member in &group.members {
            if let Some(inst) = s.block.insts.get_mut(member) {
                if inst.region.is_none() {
                    inst.region = group.region.clone();
                }
            }
        }
        let _ = s.block.groups.insert(group);
        Ok(())
    }

    pub fn abandon(&mut self) {
        self.region.abandon();
        self.group.abandon();
    }
}

impl PropertySink for RegionBuilder {
    fn set_property(&mut self, name: &str, value: PropValue) -> Result<(), ProtocolError> {
        if self.region.is_open() {
            if let Some(region) = self.region.draft("property")? {
                region.properties.insert(name.to_string(), value);
            }
        } else if let Some(group) = self.group.draft("property")? {
            group.properties.insert(name.to_string(), value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil;
    use super::super::Builder;
    use super::*;
    use crate::db::{Inst, Rect};

    #[test]
    fn test_member_wildcard() {
        let names = ["alu/a", "alu/b", "fpu/a"];
        assert_eq!(matching(names.into_iter(), "alu/*"), vec!["alu/a", "alu/b"]);
        assert_eq!(matching(names.into_iter(), "fpu/a"), vec!["fpu/a"]);
        assert!(matching(names.into_iter(), "fpu").is_empty());
    }

    #[test]
    fn test_region_and_group() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        for name in ["alu/a", "alu/b", "fpu/a"] {
            let _ = block.insts.insert(Inst {
                name: name.into(),
                ..Default::default()
            });
        }
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = RegionBuilder::default();
        b.init(1000);
        b.set_units(1000, 1000.0);

        b.region_begin(&mut s, "r1").unwrap();
        b.boundary(&DefRect::new(100, 100, 0, 0)).unwrap();
        b.kind(RegionType::Fence).unwrap();
        b.property_int("level", 2).unwrap();
        b.region_end(&mut s).unwrap();

        b.group_begin(&mut s, "g1").unwrap();
        b.member(&mut s, "alu/*").unwrap();
        b.group_region(&mut s, "r1").unwrap();
        b.group_end(&mut s).unwrap();

        let r1 = s.block.regions.get("r1").unwrap();
        assert_eq!(r1.boundaries, vec![Rect::new(0, 0, 100, 100)]);
        assert_eq!(r1.properties.get("level"), Some(&PropValue::Int(2)));
        let g1 = s.block.groups.get("g1").unwrap();
        assert_eq!(g1.members, vec!["alu/a", "alu/b"]);
        assert_eq!(s.block.insts.get("alu/b").unwrap().region.as_deref(), Some("r1"));
        assert_eq!(s.block.insts.get("fpu/a").unwrap().region, None);
    }

    #[test]
    fn test_unknown_member_discards_group() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = RegionBuilder::default();
        b.init(1000);
        b.group_begin(&mut s, "g1").unwrap();
        b.member(&mut s, "nope").unwrap();
        b.group_end(&mut s).unwrap();
        assert!(s.block.groups.is_empty());
        assert_eq!(b.errors(), 1);
    }
}
