// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! COMPONENTS

use super::{impl_builder, BuilderBase, Session, Slot};
use crate::db::{find_master, Inst, Orient, PlacementStatus, PropValue, SourceType};
use crate::def::props::PropertySink;
use crate::def::DefPoint;
use crate::error::ProtocolError;

pub struct ComponentBuilder {
    base: BuilderBase,
    inst: Slot<Inst>,
    pub inst_cnt: u32,
    pub iterm_cnt: u32,
}

impl Default for ComponentBuilder {
    fn default() -> Self {
        Self {
            base: BuilderBase::default(),
            inst: Slot::new("component"),
            inst_cnt: 0,
            iterm_cnt: 0,
        }
    }
}

impl_builder!(ComponentBuilder);

impl ComponentBuilder {
    fn reset_state(&mut self) {
        self.inst.abandon();
        self.inst_cnt = 0;
        self.iterm_cnt = 0;
    }

    pub fn begin(&mut self, s: &mut Session<'_>, id: &str, master: &str) -> Result<(), ProtocolError> {
        if s.block.insts.contains(id) {
            self.base
                .error(s, format!("Component {id} already exists"));
            return self.inst.begin_discarded();
        }
        let Some(m) = find_master(s.libs, master) else {
            self.base.error(
                s,
                format!("Unknown library cell ({master}) referenced by component {id}"),
            );
            return self.inst.begin_discarded();
        };
        self.inst.begin(Inst {
            name: id.to_string(),
            master: master.to_string(),
            terms: m.pins.iter().map(|p| p.name.clone()).collect(),
            ..Default::default()
        })
    }

    pub fn source(&mut self, source: SourceType) -> Result<(), ProtocolError> {
        if let Some(inst) = self.inst.draft("source")? {
            inst.source = Some(source);
        }
        Ok(())
    }

    pub fn weight(&mut self, weight: i32) -> Result<(), ProtocolError> {
        if let Some(inst) = self.inst.draft("weight")? {
            inst.weight = Some(weight);
        }
        Ok(())
    }

    pub fn region(&mut self, s: &mut Session<'_>, region: &str) -> Result<(), ProtocolError> {
        let Some(inst) = self.inst.draft("region")? else {
            return Ok(());
        };
        if s.block.regions.contains(region) {
            inst.region = Some(region.to_string());
            return Ok(());
        }
        let msg = format!("Region {region} referenced by component {} not found", inst.name);
        self.inst.discard();
        self.base.error(s, msg);
        Ok(())
    }

    pub fn placement(
        &mut self,
        status: PlacementStatus,
        at: DefPoint,
        orient: Orient,
    ) -> Result<(), ProtocolError> {
        let location = self.base.point(at);
        if let Some(inst) = self.inst.draft("placement")? {
            inst.status = status;
            inst.location = location;
            inst.orient = orient;
        }
        Ok(())
    }

    pub fn end(&mut self, s: &mut Session<'_>) -> Result<(), ProtocolError> {
        if let Some(inst) = self.inst.finish()? {
            self.inst_cnt += 1;
            self.iterm_cnt += inst.terms.len() as u32;
            let _ = s.block.insts.insert(inst);
        }
        Ok(())
    }

    /// Close any open component without committing it
    pub fn abandon(&mut self) {
        self.inst.abandon();
    }
}

impl PropertySink for ComponentBuilder {
    fn set_property(&mut self, name: &str, value: PropValue) -> Result<(), ProtocolError> {
        if let Some(inst) = self.inst.draft("property")? {
            inst.properties.insert(name.to_string(), value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil;
    use super::super::Builder;
    use super::*;

    #[test]
    fn test_component_commit() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = ComponentBuilder::default();
        b.init(1000);
        b.set_units(1000, 1000.0);
        b.begin(&mut s, "u1", "INV").unwrap();
        b.placement(PlacementStatus::Placed, DefPoint::new(100, 200), Orient::MX)
            .unwrap();
        b.property_int("p", 3).unwrap();
        b.end(&mut s).unwrap();

        assert_eq!(b.inst_cnt, 1);
        assert_eq!(b.iterm_cnt, 4);
        let inst = s.block.insts.get("u1").unwrap();
        assert_eq!(inst.location.x, 100);
        assert_eq!(inst.orient, Orient::MX);
        assert_eq!(inst.properties.get("p"), Some(&PropValue::Int(3)));
    }

    #[test]
    fn test_unknown_master_discards() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = ComponentBuilder::default();
        b.init(1000);
        b.begin(&mut s, "u1", "NOPE").unwrap();
        b.weight(2).unwrap();
        b.end(&mut s).unwrap();
        assert_eq!(b.errors(), 1);
        assert!(s.block.insts.is_empty());
    }

    #[test]
    fn test_protocol_violations() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = ComponentBuilder::default();
        assert!(matches!(b.weight(1), Err(ProtocolError::NotOpen { .. })));
        b.begin(&mut s, "u1", "INV").unwrap();
        assert!(matches!(
            b.begin(&mut s, "u2", "INV"),
            Err(ProtocolError::AlreadyOpen { .. })
        ));
        b.end(&mut s).unwrap();
        assert!(matches!(b.end(&mut s), Err(ProtocolError::NotOpen { .. })));
    }
}
