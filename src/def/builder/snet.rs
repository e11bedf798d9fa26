// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! SPECIALNETS

use super::{impl_builder, BuilderBase, Session, Slot};
use crate::db::{
    NetConnection, PathElement, PropValue, SPath, SRect, SWire, SigType, SourceType, SpecialNet,
    WireShape, WireType,
};
use crate::def::props::PropertySink;
use crate::def::{DefPoint, DefRect};
use crate::error::ProtocolError;

const NAME: &str = "special net";

pub struct SNetBuilder {
    base: BuilderBase,
    net: Slot<SpecialNet>,
    wire: Slot<SWire>,
    path: Slot<SPath>,
    current: String,
    pub skip_special_wires: bool,
    pub skip_shields: bool,
    pub skip_block_wires: bool,
    pub skip_fill_wires: bool,
    pub replace_wires: bool,
    pub snet_cnt: u32,
    pub snet_iterm_cnt: u32,
}

impl Default for SNetBuilder {
    fn default() -> Self {
        Self {
            base: BuilderBase::default(),
            net: Slot::new(NAME),
            wire: Slot::new("special net wire"),
            path: Slot::new("special net path"),
            current: String::new(),
            skip_special_wires: false,
            skip_shields: false,
            skip_block_wires: false,
            skip_fill_wires: false,
            replace_wires: false,
            snet_cnt: 0,
            snet_iterm_cnt: 0,
        }
    }
}

impl_builder!(SNetBuilder);

impl SNetBuilder {
    fn reset_state(&mut self) {
        self.abandon();
        self.snet_cnt = 0;
        self.snet_iterm_cnt = 0;
    }

    fn reject(&mut self, s: &mut Session<'_>, msg: String) {
        self.base.error(s, msg);
        self.net.discard();
        self.wire.discard();
        self.path.discard();
    }

    fn skips_shape(&self, shape: WireShape) -> bool {
        (self.skip_block_wires && shape == WireShape::BlockWire)
            || (self.skip_fill_wires && shape == WireShape::FillWire)
    }

    pub fn begin(&mut self, s: &mut Session<'_>, name: &str) -> Result<(), ProtocolError> {
        self.current = name.to_string();
        let exists = s.block.special_nets.contains(name);
        if self.replace_wires && !exists {
            self.base.error(
                s,
                format!("Special net {name} not found for wire replacement"),
            );
            return self.net.begin_discarded();
        }
        if !self.replace_wires && exists {
            self.base
                .error(s, format!("Special net {name} already exists"));
            return self.net.begin_discarded();
        }
        self.net.begin(SpecialNet {
            name: name.to_string(),
            ..Default::default()
        })
    }

    pub fn use_(&mut self, sig_type: SigType) -> Result<(), ProtocolError> {
        if let Some(net) = self.net.draft("use")? {
            net.sig_type = Some(sig_type);
        }
        Ok(())
    }

    pub fn source(&mut self, source: SourceType) -> Result<(), ProtocolError> {
        if let Some(net) = self.net.draft("source")? {
            net.source = Some(source);
        }
        Ok(())
    }

    pub fn fixed_bump(&mut self) -> Result<(), ProtocolError> {
        if let Some(net) = self.net.draft("fixed_bump")? {
            net.fixed_bump = true;
        }
        Ok(())
    }

    pub fn weight(&mut self, weight: i32) -> Result<(), ProtocolError> {
        if let Some(net) = self.net.draft("weight")? {
            net.weight = Some(weight);
        }
        Ok(())
    }

    /// Connect `( inst pin )`. Instance `*` connects every component whose
    /// master has `pin`; `PIN` names a block pin. Connections not marked
    /// `SYNTHESIZED` are flagged special.
    pub fn connection(
        &mut self,
        s: &mut Session<'_>,
        inst: &str,
        pin: &str,
        synthesized: bool,
    ) -> Result<(), ProtocolError> {
        if self.net.draft("connection")?.is_none() || self.replace_wires {
            return Ok(());
        }

        let mut found = Vec::new();
        let mut bterm = None;
        let problem = match inst {
            "*" => {
                found.extend(
                    s.block
                        .insts
                        .iter()
                        .filter(|i| i.terms.iter().any(|t| t == pin))
                        .map(|i| i.name.clone()),
                );
                None
            }
            "PIN" => {
                if s.block.bterms.contains(pin) {
                    bterm = Some(pin.to_string());
                    None
                } else {
                    Some(format!("Pin {pin} on special net {} not found", self.current))
                }
            }
            _ => match s.block.insts.get(inst) {
                None => Some(format!(
                    "Component {inst} on special net {} not found",
                    self.current
                )),
                Some(i) if !i.terms.iter().any(|t| t == pin) => Some(format!(
                    "Component pin {inst}/{pin} on special net {} not found",
                    self.current
                )),
                Some(_) => {
                    found.push(inst.to_string());
                    None
                }
            },
        };
        if let Some(msg) = problem {
            self.reject(s, msg);
            return Ok(());
        }

        if let Some(net) = self.net.draft("connection")? {
            net.bterms.extend(bterm);
            net.connections.extend(found.into_iter().map(|inst| NetConnection {
                inst,
                pin: pin.to_string(),
                must_join: false,
                special: !synthesized,
            }));
        }
        Ok(())
    }

    pub fn wire(&mut self, wire_type: WireType, shield: Option<&str>) -> Result<(), ProtocolError> {
        let active = self.net.draft("wire")?.is_some();
        let skipped =
            self.skip_special_wires || (self.skip_shields && wire_type == WireType::Shield);
        if !active || skipped {
            return self.wire.begin_discarded();
        }
        self.wire.begin(SWire {
            wire_type,
            shield: shield.map(str::to_string),
            paths: Vec::new(),
            rects: Vec::new(),
        })
    }

    /// Rectangle shape committed directly into the open wire
    pub fn rect(
        &mut self,
        s: &mut Session<'_>,
        layer: &str,
        rect: &DefRect,
        shape: WireShape,
    ) -> Result<(), ProtocolError> {
        if self.wire.draft("rect")?.is_none() || self.skips_shape(shape) {
            return Ok(());
        }
        if s.tech.find_layer(layer).is_none() {
            let msg = format!("Layer {layer} on special net {} not found", self.current);
            self.reject(s, msg);
            return Ok(());
        }
        let rect = self.base.rect(rect);
        if let Some(wire) = self.wire.draft("rect")? {
            wire.rects.push(SRect {
                layer: layer.to_string(),
                shape,
                rect,
            });
        }
        Ok(())
    }

    pub fn path(&mut self, s: &mut Session<'_>, layer: &str, width: i32) -> Result<(), ProtocolError> {
        if self.wire.is_closed() {
            return Err(ProtocolError::OutOfOrder {
                builder: NAME,
                call: "path",
                requires: "wire",
            });
        }
        if self.wire.is_discarded() {
            return self.path.begin_discarded();
        }
        if s.tech.find_layer(layer).is_none() {
            self.path.begin_discarded()?;
            let msg = format!("Layer {layer} on special net {} not found", self.current);
            self.reject(s, msg);
            return Ok(());
        }
        let width = self.base.dbdist(width);
        self.path.begin(SPath {
            layer: layer.to_string(),
            width,
            shape: WireShape::None,
            elements: Vec::new(),
        })
    }

    pub fn path_shape(&mut self, shape: WireShape) -> Result<(), ProtocolError> {
        let skipped = self.skips_shape(shape);
        if let Some(path) = self.path.draft("path_shape")? {
            path.shape = shape;
        }
        if skipped {
            self.path.discard();
        }
        Ok(())
    }

    pub fn path_point(&mut self, at: DefPoint, ext: Option<i32>) -> Result<(), ProtocolError> {
        let at = self.base.point(at);
        let ext = ext.map(|e| self.base.dbdist(e));
        if let Some(path) = self.path.draft("path_point")? {
            path.elements.push(PathElement::Point { at, ext });
        }
        Ok(())
    }

    pub fn path_via(&mut self, s: &mut Session<'_>, via: &str) -> Result<(), ProtocolError> {
        if self.path.draft("path_via")?.is_none() {
            return Ok(());
        }
        if !s.block.has_via(s.tech, via) {
            let msg = format!("Via {via} on special net {} not found", self.current);
            self.reject(s, msg);
            return Ok(());
        }
        if let Some(path) = self.path.draft("path_via")? {
            path.elements.push(PathElement::Via {
                name: via.to_string(),
                orient: None,
            });
        }
        Ok(())
    }

    pub fn path_end(&mut self) -> Result<(), ProtocolError> {
        if let Some(path) = self.path.finish()? {
            if let Some(wire) = self.wire.draft("path_end")? {
                wire.paths.push(path);
            }
        }
        Ok(())
    }

    pub fn wire_end(&mut self) -> Result<(), ProtocolError> {
        if self.path.is_open() {
            return Err(ProtocolError::OutOfOrder {
                builder: NAME,
                call: "wire_end",
                requires: "path_end",
            });
        }
        if let Some(wire) = self.wire.finish()? {
            if let Some(net) = self.net.draft("wire_end")? {
                net.wires.push(wire);
            }
        }
        Ok(())
    }

    pub fn end(&mut self, s: &mut Session<'_>) -> Result<(), ProtocolError> {
        if self.wire.is_open() {
            return Err(ProtocolError::OutOfOrder {
                builder: NAME,
                call: "end",
                requires: "wire_end",
            });
        }
        let Some(net) = self.net.finish()? else {
            return Ok(());
        };
        self.snet_cnt += 1;
        if self.replace_wires {
            if let Some(existing) = s.block.special_nets.get_mut(&net.name) {
                existing.wires = net.wires;
            }
            return Ok(());
        }
        self.snet_iterm_cnt += net.connections.len() as u32;
        for bterm in &net.bterms {
            if let Some(b) = s.block.bterms.get_mut(bterm) {
                if b.net.is_empty() {
                    b.net = net.name.clone();
                }
            }
        }
        let _ = s.block.special_nets.insert(net);
        Ok(())
    }

    pub fn abandon(&mut self) {
        self.path.abandon();
        self.wire.abandon();
        self.net.abandon();
    }
}

impl PropertySink for SNetBuilder {
    fn set_property(&mut self, name: &str, value: PropValue) -> Result<(), ProtocolError> {
        if let Some(net) = self.net.draft("property")? {
            net.properties.insert(name.to_string(), value);
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

    fn insts(block: &mut crate::db::Block) {
        for name in ["u1", "u2"] {
            let _ = block.insts.insert(Inst {
                name: name.into(),
                master: "INV".into(),
                terms: vec!["A".into(), "VDD".into()],
                ..Default::default()
            });
        }
    }

    #[test]
    fn test_wildcard_connection() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        insts(&mut block);
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = SNetBuilder::default();
        b.init(1000);
        b.begin(&mut s, "VDD").unwrap();
        b.use_(SigType::Power).unwrap();
        b.connection(&mut s, "*", "VDD", false).unwrap();
        b.end(&mut s).unwrap();
        assert_eq!((b.snet_cnt, b.snet_iterm_cnt), (1, 2));
        let net = s.block.special_nets.get("VDD").unwrap();
        assert_eq!(net.connections.len(), 2);
        assert!(net.connections.iter().all(|c| c.special));
    }

    #[test]
    fn test_synthesized_connection_not_special() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        insts(&mut block);
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = SNetBuilder::default();
        b.init(1000);
        b.begin(&mut s, "VDD").unwrap();
        b.connection(&mut s, "u1", "VDD", true).unwrap();
        b.connection(&mut s, "u2", "VDD", false).unwrap();
        b.end(&mut s).unwrap();
        let net = s.block.special_nets.get("VDD").unwrap();
        let specials: Vec<bool> = net.connections.iter().map(|c| c.special).collect();
        assert_eq!(specials, vec![false, true]);
    }

    #[test]
    fn test_paths_and_rects() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = SNetBuilder::default();
        b.init(1000);
        b.set_units(1000, 1000.0);
        b.begin(&mut s, "VSS").unwrap();
        b.wire(WireType::Routed, None).unwrap();
        b.rect(&mut s, "M1", &DefRect::new(10, 10, 0, 0), WireShape::Stripe)
            .unwrap();
        b.wire_end().unwrap();
        b.wire(WireType::Fixed, None).unwrap();
        b.path(&mut s, "M2", 400).unwrap();
        b.path_shape(WireShape::Ring).unwrap();
        b.path_point(DefPoint::new(0, 0), None).unwrap();
        b.path_point(DefPoint::new(1000, 0), None).unwrap();
        b.path_via(&mut s, "VIA12").unwrap();
        b.path_end().unwrap();
        b.wire_end().unwrap();
        b.end(&mut s).unwrap();

        let net = s.block.special_nets.get("VSS").unwrap();
        assert_eq!(net.wires.len(), 2);
        assert_eq!(net.wires[0].rects[0].rect, Rect::new(0, 0, 10, 10));
        let path = &net.wires[1].paths[0];
        assert_eq!((path.width, path.shape), (400, WireShape::Ring));
        assert_eq!(path.elements.len(), 3);
    }

    #[test]
    fn test_skip_fill_wires_drops_path_only() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = SNetBuilder::default();
        b.init(1000);
        b.skip_fill_wires = true;
        b.begin(&mut s, "VSS").unwrap();
        b.wire(WireType::Routed, None).unwrap();
        b.path(&mut s, "M1", 100).unwrap();
        b.path_shape(WireShape::FillWire).unwrap();
        b.path_point(DefPoint::new(0, 0), None).unwrap();
        b.path_end().unwrap();
        b.path(&mut s, "M1", 100).unwrap();
        b.path_point(DefPoint::new(0, 0), None).unwrap();
        b.path_end().unwrap();
        b.wire_end().unwrap();
        b.end(&mut s).unwrap();
        assert_eq!(
            s.block.special_nets.get("VSS").unwrap().wires[0].paths.len(),
            1
        );
        assert_eq!(b.errors(), 0);
    }
}
