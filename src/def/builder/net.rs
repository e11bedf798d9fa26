// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! NETS
//!
//! A net is bracketed as net, wire, path: `begin` / `wire` / `path*` /
//! points and vias / `path_end` / `wire_end` / `end`.

use super::{impl_builder, BuilderBase, Session, Slot};
use crate::db::{
    Net, NetConnection, Orient, PathElement, PropValue, SigType, SourceType, Taper, Wire,
    WirePath, WireType,
};
use crate::def::props::PropertySink;
use crate::def::translate::{rect_path_points, Deltas, RectPath};
use crate::def::DefPoint;
use crate::error::ProtocolError;

const NAME: &str = "net";

pub struct NetBuilder {
    base: BuilderBase,
    net: Slot<Net>,
    wire: Slot<Wire>,
    path: Slot<WirePath>,
    current: String,
    pub skip_wires: bool,
    pub skip_connections: bool,
    pub replace_wires: bool,
    pub net_cnt: u32,
    pub net_iterm_cnt: u32,
}

impl Default for NetBuilder {
    fn default() -> Self {
        Self {
            base: BuilderBase::default(),
            net: Slot::new(NAME),
            wire: Slot::new("net wire"),
            path: Slot::new("net path"),
            current: String::new(),
            skip_wires: false,
            skip_connections: false,
            replace_wires: false,
            net_cnt: 0,
            net_iterm_cnt: 0,
        }
    }
}

impl_builder!(NetBuilder);

impl NetBuilder {
    fn reset_state(&mut self) {
        self.abandon();
        self.net_cnt = 0;
        self.net_iterm_cnt = 0;
    }

    /// Reject the open net and everything nested in it
    fn reject(&mut self, s: &mut Session<'_>, msg: String) {
        self.base.error(s, msg);
        self.net.discard();
        self.wire.discard();
        self.path.discard();
    }

    pub fn begin(&mut self, s: &mut Session<'_>, name: &str) -> Result<(), ProtocolError> {
        self.current = name.to_string();
        let exists = s.block.nets.contains(name);
        if self.replace_wires && !exists {
            self.base
                .error(s, format!("Net {name} not found for wire replacement"));
            return self.net.begin_discarded();
        }
        if !self.replace_wires && exists {
            self.base.error(s, format!("Net {name} already exists"));
            return self.net.begin_discarded();
        }
        self.net.begin(Net {
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

    pub fn non_default_rule(&mut self, s: &mut Session<'_>, rule: &str) -> Result<(), ProtocolError> {
        if self.net.draft("non_default_rule")?.is_none() {
            return Ok(());
        }
        if !s.block.non_default_rules.contains(rule) {
            let msg = format!("Nondefault rule {rule} on net {} not found", self.current);
            self.reject(s, msg);
            return Ok(());
        }
        if let Some(net) = self.net.draft("non_default_rule")? {
            net.non_default_rule = Some(rule.to_string());
        }
        Ok(())
    }

    /// Connect `( inst pin )`; `PIN` as instance names a block pin
    pub fn connection(
        &mut self,
        s: &mut Session<'_>,
        inst: &str,
        pin: &str,
        must_join: bool,
    ) -> Result<(), ProtocolError> {
        if self.net.draft("connection")?.is_none() {
            return Ok(());
        }
        if self.skip_connections || self.replace_wires {
            return Ok(());
        }

        let problem = if inst == "PIN" {
            (!s.block.bterms.contains(pin)).then(|| format!("Pin {pin} on net {} not found", self.current))
        } else {
            match s.block.insts.get(inst) {
                None => Some(format!("Component {inst} on net {} not found", self.current)),
                Some(i) if !i.terms.iter().any(|t| t == pin) => Some(format!(
                    "Component pin {inst}/{pin} on net {} not found",
                    self.current
                )),
                Some(_) => None,
            }
        };
        if let Some(msg) = problem {
            self.reject(s, msg);
            return Ok(());
        }

        if let Some(net) = self.net.draft("connection")? {
            if inst == "PIN" {
                net.bterms.push(pin.to_string());
            } else {
                net.connections.push(NetConnection {
                    inst: inst.to_string(),
                    pin: pin.to_string(),
                    must_join,
                    special: false,
                });
            }
        }
        Ok(())
    }

    pub fn wire(&mut self, wire_type: WireType) -> Result<(), ProtocolError> {
        let active = self.net.draft("wire")?.is_some();
        if !active || self.skip_wires {
            return self.wire.begin_discarded();
        }
        self.wire.begin(Wire {
            wire_type,
            paths: Vec::new(),
        })
    }

    fn begin_path(&mut self, s: &mut Session<'_>, layer: &str, taper: Taper) -> Result<(), ProtocolError> {
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
            let msg = format!("Layer {layer} on net {} not found", self.current);
            self.reject(s, msg);
            return Ok(());
        }
        self.path.begin(WirePath {
            layer: layer.to_string(),
            taper,
            elements: Vec::new(),
        })
    }

    pub fn path(&mut self, s: &mut Session<'_>, layer: &str) -> Result<(), ProtocolError> {
        self.begin_path(s, layer, Taper::Default)
    }

    pub fn path_taper(&mut self, s: &mut Session<'_>, layer: &str) -> Result<(), ProtocolError> {
        self.begin_path(s, layer, Taper::Taper)
    }

    pub fn path_taper_rule(
        &mut self,
        s: &mut Session<'_>,
        layer: &str,
        rule: &str,
    ) -> Result<(), ProtocolError> {
        self.begin_path(s, layer, Taper::Rule(rule.to_string()))
    }

    pub fn path_point(&mut self, at: DefPoint, ext: Option<i32>) -> Result<(), ProtocolError> {
        let at = self.base.point(at);
        let ext = ext.map(|e| self.base.dbdist(e));
        if let Some(path) = self.path.draft("path_point")? {
            path.elements.push(PathElement::Point { at, ext });
        }
        Ok(())
    }

    pub fn path_via(
        &mut self,
        s: &mut Session<'_>,
        via: &str,
        orient: Option<Orient>,
    ) -> Result<(), ProtocolError> {
        if self.path.draft("path_via")?.is_none() {
            return Ok(());
        }
        if !s.block.has_via(s.tech, via) {
            let msg = format!("Via {via} on net {} not found", self.current);
            self.reject(s, msg);
            return Ok(());
        }
        if let Some(path) = self.path.draft("path_via")? {
            path.elements.push(PathElement::Via {
                name: via.to_string(),
                orient,
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

    /// Two-point reconstruction of a single minimum-width rectangle path.
    ///
    /// Returns `false`, leaving no path behind, when the rectangle does not
    /// fit the minimum-width shape and the path must be interpreted as is.
    pub fn rect_path(&mut self, s: &mut Session<'_>, rp: &RectPath<'_>) -> Result<bool, ProtocolError> {
        let Some(layer) = s.tech.find_layer(rp.layer) else {
            return Ok(false);
        };
        let anchor = self.base.point(rp.anchor);
        let deltas = Deltas {
            dx1: self.base.dbdist(rp.rect.xl),
            dy1: self.base.dbdist(rp.rect.yl),
            dx2: self.base.dbdist(rp.rect.xh),
            dy2: self.base.dbdist(rp.rect.yh),
        };
        let Some((p0, p1)) = rect_path_points(anchor, deltas, layer.width) else {
            return Ok(false);
        };
        self.begin_path(s, rp.layer, Taper::Default)?;
        if let Some(path) = self.path.draft("rect_path")? {
            path.elements.push(PathElement::Point { at: p0, ext: None });
            path.elements.push(PathElement::Point { at: p1, ext: None });
        }
        self.path_end()?;
        Ok(true)
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
        self.net_cnt += 1;
        if self.replace_wires {
            if let Some(existing) = s.block.nets.get_mut(&net.name) {
                existing.wires = net.wires;
            }
            return Ok(());
        }
        self.net_iterm_cnt += net.connections.len() as u32;
        for bterm in &net.bterms {
            if let Some(b) = s.block.bterms.get_mut(bterm) {
                if b.net.is_empty() {
                    b.net = net.name.clone();
                }
            }
        }
        let _ = s.block.nets.insert(net);
        Ok(())
    }

    /// Close all open drafts without committing
    pub fn abandon(&mut self) {
        self.path.abandon();
        self.wire.abandon();
        self.net.abandon();
    }
}

impl PropertySink for NetBuilder {
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
    use crate::db::{Inst, Point};
    use crate::def::{DefRect, PathToken, DefPath};
    use crate::def::translate::is_rect_path;

    fn with_inst(block: &mut crate::db::Block) {
        let _ = block.insts.insert(Inst {
            name: "u1".into(),
            master: "INV".into(),
            terms: vec!["A".into(), "Y".into()],
            ..Default::default()
        });
    }

    #[test]
    fn test_net_with_wire() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        with_inst(&mut block);
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = NetBuilder::default();
        b.init(1000);
        b.set_units(1000, 1000.0);

        b.begin(&mut s, "n1").unwrap();
        b.connection(&mut s, "u1", "A", false).unwrap();
        b.connection(&mut s, "u1", "Y", true).unwrap();
        b.wire(WireType::Routed).unwrap();
        b.path_taper(&mut s, "M1").unwrap();
        b.path_point(DefPoint::new(0, 0), None).unwrap();
        b.path_via(&mut s, "VIA12", Some(Orient::R90)).unwrap();
        b.path_point(DefPoint::new(0, 500), Some(10)).unwrap();
        b.path_end().unwrap();
        b.wire_end().unwrap();
        b.end(&mut s).unwrap();

        assert_eq!((b.net_cnt, b.net_iterm_cnt), (1, 2));
        let net = s.block.nets.get("n1").unwrap();
        assert!(net.connections[1].must_join);
        let path = &net.wires[0].paths[0];
        assert_eq!(path.taper, Taper::Taper);
        assert_eq!(path.elements.len(), 3);
        assert_eq!(
            path.elements[2],
            PathElement::Point {
                at: Point::new(0, 500),
                ext: Some(10)
            }
        );
    }

    #[test]
    fn test_unknown_via_discards_net() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = NetBuilder::default();
        b.init(1000);
        b.begin(&mut s, "n1").unwrap();
        b.wire(WireType::Routed).unwrap();
        b.path(&mut s, "M1").unwrap();
        b.path_via(&mut s, "NOVIA", None).unwrap();
        b.path_point(DefPoint::new(1, 1), None).unwrap();
        b.path_end().unwrap();
        b.wire_end().unwrap();
        b.end(&mut s).unwrap();
        assert_eq!(b.errors(), 1);
        assert!(s.block.nets.is_empty());
        assert_eq!(b.net_cnt, 0);
    }

    #[test]
    fn test_path_requires_wire() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = NetBuilder::default();
        b.begin(&mut s, "n1").unwrap();
        assert!(matches!(
            b.path(&mut s, "M1"),
            Err(ProtocolError::OutOfOrder { requires: "wire", .. })
        ));
    }

    #[test]
    fn test_rect_path_reconstruction() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = NetBuilder::default();
        b.init(1000);
        b.set_units(1000, 1000.0);
        let path = DefPath {
            tokens: vec![
                PathToken::Layer("M1".into()),
                PathToken::Point(DefPoint::new(500, 500)),
                PathToken::Rect(DefRect::new(-70, -100, 70, 100)),
            ],
        };
        let rp = is_rect_path(&path).unwrap();
        b.begin(&mut s, "n1").unwrap();
        b.wire(WireType::Routed).unwrap();
        assert!(b.rect_path(&mut s, &rp).unwrap());
        b.wire_end().unwrap();
        b.end(&mut s).unwrap();
        let wire_path = &s.block.nets.get("n1").unwrap().wires[0].paths[0];
        assert_eq!(wire_path.layer, "M1");
        assert_eq!(
            wire_path.points(),
            vec![Point::new(500, 470), Point::new(500, 530)]
        );
    }

    #[test]
    fn test_replace_wires_keeps_connections() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let _ = block.nets.insert(Net {
            name: "n1".into(),
            connections: vec![NetConnection {
                inst: "u1".into(),
                pin: "A".into(),
                must_join: false,
                special: false,
            }],
            ..Default::default()
        });
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = NetBuilder::default();
        b.replace_wires = true;
        b.begin(&mut s, "n1").unwrap();
        b.wire(WireType::Fixed).unwrap();
        b.path(&mut s, "M2").unwrap();
        b.path_point(DefPoint::new(0, 0), None).unwrap();
        b.path_end().unwrap();
        b.wire_end().unwrap();
        b.end(&mut s).unwrap();
        let net = s.block.nets.get("n1").unwrap();
        assert_eq!(net.connections.len(), 1);
        assert_eq!(net.wires.len(), 1);
        assert_eq!(net.wires[0].wire_type, WireType::Fixed);
    }
}
