// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! PINS
//!
//! Pin shapes are given relative to the pin placement. They are kept local
//! while the pin is open and moved into block coordinates at `end`.

use super::{impl_builder, BuilderBase, Session, Slot};
use crate::db::{BPin, BTerm, IoType, Orient, PinBox, PlacementStatus, SigType};
use crate::def::{DefPoint, DefRect};
use crate::error::ProtocolError;

const NAME: &str = "pin";

struct Sensitivity {
    pin: String,
    supply: Option<String>,
    ground: Option<String>,
}

pub struct PinBuilder {
    base: BuilderBase,
    pin: Slot<(BTerm, BPin)>,
    pending: Vec<Sensitivity>,
    pub bterm_cnt: u32,
}

impl Default for PinBuilder {
    fn default() -> Self {
        Self {
            base: BuilderBase::default(),
            pin: Slot::new(NAME),
            pending: Vec::new(),
            bterm_cnt: 0,
        }
    }
}

impl_builder!(PinBuilder);

impl PinBuilder {
    fn reset_state(&mut self) {
        self.pin.abandon();
        self.pending.clear();
        self.bterm_cnt = 0;
    }

    fn term(&mut self, call: &'static str) -> Result<Option<&mut BTerm>, ProtocolError> {
        Ok(self.pin.draft(call)?.map(|(term, _)| term))
    }

    pub fn pins_begin(&mut self) {
        self.pending.clear();
    }

    /// Resolve SUPPLYSENSITIVITY and GROUNDSENSITIVITY now that every pin
    /// of the section exists
    pub fn pins_end(&mut self, s: &mut Session<'_>) -> Result<(), ProtocolError> {
        if self.pin.is_open() {
            return Err(ProtocolError::OutOfOrder {
                builder: NAME,
                call: "pins_end",
                requires: "end",
            });
        }
        for item in std::mem::take(&mut self.pending) {
            for (kind, target) in [("supply", &item.supply), ("ground", &item.ground)] {
                let Some(target) = target else { continue };
                if !s.block.bterms.contains(target) {
                    self.base.error(
                        s,
                        format!("Pin {target} in {kind} sensitivity of pin {} not found", item.pin),
                    );
                    continue;
                }
                if let Some(term) = s.block.bterms.get_mut(&item.pin) {
                    match kind {
                        "supply" => term.supply_pin = Some(target.clone()),
                        _ => term.ground_pin = Some(target.clone()),
                    }
                }
            }
        }
        Ok(())
    }

    pub fn begin(&mut self, s: &mut Session<'_>, name: &str, net: &str) -> Result<(), ProtocolError> {
        if s.block.bterms.contains(name) {
            self.base.error(s, format!("Pin {name} already exists"));
            return self.pin.begin_discarded();
        }
        self.pin.begin((
            BTerm {
                name: name.to_string(),
                net: net.to_string(),
                ..Default::default()
            },
            BPin::default(),
        ))
    }

    pub fn special(&mut self) -> Result<(), ProtocolError> {
        if let Some(term) = self.term("special")? {
            term.special = true;
        }
        Ok(())
    }

    pub fn use_(&mut self, sig_type: SigType) -> Result<(), ProtocolError> {
        if let Some(term) = self.term("use")? {
            term.sig_type = Some(sig_type);
        }
        Ok(())
    }

    pub fn direction(&mut self, io_type: IoType) -> Result<(), ProtocolError> {
        if let Some(term) = self.term("direction")? {
            term.io_type = Some(io_type);
        }
        Ok(())
    }

    pub fn supply_pin(&mut self, pin: &str) -> Result<(), ProtocolError> {
        self.sensitivity("supply_pin", Some(pin), None)
    }

    pub fn ground_pin(&mut self, pin: &str) -> Result<(), ProtocolError> {
        self.sensitivity("ground_pin", None, Some(pin))
    }

    fn sensitivity(
        &mut self,
        call: &'static str,
        supply: Option<&str>,
        ground: Option<&str>,
    ) -> Result<(), ProtocolError> {
        let Some(term) = self.term(call)? else {
            return Ok(());
        };
        let name = term.name.clone();
        let idx = match self.pending.iter().position(|p| p.pin == name) {
            Some(idx) => idx,
            None => {
                self.pending.push(Sensitivity {
                    pin: name,
                    supply: None,
                    ground: None,
                });
                self.pending.len() - 1
            }
        };
        let entry = &mut self.pending[idx];
        if let Some(pin) = supply {
            entry.supply = Some(pin.to_string());
        }
        if let Some(pin) = ground {
            entry.ground = Some(pin.to_string());
        }
        Ok(())
    }

    /// Shape relative to the pin origin
    pub fn rect(&mut self, s: &mut Session<'_>, layer: &str, rect: &DefRect) -> Result<(), ProtocolError> {
        let Some((term, _)) = self.pin.draft("rect")? else {
            return Ok(());
        };
        if s.tech.find_layer(layer).is_none() {
            let msg = format!("Layer {layer} referenced by pin {} not found", term.name);
            self.pin.discard();
            self.base.error(s, msg);
            return Ok(());
        }
        let rect = self.base.rect(rect);
        if let Some((_, bpin)) = self.pin.draft("rect")? {
            bpin.boxes.push(PinBox {
                layer: layer.to_string(),
                rect,
                min_spacing: None,
                effective_width: None,
            });
        }
        Ok(())
    }

    fn last_box(&mut self, call: &'static str) -> Result<Option<&mut PinBox>, ProtocolError> {
        let Some((_, bpin)) = self.pin.draft(call)? else {
            return Ok(None);
        };
        match bpin.boxes.last_mut() {
            Some(b) => Ok(Some(b)),
            None => Err(ProtocolError::OutOfOrder {
                builder: NAME,
                call,
                requires: "rect",
            }),
        }
    }

    /// SPACING of the last layer shape
    pub fn min_spacing(&mut self, spacing: i32) -> Result<(), ProtocolError> {
        let v = self.base.dbdist(spacing);
        if let Some(b) = self.last_box("min_spacing")? {
            b.min_spacing = Some(v);
        }
        Ok(())
    }

    /// DESIGNRULEWIDTH of the last layer shape
    pub fn effective_width(&mut self, width: i32) -> Result<(), ProtocolError> {
        let v = self.base.dbdist(width);
        if let Some(b) = self.last_box("effective_width")? {
            b.effective_width = Some(v);
        }
        Ok(())
    }

    pub fn placement(
        &mut self,
        status: PlacementStatus,
        at: DefPoint,
        orient: Orient,
    ) -> Result<(), ProtocolError> {
        let location = self.base.point(at);
        if let Some((_, bpin)) = self.pin.draft("placement")? {
            bpin.status = status;
            bpin.location = location;
            bpin.orient = orient;
        }
        Ok(())
    }

    pub fn end(&mut self, s: &mut Session<'_>) -> Result<(), ProtocolError> {
        let Some((mut term, mut bpin)) = self.pin.finish()? else {
            return Ok(());
        };
        for b in &mut bpin.boxes {
            b.rect = b.rect.place(bpin.orient, bpin.location);
        }
        if !bpin.boxes.is_empty() || bpin.status != PlacementStatus::None {
            term.pins.push(bpin);
        }
        self.bterm_cnt += 1;
        let _ = s.block.bterms.insert(term);
        Ok(())
    }

    pub fn abandon(&mut self) {
        self.pin.abandon();
    }
}

impl crate::def::props::PropertySink for PinBuilder {
    fn set_property(&mut self, name: &str, value: crate::db::PropValue) -> Result<(), ProtocolError> {
        if let Some(term) = self.term("property")? {
            term.properties.insert(name.to_string(), value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil;
    use super::super::Builder;
    use super::*;
    use crate::db::{Point, Rect};

    #[test]
    fn test_pin_shapes_follow_placement() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = PinBuilder::default();
        b.init(1000);
        b.set_units(1000, 1000.0);
        b.pins_begin();
        b.begin(&mut s, "in1", "n1").unwrap();
        b.direction(IoType::Input).unwrap();
        b.rect(&mut s, "M2", &DefRect::new(-10, 0, 10, 40)).unwrap();
        b.min_spacing(5).unwrap();
        b.placement(PlacementStatus::Placed, DefPoint::new(100, 0), Orient::R180)
            .unwrap();
        b.end(&mut s).unwrap();
        b.pins_end(&mut s).unwrap();

        let term = s.block.bterms.get("in1").unwrap();
        assert_eq!(term.net, "n1");
        assert_eq!(term.io_type, Some(IoType::Input));
        let bpin = &term.pins[0];
        assert_eq!(bpin.location, Point::new(100, 0));
        assert_eq!(bpin.boxes[0].rect, Rect::new(90, -40, 110, 0));
        assert_eq!(bpin.boxes[0].min_spacing, Some(5));
        assert_eq!(b.bterm_cnt, 1);
    }

    #[test]
    fn test_sensitivity_resolved_at_section_end() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = PinBuilder::default();
        b.init(1000);
        b.pins_begin();
        b.begin(&mut s, "a", "a").unwrap();
        b.supply_pin("vdd").unwrap();
        b.ground_pin("gnd").unwrap();
        b.end(&mut s).unwrap();
        b.begin(&mut s, "vdd", "VDD").unwrap();
        b.special().unwrap();
        b.end(&mut s).unwrap();
        b.pins_end(&mut s).unwrap();

        let term = s.block.bterms.get("a").unwrap();
        assert_eq!(term.supply_pin.as_deref(), Some("vdd"));
        assert_eq!(term.ground_pin, None);
        assert_eq!(b.errors(), 1);
    }

    #[test]
    fn test_spacing_requires_shape() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = PinBuilder::default();
        b.begin(&mut s, "a", "a").unwrap();
        assert!(matches!(
            b.min_spacing(1),
            Err(ProtocolError::OutOfOrder { requires: "rect", .. })
        ));
    }
}
