// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! VIAS
//!
//! A via is either a list of layer rectangles or a generated via built
//! from a VIARULE. Nothing reaches the block until `end`, so a via that
//! failed layer validation leaves no partial state behind.

use super::{impl_builder, BuilderBase, Session, Slot};
use crate::db::{BlockVia, LayerRect, ViaParams};
use crate::def::{DefPoint, DefRect};
use crate::error::ProtocolError;

const NAME: &str = "via";

pub struct ViaBuilder {
    base: BuilderBase,
    via: Slot<BlockVia>,
    pub via_cnt: u32,
}

impl Default for ViaBuilder {
    fn default() -> Self {
        Self {
            base: BuilderBase::default(),
            via: Slot::new(NAME),
            via_cnt: 0,
        }
    }
}

impl_builder!(ViaBuilder);

impl ViaBuilder {
    fn reset_state(&mut self) {
        self.via.abandon();
        self.via_cnt = 0;
    }

    fn params(&mut self, call: &'static str) -> Result<Option<&mut ViaParams>, ProtocolError> {
        let Some(via) = self.via.draft(call)? else {
            return Ok(None);
        };
        match via.params.as_mut() {
            Some(p) => Ok(Some(p)),
            None => Err(ProtocolError::OutOfOrder {
                builder: NAME,
                call,
                requires: "rule",
            }),
        }
    }

    pub fn begin(&mut self, s: &mut Session<'_>, name: &str) -> Result<(), ProtocolError> {
        if s.block.vias.contains(name) {
            self.base.error(s, format!("Via {name} already exists"));
            return self.via.begin_discarded();
        }
        self.via.begin(BlockVia {
            name: name.to_string(),
            ..Default::default()
        })
    }

    pub fn rect(&mut self, s: &mut Session<'_>, layer: &str, rect: &DefRect) -> Result<(), ProtocolError> {
        let Some(via) = self.via.draft("rect")? else {
            return Ok(());
        };
        if s.tech.find_layer(layer).is_none() {
            let msg = format!("Layer {layer} referenced by via {} not found", via.name);
            self.via.discard();
            self.base.error(s, msg);
            return Ok(());
        }
        via.boxes.push(LayerRect {
            layer: layer.to_string(),
            rect: self.base.rect(rect),
        });
        Ok(())
    }

    /// Switch the via to generated form
    pub fn rule(&mut self, s: &mut Session<'_>, rule: &str) -> Result<(), ProtocolError> {
        let Some(via) = self.via.draft("rule")? else {
            return Ok(());
        };
        if !s.tech.has_via_rule(rule) {
            let msg = format!("Via rule {rule} referenced by via {} not found", via.name);
            self.via.discard();
            self.base.error(s, msg);
            return Ok(());
        }
        if via.params.is_some() {
            return Err(ProtocolError::FieldAlreadySet {
                builder: NAME,
                field: "rule",
            });
        }
        via.params = Some(ViaParams {
            rule: rule.to_string(),
            ..Default::default()
        });
        Ok(())
    }

    pub fn cut_size(&mut self, x: i32, y: i32) -> Result<(), ProtocolError> {
        let size = (self.base.dbdist(x), self.base.dbdist(y));
        if let Some(p) = self.params("cut_size")? {
            p.cut_size = size;
        }
        Ok(())
    }

    /// Bottom, cut and top layers. Returns `false` and discards the via when
    /// a layer is unknown or not of the kind its position requires.
    pub fn layers(
        &mut self,
        s: &mut Session<'_>,
        bottom: &str,
        cut: &str,
        top: &str,
    ) -> Result<bool, ProtocolError> {
        use crate::db::LayerKind;

        if self.params("layers")?.is_none() {
            return Ok(false);
        }
        let kind = |name: &str| s.tech.find_layer(name).map(|l| l.kind);
        let problem = match (kind(bottom), kind(cut), kind(top)) {
            (Some(b), Some(LayerKind::Cut), Some(t))
                if b != LayerKind::Cut && t != LayerKind::Cut =>
            {
                None
            }
            (None, _, _) => Some(format!("Layer {bottom} not found")),
            (_, None, _) => Some(format!("Layer {cut} not found")),
            (_, _, None) => Some(format!("Layer {top} not found")),
            _ => Some(format!(
                "Invalid layer order {bottom} {cut} {top} in generated via"
            )),
        };
        if let Some(msg) = problem {
            self.via.discard();
            self.base.error(s, msg);
            return Ok(false);
        }
        if let Some(p) = self.params("layers")? {
            p.bottom_layer = bottom.to_string();
            p.cut_layer = cut.to_string();
            p.top_layer = top.to_string();
        }
        Ok(true)
    }

    pub fn cut_spacing(&mut self, x: i32, y: i32) -> Result<(), ProtocolError> {
        let v = (self.base.dbdist(x), self.base.dbdist(y));
        if let Some(p) = self.params("cut_spacing")? {
            p.cut_spacing = v;
        }
        Ok(())
    }

    pub fn enclosure(&mut self, bottom: (i32, i32), top: (i32, i32)) -> Result<(), ProtocolError> {
        let b = (self.base.dbdist(bottom.0), self.base.dbdist(bottom.1));
        let t = (self.base.dbdist(top.0), self.base.dbdist(top.1));
        if let Some(p) = self.params("enclosure")? {
            p.bottom_enclosure = b;
            p.top_enclosure = t;
        }
        Ok(())
    }

    pub fn rows_cols(&mut self, rows: i32, cols: i32) -> Result<(), ProtocolError> {
        if let Some(p) = self.params("rows_cols")? {
            p.rows_cols = Some((rows, cols));
        }
        Ok(())
    }

    pub fn origin(&mut self, at: DefPoint) -> Result<(), ProtocolError> {
        let at = self.base.point(at);
        if let Some(p) = self.params("origin")? {
            p.origin = Some(at);
        }
        Ok(())
    }

    /// OFFSET xBot yBot xTop yTop
    pub fn offset(&mut self, offset: &DefRect) -> Result<(), ProtocolError> {
        let bottom = self.base.point(DefPoint::new(offset.xl, offset.yl));
        let top = self.base.point(DefPoint::new(offset.xh, offset.yh));
        if let Some(p) = self.params("offset")? {
            p.bottom_offset = Some(bottom);
            p.top_offset = Some(top);
        }
        Ok(())
    }

    pub fn pattern(&mut self, pattern: &str) -> Result<(), ProtocolError> {
        if let Some(p) = self.params("pattern")? {
            p.pattern = Some(pattern.to_string());
        }
        Ok(())
    }

    pub fn end(&mut self, s: &mut Session<'_>) -> Result<(), ProtocolError> {
        if let Some(via) = self.via.finish()? {
            self.via_cnt += 1;
            let _ = s.block.vias.insert(via);
        }
        Ok(())
    }

    pub fn abandon(&mut self) {
        self.via.abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil;
    use super::super::Builder;
    use super::*;
    use crate::db::{Point, Rect};

    #[test]
    fn test_rect_via() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = ViaBuilder::default();
        b.init(1000);
        b.set_units(1000, 1000.0);
        b.begin(&mut s, "V_A").unwrap();
        b.rect(&mut s, "M1", &DefRect::new(-50, -50, 50, 50)).unwrap();
        b.rect(&mut s, "M2", &DefRect::new(-60, -60, 60, 60)).unwrap();
        b.end(&mut s).unwrap();
        let via = s.block.vias.get("V_A").unwrap();
        assert_eq!(via.boxes[1].rect, Rect::new(-60, -60, 60, 60));
        assert_eq!(b.via_cnt, 1);
    }

    #[test]
    fn test_generated_via() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = ViaBuilder::default();
        b.init(1000);
        b.set_units(1000, 1000.0);
        b.begin(&mut s, "V_G").unwrap();
        b.rule(&mut s, "VIAGEN12").unwrap();
        b.cut_size(70, 70).unwrap();
        assert!(b.layers(&mut s, "M1", "V1", "M2").unwrap());
        b.origin(DefPoint::new(5, 5)).unwrap();
        b.end(&mut s).unwrap();
        let params = s.block.vias.get("V_G").unwrap().params.clone().unwrap();
        assert_eq!(params.cut_size, (70, 70));
        assert_eq!(params.cut_layer, "V1");
        assert_eq!(params.origin, Some(Point::new(5, 5)));
    }

    #[test]
    fn test_bad_layer_order_leaves_nothing() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = ViaBuilder::default();
        b.init(1000);
        b.begin(&mut s, "V_G").unwrap();
        b.rule(&mut s, "VIAGEN12").unwrap();
        b.cut_size(70, 70).unwrap();
        assert!(!b.layers(&mut s, "V1", "M1", "M2").unwrap());
        b.cut_spacing(80, 80).unwrap();
        b.end(&mut s).unwrap();
        assert!(s.block.vias.is_empty());
        assert_eq!(b.errors(), 1);
    }

    #[test]
    fn test_params_require_rule() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = ViaBuilder::default();
        b.begin(&mut s, "V").unwrap();
        assert!(matches!(
            b.cut_size(1, 1),
            Err(ProtocolError::OutOfOrder { requires: "rule", .. })
        ));
    }
}
