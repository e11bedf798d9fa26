// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! BLOCKAGES, routing (`LAYER`) and placement

use super::{impl_builder, BuilderBase, Session, Slot};
use crate::db::{Obstruction, PlacementBlockage, Polygon, Shape};
use crate::def::translate::translate_points;
use crate::def::{DefPoint, DefRect};
use crate::error::ProtocolError;

const NAME: &str = "blockage";

enum Draft {
    Routing(Obstruction),
    Placement(PlacementBlockage),
}

pub struct BlockageBuilder {
    base: BuilderBase,
    blockage: Slot<Draft>,
    pub routing_cnt: u32,
    pub placement_cnt: u32,
}

impl Default for BlockageBuilder {
    fn default() -> Self {
        Self {
            base: BuilderBase::default(),
            blockage: Slot::new(NAME),
            routing_cnt: 0,
            placement_cnt: 0,
        }
    }
}

impl_builder!(BlockageBuilder);

impl BlockageBuilder {
    fn reset_state(&mut self) {
        self.blockage.abandon();
        self.routing_cnt = 0;
        self.placement_cnt = 0;
    }

    fn routing(&mut self, call: &'static str) -> Result<Option<&mut Obstruction>, ProtocolError> {
        match self.blockage.draft(call)? {
            None => Ok(None),
            Some(Draft::Routing(o)) => Ok(Some(o)),
            Some(Draft::Placement(_)) => Err(ProtocolError::OutOfOrder {
                builder: NAME,
                call,
                requires: "routing_begin",
            }),
        }
    }

    pub fn routing_begin(&mut self, s: &mut Session<'_>, layer: &str) -> Result<(), ProtocolError> {
        if s.tech.find_layer(layer).is_none() {
            self.base
                .error(s, format!("Layer {layer} referenced by blockage not found"));
            return self.blockage.begin_discarded();
        }
        self.blockage.begin(Draft::Routing(Obstruction {
            layer: layer.to_string(),
            ..Default::default()
        }))
    }

    pub fn placement_begin(&mut self) -> Result<(), ProtocolError> {
        self.blockage
            .begin(Draft::Placement(PlacementBlockage::default()))
    }

    pub fn slots(&mut self) -> Result<(), ProtocolError> {
        if let Some(o) = self.routing("slots")? {
            o.slots = true;
        }
        Ok(())
    }

    pub fn fills(&mut self) -> Result<(), ProtocolError> {
        if let Some(o) = self.routing("fills")? {
            o.fills = true;
        }
        Ok(())
    }

    pub fn spacing(&mut self, spacing: i32) -> Result<(), ProtocolError> {
        let v = self.base.dbdist(spacing);
        if let Some(o) = self.routing("spacing")? {
            o.min_spacing = Some(v);
        }
        Ok(())
    }

    pub fn design_rule_width(&mut self, width: i32) -> Result<(), ProtocolError> {
        let v = self.base.dbdist(width);
        if let Some(o) = self.routing("design_rule_width")? {
            o.effective_width = Some(v);
        }
        Ok(())
    }

    pub fn polygon(&mut self, points: &[DefPoint]) -> Result<(), ProtocolError> {
        let points = translate_points(points, &self.base.scale);
        if let Some(o) = self.routing("polygon")? {
            o.shapes.push(Shape::Polygon(Polygon { points }));
        }
        Ok(())
    }

    pub fn pushdown(&mut self) -> Result<(), ProtocolError> {
        match self.blockage.draft("pushdown")? {
            Some(Draft::Routing(o)) => o.pushdown = true,
            Some(Draft::Placement(p)) => p.pushdown = true,
            None => {}
        }
        Ok(())
    }

    pub fn component(&mut self, s: &mut Session<'_>, inst: &str) -> Result<(), ProtocolError> {
        if self.blockage.draft("component")?.is_none() {
            return Ok(());
        }
        if !s.block.insts.contains(inst) {
            self.blockage.discard();
            self.base
                .error(s, format!("Component {inst} referenced by blockage not found"));
            return Ok(());
        }
        match self.blockage.draft("component")? {
            Some(Draft::Routing(o)) => o.component = Some(inst.to_string()),
            Some(Draft::Placement(p)) => p.component = Some(inst.to_string()),
            None => {}
        }
        Ok(())
    }

    pub fn rect(&mut self, rect: &DefRect) -> Result<(), ProtocolError> {
        let rect = self.base.rect(rect);
        match self.blockage.draft("rect")? {
            Some(Draft::Routing(o)) => o.shapes.push(Shape::Rect(rect)),
            Some(Draft::Placement(p)) => p.rects.push(rect),
            None => {}
        }
        Ok(())
    }

    pub fn end(&mut self, s: &mut Session<'_>) -> Result<(), ProtocolError> {
        match self.blockage.finish()? {
            Some(Draft::Routing(o)) => {
                self.routing_cnt += 1;
                s.block.obstructions.push(o);
            }
            Some(Draft::Placement(p)) => {
                self.placement_cnt += 1;
                s.block.placement_blockages.push(p);
            }
            None => {}
        }
        Ok(())
    }

    pub fn abandon(&mut self) {
        self.blockage.abandon();
    }
}
