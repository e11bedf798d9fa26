// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use super::{impl_builder, BuilderBase, Session, Slot};
use crate::db::{Fill, Polygon, Shape};
use crate::def::translate::translate_points;
use crate::def::{DefPoint, DefRect};
use crate::error::ProtocolError;

/// FILLS on one layer
pub struct FillBuilder {
    base: BuilderBase,
    fill: Slot<Fill>,
    pub fill_cnt: u32,
}

impl Default for FillBuilder {
    fn default() -> Self {
        Self {
            base: BuilderBase::default(),
            fill: Slot::new("fill"),
            fill_cnt: 0,
        }
    }
}

impl_builder!(FillBuilder);

impl FillBuilder {
    fn reset_state(&mut self) {
        self.fill.abandon();
        self.fill_cnt = 0;
    }

    pub fn begin(&mut self, s: &mut Session<'_>, layer: &str) -> Result<(), ProtocolError> {
        if s.tech.find_layer(layer).is_none() {
            self.base
                .error(s, format!("Layer {layer} referenced by fill not found"));
            return self.fill.begin_discarded();
        }
        self.fill.begin(Fill {
            layer: layer.to_string(),
            shapes: Vec::new(),
        })
    }

    pub fn rect(&mut self, rect: &DefRect) -> Result<(), ProtocolError> {
        let rect = self.base.rect(rect);
        if let Some(fill) = self.fill.draft("rect")? {
            fill.shapes.push(Shape::Rect(rect));
        }
        Ok(())
    }

    pub fn polygon(&mut self, points: &[DefPoint]) -> Result<(), ProtocolError> {
        let points = translate_points(points, &self.base.scale);
        if let Some(fill) = self.fill.draft("polygon")? {
            fill.shapes.push(Shape::Polygon(Polygon { points }));
        }
        Ok(())
    }

    pub fn end(&mut self, s: &mut Session<'_>) -> Result<(), ProtocolError> {
        if let Some(fill) = self.fill.finish()? {
            self.fill_cnt += 1;
            s.block.fills.push(fill);
        }
        Ok(())
    }

    pub fn abandon(&mut self) {
        self.fill.abandon();
    }
}
