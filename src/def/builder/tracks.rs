// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use super::{impl_builder, BuilderBase, Session, Slot};
use crate::db::GridPattern;
use crate::def::DefAxis;
use crate::error::ProtocolError;

struct TrackDraft {
    axis: DefAxis,
    pattern: GridPattern,
    layers: Vec<String>,
}

/// One TRACKS statement, applied to each of its layers
pub struct TracksBuilder {
    base: BuilderBase,
    track: Slot<TrackDraft>,
}

impl Default for TracksBuilder {
    fn default() -> Self {
        Self {
            base: BuilderBase::default(),
            track: Slot::new("tracks"),
        }
    }
}

impl_builder!(TracksBuilder);

impl TracksBuilder {
    fn reset_state(&mut self) {
        self.track.abandon();
    }

    pub fn begin(&mut self, axis: DefAxis, start: i32, count: i32, step: i32) -> Result<(), ProtocolError> {
        self.track.begin(TrackDraft {
            axis,
            pattern: GridPattern {
                origin: self.base.dbdist(start),
                count,
                step: self.base.dbdist(step),
            },
            layers: Vec::new(),
        })
    }

    pub fn layer(&mut self, s: &mut Session<'_>, layer: &str) -> Result<(), ProtocolError> {
        let Some(track) = self.track.draft("layer")? else {
            return Ok(());
        };
        if s.tech.find_layer(layer).is_none() {
            self.track.discard();
            self.base
                .error(s, format!("Layer {layer} referenced by tracks not found"));
            return Ok(());
        }
        track.layers.push(layer.to_string());
        Ok(())
    }

    pub fn end(&mut self, s: &mut Session<'_>) -> Result<(), ProtocolError> {
        let Some(track) = self.track.finish()? else {
            return Ok(());
        };
        for layer in &track.layers {
            let grid = s.block.track_grid_mut(layer);
            match track.axis {
                DefAxis::X => grid.x.push(track.pattern),
                DefAxis::Y => grid.y.push(track.pattern),
            }
        }
        Ok(())
    }

    pub fn abandon(&mut self) {
        self.track.abandon();
    }
}
