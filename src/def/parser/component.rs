// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! COMPONENTS and COMPONENTMASKSHIFT statements

use log::debug;

use super::common::{placement, properties, PropKinds, Tokens};
use crate::db::SourceType;
use crate::def::{DefComponent, DefPlacementStatus, DefRect};
use crate::error::SourceError;
use crate::utils::EnumStr;

/// `- compName modelName [+ option ...]`
pub fn component(t: &mut Tokens<'_>, kinds: &PropKinds) -> Result<DefComponent, SourceError> {
    t.expect("-")?;
    let mut c = DefComponent {
        id: t.word("component name")?.to_string(),
        master: t.word("component master")?.to_string(),
        ..Default::default()
    };

    while !t.is_done() {
        t.expect("+")?;
        let kw = t.keyword("component option")?;
        match kw.as_str() {
            "EEQMASTER" => c.eeq_master = Some(t.word("EEQMASTER name")?.to_string()),
            "SOURCE" => c.source = Some(t.enum_value::<SourceType>("SOURCE type")?),
            "FIXED" | "PLACED" | "COVER" | "UNPLACED" => {
                let status = DefPlacementStatus::from_str(&kw)
                    .ok_or_else(|| t.err(format!("Unknown placement status {kw}")))?;
                c.placement = Some(placement(t, status)?);
            }
            "MASKSHIFT" => {
                let masks = t.word("MASKSHIFT value")?;
                c.mask_shift = masks
                    .chars()
                    .filter_map(|ch| ch.to_digit(10))
                    .map(|d| d as i32)
                    .collect();
            }
            "HALO" => {
                let _ = t.eat("SOFT");
                let left = t.int("HALO left")?;
                let bottom = t.int("HALO bottom")?;
                let right = t.int("HALO right")?;
                let top = t.int("HALO top")?;
                c.halo = Some(DefRect::new(left, bottom, right, top));
            }
            "ROUTEHALO" => {
                let dist = t.int("ROUTEHALO distance")?;
                let min_layer = t.word("ROUTEHALO min layer")?.to_string();
                let max_layer = t.word("ROUTEHALO max layer")?.to_string();
                c.route_halo = Some((dist, min_layer, max_layer));
            }
            "WEIGHT" => c.weight = Some(t.int("WEIGHT")?),
            "REGION" => c.region = Some(t.word("REGION name")?.to_string()),
            "PROPERTY" => properties(t, kinds, "COMPONENT", &mut c.properties)?,
            _ => {
                debug!("skipping component option {kw} on {}", c.id);
                t.skip_option();
            }
        }
    }
    Ok(c)
}

/// `COMPONENTMASKSHIFT layer ...`
pub fn mask_shift(t: &mut Tokens<'_>) -> Vec<String> {
    let mut layers = Vec::new();
    while let Some(layer) = t.next() {
        layers.push(layer.to_string());
    }
    layers
}
