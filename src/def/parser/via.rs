// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! VIAS and NONDEFAULTRULES statements

use log::debug;

use super::common::{properties, PropKinds, Tokens};
use crate::def::{
    DefNdrLayer, DefNonDefaultRule, DefPoint, DefPolygon, DefRect, DefVia, DefViaRect, DefViaRule,
};
use crate::error::SourceError;

/// Parameters of a generated via, collected in any order
#[derive(Debug, Default)]
struct RuleParams {
    name: Option<String>,
    cut_size: Option<(i32, i32)>,
    layers: Option<(String, String, String)>,
    cut_spacing: Option<(i32, i32)>,
    enclosure: Option<DefRect>,
    rows_cols: Option<(i32, i32)>,
    origin: Option<DefPoint>,
    offset: Option<DefRect>,
    pattern: Option<String>,
}

impl RuleParams {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cut_size.is_none()
            && self.layers.is_none()
            && self.cut_spacing.is_none()
            && self.enclosure.is_none()
    }

    fn build(self, t: &Tokens<'_>, via: &str) -> Result<DefViaRule, SourceError> {
        let name = self
            .name
            .ok_or_else(|| t.err(format!("Via {via} has generated-via parameters without VIARULE")))?;
        let Some((bottom_layer, cut_layer, top_layer)) = self.layers else {
            return Err(t.err(format!("Via {via} VIARULE {name} is missing LAYERS")));
        };
        let enclosure = self.enclosure.unwrap_or_default();
        Ok(DefViaRule {
            name,
            cut_size: self.cut_size.unwrap_or_default(),
            bottom_layer,
            cut_layer,
            top_layer,
            cut_spacing: self.cut_spacing.unwrap_or_default(),
            bottom_enclosure: (enclosure.xl, enclosure.yl),
            top_enclosure: (enclosure.xh, enclosure.yh),
            rows_cols: self.rows_cols,
            origin: self.origin,
            offset: self.offset,
            pattern: self.pattern,
        })
    }
}

fn pair(t: &mut Tokens<'_>, what: &str) -> Result<(i32, i32), SourceError> {
    Ok((t.int(what)?, t.int(what)?))
}

fn quad(t: &mut Tokens<'_>, what: &str) -> Result<DefRect, SourceError> {
    let (xl, yl) = pair(t, what)?;
    let (xh, yh) = pair(t, what)?;
    Ok(DefRect::new(xl, yl, xh, yh))
}

fn shape_mask(t: &mut Tokens<'_>) -> Result<i32, SourceError> {
    if t.at_option("MASK") {
        t.next();
        t.next();
        return t.int("MASK number");
    }
    Ok(0)
}

/// `- viaName [+ VIARULE ... | + RECT ... | + POLYGON ...]`
pub fn via(t: &mut Tokens<'_>) -> Result<DefVia, SourceError> {
    t.expect("-")?;
    let mut via = DefVia {
        name: t.word("via name")?.to_string(),
        ..Default::default()
    };
    let mut params = RuleParams::default();

    while !t.is_done() {
        t.expect("+")?;
        let kw = t.keyword("via option")?;
        match kw.as_str() {
            "RECT" => {
                let layer = t.word("RECT layer")?.to_string();
                let mask = shape_mask(t)?;
                let rect = t.rect()?;
                via.rects.push(DefViaRect { layer, mask, rect });
            }
            "POLYGON" => {
                let layer = t.word("POLYGON layer")?.to_string();
                let _ = shape_mask(t)?;
                let points = t.points()?;
                via.polygons.push(DefPolygon { layer, points });
            }
            "VIARULE" => params.name = Some(t.word("VIARULE name")?.to_string()),
            "CUTSIZE" => params.cut_size = Some(pair(t, "CUTSIZE")?),
            "LAYERS" => {
                let bottom = t.word("bottom layer")?.to_string();
                let cut = t.word("cut layer")?.to_string();
                let top = t.word("top layer")?.to_string();
                params.layers = Some((bottom, cut, top));
            }
            "CUTSPACING" => params.cut_spacing = Some(pair(t, "CUTSPACING")?),
            "ENCLOSURE" => params.enclosure = Some(quad(t, "ENCLOSURE")?),
            "ROWCOL" => params.rows_cols = Some(pair(t, "ROWCOL")?),
            "ORIGIN" => {
                let (x, y) = pair(t, "ORIGIN")?;
                params.origin = Some(DefPoint::new(x, y));
            }
            "OFFSET" => params.offset = Some(quad(t, "OFFSET")?),
            "PATTERN" => params.pattern = Some(t.word("PATTERN")?.to_string()),
            _ => {
                debug!("skipping via option {kw} on {}", via.name);
                t.skip_option();
            }
        }
    }
    if !params.is_empty() {
        via.rule = Some(params.build(t, &via.name)?);
    }
    Ok(via)
}

/// `- ruleName [+ HARDSPACING] [+ LAYER ...] [+ VIA v] [+ VIARULE r] [+ MINCUTS l n]`
pub fn non_default_rule(t: &mut Tokens<'_>, kinds: &PropKinds) -> Result<DefNonDefaultRule, SourceError> {
    t.expect("-")?;
    let mut rule = DefNonDefaultRule {
        name: t.word("non-default rule name")?.to_string(),
        ..Default::default()
    };

    while !t.is_done() {
        t.expect("+")?;
        let kw = t.keyword("non-default rule option")?;
        match kw.as_str() {
            "HARDSPACING" => rule.hard_spacing = true,
            "LAYER" => {
                let mut layer = DefNdrLayer {
                    name: t.word("LAYER name")?.to_string(),
                    ..Default::default()
                };
                t.expect("WIDTH")?;
                layer.width = t.int("WIDTH")?;
                loop {
                    if t.eat("DIAGWIDTH") {
                        layer.diag_width = Some(t.int("DIAGWIDTH")?);
                    } else if t.eat("SPACING") {
                        layer.spacing = Some(t.int("SPACING")?);
                    } else if t.eat("WIREEXT") {
                        layer.wire_ext = Some(t.int("WIREEXT")?);
                    } else {
                        break;
                    }
                }
                rule.layers.push(layer);
            }
            "VIA" => rule.vias.push(t.word("VIA name")?.to_string()),
            "VIARULE" => rule.via_rules.push(t.word("VIARULE name")?.to_string()),
            "MINCUTS" => {
                let layer = t.word("MINCUTS layer")?.to_string();
                rule.min_cuts.push((layer, t.int("MINCUTS count")?));
            }
            "PROPERTY" => properties(t, kinds, "NONDEFAULTRULE", &mut rule.properties)?,
            _ => {
                debug!("skipping non-default rule option {kw} on {}", rule.name);
                t.skip_option();
            }
        }
    }
    Ok(rule)
}
