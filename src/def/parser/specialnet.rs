// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! SPECIALNETS statements
//!
//! A wire status keyword either starts routing (`layer width ...`) or
//! qualifies the `RECT`, `POLYGON` and `VIA` shapes that follow it, as do
//! `SHAPE` and `MASK` options given in between.

use log::debug;

use super::common::{PropKinds, Tokens};
use super::net::{common_option, connections, routing_points};
use crate::db::{WireShape, WireType};
use crate::def::{DefNet, DefNetRect, DefPath, DefPolygon, DefWire, PathToken};
use crate::error::SourceError;
use crate::utils::EnumStr;

/// Status, shield and shape that apply to the following shapes
#[derive(Debug, Default)]
struct ShapeContext {
    wire_type: Option<WireType>,
    shield_net: Option<String>,
    shape: Option<WireShape>,
    mask: i32,
}

/// `layer width [+ SHAPE s] [+ MASK n] [+ STYLE n] points [NEW ...]`
fn special_wire(
    t: &mut Tokens<'_>,
    wire_type: WireType,
    shield_net: Option<String>,
) -> Result<DefWire, SourceError> {
    let mut wire = DefWire {
        wire_type,
        shield_net,
        paths: Vec::new(),
    };
    loop {
        let mut tokens = vec![PathToken::Layer(t.word("routing layer")?.to_string())];
        if !t.at("(") && !t.at("+") {
            tokens.push(PathToken::Width(t.int("route width")?));
        }
        loop {
            if t.at_option("SHAPE") {
                t.next();
                t.next();
                tokens.push(PathToken::Shape(t.enum_value::<WireShape>("SHAPE")?));
            } else if t.at_option("STYLE") {
                t.next();
                t.next();
                tokens.push(PathToken::Style(t.int("STYLE number")?));
            } else if t.at_option("MASK") {
                t.next();
                t.next();
                tokens.push(PathToken::Mask(t.int("MASK number")?));
            } else {
                break;
            }
        }
        routing_points(t, &mut tokens)?;
        wire.paths.push(DefPath { tokens });
        if !t.eat("NEW") {
            return Ok(wire);
        }
    }
}

/// `- netName ( comp pin ) ... [+ option ...]`; `( * pin )` names every
/// component with that pin
pub fn special_net(t: &mut Tokens<'_>, kinds: &PropKinds) -> Result<DefNet, SourceError> {
    t.expect("-")?;
    let mut net = DefNet {
        name: t.word("special net name")?.to_string(),
        ..Default::default()
    };
    connections(t, &mut net)?;
    let mut ctx = ShapeContext::default();

    while !t.is_done() {
        t.expect("+")?;
        let kw = t.keyword("special net option")?;
        if common_option(t, &kw, &mut net, kinds, "SPECIALNET")? {
            continue;
        }
        match kw.as_str() {
            "COVER" | "FIXED" | "ROUTED" | "SHIELD" => {
                let wire_type = WireType::from_str(&kw)
                    .ok_or_else(|| t.err(format!("Unknown wire type {kw}")))?;
                let shield_net = match wire_type {
                    WireType::Shield => Some(t.word("SHIELD net")?.to_string()),
                    _ => None,
                };
                if t.is_done() || t.at("+") {
                    ctx = ShapeContext {
                        wire_type: Some(wire_type),
                        shield_net,
                        ..Default::default()
                    };
                } else {
                    net.wires.push(special_wire(t, wire_type, shield_net)?);
                }
            }
            "SHAPE" => ctx.shape = Some(t.enum_value::<WireShape>("SHAPE")?),
            "MASK" => ctx.mask = t.int("MASK number")?,
            "RECT" => {
                let layer = t.word("RECT layer")?.to_string();
                if t.at_option("MASK") {
                    t.next();
                    t.next();
                    ctx.mask = t.int("MASK number")?;
                }
                let rect = t.rect()?;
                net.rects.push(DefNetRect {
                    layer,
                    rect,
                    wire_type: ctx.wire_type.unwrap_or(WireType::Routed),
                    shape: ctx.shape,
                    shield_net: ctx.shield_net.clone(),
                    mask: ctx.mask,
                });
            }
            "POLYGON" => {
                let layer = t.word("POLYGON layer")?.to_string();
                if t.at_option("MASK") {
                    t.next();
                    t.next();
                    let _ = t.int("MASK number")?;
                }
                let points = t.points()?;
                net.polygons.push(DefPolygon { layer, points });
            }
            "VIA" => {
                net.via_specs.push(t.word("VIA name")?.to_string());
                t.skip_option();
            }
            "VOLTAGE" => net.voltage = Some(t.float("VOLTAGE")?),
            "SHIELDNET" => net.shield_nets.push(t.word("SHIELDNET name")?.to_string()),
            _ => {
                debug!("skipping special net option {kw} on {}", net.name);
                t.skip_option();
            }
        }
    }
    Ok(net)
}

#[cfg(test)]
mod tests {
    use super::super::common::tokenize;
    use super::*;
    use crate::def::{DefPoint, DefRect};

    fn parse(text: &str) -> DefNet {
        let mut t = Tokens::new(tokenize(text).unwrap(), (1, 1));
        special_net(&mut t, &PropKinds::new()).unwrap()
    }

    #[test]
    fn test_routed_stripe_with_shape() {
        let n = parse(
            "- VDD ( * VDD ) + USE POWER \
             + ROUTED M1 200 + SHAPE STRIPE ( 0 0 ) ( 1000 * ) NEW M2 100 ( 0 0 ) VIA12 ( 0 500 )",
        );
        assert_eq!(n.connections[0].instance, "*");
        let wire = &n.wires[0];
        assert_eq!(wire.paths.len(), 2);
        assert_eq!(
            wire.paths[0].tokens,
            vec![
                PathToken::Layer("M1".into()),
                PathToken::Width(200),
                PathToken::Shape(WireShape::Stripe),
                PathToken::Point(DefPoint::new(0, 0)),
                PathToken::Point(DefPoint::new(1000, 0)),
            ]
        );
        assert_eq!(wire.paths[1].tokens[1], PathToken::Width(100));
    }

    #[test]
    fn test_rect_after_status_and_shape() {
        let n = parse("- VSS + FIXED + SHAPE RING + RECT M1 ( 0 0 ) ( 10 10 ) + VOLTAGE 1.1");
        assert!(n.wires.is_empty());
        let r = &n.rects[0];
        assert_eq!(r.wire_type, WireType::Fixed);
        assert_eq!(r.shape, Some(WireShape::Ring));
        assert_eq!(r.rect, DefRect::new(0, 0, 10, 10));
        assert_eq!(n.voltage, Some(1.1));
    }

    #[test]
    fn test_shield_wire() {
        let n = parse("- VSS + SHIELD sig1 M1 50 ( 0 0 ) ( 0 100 )");
        assert_eq!(n.wires[0].wire_type, WireType::Shield);
        assert_eq!(n.wires[0].shield_net.as_deref(), Some("sig1"));
    }

    #[test]
    fn test_path_without_width_keeps_layer_only() {
        let n = parse("- VDD + ROUTED M1 ( 0 0 ) ( 10 0 )");
        assert_eq!(n.wires[0].paths[0].tokens[1], PathToken::Point(DefPoint::new(0, 0)));
    }
}
