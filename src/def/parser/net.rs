// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! NETS statements and the routing-point grammar shared with SPECIALNETS

use log::debug;

use super::common::{properties, PropKinds, Tokens};
use crate::db::{SigType, SourceType, WireType};
use crate::def::{
    DefConnection, DefNet, DefNetRect, DefOrient, DefPath, DefPoint, DefPolygon, DefRect, DefWire,
    PathToken,
};
use crate::error::SourceError;
use crate::utils::EnumStr;

/// `( x y [ext] )` with `*` repeating the previous point's coordinate
fn routing_point(t: &mut Tokens<'_>, prev: &mut Option<DefPoint>) -> Result<PathToken, SourceError> {
    t.expect("(")?;
    let x = match t.eat("*") {
        true => prev.map(|p| p.x),
        false => Some(t.int("x coordinate")?),
    };
    let y = match t.eat("*") {
        true => prev.map(|p| p.y),
        false => Some(t.int("y coordinate")?),
    };
    let (Some(x), Some(y)) = (x, y) else {
        return Err(t.err("`*` in the first routing point"));
    };
    let ext = match t.at(")") {
        true => None,
        false => Some(t.int("extension")?),
    };
    t.expect(")")?;
    let p = DefPoint::new(x, y);
    *prev = Some(p);
    Ok(match ext {
        Some(ext) => PathToken::FlushPoint(p, ext),
        None => PathToken::Point(p),
    })
}

/// Points, vias, RECT and VIRTUAL elements up to `NEW`, `+` or the end
pub(super) fn routing_points(t: &mut Tokens<'_>, tokens: &mut Vec<PathToken>) -> Result<(), SourceError> {
    let mut prev = None;
    while let Some(word) = t.peek() {
        if t.at("+") || t.at("NEW") {
            break;
        }
        if word == "(" {
            tokens.push(routing_point(t, &mut prev)?);
        } else if t.eat("MASK") {
            let mask = t.int("MASK number")?;
            tokens.push(match t.at("(") || t.at("RECT") {
                true => PathToken::Mask(mask),
                false => PathToken::ViaMask(mask),
            });
        } else if t.eat("RECT") {
            t.expect("(")?;
            let dx1 = t.int("RECT delta")?;
            let dy1 = t.int("RECT delta")?;
            let dx2 = t.int("RECT delta")?;
            let dy2 = t.int("RECT delta")?;
            t.expect(")")?;
            tokens.push(PathToken::Rect(DefRect::new(dx1, dy1, dx2, dy2)));
        } else if t.eat("VIRTUAL") {
            let PathToken::Point(p) = routing_point(t, &mut prev)? else {
                return Err(t.err("VIRTUAL point with an extension"));
            };
            tokens.push(PathToken::VirtualPoint(p));
        } else {
            t.next();
            tokens.push(PathToken::Via(word.to_string()));
            if let Some(orient) = t.peek().and_then(DefOrient::from_str) {
                t.next();
                tokens.push(PathToken::ViaRotation(orient));
            }
        }
    }
    Ok(())
}

/// `layer [TAPER | TAPERRULE r] [STYLE n] points [NEW ...]`
fn regular_wire(t: &mut Tokens<'_>, wire_type: WireType) -> Result<DefWire, SourceError> {
    let mut wire = DefWire {
        wire_type,
        shield_net: None,
        paths: Vec::new(),
    };
    loop {
        let mut tokens = vec![PathToken::Layer(t.word("routing layer")?.to_string())];
        loop {
            if t.eat("TAPER") {
                tokens.push(PathToken::Taper);
            } else if t.eat("TAPERRULE") {
                tokens.push(PathToken::TaperRule(t.word("TAPERRULE name")?.to_string()));
            } else if t.eat("STYLE") {
                tokens.push(PathToken::Style(t.int("STYLE number")?));
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

/// Connections following the net name; `MUSTJOIN` marks them must-join
pub(super) fn connections(t: &mut Tokens<'_>, net: &mut DefNet) -> Result<(), SourceError> {
    let must_join = net.name.eq_ignore_ascii_case("MUSTJOIN");
    while t.eat("(") {
        let instance = t.word("connection component")?.to_string();
        let pin = t.word("connection pin")?.to_string();
        let mut synthesized = false;
        if t.eat("+") {
            t.expect("SYNTHESIZED")?;
            synthesized = true;
        }
        t.expect(")")?;
        net.connections.push(DefConnection {
            instance,
            pin,
            synthesized,
            must_join,
        });
    }
    Ok(())
}

/// Options shared by nets and special nets. `false` means unrecognized.
pub(super) fn common_option(
    t: &mut Tokens<'_>,
    kw: &str,
    net: &mut DefNet,
    kinds: &PropKinds,
    owner: &str,
) -> Result<bool, SourceError> {
    match kw {
        "SOURCE" => net.source = Some(t.enum_value::<SourceType>("SOURCE type")?),
        "USE" => net.use_ = Some(t.enum_value::<SigType>("USE")?),
        "FIXEDBUMP" => net.fixed_bump = true,
        "WEIGHT" => net.weight = Some(t.int("WEIGHT")?),
        "ORIGINAL" => net.original = Some(t.word("ORIGINAL net")?.to_string()),
        "PATTERN" => net.pattern = Some(t.word("PATTERN")?.to_string()),
        "ESTCAP" => net.est_cap = Some(t.float("ESTCAP")?),
        "PROPERTY" => properties(t, kinds, owner, &mut net.properties)?,
        _ => return Ok(false),
    }
    Ok(true)
}

/// `- netName ( comp pin ) ... [+ option ...]`
pub fn net(t: &mut Tokens<'_>, kinds: &PropKinds) -> Result<DefNet, SourceError> {
    t.expect("-")?;
    let mut net = DefNet {
        name: t.word("net name")?.to_string(),
        ..Default::default()
    };
    connections(t, &mut net)?;

    while !t.is_done() {
        t.expect("+")?;
        let kw = t.keyword("net option")?;
        if common_option(t, &kw, &mut net, kinds, "NET")? {
            continue;
        }
        match kw.as_str() {
            "COVER" | "FIXED" | "ROUTED" | "NOSHIELD" => {
                let wire_type = WireType::from_str(&kw)
                    .ok_or_else(|| t.err(format!("Unknown wire type {kw}")))?;
                net.wires.push(regular_wire(t, wire_type)?);
            }
            "SHIELDNET" => net.shield_nets.push(t.word("SHIELDNET name")?.to_string()),
            "VPIN" => {
                net.vpins.push(t.word("VPIN name")?.to_string());
                t.skip_option();
            }
            "SUBNET" => {
                net.subnets.push(t.word("SUBNET name")?.to_string());
                t.skip_option();
            }
            "XTALK" => net.xtalk = Some(t.int("XTALK")?),
            "FREQUENCY" => net.frequency = Some(t.float("FREQUENCY")?),
            "NONDEFAULTRULE" => {
                net.non_default_rule = Some(t.word("NONDEFAULTRULE name")?.to_string())
            }
            "RECT" => {
                let layer = t.word("RECT layer")?.to_string();
                let rect = t.rect()?;
                net.rects.push(DefNetRect {
                    layer,
                    rect,
                    wire_type: WireType::Routed,
                    shape: None,
                    shield_net: None,
                    mask: 0,
                });
            }
            "POLYGON" => {
                let layer = t.word("POLYGON layer")?.to_string();
                let points = t.points()?;
                net.polygons.push(DefPolygon { layer, points });
            }
            "VIA" => {
                net.via_specs.push(t.word("VIA name")?.to_string());
                t.skip_option();
            }
            _ => {
                debug!("skipping net option {kw} on {}", net.name);
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

    fn parse(text: &str) -> DefNet {
        let mut t = Tokens::new(tokenize(text).unwrap(), (1, 1));
        net(&mut t, &PropKinds::new()).unwrap()
    }

    #[test]
    fn test_connections_and_routing() {
        let n = parse(
            "- n1 ( u1 A ) ( PIN n1 ) + USE CLOCK \
             + ROUTED M1 ( 0 0 ) ( 100 * ) VIA12 ( * 200 5 ) NEW M2 TAPER ( 100 200 ) ( 100 400 )",
        );
        assert_eq!(n.connections.len(), 2);
        assert_eq!(n.connections[1].instance, "PIN");
        assert_eq!(n.use_, Some(SigType::Clock));
        let wire = &n.wires[0];
        assert_eq!(wire.wire_type, WireType::Routed);
        assert_eq!(wire.paths.len(), 2);
        assert_eq!(
            wire.paths[0].tokens,
            vec![
                PathToken::Layer("M1".into()),
                PathToken::Point(DefPoint::new(0, 0)),
                PathToken::Point(DefPoint::new(100, 0)),
                PathToken::Via("VIA12".into()),
                PathToken::FlushPoint(DefPoint::new(100, 200), 5),
            ]
        );
        assert_eq!(wire.paths[1].tokens[1], PathToken::Taper);
    }

    #[test]
    fn test_rotated_via_rect_and_virtual() {
        let n = parse(
            "- n2 + ROUTED M1 ( 500 500 ) RECT ( -70 -100 70 100 ) \
             NEW M1 ( 0 0 ) VIA12 FS VIRTUAL ( 10 10 ) MASK 2 ( 20 10 )",
        );
        let paths = &n.wires[0].paths;
        assert_eq!(paths[0].tokens[2], PathToken::Rect(DefRect::new(-70, -100, 70, 100)));
        assert_eq!(paths[1].tokens[3], PathToken::ViaRotation(DefOrient::FS));
        assert_eq!(
            paths[1].tokens[4],
            PathToken::VirtualPoint(DefPoint::new(10, 10))
        );
        assert_eq!(paths[1].tokens[5], PathToken::Mask(2));
    }

    #[test]
    fn test_mustjoin_and_synthesized() {
        let n = parse("- MUSTJOIN ( u1 A + SYNTHESIZED )");
        assert!(n.connections[0].must_join);
        assert!(n.connections[0].synthesized);
    }

    #[test]
    fn test_star_in_first_point_is_error() {
        let mut t = Tokens::new(tokenize("- n + ROUTED M1 ( * 0 )").unwrap(), (2, 2));
        assert!(net(&mut t, &PropKinds::new()).is_err());
    }

    #[test]
    fn test_multiple_wires_and_rule() {
        let n = parse("- n3 + NONDEFAULTRULE WIDE + FIXED M1 ( 0 0 ) ( 0 10 ) + ROUTED M2 ( 0 0 ) ( 10 0 )");
        assert_eq!(n.non_default_rule.as_deref(), Some("WIDE"));
        assert_eq!(n.wires.len(), 2);
        assert_eq!(n.wires[0].wire_type, WireType::Fixed);
    }
}
