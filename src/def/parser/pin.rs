// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! PINS and PINPROPERTIES statements
//!
//! Shapes and placements given before any `+ PORT` belong to one implicit
//! port.

use log::debug;

use super::common::{placement, properties, PropKinds, Tokens};
use crate::db::{IoType, SigType};
use crate::def::{
    DefAntenna, DefPin, DefPinLayer, DefPinPort, DefPinProp, DefPinVia, DefPlacementStatus,
    DefPolygon,
};
use crate::error::SourceError;
use crate::utils::EnumStr;

/// Optional `MASK n` and `SPACING s | DESIGNRULEWIDTH w` of a pin shape
fn shape_rules(t: &mut Tokens<'_>) -> Result<(i32, Option<i32>, Option<i32>), SourceError> {
    let mut mask = 0;
    let mut spacing = None;
    let mut width = None;
    loop {
        if t.eat("MASK") {
            mask = t.int("MASK number")?;
        } else if t.eat("SPACING") {
            spacing = Some(t.int("SPACING")?);
        } else if t.eat("DESIGNRULEWIDTH") {
            width = Some(t.int("DESIGNRULEWIDTH")?);
        } else {
            return Ok((mask, spacing, width));
        }
    }
}

fn port_mut(ports: &mut Vec<DefPinPort>) -> &mut DefPinPort {
    if ports.is_empty() {
        ports.push(DefPinPort::default());
    }
    let last = ports.len() - 1;
    &mut ports[last]
}

/// `- pinName + NET netName [+ option ...]`
pub fn pin(t: &mut Tokens<'_>) -> Result<DefPin, SourceError> {
    t.expect("-")?;
    let mut pin = DefPin {
        name: t.word("pin name")?.to_string(),
        ..Default::default()
    };

    while !t.is_done() {
        t.expect("+")?;
        let kw = t.keyword("pin option")?;
        match kw.as_str() {
            "NET" => pin.net = t.word("NET name")?.to_string(),
            "SPECIAL" => pin.special = true,
            "DIRECTION" => pin.direction = Some(t.enum_value::<IoType>("DIRECTION")?),
            "USE" => pin.use_ = Some(t.enum_value::<SigType>("USE")?),
            "NETEXPR" => pin.net_expr = Some(t.word("NETEXPR")?.to_string()),
            "SUPPLYSENSITIVITY" => {
                pin.supply_sensitivity = Some(t.word("SUPPLYSENSITIVITY pin")?.to_string())
            }
            "GROUNDSENSITIVITY" => {
                pin.ground_sensitivity = Some(t.word("GROUNDSENSITIVITY pin")?.to_string())
            }
            "PORT" => pin.ports.push(DefPinPort::default()),
            "LAYER" => {
                let layer = t.word("pin LAYER name")?.to_string();
                let (mask, spacing, design_rule_width) = shape_rules(t)?;
                let rect = t.rect()?;
                port_mut(&mut pin.ports).layers.push(DefPinLayer {
                    layer,
                    mask,
                    rect,
                    spacing,
                    design_rule_width,
                });
            }
            "POLYGON" => {
                let layer = t.word("pin POLYGON layer")?.to_string();
                let _ = shape_rules(t)?;
                let points = t.points()?;
                port_mut(&mut pin.ports)
                    .polygons
                    .push(DefPolygon { layer, points });
            }
            "VIA" => {
                let name = t.word("pin VIA name")?.to_string();
                if t.eat("MASK") {
                    let _ = t.int("MASK number")?;
                }
                let at = t.point()?;
                port_mut(&mut pin.ports).vias.push(DefPinVia { name, at });
            }
            "FIXED" | "PLACED" | "COVER" => {
                let status = DefPlacementStatus::from_str(&kw)
                    .ok_or_else(|| t.err(format!("Unknown placement status {kw}")))?;
                port_mut(&mut pin.ports).placement = Some(placement(t, status)?);
            }
            kw if kw.starts_with("ANTENNA") => {
                let value = match t.peek().and_then(|v| v.parse::<f64>().ok()) {
                    Some(v) => {
                        t.next();
                        v
                    }
                    None => 0.0,
                };
                let layer = if t.eat("LAYER") {
                    Some(t.word("antenna LAYER name")?.to_string())
                } else {
                    None
                };
                t.skip_option();
                pin.antenna.push(DefAntenna {
                    keyword: kw.to_string(),
                    value,
                    layer,
                });
            }
            _ => {
                debug!("skipping pin option {kw} on {}", pin.name);
                t.skip_option();
            }
        }
    }
    Ok(pin)
}

/// `- {compName | PIN} pinName [+ PROPERTY ...]`
pub fn pin_prop(t: &mut Tokens<'_>, kinds: &PropKinds) -> Result<DefPinProp, SourceError> {
    t.expect("-")?;
    let mut prop = DefPinProp {
        instance: t.word("component name")?.to_string(),
        pin: t.word("pin name")?.to_string(),
        properties: Vec::new(),
    };
    while !t.is_done() {
        t.expect("+")?;
        if t.eat("PROPERTY") {
            properties(t, kinds, "COMPONENTPIN", &mut prop.properties)?;
        } else {
            t.skip_option();
        }
    }
    Ok(prop)
}

#[cfg(test)]
mod tests {
    use super::super::common::tokenize;
    use super::*;
    use crate::def::{DefOrient, DefPoint, DefRect};

    fn parse(text: &str) -> DefPin {
        let mut t = Tokens::new(tokenize(text).unwrap(), (1, 1));
        pin(&mut t).unwrap()
    }

    #[test]
    fn test_pin_with_implicit_port() {
        let p = parse(
            "- a + NET a + DIRECTION INPUT + USE SIGNAL \
             + LAYER M1 SPACING 5 ( -10 0 ) ( 10 20 ) + FIXED ( 100 0 ) S",
        );
        assert_eq!(p.net, "a");
        assert_eq!(p.direction, Some(IoType::Input));
        assert_eq!(p.use_, Some(SigType::Signal));
        assert_eq!(p.ports.len(), 1);
        let port = &p.ports[0];
        assert_eq!(port.layers[0].rect, DefRect::new(-10, 0, 10, 20));
        assert_eq!(port.layers[0].spacing, Some(5));
        let placed = port.placement.unwrap();
        assert_eq!(placed.at, DefPoint::new(100, 0));
        assert_eq!(placed.orient, DefOrient::S);
    }

    #[test]
    fn test_explicit_ports() {
        let p = parse(
            "- b + NET b + PORT + LAYER M1 ( 0 0 ) ( 1 1 ) + PORT + LAYER M2 ( 0 0 ) ( 2 2 )",
        );
        assert_eq!(p.ports.len(), 2);
        assert_eq!(p.ports[1].layers[0].layer, "M2");
    }

    #[test]
    fn test_antenna_and_sensitivity() {
        let p = parse(
            "- c + NET c + ANTENNAPINDIFFAREA 0.5 LAYER M1 + SUPPLYSENSITIVITY VDD + SPECIAL",
        );
        assert_eq!(p.antenna.len(), 1);
        assert_eq!(p.antenna[0].value, 0.5);
        assert_eq!(p.antenna[0].layer.as_deref(), Some("M1"));
        assert_eq!(p.supply_sensitivity.as_deref(), Some("VDD"));
        assert!(p.special);
    }

    #[test]
    fn test_pin_prop() {
        let mut t = Tokens::new(tokenize("- PIN a + PROPERTY k 1").unwrap(), (1, 1));
        let prop = pin_prop(&mut t, &PropKinds::new()).unwrap();
        assert!(prop.is_pin());
        assert_eq!(prop.pin, "a");
        assert_eq!(prop.properties[0].number, Some(1.0));
    }
}
