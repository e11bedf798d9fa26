// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Floorplan statements: PROPERTYDEFINITIONS entries, ROW, TRACKS,
//! GCELLGRID, REGIONS, GROUPS, BLOCKAGES and FILLS

use log::debug;

use super::common::{properties, PropKinds, Tokens};
use crate::db::RegionType;
use crate::def::{
    DefAxis, DefBlockage, DefFill, DefGcellGrid, DefGroup, DefOrient, DefPoint, DefPropDef,
    DefPropKind, DefRegion, DefRow, DefTrack,
};
use crate::error::SourceError;

/// `objectType propName propType [RANGE min max] [value]`
pub fn prop_def(t: &mut Tokens<'_>) -> Result<DefPropDef, SourceError> {
    let object_type = t.keyword("property object type")?;
    let name = t.word("property name")?.to_string();
    let data_type = match t.keyword("property type")?.as_str() {
        "INTEGER" => DefPropKind::Integer,
        "REAL" => DefPropKind::Real,
        "STRING" => DefPropKind::Str,
        "NAMEMAPSTRING" => DefPropKind::Name,
        other => return Err(t.err(format!("Unknown property type {other} for {name}"))),
    };
    let mut def = DefPropDef {
        object_type,
        name,
        data_type,
        range: None,
        number: None,
        string: None,
    };
    if t.eat("RANGE") {
        def.range = Some((t.float("RANGE min")?, t.float("RANGE max")?));
    }
    if let Some(value) = t.next_token() {
        match (data_type, value.text.parse::<f64>()) {
            (DefPropKind::Integer | DefPropKind::Real, Ok(n)) if !value.quoted => def.number = Some(n),
            _ => def.string = Some(value.text.to_string()),
        }
    }
    Ok(def)
}

/// `ROW rowName siteName x y orient [DO nx BY ny [STEP sx sy]] [+ PROPERTY ...]`
pub fn row(t: &mut Tokens<'_>, kinds: &PropKinds) -> Result<DefRow, SourceError> {
    let name = t.word("row name")?.to_string();
    let site = t.word("row site")?.to_string();
    let x = t.int("row origin x")?;
    let y = t.int("row origin y")?;
    let mut row = DefRow {
        name,
        site,
        origin: DefPoint::new(x, y),
        orient: t.enum_value::<DefOrient>("row orientation")?,
        do_count: None,
        do_step: None,
        properties: Vec::new(),
    };
    if t.eat("DO") {
        let nx = t.int("DO count")?;
        t.expect("BY")?;
        row.do_count = Some((nx, t.int("BY count")?));
        if t.eat("STEP") {
            row.do_step = Some((t.int("STEP x")?, t.int("STEP y")?));
        }
    }
    while !t.is_done() {
        t.expect("+")?;
        if t.eat("PROPERTY") {
            properties(t, kinds, "ROW", &mut row.properties)?;
        } else {
            t.skip_option();
        }
    }
    Ok(row)
}

/// `TRACKS {X|Y} start DO n STEP s [MASK m [SAMEMASK]] [LAYER l ...]`
pub fn tracks(t: &mut Tokens<'_>) -> Result<DefTrack, SourceError> {
    let axis = t.enum_value::<DefAxis>("TRACKS axis")?;
    let start = t.int("TRACKS start")?;
    t.expect("DO")?;
    let count = t.int("TRACKS count")?;
    t.expect("STEP")?;
    let step = t.int("TRACKS step")?;
    let mut track = DefTrack {
        axis,
        start,
        count,
        step,
        first_mask: 0,
        layers: Vec::new(),
    };
    if t.eat("MASK") {
        track.first_mask = t.int("TRACKS mask")?;
        let _ = t.eat("SAMEMASK");
    }
    if t.eat("LAYER") {
        while let Some(layer) = t.next() {
            track.layers.push(layer.to_string());
        }
    }
    Ok(track)
}

/// `GCELLGRID {X|Y} start DO n STEP s`
pub fn gcell_grid(t: &mut Tokens<'_>) -> Result<DefGcellGrid, SourceError> {
    let axis = t.enum_value::<DefAxis>("GCELLGRID axis")?;
    let start = t.int("GCELLGRID start")?;
    t.expect("DO")?;
    let count = t.int("GCELLGRID count")?;
    t.expect("STEP")?;
    let step = t.int("GCELLGRID step")?;
    Ok(DefGcellGrid {
        axis,
        start,
        count,
        step,
    })
}

/// `- regionName pt pt [pt pt ...] [+ TYPE {FENCE|GUIDE}] [+ PROPERTY ...]`
pub fn region(t: &mut Tokens<'_>, kinds: &PropKinds) -> Result<DefRegion, SourceError> {
    t.expect("-")?;
    let mut region = DefRegion {
        name: t.word("region name")?.to_string(),
        ..Default::default()
    };
    while t.at("(") {
        region.rects.push(t.rect()?);
    }
    while !t.is_done() {
        t.expect("+")?;
        let kw = t.keyword("region option")?;
        match kw.as_str() {
            "TYPE" => region.kind = Some(t.enum_value::<RegionType>("region TYPE")?),
            "PROPERTY" => properties(t, kinds, "REGION", &mut region.properties)?,
            _ => {
                debug!("skipping region option {kw} on {}", region.name);
                t.skip_option();
            }
        }
    }
    Ok(region)
}

/// `- groupName [pattern ...] [+ REGION r] [+ PROPERTY ...]`
pub fn group(t: &mut Tokens<'_>, kinds: &PropKinds) -> Result<(String, Vec<String>, DefGroup), SourceError> {
    t.expect("-")?;
    let name = t.word("group name")?.to_string();
    let mut members = Vec::new();
    while !t.is_done() && !t.at("+") {
        members.push(t.word("group member")?.to_string());
    }
    let mut group = DefGroup::default();
    while !t.is_done() {
        t.expect("+")?;
        let kw = t.keyword("group option")?;
        match kw.as_str() {
            "REGION" => group.region = Some(t.word("group REGION")?.to_string()),
            "PROPERTY" => properties(t, kinds, "GROUP", &mut group.properties)?,
            _ => {
                debug!("skipping group option {kw} on {name}");
                t.skip_option();
            }
        }
    }
    Ok((name, members, group))
}

/// `- LAYER l ...` or `- PLACEMENT ...`, options then RECT/POLYGON shapes
pub fn blockage(t: &mut Tokens<'_>) -> Result<DefBlockage, SourceError> {
    t.expect("-")?;
    let mut blk = DefBlockage::default();
    match t.keyword("blockage kind")?.as_str() {
        "LAYER" => blk.layer = Some(t.word("blockage layer")?.to_string()),
        "PLACEMENT" => {}
        other => return Err(t.err(format!("Unknown blockage kind {other}"))),
    }
    while !t.is_done() {
        if t.eat("RECT") {
            blk.rects.push(t.rect()?);
            continue;
        }
        if t.eat("POLYGON") {
            blk.polygons.push(t.points()?);
            continue;
        }
        t.expect("+")?;
        let kw = t.keyword("blockage option")?;
        match kw.as_str() {
            "SLOTS" => blk.slots = true,
            "FILLS" => blk.fills = true,
            "PUSHDOWN" => blk.pushdown = true,
            "EXCEPTPGNET" => blk.except_pg_net = true,
            "SOFT" => blk.soft = true,
            "PARTIAL" => blk.partial = Some(t.float("PARTIAL density")?),
            "COMPONENT" => blk.component = Some(t.word("blockage COMPONENT")?.to_string()),
            "SPACING" => blk.spacing = Some(t.int("blockage SPACING")?),
            "DESIGNRULEWIDTH" => blk.design_rule_width = Some(t.int("DESIGNRULEWIDTH")?),
            "MASK" => blk.mask = Some(t.int("blockage MASK")?),
            _ => {
                debug!("skipping blockage option {kw}");
                while !t.is_done() && !t.at("+") && !t.at("RECT") && !t.at("POLYGON") {
                    t.next();
                }
            }
        }
    }
    Ok(blk)
}

/// `- LAYER l [+ MASK m] [+ OPC] shapes` or `- VIA v [+ MASK m] [+ OPC] pts`
pub fn fill(t: &mut Tokens<'_>) -> Result<DefFill, SourceError> {
    t.expect("-")?;
    let mut fill = DefFill::default();
    let mut via = None;
    match t.keyword("fill kind")?.as_str() {
        "LAYER" => fill.layer = Some(t.word("fill layer")?.to_string()),
        "VIA" => via = Some(t.word("fill via")?.to_string()),
        other => return Err(t.err(format!("Unknown fill kind {other}"))),
    }
    let mut via_points = Vec::new();
    while !t.is_done() {
        if t.eat("RECT") {
            fill.rects.push(t.rect()?);
        } else if t.eat("POLYGON") {
            fill.polygons.push(t.points()?);
        } else if t.at("(") {
            via_points.extend(t.points()?);
        } else {
            t.expect("+")?;
            match t.keyword("fill option")?.as_str() {
                "MASK" => fill.mask = Some(t.int("fill MASK")?),
                "OPC" => fill.opc = true,
                other => return Err(t.err(format!("Unknown fill option {other}"))),
            }
        }
    }
    fill.via = via.map(|name| (name, via_points));
    Ok(fill)
}
