// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Event dispatch
//!
//! [Callbacks] owns one builder per construct family and routes each
//! [DefEvent] to its builder. Constructs that parse but are not supported
//! are rejected here, before anything is opened, with a message naming the
//! construct.

use super::builder::{
    BlockageBuilder, Builder, ComponentBuilder, FillBuilder, GCellBuilder, NetBuilder,
    NonDefaultRuleBuilder, PinBuilder, PinPropsBuilder, PropDefsBuilder, RegionBuilder, RowBuilder,
    SNetBuilder, Session, TracksBuilder, ViaBuilder,
};
use super::props::transfer_props;
use super::translate::{
    die_area, is_rect_path, translate_orientation, translate_placement, translate_points,
    DieAreaNote, UnitScale,
};
use super::{
    DefBlockage, DefComponent, DefEvent, DefFill, DefGroup, DefNet, DefNonDefaultRule, DefPath,
    DefPin, DefPinProp, DefPropDef, DefPropKind, DefRegion, DefRow, DefTrack, DefVia, PathToken,
};
use crate::config::ReaderOptions;
use crate::db::{PropKind, WireShape};
use crate::error::ProtocolError;

/// Result of handling one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    /// The construct was refused; the caller decides whether to continue
    Rejected,
}

/// First message among `checks` whose condition holds
fn first_unsupported(checks: &[(bool, &'static str)]) -> Option<&'static str> {
    checks.iter().find(|(hit, _)| *hit).map(|(_, msg)| *msg)
}

fn token_name(token: &PathToken) -> &'static str {
    match token {
        PathToken::Layer(_) => "LAYER",
        PathToken::Via(_) => "VIA",
        PathToken::ViaRotation(_) => "Via orientation",
        PathToken::Width(_) => "WIDTH",
        PathToken::Point(_) | PathToken::FlushPoint(..) => "Point",
        PathToken::Taper => "TAPER",
        PathToken::TaperRule(_) => "TAPERRULE",
        PathToken::Shape(_) => "SHAPE",
        PathToken::Style(_) => "STYLE",
        PathToken::Rect(_) => "RECT",
        PathToken::VirtualPoint(_) => "VIRTUAL",
        PathToken::Mask(_) | PathToken::ViaMask(_) => "MASK",
    }
}

fn prop_kind(kind: DefPropKind) -> PropKind {
    match kind {
        DefPropKind::Real => PropKind::Real,
        DefPropKind::Integer => PropKind::Integer,
        DefPropKind::Str | DefPropKind::Name | DefPropKind::Quoted => PropKind::String,
    }
}

/// Walk one signal-net path. `Some(msg)` names an unsupported token.
fn net_path(b: &mut NetBuilder, s: &mut Session<'_>, path: &DefPath) -> Result<Option<String>, ProtocolError> {
    let mut cursor = path.cursor();
    let mut open = false;
    while let Some(token) = cursor.advance() {
        match token {
            PathToken::Layer(layer) => {
                if open {
                    b.path_end()?;
                }
                match cursor.peek() {
                    Some(PathToken::Taper) => {
                        cursor.advance();
                        b.path_taper(s, layer)?;
                    }
                    Some(PathToken::TaperRule(rule)) => {
                        cursor.advance();
                        b.path_taper_rule(s, layer, rule)?;
                    }
                    _ => b.path(s, layer)?,
                }
                open = true;
            }
            _ if !open => {
                return Ok(Some(format!(
                    "{} before LAYER in net's routing is unsupported",
                    token_name(token)
                )))
            }
            PathToken::Via(via) => {
                let orient = match cursor.peek() {
                    Some(PathToken::ViaRotation(o)) => {
                        cursor.advance();
                        Some(translate_orientation(*o))
                    }
                    _ => None,
                };
                b.path_via(s, via, orient)?;
            }
            PathToken::Point(p) => b.path_point(*p, None)?,
            PathToken::FlushPoint(p, ext) => b.path_point(*p, Some(*ext))?,
            other => {
                return Ok(Some(format!(
                    "{} in net's routing is unsupported",
                    token_name(other)
                )))
            }
        }
    }
    if open {
        b.path_end()?;
    }
    Ok(None)
}

/// Walk one special-net path, which starts with `LAYER name WIDTH w`
fn snet_path(b: &mut SNetBuilder, s: &mut Session<'_>, path: &DefPath) -> Result<Option<String>, ProtocolError> {
    let mut cursor = path.cursor();
    let mut open = false;
    while let Some(token) = cursor.advance() {
        match token {
            PathToken::Layer(layer) => {
                if open {
                    b.path_end()?;
                }
                let Some(PathToken::Width(width)) = cursor.peek() else {
                    return Ok(Some(format!(
                        "Special net path on layer {layer} without WIDTH is unsupported"
                    )));
                };
                cursor.advance();
                b.path(s, layer, *width)?;
                open = true;
            }
            _ if !open => {
                return Ok(Some(format!(
                    "{} before LAYER in special net's routing is unsupported",
                    token_name(token)
                )))
            }
            PathToken::Via(via) => {
                if let Some(PathToken::ViaRotation(_)) = cursor.peek() {
                    return Ok(Some(format!(
                        "Rotated via {via} in special net is unsupported"
                    )));
                }
                b.path_via(s, via)?;
            }
            PathToken::Point(p) => b.path_point(*p, None)?,
            PathToken::FlushPoint(p, ext) => b.path_point(*p, Some(*ext))?,
            PathToken::Shape(shape) => b.path_shape(*shape)?,
            other => {
                return Ok(Some(format!(
                    "{} in special net's routing is unsupported",
                    token_name(other)
                )))
            }
        }
    }
    if open {
        b.path_end()?;
    }
    Ok(None)
}

/// Builders for every construct family plus the dispatcher's own state
#[derive(Default)]
pub struct Callbacks {
    pub components: ComponentBuilder,
    pub nets: NetBuilder,
    pub snets: SNetBuilder,
    pub vias: ViaBuilder,
    pub pins: PinBuilder,
    pub pin_props: PinPropsBuilder,
    pub rows: RowBuilder,
    pub tracks: TracksBuilder,
    pub gcells: GCellBuilder,
    pub regions: RegionBuilder,
    pub blockages: BlockageBuilder,
    pub fills: FillBuilder,
    pub ndrs: NonDefaultRuleBuilder,
    pub prop_defs: PropDefsBuilder,
    errors: u32,
    dbu_per_micron: u32,
    scale: UnitScale,
    replace_wires: bool,
}

impl Callbacks {
    fn builders(&self) -> [&dyn Builder; 14] {
        [
            &self.components,
            &self.nets,
            &self.snets,
            &self.vias,
            &self.pins,
            &self.pin_props,
            &self.rows,
            &self.tracks,
            &self.gcells,
            &self.regions,
            &self.blockages,
            &self.fills,
            &self.ndrs,
            &self.prop_defs,
        ]
    }

    fn builders_mut(&mut self) -> [&mut dyn Builder; 14] {
        [
            &mut self.components,
            &mut self.nets,
            &mut self.snets,
            &mut self.vias,
            &mut self.pins,
            &mut self.pin_props,
            &mut self.rows,
            &mut self.tracks,
            &mut self.gcells,
            &mut self.regions,
            &mut self.blockages,
            &mut self.fills,
            &mut self.ndrs,
            &mut self.prop_defs,
        ]
    }

    /// Reset every builder for a new file
    pub fn init(&mut self, dbu_per_micron: u32, opts: &ReaderOptions, replace_wires: bool) {
        for b in self.builders_mut() {
            b.init(dbu_per_micron);
        }
        self.errors = 0;
        self.dbu_per_micron = dbu_per_micron;
        self.scale = UnitScale::new(dbu_per_micron, 100.0);
        self.replace_wires = replace_wires;

        self.nets.skip_wires = opts.skip_wires;
        self.nets.skip_connections = opts.skip_connections;
        self.nets.replace_wires = replace_wires;
        self.snets.skip_special_wires = opts.skip_special_wires;
        self.snets.skip_shields = opts.skip_shields;
        self.snets.skip_block_wires = opts.skip_block_wires;
        self.snets.skip_fill_wires = opts.skip_fill_wires;
        self.snets.replace_wires = replace_wires;
    }

    /// Own errors plus the errors of every builder
    pub fn errors(&self) -> u32 {
        self.errors + self.builders().iter().map(|b| b.errors()).sum::<u32>()
    }

    fn unsupported(&mut self, s: &mut Session<'_>, msg: impl Into<String>) -> Outcome {
        self.errors += 1;
        s.error(msg);
        Outcome::Rejected
    }

    pub fn dispatch(&mut self, s: &mut Session<'_>, event: &DefEvent) -> Result<Outcome, ProtocolError> {
        if self.replace_wires {
            return match event {
                DefEvent::Units(units) => Ok(self.on_units(s, *units)),
                DefEvent::SpecialNet(net) => self.on_special_net(s, net),
                DefEvent::Net(net) => self.on_net(s, net),
                _ => Ok(Outcome::Ok),
            };
        }

        match event {
            DefEvent::Units(units) => Ok(self.on_units(s, *units)),
            DefEvent::DieArea(points) => Ok(self.on_die_area(s, points)),
            DefEvent::PropDefsStart => {
                self.prop_defs.definitions_begin()?;
                Ok(Outcome::Ok)
            }
            DefEvent::PropDef(def) => self.on_prop_def(s, def),
            DefEvent::PropDefsEnd => {
                self.prop_defs.definitions_end(s)?;
                Ok(Outcome::Ok)
            }
            DefEvent::Via(via) => self.on_via(s, via),
            DefEvent::NonDefaultRule(rule) => self.on_non_default_rule(s, rule),
            DefEvent::Region(region) => self.on_region(s, region),
            DefEvent::Row(row) => self.on_row(s, row),
            DefEvent::Track(track) => self.on_track(s, track),
            DefEvent::GcellGrid(g) => {
                self.gcells.grid(s, g.axis, g.start, g.count, g.step);
                Ok(Outcome::Ok)
            }
            DefEvent::ComponentMaskShift(_) => {
                Ok(self.unsupported(s, "COMPONENTMASKSHIFT is unsupported"))
            }
            DefEvent::Component(c) => self.on_component(s, c),
            DefEvent::PinsStart(_) => {
                self.pins.pins_begin();
                Ok(Outcome::Ok)
            }
            DefEvent::Pin(pin) => self.on_pin(s, pin),
            DefEvent::PinsEnd => {
                self.pins.pins_end(s)?;
                Ok(Outcome::Ok)
            }
            DefEvent::PinProp(prop) => self.on_pin_prop(s, prop),
            DefEvent::Blockage(blockage) => self.on_blockage(s, blockage),
            DefEvent::FillsStart(_) => Ok(Outcome::Ok),
            DefEvent::Fill(fill) => self.on_fill(s, fill),
            DefEvent::SpecialNet(net) => self.on_special_net(s, net),
            DefEvent::Net(net) => self.on_net(s, net),
            DefEvent::GroupName(name) => {
                self.regions.group_begin(s, name)?;
                Ok(Outcome::Ok)
            }
            DefEvent::GroupMember(member) => {
                self.regions.member(s, member)?;
                Ok(Outcome::Ok)
            }
            DefEvent::Group(group) => self.on_group(s, group),
            DefEvent::Extension(_) => {
                Ok(self.unsupported(s, "Syntax extensions (BEGINEXT/ENDEXT) are unsupported"))
            }
            DefEvent::History(_) => Ok(self.unsupported(s, "HISTORY is unsupported")),
            DefEvent::ScanChainsStart(n) => Ok(self.section(s, *n, "SCANCHAINS are unsupported")),
            DefEvent::SlotsStart(n) => Ok(self.section(s, *n, "SLOTS are unsupported")),
            DefEvent::StylesStart(n) => Ok(self.section(s, *n, "STYLES are unsupported")),
            DefEvent::Technology(_) => Ok(self.unsupported(s, "TECHNOLOGY is unsupported")),
        }
    }

    /// Unsupported section, harmless when declared empty
    fn section(&mut self, s: &mut Session<'_>, count: usize, msg: &str) -> Outcome {
        if count == 0 {
            return Outcome::Ok;
        }
        self.unsupported(s, msg)
    }

    fn on_units(&mut self, s: &mut Session<'_>, units: f64) -> Outcome {
        if units > f64::from(self.dbu_per_micron) {
            return self.unsupported(
                s,
                format!(
                    "The DEF UNITS DISTANCE MICRONS convert factor ({}) is greater than the database units per micron ({}) value.",
                    units, self.dbu_per_micron
                ),
            );
        }
        let dbu = self.dbu_per_micron;
        for b in self.builders_mut() {
            b.set_units(dbu, units);
        }
        self.scale = UnitScale::new(dbu, units);
        s.block.def_units = units as i32;
        Outcome::Ok
    }

    fn on_die_area(&mut self, s: &mut Session<'_>, points: &[super::DefPoint]) -> Outcome {
        let points = translate_points(points, &self.scale);
        match die_area(&points) {
            Ok((rect, note)) => {
                if note == DieAreaNote::BoundingBox {
                    s.warning(
                        "Polygon DIEAREA statement not supported.  The bounding box will be used instead",
                    );
                }
                s.block.die_area = Some(rect);
                Outcome::Ok
            }
            Err(_) => self.unsupported(s, "Invalid DIEAREA statement, missing point(s)"),
        }
    }

    fn on_prop_def(&mut self, s: &mut Session<'_>, def: &DefPropDef) -> Result<Outcome, ProtocolError> {
        let b = &mut self.prop_defs;
        b.begin(s, &def.object_type, &def.name, prop_kind(def.data_type))?;
        if let Some((min, max)) = def.range {
            b.range(min, max)?;
        }
        if let Some(n) = def.number {
            b.number(n)?;
        } else if let Some(v) = &def.string {
            b.string(v)?;
        }
        b.end()?;
        Ok(Outcome::Ok)
    }

    fn on_via(&mut self, s: &mut Session<'_>, via: &DefVia) -> Result<Outcome, ProtocolError> {
        if let Some(msg) = first_unsupported(&[
            (!via.polygons.is_empty(), "POLYGON in via is unsupported"),
            (via.rects.iter().any(|r| r.mask != 0), "MASK on via rect is unsupported"),
        ]) {
            return Ok(self.unsupported(s, msg));
        }

        let b = &mut self.vias;
        b.begin(s, &via.name)?;
        for r in &via.rects {
            b.rect(s, &r.layer, &r.rect)?;
        }
        if let Some(rule) = &via.rule {
            b.rule(s, &rule.name)?;
            b.cut_size(rule.cut_size.0, rule.cut_size.1)?;
            if b.layers(s, &rule.bottom_layer, &rule.cut_layer, &rule.top_layer)? {
                b.cut_spacing(rule.cut_spacing.0, rule.cut_spacing.1)?;
                b.enclosure(rule.bottom_enclosure, rule.top_enclosure)?;
                if let Some((rows, cols)) = rule.rows_cols {
                    b.rows_cols(rows, cols)?;
                }
                if let Some(origin) = rule.origin {
                    b.origin(origin)?;
                }
                if let Some(offset) = &rule.offset {
                    b.offset(offset)?;
                }
                if let Some(pattern) = &rule.pattern {
                    b.pattern(pattern)?;
                }
            }
        }
        b.end(s)?;
        Ok(Outcome::Ok)
    }

    fn on_non_default_rule(
        &mut self,
        s: &mut Session<'_>,
        rule: &DefNonDefaultRule,
    ) -> Result<Outcome, ProtocolError> {
        if rule.layers.iter().any(|l| l.diag_width.is_some()) {
            return Ok(self.unsupported(s, "DIAGWIDTH on non-default rule is unsupported"));
        }

        let b = &mut self.ndrs;
        b.begin(s, &rule.name)?;
        if rule.hard_spacing {
            b.hard_spacing()?;
        }
        for layer in &rule.layers {
            b.layer_begin(s, &layer.name, layer.width)?;
            if let Some(spacing) = layer.spacing {
                b.layer_spacing(spacing)?;
            }
            if let Some(ext) = layer.wire_ext {
                b.layer_wire_ext(ext)?;
            }
            b.layer_end()?;
        }
        for via in &rule.vias {
            b.via(s, via)?;
        }
        for via_rule in &rule.via_rules {
            b.via_rule(s, via_rule)?;
        }
        for (layer, cuts) in &rule.min_cuts {
            b.min_cuts(s, layer, *cuts)?;
        }
        transfer_props(b, &rule.properties)?;
        b.end(s)?;
        Ok(Outcome::Ok)
    }

    fn on_region(&mut self, s: &mut Session<'_>, region: &DefRegion) -> Result<Outcome, ProtocolError> {
        let b = &mut self.regions;
        b.region_begin(s, &region.name)?;
        for rect in &region.rects {
            b.boundary(rect)?;
        }
        if let Some(kind) = region.kind {
            b.kind(kind)?;
        }
        transfer_props(b, &region.properties)?;
        b.region_end(s)?;
        Ok(Outcome::Ok)
    }

    fn on_group(&mut self, s: &mut Session<'_>, group: &DefGroup) -> Result<Outcome, ProtocolError> {
        let b = &mut self.regions;
        if let Some(region) = &group.region {
            b.group_region(s, region)?;
        }
        transfer_props(b, &group.properties)?;
        b.group_end(s)?;
        Ok(Outcome::Ok)
    }

    fn on_row(&mut self, s: &mut Session<'_>, row: &DefRow) -> Result<Outcome, ProtocolError> {
        let b = &mut self.rows;
        b.begin(
            s,
            &row.name,
            &row.site,
            row.origin,
            translate_orientation(row.orient),
        )?;
        if let Some(count) = row.do_count {
            b.repeat(count, row.do_step)?;
        }
        transfer_props(b, &row.properties)?;
        b.end(s)?;
        Ok(Outcome::Ok)
    }

    fn on_track(&mut self, s: &mut Session<'_>, track: &DefTrack) -> Result<Outcome, ProtocolError> {
        if track.first_mask != 0 {
            return Ok(self.unsupported(s, "MASK on track is unsupported"));
        }
        let b = &mut self.tracks;
        b.begin(track.axis, track.start, track.count, track.step)?;
        for layer in &track.layers {
            b.layer(s, layer)?;
        }
        b.end(s)?;
        Ok(Outcome::Ok)
    }

    fn on_component(&mut self, s: &mut Session<'_>, c: &DefComponent) -> Result<Outcome, ProtocolError> {
        if let Some(msg) = first_unsupported(&[
            (c.eeq_master.is_some(), "EEQMASTER on component is unsupported"),
            (!c.mask_shift.is_empty(), "MASKSHIFT on component is unsupported"),
            (c.halo.is_some(), "HALO on component is unsupported"),
            (c.route_halo.is_some(), "ROUTEHALO on component is unsupported"),
        ]) {
            return Ok(self.unsupported(s, msg));
        }

        let b = &mut self.components;
        b.begin(s, &c.id, &c.master)?;
        if let Some(source) = c.source {
            b.source(source)?;
        }
        if let Some(weight) = c.weight {
            b.weight(weight)?;
        }
        if let Some(region) = &c.region {
            b.region(s, region)?;
        }
        if let Some(p) = &c.placement {
            b.placement(
                translate_placement(p.status),
                p.at,
                translate_orientation(p.orient),
            )?;
        }
        transfer_props(b, &c.properties)?;
        b.end(s)?;
        Ok(Outcome::Ok)
    }

    fn on_pin(&mut self, s: &mut Session<'_>, pin: &DefPin) -> Result<Outcome, ProtocolError> {
        let ports = &pin.ports;
        if let Some(msg) = first_unsupported(&[
            (pin.net_expr.is_some(), "NETEXPR on pin is unsupported"),
            (!pin.antenna.is_empty(), "Antenna data on pin is unsupported"),
            (ports.len() > 1, "Multiple ports on pin are unsupported"),
            (ports.iter().any(|p| !p.vias.is_empty()), "VIA in pin is unsupported"),
            (ports.iter().any(|p| !p.polygons.is_empty()), "POLYGON in pin is unsupported"),
            (
                ports.iter().flat_map(|p| &p.layers).any(|l| l.mask != 0),
                "MASK on pin layer is unsupported",
            ),
        ]) {
            return Ok(self.unsupported(s, format!("{msg} ({})", pin.name)));
        }

        let b = &mut self.pins;
        b.begin(s, &pin.name, &pin.net)?;
        if pin.special {
            b.special()?;
        }
        if let Some(sig) = pin.use_ {
            b.use_(sig)?;
        }
        if let Some(dir) = pin.direction {
            b.direction(dir)?;
        }
        if let Some(supply) = &pin.supply_sensitivity {
            b.supply_pin(supply)?;
        }
        if let Some(ground) = &pin.ground_sensitivity {
            b.ground_pin(ground)?;
        }
        if let Some(port) = ports.first() {
            for layer in &port.layers {
                b.rect(s, &layer.layer, &layer.rect)?;
                if let Some(spacing) = layer.spacing {
                    b.min_spacing(spacing)?;
                }
                if let Some(width) = layer.design_rule_width {
                    b.effective_width(width)?;
                }
            }
            if let Some(p) = &port.placement {
                b.placement(
                    translate_placement(p.status),
                    p.at,
                    translate_orientation(p.orient),
                )?;
            }
        }
        b.end(s)?;
        Ok(Outcome::Ok)
    }

    fn on_pin_prop(&mut self, s: &mut Session<'_>, prop: &DefPinProp) -> Result<Outcome, ProtocolError> {
        let b = &mut self.pin_props;
        b.begin(s, &prop.instance, &prop.pin)?;
        transfer_props(b, &prop.properties)?;
        b.end(s)?;
        Ok(Outcome::Ok)
    }

    fn on_blockage(&mut self, s: &mut Session<'_>, blk: &DefBlockage) -> Result<Outcome, ProtocolError> {
        if let Some(msg) = first_unsupported(&[
            (blk.except_pg_net, "EXCEPTPGNET on blockage is unsupported"),
            (blk.mask.is_some(), "MASK on blockage is unsupported"),
            (blk.soft, "SOFT on blockage is unsupported"),
            (blk.partial.is_some(), "PARTIAL on blockage is unsupported"),
            (
                blk.layer.is_none() && !blk.polygons.is_empty(),
                "POLYGON in placement blockage is unsupported",
            ),
        ]) {
            return Ok(self.unsupported(s, msg));
        }

        let b = &mut self.blockages;
        match &blk.layer {
            Some(layer) => {
                b.routing_begin(s, layer)?;
                if blk.slots {
                    b.slots()?;
                }
                if blk.fills {
                    b.fills()?;
                }
                if let Some(spacing) = blk.spacing {
                    b.spacing(spacing)?;
                }
                if let Some(width) = blk.design_rule_width {
                    b.design_rule_width(width)?;
                }
                for polygon in &blk.polygons {
                    b.polygon(polygon)?;
                }
            }
            None => b.placement_begin()?,
        }
        if blk.pushdown {
            b.pushdown()?;
        }
        if let Some(inst) = &blk.component {
            b.component(s, inst)?;
        }
        for rect in &blk.rects {
            b.rect(rect)?;
        }
        b.end(s)?;
        Ok(Outcome::Ok)
    }

    fn on_fill(&mut self, s: &mut Session<'_>, fill: &DefFill) -> Result<Outcome, ProtocolError> {
        if let Some(msg) = first_unsupported(&[
            (fill.via.is_some(), "VIA in fill is unsupported"),
            (fill.mask.is_some(), "MASK on fill is unsupported"),
            (fill.opc, "OPC on fill is unsupported"),
        ]) {
            return Ok(self.unsupported(s, msg));
        }
        let Some(layer) = &fill.layer else {
            return Ok(self.unsupported(s, "Fill without LAYER is unsupported"));
        };

        let b = &mut self.fills;
        b.begin(s, layer)?;
        for rect in &fill.rects {
            b.rect(rect)?;
        }
        for polygon in &fill.polygons {
            b.polygon(polygon)?;
        }
        b.end(s)?;
        Ok(Outcome::Ok)
    }

    fn on_special_net(&mut self, s: &mut Session<'_>, net: &DefNet) -> Result<Outcome, ProtocolError> {
        if let Some(msg) = first_unsupported(&[
            (net.est_cap.is_some(), "ESTCAP on special net is unsupported"),
            (net.pattern.is_some(), "PATTERN on special net is unsupported"),
            (net.original.is_some(), "ORIGINAL on special net is unsupported"),
            (!net.shield_nets.is_empty(), "SHIELDNET on special net is unsupported"),
            (net.voltage.is_some(), "VOLTAGE on special net is unsupported"),
            (!net.polygons.is_empty(), "POLYGON in special net is unsupported"),
            (!net.via_specs.is_empty(), "VIA in special net is unsupported"),
            (net.rects.iter().any(|r| r.mask != 0), "MASK on special net rect is unsupported"),
        ]) {
            return Ok(self.unsupported(s, format!("{msg} ({})", net.name)));
        }

        let b = &mut self.snets;
        b.begin(s, &net.name)?;
        if let Some(sig) = net.use_ {
            b.use_(sig)?;
        }
        if let Some(source) = net.source {
            b.source(source)?;
        }
        if net.fixed_bump {
            b.fixed_bump()?;
        }
        if let Some(weight) = net.weight {
            b.weight(weight)?;
        }
        for c in &net.connections {
            b.connection(s, &c.instance, &c.pin, c.synthesized)?;
        }
        for r in &net.rects {
            b.wire(r.wire_type, r.shield_net.as_deref())?;
            b.rect(s, &r.layer, &r.rect, r.shape.unwrap_or(WireShape::None))?;
            b.wire_end()?;
        }
        for wire in &net.wires {
            b.wire(wire.wire_type, wire.shield_net.as_deref())?;
            for path in &wire.paths {
                if let Some(msg) = snet_path(b, s, path)? {
                    b.abandon();
                    return Ok(self.unsupported(s, msg));
                }
            }
            b.wire_end()?;
        }
        transfer_props(b, &net.properties)?;
        b.end(s)?;
        Ok(Outcome::Ok)
    }

    fn on_net(&mut self, s: &mut Session<'_>, net: &DefNet) -> Result<Outcome, ProtocolError> {
        if let Some(msg) = first_unsupported(&[
            (!net.shield_nets.is_empty(), "SHIELDNET on net is unsupported"),
            (!net.vpins.is_empty(), "VPIN on net is unsupported"),
            (!net.subnets.is_empty(), "SUBNET on net is unsupported"),
            (net.xtalk.is_some(), "XTALK on net is unsupported"),
            (net.frequency.is_some(), "FREQUENCY on net is unsupported"),
            (net.original.is_some(), "ORIGINAL on net is unsupported"),
            (net.pattern.is_some(), "PATTERN on net is unsupported"),
            (net.est_cap.is_some(), "ESTCAP on net is unsupported"),
            (!net.polygons.is_empty(), "POLYGON in net is unsupported"),
            (!net.rects.is_empty(), "RECT in net is unsupported"),
            (!net.via_specs.is_empty(), "VIA in net is unsupported"),
            (
                net.connections.iter().any(|c| c.synthesized),
                "SYNTHESIZED on net connection is unsupported",
            ),
        ]) {
            return Ok(self.unsupported(s, format!("{msg} ({})", net.name)));
        }

        let b = &mut self.nets;
        b.begin(s, &net.name)?;
        if let Some(sig) = net.use_ {
            b.use_(sig)?;
        }
        if let Some(source) = net.source {
            b.source(source)?;
        }
        if net.fixed_bump {
            b.fixed_bump()?;
        }
        if let Some(weight) = net.weight {
            b.weight(weight)?;
        }
        if let Some(rule) = &net.non_default_rule {
            b.non_default_rule(s, rule)?;
        }
        for c in &net.connections {
            b.connection(s, &c.instance, &c.pin, c.must_join)?;
        }
        for wire in &net.wires {
            b.wire(wire.wire_type)?;
            for path in &wire.paths {
                if let Some(rp) = is_rect_path(path) {
                    if b.rect_path(s, &rp)? {
                        continue;
                    }
                }
                if let Some(msg) = net_path(b, s, path)? {
                    b.abandon();
                    return Ok(self.unsupported(s, msg));
                }
            }
            b.wire_end()?;
        }
        transfer_props(b, &net.properties)?;
        b.end(s)?;
        Ok(Outcome::Ok)
    }
}
