// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! DEF events
//!
//! One [DefEvent] per recognized construct, carrying fully parsed fields.
//! Optional DEF statements are `Option`s, repeated ones are `Vec`s.
//! Coordinates are in DEF distance units; builders convert them to database
//! units.

use serde::{Deserialize, Serialize};

use crate::db::{IoType, RegionType, SigType, SourceType, WireShape, WireType};
use crate::error::SourceError;

pub mod builder;
pub mod callbacks;
pub mod header;
pub mod parser;
pub mod preprocessor;
pub mod props;
pub mod reader;
pub mod translate;

crate::enumstr!(
    /// DEF orientation code
    DefOrient {
        N: "N",
        W: "W",
        S: "S",
        E: "E",
        FN: "FN",
        FW: "FW",
        FS: "FS",
        FE: "FE",
    }
);

impl Default for DefOrient {
    fn default() -> Self {
        Self::N
    }
}

crate::enumstr!(
    /// DEF placement status keyword
    DefPlacementStatus {
        Fixed: "FIXED",
        Placed: "PLACED",
        Cover: "COVER",
        Unplaced: "UNPLACED",
    }
);

crate::enumstr!(
    /// Property data kind as declared in PROPERTYDEFINITIONS
    DefPropKind {
        Real: "R",
        Integer: "I",
        Str: "S",
        Name: "N",
        Quoted: "Q",
    }
);

crate::enumstr!(
    /// Grid axis of TRACKS and GCELLGRID
    DefAxis {
        X: "X",
        Y: "Y",
    }
);

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DefPoint {
    pub x: i32,
    pub y: i32,
}

impl DefPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Rectangle as written, corners not normalized
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DefRect {
    pub xl: i32,
    pub yl: i32,
    pub xh: i32,
    pub yh: i32,
}

impl DefRect {
    pub fn new(xl: i32, yl: i32, xh: i32, yh: i32) -> Self {
        Self { xl, yl, xh, yh }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DefPlacement {
    pub status: DefPlacementStatus,
    pub at: DefPoint,
    pub orient: DefOrient,
}

impl DefPlacement {
    pub fn unplaced() -> Self {
        Self {
            status: DefPlacementStatus::Unplaced,
            at: DefPoint::default(),
            orient: DefOrient::N,
        }
    }
}

/// Property attached to a construct instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefProperty {
    pub name: String,
    pub kind: DefPropKind,
    /// Value as written
    pub value: String,
    /// Numeric value when the text parses as a number
    pub number: Option<f64>,
}

/// PROPERTYDEFINITIONS entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefPropDef {
    /// Owner object keyword, e.g. COMPONENT or NET
    pub object_type: String,
    pub name: String,
    pub data_type: DefPropKind,
    pub range: Option<(f64, f64)>,
    pub number: Option<f64>,
    pub string: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DefComponent {
    pub id: String,
    pub master: String,
    pub eeq_master: Option<String>,
    pub mask_shift: Vec<i32>,
    pub halo: Option<DefRect>,
    pub route_halo: Option<(i32, String, String)>,
    pub source: Option<SourceType>,
    pub weight: Option<i32>,
    pub region: Option<String>,
    pub placement: Option<DefPlacement>,
    pub properties: Vec<DefProperty>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefPinLayer {
    pub layer: String,
    pub mask: i32,
    pub rect: DefRect,
    pub spacing: Option<i32>,
    pub design_rule_width: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefPinVia {
    pub name: String,
    pub at: DefPoint,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefPolygon {
    pub layer: String,
    pub points: Vec<DefPoint>,
}

/// Physical port of a pin; pins without PORT statements have one implicit port
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DefPinPort {
    pub layers: Vec<DefPinLayer>,
    pub polygons: Vec<DefPolygon>,
    pub vias: Vec<DefPinVia>,
    pub placement: Option<DefPlacement>,
}

/// Antenna statement on a pin
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefAntenna {
    pub keyword: String,
    pub value: f64,
    pub layer: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DefPin {
    pub name: String,
    pub net: String,
    pub special: bool,
    pub direction: Option<IoType>,
    pub use_: Option<SigType>,
    pub net_expr: Option<String>,
    pub supply_sensitivity: Option<String>,
    pub ground_sensitivity: Option<String>,
    pub antenna: Vec<DefAntenna>,
    pub ports: Vec<DefPinPort>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefPinProp {
    /// Component name, or `PIN` for a block pin
    pub instance: String,
    pub pin: String,
    pub properties: Vec<DefProperty>,
}

impl DefPinProp {
    pub fn is_pin(&self) -> bool {
        self.instance == "PIN"
    }
}

/// Net connection `( instance pin )`; instance `PIN` names a block pin
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DefConnection {
    pub instance: String,
    pub pin: String,
    pub synthesized: bool,
    pub must_join: bool,
}

/// Routing path token in source order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PathToken {
    Layer(String),
    Via(String),
    ViaRotation(DefOrient),
    Width(i32),
    Point(DefPoint),
    FlushPoint(DefPoint, i32),
    Taper,
    TaperRule(String),
    Shape(WireShape),
    Style(i32),
    /// Rectangle given as deltas from the preceding point
    Rect(DefRect),
    VirtualPoint(DefPoint),
    Mask(i32),
    ViaMask(i32),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DefPath {
    pub tokens: Vec<PathToken>,
}

impl DefPath {
    pub fn cursor(&self) -> PathCursor<'_> {
        PathCursor::new(&self.tokens)
    }
}

/// Forward cursor over path tokens with one-token lookahead
#[derive(Debug, Clone)]
pub struct PathCursor<'a> {
    tokens: &'a [PathToken],
    pos: usize,
}

impl<'a> PathCursor<'a> {
    pub fn new(tokens: &'a [PathToken]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn peek(&self) -> Option<&'a PathToken> {
        self.tokens.get(self.pos)
    }

    pub fn advance(&mut self) -> Option<&'a PathToken> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefWire {
    pub wire_type: WireType,
    pub shield_net: Option<String>,
    pub paths: Vec<DefPath>,
}

/// Special-net `RECT` shape
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefNetRect {
    pub layer: String,
    pub rect: DefRect,
    pub wire_type: WireType,
    pub shape: Option<WireShape>,
    pub shield_net: Option<String>,
    pub mask: i32,
}

/// Regular or special net
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DefNet {
    pub name: String,
    pub connections: Vec<DefConnection>,
    pub shield_nets: Vec<String>,
    pub vpins: Vec<String>,
    pub subnets: Vec<String>,
    pub xtalk: Option<i32>,
    pub frequency: Option<f64>,
    pub original: Option<String>,
    pub pattern: Option<String>,
    pub est_cap: Option<f64>,
    pub voltage: Option<f64>,
    pub use_: Option<SigType>,
    pub source: Option<SourceType>,
    pub fixed_bump: bool,
    pub weight: Option<i32>,
    pub non_default_rule: Option<String>,
    pub polygons: Vec<DefPolygon>,
    pub via_specs: Vec<String>,
    pub rects: Vec<DefNetRect>,
    pub wires: Vec<DefWire>,
    pub properties: Vec<DefProperty>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefViaRule {
    pub name: String,
    pub cut_size: (i32, i32),
    pub bottom_layer: String,
    pub cut_layer: String,
    pub top_layer: String,
    pub cut_spacing: (i32, i32),
    pub bottom_enclosure: (i32, i32),
    pub top_enclosure: (i32, i32),
    pub rows_cols: Option<(i32, i32)>,
    pub origin: Option<DefPoint>,
    pub offset: Option<DefRect>,
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefViaRect {
    pub layer: String,
    pub mask: i32,
    pub rect: DefRect,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DefVia {
    pub name: String,
    pub rule: Option<DefViaRule>,
    pub rects: Vec<DefViaRect>,
    pub polygons: Vec<DefPolygon>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DefNdrLayer {
    pub name: String,
    pub width: i32,
    pub diag_width: Option<i32>,
    pub spacing: Option<i32>,
    pub wire_ext: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DefNonDefaultRule {
    pub name: String,
    pub hard_spacing: bool,
    pub layers: Vec<DefNdrLayer>,
    pub vias: Vec<String>,
    pub via_rules: Vec<String>,
    pub min_cuts: Vec<(String, i32)>,
    pub properties: Vec<DefProperty>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DefRegion {
    pub name: String,
    pub rects: Vec<DefRect>,
    pub kind: Option<RegionType>,
    pub properties: Vec<DefProperty>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefRow {
    pub name: String,
    pub site: String,
    pub origin: DefPoint,
    pub orient: DefOrient,
    /// `DO x BY y`
    pub do_count: Option<(i32, i32)>,
    /// `STEP x y`
    pub do_step: Option<(i32, i32)>,
    pub properties: Vec<DefProperty>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefTrack {
    pub axis: DefAxis,
    pub start: i32,
    pub count: i32,
    pub step: i32,
    pub first_mask: i32,
    pub layers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefGcellGrid {
    pub axis: DefAxis,
    pub start: i32,
    pub count: i32,
    pub step: i32,
}

/// Routing blockage when `layer` is set, placement blockage otherwise
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DefBlockage {
    pub layer: Option<String>,
    pub component: Option<String>,
    pub slots: bool,
    pub fills: bool,
    pub pushdown: bool,
    pub except_pg_net: bool,
    pub soft: bool,
    pub partial: Option<f64>,
    pub mask: Option<i32>,
    pub spacing: Option<i32>,
    pub design_rule_width: Option<i32>,
    pub rects: Vec<DefRect>,
    pub polygons: Vec<Vec<DefPoint>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DefFill {
    pub layer: Option<String>,
    pub mask: Option<i32>,
    pub opc: bool,
    pub rects: Vec<DefRect>,
    pub polygons: Vec<Vec<DefPoint>>,
    /// Via fill: via name and placement points
    pub via: Option<(String, Vec<DefPoint>)>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DefGroup {
    pub region: Option<String>,
    pub properties: Vec<DefProperty>,
}

/// One construct notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DefEvent {
    Units(f64),
    DieArea(Vec<DefPoint>),
    PropDefsStart,
    PropDef(DefPropDef),
    PropDefsEnd,
    Via(DefVia),
    NonDefaultRule(DefNonDefaultRule),
    Region(DefRegion),
    Row(DefRow),
    Track(DefTrack),
    GcellGrid(DefGcellGrid),
    ComponentMaskShift(Vec<String>),
    Component(DefComponent),
    PinsStart(usize),
    Pin(DefPin),
    PinsEnd,
    PinProp(DefPinProp),
    Blockage(DefBlockage),
    FillsStart(usize),
    Fill(DefFill),
    SpecialNet(DefNet),
    Net(DefNet),
    GroupName(String),
    GroupMember(String),
    Group(DefGroup),
    Extension(String),
    History(String),
    ScanChainsStart(usize),
    SlotsStart(usize),
    StylesStart(usize),
    Technology(String),
}

impl DefEvent {
    /// Construct keyword, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Units(_) => "UNITS",
            Self::DieArea(_) => "DIEAREA",
            Self::PropDefsStart | Self::PropDef(_) | Self::PropDefsEnd => "PROPERTYDEFINITIONS",
            Self::Via(_) => "VIA",
            Self::NonDefaultRule(_) => "NONDEFAULTRULE",
            Self::Region(_) => "REGION",
            Self::Row(_) => "ROW",
            Self::Track(_) => "TRACKS",
            Self::GcellGrid(_) => "GCELLGRID",
            Self::ComponentMaskShift(_) => "COMPONENTMASKSHIFT",
            Self::Component(_) => "COMPONENT",
            Self::PinsStart(_) | Self::Pin(_) | Self::PinsEnd => "PIN",
            Self::PinProp(_) => "PINPROPERTIES",
            Self::Blockage(_) => "BLOCKAGE",
            Self::FillsStart(_) | Self::Fill(_) => "FILL",
            Self::SpecialNet(_) => "SPECIALNET",
            Self::Net(_) => "NET",
            Self::GroupName(_) | Self::GroupMember(_) | Self::Group(_) => "GROUP",
            Self::Extension(_) => "BEGINEXT",
            Self::History(_) => "HISTORY",
            Self::ScanChainsStart(_) => "SCANCHAINS",
            Self::SlotsStart(_) => "SLOTS",
            Self::StylesStart(_) => "STYLES",
            Self::Technology(_) => "TECHNOLOGY",
        }
    }
}

/// Ordered producer of [DefEvent]s.
///
/// `None` ends the stream; an `Err` is a structural read failure.
pub trait EventSource {
    fn next_event(&mut self) -> Option<Result<DefEvent, SourceError>>;
}

impl<I: Iterator<Item = DefEvent>> EventSource for I {
    fn next_event(&mut self) -> Option<Result<DefEvent, SourceError>> {
        self.next().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_cursor_peek_does_not_consume() {
        let path = DefPath {
            tokens: vec![
                PathToken::Layer("M1".into()),
                PathToken::Taper,
                PathToken::Point(DefPoint::new(0, 0)),
            ],
        };
        let mut cursor = path.cursor();
        assert_eq!(cursor.advance(), Some(&PathToken::Layer("M1".into())));
        assert_eq!(cursor.peek(), Some(&PathToken::Taper));
        assert_eq!(cursor.peek(), Some(&PathToken::Taper));
        assert_eq!(cursor.advance(), Some(&PathToken::Taper));
        assert!(matches!(cursor.advance(), Some(PathToken::Point(_))));
        assert_eq!(cursor.peek(), None);
        assert_eq!(cursor.advance(), None);
    }

    #[test]
    fn test_iterator_is_event_source() {
        let mut source = vec![DefEvent::Units(1000.0), DefEvent::PinsEnd].into_iter();
        assert!(matches!(source.next_event(), Some(Ok(DefEvent::Units(_)))));
        assert!(matches!(source.next_event(), Some(Ok(DefEvent::PinsEnd))));
        assert!(source.next_event().is_none());
    }
}
