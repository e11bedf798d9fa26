// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! In-memory design database
//!
//! Holds the technology and library data loaded from LEF, and the chip with
//! its top block populated by the DEF importer. Collections that DEF requires
//! to be name-unique are [NamedList]s.

pub mod geom;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use geom::{Int, Orient, Point, Polygon, Rect, Shape};

/// Anything stored in a [NamedList]
pub trait Named {
    fn name(&self) -> &str;
}

/// Ordered collection with unique names and by-name lookup
#[derive(Debug, Clone)]
pub struct NamedList<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for NamedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Named> NamedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `item`, handing it back if the name is already taken
    pub fn insert(&mut self, item: T) -> Result<(), T> {
        if self.index.contains_key(item.name()) {
            return Err(item);
        }
        self.index.insert(item.name().to_string(), self.items.len());
        self.items.push(item);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&i| &self.items[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.items[i]),
            None => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<T> {
        let pos = self.index.remove(name)?;
        let item = self.items.remove(pos);
        for (i, it) in self.items.iter().enumerate().skip(pos) {
            self.index.insert(it.name().to_string(), i);
        }
        Some(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }
}

impl<T: Named> FromIterator<T> for NamedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        for item in iter {
            // Later duplicates are dropped
            let _ = list.insert(item);
        }
        list
    }
}

impl<'a, T> IntoIterator for &'a NamedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize> Serialize for NamedList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de> + Named> Deserialize<'de> for NamedList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Ok(items.into_iter().collect())
    }
}

macro_rules! impl_named {
    ($($t:ty),* $(,)?) => {
        $( impl Named for $t {
            fn name(&self) -> &str {
                &self.name
            }
        } )*
    };
}

impl_named!(
    Layer,
    TechVia,
    Site,
    Master,
    Block,
    Inst,
    BTerm,
    Net,
    SpecialNet,
    BlockVia,
    Row,
    Region,
    Group,
    NonDefaultRule,
);

/// Typed property value attached to a design object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropValue {
    Real(f64),
    Int(i32),
    Str(String),
}

/// Name-unique property map
pub type Properties = BTreeMap<String, PropValue>;

crate::enumstr!(
    /// Placement status of instances and pins
    PlacementStatus {
        None: "NONE",
        Unplaced: "UNPLACED",
        Suggested: "SUGGESTED",
        Placed: "PLACED",
        Locked: "LOCKED",
        Firm: "FIRM",
        Cover: "COVER",
    }
);

impl Default for PlacementStatus {
    fn default() -> Self {
        Self::None
    }
}

impl PlacementStatus {
    pub fn is_placed(&self) -> bool {
        !matches!(self, Self::None | Self::Unplaced)
    }
}

crate::enumstr!(
    /// Signal usage of nets and terminals
    SigType {
        Signal: "SIGNAL",
        Power: "POWER",
        Ground: "GROUND",
        Clock: "CLOCK",
        Analog: "ANALOG",
        Reset: "RESET",
        Scan: "SCAN",
        Tieoff: "TIEOFF",
    }
);

crate::enumstr!(
    /// Terminal direction
    IoType {
        Input: "INPUT",
        Output: "OUTPUT",
        Inout: "INOUT",
        Feedthru: "FEEDTHRU",
    }
);

crate::enumstr!(
    /// Origin of a net or instance
    SourceType {
        Netlist: "NETLIST",
        Dist: "DIST",
        User: "USER",
        Timing: "TIMING",
        Test: "TEST",
    }
);

crate::enumstr!(
    /// Routing status of a wire
    WireType {
        Cover: "COVER",
        Fixed: "FIXED",
        Routed: "ROUTED",
        Shield: "SHIELD",
        NoShield: "NOSHIELD",
    }
);

crate::enumstr!(
    /// Purpose of a special-net shape
    WireShape {
        None: "NONE",
        Ring: "RING",
        PadRing: "PADRING",
        BlockRing: "BLOCKRING",
        Stripe: "STRIPE",
        FollowPin: "FOLLOWPIN",
        IoWire: "IOWIRE",
        CoreWire: "COREWIRE",
        BlockWire: "BLOCKWIRE",
        BlockageWire: "BLOCKAGEWIRE",
        FillWire: "FILLWIRE",
        FillWireOpc: "FILLWIREOPC",
        DrcFill: "DRCFILL",
    }
);

impl Default for WireShape {
    fn default() -> Self {
        Self::None
    }
}

crate::enumstr!(
    /// Region kind
    RegionType {
        Fence: "FENCE",
        Guide: "GUIDE",
    }
);

crate::enumstr!(
    /// Row site stepping direction
    RowDir {
        Horizontal: "HORIZONTAL",
        Vertical: "VERTICAL",
    }
);

crate::enumstr!(
    /// Technology layer kind
    LayerKind {
        Routing: "ROUTING",
        Cut: "CUT",
        Masterslice: "MASTERSLICE",
        Overlap: "OVERLAP",
        Implant: "IMPLANT",
    }
);

crate::enumstr!(
    /// Preferred routing direction
    LayerDirection {
        Horizontal: "HORIZONTAL",
        Vertical: "VERTICAL",
        Diag45: "DIAG45",
        Diag135: "DIAG135",
    }
);

/// Technology layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Layer {
    pub name: String,
    pub kind: LayerKind,
    /// Default (minimum) wire width in database units
    pub width: Int,
    pub direction: Option<LayerDirection>,
}

/// Fixed via defined in the technology
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TechVia {
    pub name: String,
    pub layers: Vec<String>,
}

/// Technology data shared by all libraries and blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tech {
    pub name: String,
    pub dbu_per_micron: u32,
    pub layers: NamedList<Layer>,
    pub vias: NamedList<TechVia>,
    /// Names of `VIARULE ... GENERATE` rules
    pub via_rules: Vec<String>,
}

impl Default for Tech {
    fn default() -> Self {
        Self {
            name: String::new(),
            dbu_per_micron: 1000,
            layers: NamedList::new(),
            vias: NamedList::new(),
            via_rules: Vec::new(),
        }
    }
}

impl Tech {
    pub fn find_layer(&self, name: &str) -> Option<&Layer> {
        self.layers.get(name)
    }

    pub fn find_via(&self, name: &str) -> Option<&TechVia> {
        self.vias.get(name)
    }

    pub fn has_via_rule(&self, name: &str) -> bool {
        self.via_rules.iter().any(|r| r == name)
    }
}

/// Placement site
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Site {
    pub name: String,
    pub class: Option<String>,
    pub width: Int,
    pub height: Int,
}

/// Pin of a library master
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MTerm {
    pub name: String,
    pub io_type: Option<IoType>,
    pub sig_type: Option<SigType>,
}

/// Library cell
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Master {
    pub name: String,
    pub class: Option<String>,
    pub width: Int,
    pub height: Int,
    pub pins: Vec<MTerm>,
}

impl Master {
    pub fn find_pin(&self, name: &str) -> Option<&MTerm> {
        self.pins.iter().find(|p| p.name == name)
    }
}

/// Cell library
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    pub sites: NamedList<Site>,
    pub masters: NamedList<Master>,
}

/// Master lookup across all libraries, first match wins
pub fn find_master<'a>(libs: &'a [Library], name: &str) -> Option<&'a Master> {
    libs.iter().find_map(|lib| lib.masters.get(name))
}

/// Site lookup across all libraries, first match wins
pub fn find_site<'a>(libs: &'a [Library], name: &str) -> Option<&'a Site> {
    libs.iter().find_map(|lib| lib.sites.get(name))
}

/// Top-level container
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    pub tech: Tech,
    pub libs: Vec<Library>,
    pub chip: Option<Chip>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chip {
    pub block: Block,
}

/// Component instance
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Inst {
    pub name: String,
    pub master: String,
    pub status: PlacementStatus,
    pub location: Point,
    pub orient: Orient,
    pub source: Option<SourceType>,
    pub weight: Option<i32>,
    pub region: Option<String>,
    /// Instance terminals, one per master pin
    pub terms: Vec<String>,
    pub properties: Properties,
    /// Properties attached to individual instance terminals
    pub term_properties: BTreeMap<String, Properties>,
}

/// Layer-qualified rectangle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerRect {
    pub layer: String,
    pub rect: Rect,
}

/// Physical shape of a boundary terminal
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BPin {
    pub status: PlacementStatus,
    pub location: Point,
    pub orient: Orient,
    /// Layer shapes in absolute block coordinates
    pub boxes: Vec<PinBox>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PinBox {
    pub layer: String,
    pub rect: Rect,
    pub min_spacing: Option<Int>,
    pub effective_width: Option<Int>,
}

/// Boundary terminal (DEF pin)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BTerm {
    pub name: String,
    pub net: String,
    pub special: bool,
    pub io_type: Option<IoType>,
    pub sig_type: Option<SigType>,
    pub supply_pin: Option<String>,
    pub ground_pin: Option<String>,
    pub pins: Vec<BPin>,
    pub properties: Properties,
}

/// Connection of a net to an instance terminal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetConnection {
    pub inst: String,
    pub pin: String,
    pub must_join: bool,
    /// Special-net connection written in the file rather than synthesized
    pub special: bool,
}

/// Routing taper mode of a path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Taper {
    Default,
    Taper,
    Rule(String),
}

impl Default for Taper {
    fn default() -> Self {
        Self::Default
    }
}

/// Element of a routed path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PathElement {
    /// Point with optional explicit end extension; `None` is half-width
    Point { at: Point, ext: Option<Int> },
    Via { name: String, orient: Option<Orient> },
}

/// Signal-net path on one starting layer
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WirePath {
    pub layer: String,
    pub taper: Taper,
    pub elements: Vec<PathElement>,
}

impl WirePath {
    pub fn points(&self) -> Vec<Point> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                PathElement::Point { at, .. } => Some(*at),
                PathElement::Via { .. } => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Wire {
    pub wire_type: WireType,
    pub paths: Vec<WirePath>,
}

/// Signal net
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Net {
    pub name: String,
    pub sig_type: Option<SigType>,
    pub source: Option<SourceType>,
    pub fixed_bump: bool,
    pub weight: Option<i32>,
    pub non_default_rule: Option<String>,
    pub connections: Vec<NetConnection>,
    /// Block pins on the net
    pub bterms: Vec<String>,
    pub wires: Vec<Wire>,
    pub properties: Properties,
}

/// Special-net path with explicit width
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SPath {
    pub layer: String,
    pub width: Int,
    pub shape: WireShape,
    pub elements: Vec<PathElement>,
}

/// Special-net rectangle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SRect {
    pub layer: String,
    pub shape: WireShape,
    pub rect: Rect,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SWire {
    pub wire_type: WireType,
    pub shield: Option<String>,
    pub paths: Vec<SPath>,
    pub rects: Vec<SRect>,
}

/// Power/ground net
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SpecialNet {
    pub name: String,
    pub sig_type: Option<SigType>,
    pub source: Option<SourceType>,
    pub fixed_bump: bool,
    pub weight: Option<i32>,
    pub connections: Vec<NetConnection>,
    pub bterms: Vec<String>,
    pub wires: Vec<SWire>,
    pub properties: Properties,
}

/// Generated-via parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ViaParams {
    pub rule: String,
    pub cut_size: (Int, Int),
    pub bottom_layer: String,
    pub cut_layer: String,
    pub top_layer: String,
    pub cut_spacing: (Int, Int),
    pub bottom_enclosure: (Int, Int),
    pub top_enclosure: (Int, Int),
    pub rows_cols: Option<(i32, i32)>,
    pub origin: Option<Point>,
    pub bottom_offset: Option<Point>,
    pub top_offset: Option<Point>,
    pub pattern: Option<String>,
}

/// Via defined in the DEF `VIAS` section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BlockVia {
    pub name: String,
    pub params: Option<ViaParams>,
    pub boxes: Vec<LayerRect>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Row {
    pub name: String,
    pub site: String,
    pub origin: Point,
    pub orient: Orient,
    pub dir: Option<RowDir>,
    pub num_sites: i32,
    pub spacing: Int,
    pub properties: Properties,
}

/// Evenly spaced grid lines
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridPattern {
    pub origin: Int,
    pub count: i32,
    pub step: Int,
}

/// Routing tracks of one layer
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrackGrid {
    pub layer: String,
    pub x: Vec<GridPattern>,
    pub y: Vec<GridPattern>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GCellGrid {
    pub x: Vec<GridPattern>,
    pub y: Vec<GridPattern>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Region {
    pub name: String,
    pub kind: Option<RegionType>,
    pub boundaries: Vec<Rect>,
    pub properties: Properties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Group {
    pub name: String,
    pub members: Vec<String>,
    pub region: Option<String>,
    pub properties: Properties,
}

/// Routing blockage
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Obstruction {
    pub layer: String,
    pub shapes: Vec<Shape>,
    pub slots: bool,
    pub fills: bool,
    pub pushdown: bool,
    pub min_spacing: Option<Int>,
    pub effective_width: Option<Int>,
    pub component: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlacementBlockage {
    pub rects: Vec<Rect>,
    pub pushdown: bool,
    pub component: Option<String>,
}

/// Metal fill on one layer
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Fill {
    pub layer: String,
    pub shapes: Vec<Shape>,
}

/// Per-layer override in a non-default rule
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LayerRule {
    pub layer: String,
    pub width: Int,
    pub spacing: Option<Int>,
    pub wire_ext: Option<Int>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NonDefaultRule {
    pub name: String,
    pub hard_spacing: bool,
    pub layers: Vec<LayerRule>,
    pub vias: Vec<String>,
    pub via_rules: Vec<String>,
    pub min_cuts: Vec<(String, i32)>,
    pub properties: Properties,
}

crate::enumstr!(
    /// Declared data kind of a property definition
    PropKind {
        Integer: "INTEGER",
        Real: "REAL",
        String: "STRING",
    }
);

/// Declared property: kind plus optional default and range
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropDefinition {
    pub kind: PropKind,
    pub value: Option<PropValue>,
    pub range: Option<(PropValue, PropValue)>,
}

/// Property definitions keyed by owner object type, then property name
pub type PropDefTable = BTreeMap<String, BTreeMap<String, PropDefinition>>;

/// Design block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    pub hier_delimiter: char,
    pub bus_delimiters: (char, char),
    pub def_units: i32,
    pub die_area: Option<Rect>,
    pub insts: NamedList<Inst>,
    pub bterms: NamedList<BTerm>,
    pub nets: NamedList<Net>,
    pub special_nets: NamedList<SpecialNet>,
    pub vias: NamedList<BlockVia>,
    pub rows: NamedList<Row>,
    pub track_grids: Vec<TrackGrid>,
    pub gcell_grid: Option<GCellGrid>,
    pub regions: NamedList<Region>,
    pub groups: NamedList<Group>,
    pub obstructions: Vec<Obstruction>,
    pub placement_blockages: Vec<PlacementBlockage>,
    pub fills: Vec<Fill>,
    pub non_default_rules: NamedList<NonDefaultRule>,
    pub prop_defs: PropDefTable,
    pub properties: Properties,
    pub children: NamedList<Block>,
}

impl Block {
    pub fn new(name: impl Into<String>, hier_delimiter: char) -> Self {
        Self {
            name: name.into(),
            hier_delimiter,
            bus_delimiters: ('[', ']'),
            def_units: 100,
            die_area: None,
            insts: NamedList::new(),
            bterms: NamedList::new(),
            nets: NamedList::new(),
            special_nets: NamedList::new(),
            vias: NamedList::new(),
            rows: NamedList::new(),
            track_grids: Vec::new(),
            gcell_grid: None,
            regions: NamedList::new(),
            groups: NamedList::new(),
            obstructions: Vec::new(),
            placement_blockages: Vec::new(),
            fills: Vec::new(),
            non_default_rules: NamedList::new(),
            prop_defs: PropDefTable::new(),
            properties: Properties::new(),
            children: NamedList::new(),
        }
    }

    pub fn find_child(&self, name: &str) -> Option<&Block> {
        self.children.get(name)
    }

    pub fn destroy_child(&mut self, name: &str) -> Option<Block> {
        self.children.remove(name)
    }

    /// Tracks of `layer`, created on first use
    pub fn track_grid_mut(&mut self, layer: &str) -> &mut TrackGrid {
        let pos = match self.track_grids.iter().position(|g| g.layer == layer) {
            Some(pos) => pos,
            None => {
                self.track_grids.push(TrackGrid {
                    layer: layer.to_string(),
                    ..Default::default()
                });
                self.track_grids.len() - 1
            }
        };
        &mut self.track_grids[pos]
    }

    pub fn find_track_grid(&self, layer: &str) -> Option<&TrackGrid> {
        self.track_grids.iter().find(|g| g.layer == layer)
    }

    /// Block via first, then technology via
    pub fn has_via(&self, tech: &Tech, name: &str) -> bool {
        self.vias.contains(name) || tech.find_via(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_list_rejects_duplicates() {
        let mut rows = NamedList::new();
        assert!(rows
            .insert(Row {
                name: "ROW_0".into(),
                ..Default::default()
            })
            .is_ok());
        let dup = rows.insert(Row {
            name: "ROW_0".into(),
            num_sites: 7,
            ..Default::default()
        });
        assert_eq!(dup.map_err(|r| r.num_sites), Err(7));
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_named_list_remove_reindexes() {
        let mut list: NamedList<Region> = ["A", "B", "C"]
            .iter()
            .map(|n| Region {
                name: n.to_string(),
                ..Default::default()
            })
            .collect();
        assert!(list.remove("A").is_some());
        assert_eq!(list.get("C").map(|r| r.name.as_str()), Some("C"));
        assert!(list.get("A").is_none());
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_destroy_child() {
        let mut top = Block::new("top", '/');
        assert!(top.children.insert(Block::new("sub", '/')).is_ok());
        assert!(top.find_child("sub").is_some());
        assert_eq!(top.destroy_child("sub").map(|b| b.name), Some("sub".to_string()));
        assert!(top.find_child("sub").is_none());
        assert!(top.destroy_child("sub").is_none());
    }

    #[test]
    fn test_track_grid_created_once() {
        let mut block = Block::new("top", '/');
        block.track_grid_mut("M1").x.push(GridPattern {
            origin: 0,
            count: 10,
            step: 200,
        });
        block.track_grid_mut("M1").y.push(GridPattern {
            origin: 100,
            count: 5,
            step: 200,
        });
        assert_eq!(block.track_grids.len(), 1);
        let grid = block.find_track_grid("M1").unwrap();
        assert_eq!(grid.x.len(), 1);
        assert_eq!(grid.y.len(), 1);
    }

    #[test]
    fn test_placement_status_is_placed() {
        assert!(PlacementStatus::Firm.is_placed());
        assert!(!PlacementStatus::Unplaced.is_placed());
    }
}
