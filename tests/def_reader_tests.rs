// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! End-to-end DEF import through the file-level API

mod common;

use defin::db::{Block, Inst, Point, PlacementStatus, PropKind, PropValue, Rect, Row, RowDir, SigType, WireShape};
use defin::def::reader::ImportSummary;
use defin::error::ReadError;
use defin::{DefReader, ReaderOptions};

fn import(text: &str) -> (defin::Database, Result<ImportSummary, ReadError>, DefReader) {
    let mut db = common::database();
    let mut reader = DefReader::default();
    let result = reader.create_chip_from_str(&mut db, text);
    (db, result, reader)
}

fn top(db: &defin::Database) -> &Block {
    &db.chip.as_ref().expect("chip created").block
}

#[test]
fn test_full_import_counts() {
    let (db, result, reader) = import(common::DEF);
    let summary = result.unwrap();
    assert_eq!(
        summary,
        ImportSummary {
            pins: 1,
            components: 2,
            component_terms: 8,
            special_nets: 1,
            special_net_connections: 2,
            nets: 2,
            net_connections: 3,
            vias: 0,
            rows: 1,
        }
    );
    assert_eq!(reader.errors(), 0);
    assert!(reader.diagnostics().is_empty());

    let block = top(&db);
    assert_eq!(block.name, "top");
    assert_eq!(block.hier_delimiter, '/');
    assert_eq!(block.bus_delimiters, ('[', ']'));
    assert_eq!(block.def_units, 1000);
    assert_eq!(block.die_area, Some(Rect::new(0, 0, 10000, 10000)));
}

#[test]
fn test_components_and_rows() {
    let (db, result, _) = import(common::DEF);
    result.unwrap();
    let block = top(&db);

    let u1 = block.insts.get("u1").unwrap();
    assert_eq!(u1.master, "INV");
    assert_eq!(u1.status, PlacementStatus::Placed);
    assert_eq!(u1.location, Point::new(1000, 2000));
    assert_eq!(u1.terms, vec!["A", "Y", "VDD", "VSS"]);
    assert_eq!(block.insts.get("u2").unwrap().status, PlacementStatus::Firm);

    let row = block.rows.get("ROW_0").unwrap();
    assert_eq!(row.dir, Some(RowDir::Horizontal));
    assert_eq!(row.num_sites, 10);
    assert_eq!(row.spacing, 200);

    let tracks = block.find_track_grid("M1").unwrap();
    assert_eq!(tracks.x.len(), 1);
    assert_eq!(tracks.x[0].count, 50);
}

#[test]
fn test_pin_shape_follows_placement() {
    let (db, result, _) = import(common::DEF);
    result.unwrap();
    let block = top(&db);
    let pin = block.bterms.get("in").unwrap();
    assert_eq!(pin.net, "n1");
    assert_eq!(pin.sig_type, Some(SigType::Signal));
    assert_eq!(pin.pins[0].boxes[0].rect, Rect::new(-70, 4930, 70, 5070));
    assert_eq!(block.nets.get("n1").unwrap().bterms, vec!["in"]);
}

#[test]
fn test_rect_path_becomes_two_point_wire() {
    let (db, result, _) = import(common::DEF);
    result.unwrap();
    let net = top(&db).nets.get("n2").unwrap();
    assert_eq!(net.connections.len(), 2);
    let path = &net.wires[0].paths[0];
    assert_eq!(path.layer, "M1");
    assert_eq!(path.points(), vec![Point::new(500, 470), Point::new(500, 530)]);
}

#[test]
fn test_special_net_wildcard_and_stripe() {
    let (db, result, _) = import(common::DEF);
    result.unwrap();
    let vdd = top(&db).special_nets.get("VDD").unwrap();
    assert_eq!(vdd.sig_type, Some(SigType::Power));
    let instances: Vec<&str> = vdd.connections.iter().map(|c| c.inst.as_str()).collect();
    assert_eq!(instances, vec!["u1", "u2"]);
    let path = &vdd.wires[0].paths[0];
    assert_eq!(path.width, 200);
    assert_eq!(path.shape, WireShape::Stripe);
}

#[test]
fn test_property_definitions_all_recorded() {
    let text = common::def_with(
        "PROPERTYDEFINITIONS\n  COMPONENT weight INTEGER ;\n  COMPONENT tag STRING ;\nEND PROPERTYDEFINITIONS",
    )
    .replace(
        "- u1 INV + PLACED ( 1000 2000 ) N ;",
        "- u1 INV + PLACED ( 1000 2000 ) N + PROPERTY weight 3 tag \"x\" ;",
    );
    let (db, result, _) = import(&text);
    result.unwrap();
    let block = top(&db);

    let defs = block.prop_defs.get("COMPONENT").unwrap();
    assert_eq!(defs.len(), 2);
    assert_eq!(defs.get("weight").unwrap().kind, PropKind::Integer);
    assert_eq!(defs.get("tag").unwrap().kind, PropKind::String);

    let u1 = block.insts.get("u1").unwrap();
    assert_eq!(u1.properties.get("weight"), Some(&PropValue::Int(3)));
    assert_eq!(u1.properties.get("tag"), Some(&PropValue::Str("x".into())));
}

#[test]
fn test_units_above_database_precision_fail() {
    let text = common::DEF.replace("MICRONS 1000", "MICRONS 2000");
    let (db, result, reader) = import(&text);
    assert!(matches!(result, Err(ReadError::Failed { errors: 1 })));
    assert!(db.chip.is_none());
    assert!(reader.diagnostics()[0]
        .to_string()
        .starts_with("error: The DEF UNITS DISTANCE MICRONS convert factor (2000)"));
}

#[test]
fn test_halo_component_rejects_file() {
    let text = common::DEF.replace(
        "- u2 INV + FIXED ( 3000 2000 ) FS ;",
        "- u2 INV + FIXED ( 3000 2000 ) FS + HALO 10 10 10 10 ;",
    );
    let (db, result, reader) = import(&text);
    assert!(matches!(result, Err(ReadError::Failed { errors: 1 })));
    assert!(db.chip.is_none());
    assert!(reader
        .diagnostics()
        .iter()
        .any(|n| n.message.contains("HALO on component is unsupported")));
}

#[test]
fn test_unknown_master_reported() {
    let text = common::DEF.replace("- u2 INV", "- u2 NAND9");
    let (_, result, reader) = import(&text);
    assert!(result.is_err());
    assert!(reader.diagnostics()[0]
        .message
        .contains("Unknown library cell (NAND9) referenced by component u2"));
}

#[test]
fn test_continue_on_error_collects_more() {
    let text = common::def_with("HISTORY first ;\nTECHNOLOGY foo ;");
    let mut db = common::database();
    let mut reader = DefReader::new(ReaderOptions {
        continue_on_error: true,
        ..Default::default()
    });
    let result = reader.create_chip_from_str(&mut db, &text);
    assert!(matches!(result, Err(ReadError::Failed { errors: 2 })));
    assert_eq!(reader.errors(), 2);
    assert!(db.chip.is_none());
}

#[test]
fn test_polygon_die_area_warning_is_not_an_error() {
    let text = common::DEF.replace(
        "DIEAREA ( 0 0 ) ( 10000 10000 ) ;",
        "DIEAREA ( 0 0 ) ( 10000 0 ) ( 10000 8000 ) ( 0 9000 ) ;",
    );
    let (db, result, reader) = import(&text);
    result.unwrap();
    assert_eq!(top(&db).die_area, Some(Rect::new(0, 0, 10000, 9000)));
    assert!(reader.diagnostics()[0].to_string().starts_with("warning: Polygon DIEAREA"));
}

#[test]
fn test_missing_design_fails_before_block() {
    let (db, result, _) = import("VERSION 5.8 ;\nCOMPONENTS 0 ;\nEND COMPONENTS\n");
    assert!(matches!(result, Err(ReadError::Header(_))));
    assert!(db.chip.is_none());
}

#[test]
fn test_malformed_statement_is_source_error() {
    let text = common::DEF.replace("( 1000 2000 ) N", "( 1000 ) N");
    let (db, result, _) = import(&text);
    let e = match result {
        Err(ReadError::Source(e)) => e,
        other => panic!("expected a source error, got {other:?}"),
    };
    assert!(e.to_string().starts_with("Lines "));
    assert!(db.chip.is_none());
}

#[test]
fn test_second_chip_refused() {
    let (mut db, result, mut reader) = import(common::DEF);
    result.unwrap();
    let again = reader.create_chip_from_str(&mut db, common::DEF);
    assert!(matches!(again, Err(ReadError::ChipExists)));
    assert!(db.chip.is_some());
}

#[test]
fn test_block_name_override() {
    let mut db = common::database();
    let mut reader = DefReader::new(ReaderOptions {
        block_name: Some("core".into()),
        ..Default::default()
    });
    reader.create_chip_from_str(&mut db, common::DEF).unwrap();
    assert_eq!(top(&db).name, "core");
}

#[test]
fn test_child_blocks_renamed_on_collision() {
    let mut db = common::database();
    let mut reader = DefReader::default();
    reader.create_chip_from_str(&mut db, common::DEF).unwrap();

    let defin::Database { tech, libs, chip } = &mut db;
    let parent = &mut chip.as_mut().unwrap().block;
    reader.create_block_from_str(tech, libs, parent, common::DEF).unwrap();
    reader.create_block_from_str(tech, libs, parent, common::DEF).unwrap();
    assert!(parent.find_child("top").is_some());
    assert!(parent.find_child("top_1").is_some());
    assert!(reader.diagnostics()[0]
        .message
        .contains("Block with name \"top\" already exists, renaming too \"top_1\""));
}

#[test]
fn test_failed_child_block_is_destroyed() {
    let mut db = common::database();
    let mut reader = DefReader::default();
    reader.create_chip_from_str(&mut db, common::DEF).unwrap();

    let defin::Database { tech, libs, chip } = &mut db;
    let parent = &mut chip.as_mut().unwrap().block;
    let bad = common::def_with("HISTORY nope ;");
    assert!(reader.create_block_from_str(tech, libs, parent, &bad).is_err());
    assert!(parent.find_child("top").is_none());
}

#[test]
fn test_replace_wires_keeps_placement() {
    let (mut db, result, mut reader) = import(common::DEF);
    result.unwrap();

    let routing = "VERSION 5.8 ;\nDESIGN top ;\nUNITS DISTANCE MICRONS 1000 ;\n\
                   COMPONENTS 1 ;\n- u9 INV ;\nEND COMPONENTS\n\
                   NETS 1 ;\n- n2 ( u1 Y ) + ROUTED M2 ( 0 0 ) ( 0 800 ) ;\nEND NETS\n\
                   END DESIGN\n";
    let defin::Database { tech, libs, chip } = &mut db;
    let block = &mut chip.as_mut().unwrap().block;
    let insts_before: Vec<Inst> = block.insts.iter().cloned().collect();
    let rows_before: Vec<Row> = block.rows.iter().cloned().collect();
    let summary = reader.replace_wires_from_str(tech, libs, block, routing).unwrap();
    assert_eq!(summary.nets, 1);
    assert_eq!(summary.components, 0);

    assert!(block.insts.get("u9").is_none());
    assert_eq!(block.insts.iter().cloned().collect::<Vec<Inst>>(), insts_before);
    assert_eq!(block.rows.iter().cloned().collect::<Vec<Row>>(), rows_before);
    assert_eq!(block.insts.get("u1").unwrap().location, Point::new(1000, 2000));
    assert_eq!(block.insts.get("u2").unwrap().status, PlacementStatus::Firm);
    let n2 = block.nets.get("n2").unwrap();
    assert_eq!(n2.connections.len(), 2);
    assert_eq!(n2.wires[0].paths[0].layer, "M2");
    assert_eq!(
        n2.wires[0].paths[0].points(),
        vec![Point::new(0, 0), Point::new(0, 800)]
    );
}

#[test]
fn test_replace_wires_unknown_net() {
    let (mut db, result, mut reader) = import(common::DEF);
    result.unwrap();
    let routing = "NETS 1 ;\n- nX + ROUTED M1 ( 0 0 ) ( 0 10 ) ;\nEND NETS\n";
    let defin::Database { tech, libs, chip } = &mut db;
    let block = &mut chip.as_mut().unwrap().block;
    let err = reader.replace_wires_from_str(tech, libs, block, routing).unwrap_err();
    assert!(matches!(err, ReadError::Failed { errors: 1 }));
    assert!(block.nets.get("n1").is_some());
}

#[test]
fn test_path_entry_points() {
    let path = common::temp_file("top.def", common::DEF);
    let mut db = common::database();
    let mut reader = DefReader::default();
    let summary = reader.create_chip(&mut db, &path).unwrap();
    assert_eq!(summary.components, 2);

    let mut other = common::database();
    let missing = path.with_file_name("missing.def");
    let err = DefReader::default().create_chip(&mut other, &missing).unwrap_err();
    assert!(matches!(err, ReadError::Io { .. }));
    assert!(err.to_string().starts_with("Cannot open DEF file"));
}
