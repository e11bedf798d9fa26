// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! LEF loading feeding the DEF importer

mod common;

use defin::db::{find_master, IoType, LayerKind};
use defin::error::LefError;
use defin::{DefReader, LefReader};

#[test]
fn test_read_lef_file_names_library() {
    let path = common::temp_file("cells.lef", common::LEF);
    let (tech, lib) = LefReader::new().read(&path).unwrap();
    assert_eq!(lib.name, "cells");
    assert_eq!(tech.dbu_per_micron, 1000);
    assert_eq!(tech.find_layer("M2").unwrap().width, 200);
    assert_eq!(tech.find_layer("V1").unwrap().kind, LayerKind::Cut);
    assert_eq!(tech.find_via("VIA12").unwrap().layers, vec!["M1", "V1", "M2"]);
    assert_eq!(lib.sites.get("core").unwrap().height, 2000);
}

#[test]
fn test_macro_pins_resolve() {
    let db = common::database();
    let inv = find_master(&db.libs, "INV").unwrap();
    assert_eq!(inv.class.as_deref(), Some("CORE"));
    assert_eq!((inv.width, inv.height), (600, 2000));
    let names: Vec<&str> = inv.pins.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["A", "Y", "VDD", "VSS"]);
    assert_eq!(inv.find_pin("Y").unwrap().io_type, Some(IoType::Output));
}

#[test]
fn test_missing_lef_file() {
    let missing = std::env::temp_dir().join("defin-no-such-file.lef");
    let err = LefReader::new().read(&missing).unwrap_err();
    assert!(matches!(err, LefError::Io { .. }));
}

#[test]
fn test_lef_then_def_from_files() {
    let lef = common::temp_file("flow.lef", common::LEF);
    let def = common::temp_file("flow.def", common::DEF);
    let mut db = LefReader::new().read_database(&lef).unwrap();
    let summary = DefReader::default().create_chip(&mut db, &def).unwrap();
    assert_eq!(summary.nets, 2);
    assert_eq!(db.chip.unwrap().block.insts.len(), 2);
}
