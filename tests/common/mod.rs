// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Shared LEF/DEF fixtures for the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use defin::db::Database;
use defin::lef::parse_lef;

pub const LEF: &str = r#"
VERSION 5.8 ;
UNITS
  DATABASE MICRONS 1000 ;
END UNITS

LAYER M1
  TYPE ROUTING ;
  DIRECTION HORIZONTAL ;
  WIDTH 0.14 ;
END M1

LAYER V1
  TYPE CUT ;
END V1

LAYER M2
  TYPE ROUTING ;
  DIRECTION VERTICAL ;
  WIDTH 0.2 ;
END M2

VIA VIA12 DEFAULT
  LAYER M1 ;
    RECT -0.07 -0.07 0.07 0.07 ;
  LAYER V1 ;
    RECT -0.05 -0.05 0.05 0.05 ;
  LAYER M2 ;
    RECT -0.1 -0.1 0.1 0.1 ;
END VIA12

SITE core
  CLASS CORE ;
  SIZE 0.2 BY 2.0 ;
END core

MACRO INV
  CLASS CORE ;
  SIZE 0.6 BY 2.0 ;
  PIN A
    DIRECTION INPUT ;
    PORT
      LAYER M1 ;
        RECT 0.1 0.5 0.2 0.6 ;
    END
  END A
  PIN Y
    DIRECTION OUTPUT ;
  END Y
  PIN VDD
    USE POWER ;
  END VDD
  PIN VSS
    USE GROUND ;
  END VSS
END INV

END LIBRARY
"#;

pub const DEF: &str = r#"
VERSION 5.8 ;
DIVIDERCHAR "/" ;
BUSBITCHARS "[]" ;
DESIGN top ;
UNITS DISTANCE MICRONS 1000 ;

DIEAREA ( 0 0 ) ( 10000 10000 ) ;

ROW ROW_0 core 0 0 N DO 10 BY 1 STEP 200 0 ;
TRACKS X 100 DO 50 STEP 200 LAYER M1 ;

COMPONENTS 2 ;
  - u1 INV + PLACED ( 1000 2000 ) N ;
  - u2 INV + FIXED ( 3000 2000 ) FS ;
END COMPONENTS

PINS 1 ;
  - in + NET n1 + DIRECTION INPUT + USE SIGNAL
    + LAYER M1 ( -70 -70 ) ( 70 70 )
    + PLACED ( 0 5000 ) N ;
END PINS

SPECIALNETS 1 ;
  - VDD ( * VDD ) + USE POWER
    + ROUTED M1 200 + SHAPE STRIPE ( 0 100 ) ( 10000 100 ) ;
END SPECIALNETS

NETS 2 ;
  - n1 ( PIN in ) ( u1 A ) ;
  - n2 ( u1 Y ) ( u2 A )
    + ROUTED M1 ( 500 500 ) RECT ( -70 -100 70 100 ) ;
END NETS

END DESIGN
"#;

/// Database holding the fixture technology and library
pub fn database() -> Database {
    let (tech, lib) = parse_lef(LEF, "cells").unwrap();
    Database {
        tech,
        libs: vec![lib],
        chip: None,
    }
}

/// The fixture DEF text with `extra` spliced in before COMPONENTS
pub fn def_with(extra: &str) -> String {
    DEF.replace("COMPONENTS 2 ;", &format!("{extra}\nCOMPONENTS 2 ;"))
}

/// Write `content` to a per-test file under the temp directory
pub fn temp_file(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("defin-tests-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}
