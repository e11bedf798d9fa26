// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use std::fs::File;
use std::io::Write;

use csv::Writer;
use serde::Serialize;

use crate::db::{Block, Inst, Net};

#[derive(Debug, Serialize)]
pub struct ComponentCsvRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Master")]
    pub master: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "X")]
    pub x: i32,
    #[serde(rename = "Y")]
    pub y: i32,
    #[serde(rename = "Orient")]
    pub orient: String,
    #[serde(rename = "Terms")]
    pub terms: usize,
}

#[derive(Debug, Serialize)]
pub struct NetCsvRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Use")]
    pub use_: String,
    #[serde(rename = "Connections")]
    pub connections: usize,
    #[serde(rename = "Pins")]
    pub pins: String,
    #[serde(rename = "Wires")]
    pub wires: usize,
    #[serde(rename = "Segments")]
    pub segments: usize,
}

fn component_to_csv_record(inst: &Inst) -> ComponentCsvRecord {
    ComponentCsvRecord {
        name: inst.name.clone(),
        master: inst.master.clone(),
        status: inst.status.to_string(),
        x: inst.location.x,
        y: inst.location.y,
        orient: inst.orient.to_string(),
        terms: inst.terms.len(),
    }
}

/// Format connections as "INSTANCE:PIN" joined by commas
fn format_connections(net: &Net) -> String {
    net.connections
        .iter()
        .map(|c| format!("{}:{}", c.inst, c.pin))
        .chain(net.bterms.iter().map(|b| format!("PIN:{b}")))
        .collect::<Vec<String>>()
        .join(",")
}

fn net_to_csv_record(net: &Net) -> NetCsvRecord {
    NetCsvRecord {
        name: net.name.clone(),
        use_: net.sig_type.map(|s| s.to_string()).unwrap_or_default(),
        connections: net.connections.len() + net.bterms.len(),
        pins: format_connections(net),
        wires: net.wires.len(),
        segments: net.wires.iter().map(|w| w.paths.len()).sum(),
    }
}

/// Write the block's components as CSV
pub fn write_components_csv<W: Write>(
    block: &Block,
    out: W,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = Writer::from_writer(out);
    for inst in block.insts.iter() {
        writer.serialize(component_to_csv_record(inst))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the block's regular nets as CSV
pub fn write_nets_csv<W: Write>(block: &Block, out: W) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = Writer::from_writer(out);
    for net in block.nets.iter() {
        writer.serialize(net_to_csv_record(net))?;
    }
    writer.flush()?;
    Ok(())
}

/// Export block components to a CSV file
pub fn export_components_to_csv(
    block: &Block,
    file_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    write_components_csv(block, File::create(file_path)?)
}

/// Export block nets to a CSV file
pub fn export_nets_to_csv(block: &Block, file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    write_nets_csv(block, File::create(file_path)?)
}
