// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use std::env;
use std::process::ExitCode;

use log::error;

use defin::export::{export_components_to_csv, export_nets_to_csv};
use defin::{DefReader, LefReader, ReaderOptions};

const OPTIONS_ENV: &str = "DEFIN_OPTIONS";

fn run(lef: &str, def: &str, csv: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let options = match env::var(OPTIONS_ENV) {
        Ok(path) => ReaderOptions::from_file(path)?,
        Err(_) => ReaderOptions::default(),
    };
    let mut db = LefReader::new().read_database(lef)?;
    let mut reader = DefReader::new(options);
    let summary = reader.create_chip(&mut db, def)?;

    let Some(chip) = db.chip.as_ref() else {
        return Err("no chip after import".into());
    };
    println!(
        "{}: {} components, {} pins, {} nets, {} special nets",
        chip.block.name, summary.components, summary.pins, summary.nets, summary.special_nets
    );
    if let Some(prefix) = csv {
        export_components_to_csv(&chip.block, &format!("{prefix}_components.csv"))?;
        export_nets_to_csv(&chip.block, &format!("{prefix}_nets.csv"))?;
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 || args.len() > 4 {
        let prog = args.first().map_or("defin", String::as_str);
        eprintln!("usage: {prog} <lef> <def> [csv-prefix]");
        return ExitCode::from(2);
    }
    match run(&args[1], &args[2], args.get(3).map(String::as_str)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
