//! Dump command implementation.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use osumem_core::{AggregateError, Config, GameStatus, GameplayData, MenuData, Schemas, StatusData};
use serde::Serialize;

use super::{connect, resolve_best_effort};

/// One snapshot of everything the client exposes
#[derive(Debug, Serialize)]
struct Dump {
    pid: u32,
    status: GameStatus,
    addresses: BTreeMap<String, String>,
    unresolved: Vec<String>,
    menu: MenuData,
    gameplay: Option<GameplayData>,
    /// Field name to error message, for every field that failed to read
    errors: BTreeMap<String, String>,
}

fn record_errors(errors: &mut BTreeMap<String, String>, err: &AggregateError, ignored: &[String]) {
    for failure in err.failures() {
        if !ignored.iter().any(|name| name == failure.field) {
            errors.insert(
                format!("{}.{}", err.record(), failure.field),
                failure.source.to_string(),
            );
        }
    }
}

/// Run the dump command
pub fn run(config: &Config, pid: Option<u32>, output: Option<&Path>) -> Result<()> {
    let schemas = Schemas::load()?;
    let mut session = connect(config, pid, schemas.addresses.clone())?;
    resolve_best_effort(&mut session, config);

    let ignored = &config.read.ignored_fields;
    let mut errors = BTreeMap::new();

    let mut status = StatusData::default();
    if let Err(e) = session.read(&schemas.status, &mut status) {
        record_errors(&mut errors, &e, ignored);
    }

    let mut menu = MenuData::default();
    if let Err(e) = session.read(&schemas.menu, &mut menu) {
        record_errors(&mut errors, &e, ignored);
    }

    let gameplay = if status.game_status().is_playing() {
        let mut gameplay = GameplayData::default();
        if let Err(e) = session.read(&schemas.gameplay, &mut gameplay) {
            record_errors(&mut errors, &e, ignored);
        }
        Some(gameplay)
    } else {
        None
    };

    let table = session.addresses();
    let dump = Dump {
        pid: session.process().pid(),
        status: status.game_status(),
        addresses: table
            .resolved()
            .iter()
            .map(|(name, address)| (name.clone(), format!("{:#X}", address)))
            .collect(),
        unresolved: table.unresolved().into_iter().map(String::from).collect(),
        menu,
        gameplay,
        errors,
    };

    let json = serde_json::to_string_pretty(&dump)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            println!("Dump saved to: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
