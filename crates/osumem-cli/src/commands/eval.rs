//! Eval command implementation.

use anyhow::{Context, Result};
use osumem_core::{AddressExpr, Config, Schemas, Shape};

use super::hex_utils::format_hex_address;
use super::{ProcessSession, connect, resolve_best_effort};

/// Parse `source`, attach, and evaluate it.
///
/// Signatures are only scanned for when the expression names an address.
pub fn evaluate(config: &Config, pid: Option<u32>, source: &str) -> Result<(ProcessSession, u64)> {
    let expr = AddressExpr::parse(source)?;
    let schemas = Schemas::load()?;
    schemas.addresses.check_expr(&expr)?;

    let mut session = connect(config, pid, schemas.addresses)?;
    if !expr.variables().is_empty() {
        resolve_best_effort(&mut session, config);
    }

    let address = session
        .evaluate(&expr)
        .with_context(|| format!("Failed to evaluate {}", expr))?;
    Ok((session, address))
}

/// Run the eval command
pub fn run(config: &Config, pid: Option<u32>, source: &str, shape: Option<&str>) -> Result<()> {
    let shape: Option<Shape> = shape.map(str::parse).transpose()?;
    let (session, address) = evaluate(config, pid, source)?;

    println!("{} = {}", source, format_hex_address(address));
    if let Some(shape) = shape {
        let value = session.reader().read_value(address, shape)?;
        println!("{} = {}", shape, value);
    }
    Ok(())
}
