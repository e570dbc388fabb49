//! Hexdump command implementation.
//!
//! Displays raw memory at an address or expression, useful for checking
//! which offsets of a structure hold the value a field expects.

use anyhow::Result;
use osumem_core::Config;

use super::eval::evaluate;
use super::hex_utils::{format_hex_address, hexdump_lines};

/// Run the hexdump command
pub fn run(config: &Config, pid: Option<u32>, source: &str, size: usize, ascii: bool) -> Result<()> {
    let (session, address) = evaluate(config, pid, source)?;
    let bytes = session.reader().read_bytes(address, size)?;

    println!("Hexdump at {} ({} bytes):", format_hex_address(address), size);
    println!();
    for line in hexdump_lines(address, &bytes, ascii) {
        println!("{}", line);
    }
    Ok(())
}
