//! Schema command implementation.

use anyhow::Result;
use osumem_core::schema::AddressKind;
use osumem_core::{AddressSchema, RecordSchema, Schemas};

fn address_lines(schema: &AddressSchema) -> Vec<String> {
    schema
        .entries()
        .iter()
        .map(|entry| match entry.kind() {
            AddressKind::Signature(pattern) => {
                format!("  {:<14} sig    {}", entry.name(), pattern)
            }
            AddressKind::Derived(expr) => format!("  {:<14} expr   {}", entry.name(), expr),
        })
        .collect()
}

fn record_lines<R>(schema: &RecordSchema<R>) -> Vec<String> {
    schema
        .fields()
        .iter()
        .map(|field| {
            format!(
                "  {:<20} {:<7} {}",
                field.name(),
                field.shape().to_string(),
                field.expr()
            )
        })
        .collect()
}

/// Run the schema command
pub fn run() -> Result<()> {
    let schemas = Schemas::load()?;

    println!("=== Addresses ===");
    for line in address_lines(&schemas.addresses) {
        println!("{}", line);
    }

    for (name, lines) in [
        (schemas.status.name(), record_lines(&schemas.status)),
        (schemas.menu.name(), record_lines(&schemas.menu)),
        (schemas.gameplay.name(), record_lines(&schemas.gameplay)),
    ] {
        println!();
        println!("=== {} ({} fields) ===", name, lines.len());
        for line in lines {
            println!("{}", line);
        }
    }
    Ok(())
}
