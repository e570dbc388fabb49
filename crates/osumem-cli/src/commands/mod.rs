//! CLI command implementations.

pub mod dump;
pub mod eval;
pub mod hex_utils;
pub mod hexdump;
pub mod scan;
pub mod schema;
pub mod watch;

use anyhow::{Context, Result};
use osumem_core::memory::{attach, attach_pid};
use osumem_core::{AddressSchema, Config, Process, Scanner, Session};
use tracing::{info, warn};

pub type ProcessSession = Session<Box<dyn Process>>;

/// Attach to the game, either by pid or by the configured process name
pub fn connect(config: &Config, pid: Option<u32>, addresses: AddressSchema) -> Result<ProcessSession> {
    let process = match pid {
        Some(pid) => attach_pid(pid).with_context(|| format!("Failed to open pid {}", pid))?,
        None => attach(&config.process.name, &config.process.blacklisted_titles)?,
    };
    info!("Attached to {} (pid {})", config.process.name, process.pid());

    Ok(Session::new(process, addresses)
        .with_scanner(Scanner::with_window_size(config.scan.window_size)))
}

/// Fill in signature addresses from the cache, then by scanning.
///
/// Returns the scan error if any signature is still missing; whatever was
/// found is kept in the session either way.
pub fn resolve(session: &mut ProcessSession, config: &Config) -> osumem_core::Result<()> {
    let from_cache = if config.cache.enabled {
        session.load_cache(&config.cache.path)
    } else {
        0
    };

    let result = session.resolve_missing();
    let table = session.addresses();
    let total = table.schema().signatures().count();
    info!(
        "Resolved {}/{} signatures ({} from cache)",
        table.resolved().len(),
        total,
        from_cache
    );

    if config.cache.enabled && table.resolved().len() > from_cache {
        session.save_cache(&config.cache.path);
    }
    result
}

/// Like [`resolve`], but a partial result only warns
pub fn resolve_best_effort(session: &mut ProcessSession, config: &Config) {
    if let Err(e) = resolve(session, config) {
        warn!(
            "Continuing without {}: {}",
            session.addresses().unresolved().join(", "),
            e
        );
    }
}
