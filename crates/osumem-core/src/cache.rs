//! Address cache for faster startup
//!
//! Saves resolved signature addresses to a file and reuses them when the same
//! game process is attached again, skipping the signature scan.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::memory::Process;
use crate::schema::AddressTable;

/// Default cache file name
pub const CACHE_FILE: &str = ".osumem-cache.json";

/// Maximum age for cache validity (24 hours)
const MAX_CACHE_AGE_HOURS: i64 = 24;

/// Signature addresses found in one process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressCache {
    pub pid: u32,
    pub executable_path: PathBuf,
    pub addresses: BTreeMap<String, u64>,
    pub created_at: DateTime<Utc>,
}

impl AddressCache {
    pub fn new(pid: u32, executable_path: PathBuf, addresses: BTreeMap<String, u64>) -> Self {
        Self {
            pid,
            executable_path,
            addresses,
            created_at: Utc::now(),
        }
    }

    /// Snapshot the resolved entries of `table`
    pub fn from_table<P: Process + ?Sized>(process: &P, table: &AddressTable) -> Result<Self> {
        Ok(Self::new(
            process.pid(),
            process.executable_path()?,
            table.resolved().clone(),
        ))
    }

    /// Load cache from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();

        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                debug!("Cache file not found or unreadable: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<AddressCache>(&content) {
            Ok(cache) => {
                debug!(
                    "Loaded cache: pid={}, {} addresses, created_at={}",
                    cache.pid,
                    cache.addresses.len(),
                    cache.created_at
                );
                Some(cache)
            }
            Err(e) => {
                warn!("Failed to parse cache file: {}", e);
                None
            }
        }
    }

    /// Save cache to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)?;
        info!("Saved address cache to {}", path.as_ref().display());
        Ok(())
    }

    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.created_at)
    }

    /// Check if the cache was written for this very process.
    ///
    /// A restarted client gets a new pid and new addresses, so the pid and
    /// image path must both match.
    pub fn is_valid_for(&self, pid: u32, executable_path: &Path) -> bool {
        if self.pid != pid {
            debug!("Cache pid mismatch: cached={}, current={}", self.pid, pid);
            return false;
        }
        if self.executable_path != executable_path {
            debug!(
                "Cache path mismatch: cached={}, current={}",
                self.executable_path.display(),
                executable_path.display()
            );
            return false;
        }

        let age = self.age();
        if age > Duration::hours(MAX_CACHE_AGE_HOURS) {
            debug!("Cache expired: age={}s", age.num_seconds());
            return false;
        }

        if self.addresses.is_empty() {
            debug!("Cache holds no addresses");
            return false;
        }

        true
    }

    /// Copy cached addresses into `table`, returning how many were applied.
    ///
    /// Names the table does not declare as signatures are skipped.
    pub fn apply(&self, table: &mut AddressTable) -> usize {
        let mut applied = 0;
        for (name, &address) in &self.addresses {
            match table.set(name, address) {
                Ok(()) => applied += 1,
                Err(e) => debug!("Skipping cached address {}: {}", name, e),
            }
        }
        applied
    }
}

/// Fill `table` from the cache at `path` if it belongs to `process`.
///
/// Returns the number of addresses applied; zero when there is no usable cache.
pub fn try_apply_cached<P: Process + ?Sized>(
    path: &Path,
    process: &P,
    table: &mut AddressTable,
) -> usize {
    let Some(cache) = AddressCache::load(path) else {
        return 0;
    };
    let Ok(executable) = process.executable_path() else {
        return 0;
    };
    if !cache.is_valid_for(process.pid(), &executable) {
        return 0;
    }

    let applied = cache.apply(table);
    info!(
        "Using cached addresses (pid: {}, age: {}s, {} applied)",
        cache.pid,
        cache.age().num_seconds(),
        applied
    );
    applied
}

/// Save the resolved addresses of `table` to `path`
pub fn save_table<P: Process + ?Sized>(path: &Path, process: &P, table: &AddressTable) {
    let result = AddressCache::from_table(process, table).and_then(|cache| cache.save(path));
    if let Err(e) = result {
        warn!("Failed to save address cache: {}", e);
    }
}

/// Delete the cache at `path`, e.g. after its addresses stopped reading
pub fn remove(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => info!("Discarded address cache {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove address cache: {}", e),
    }
}
