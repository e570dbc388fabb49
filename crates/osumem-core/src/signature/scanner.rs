use std::ops::ControlFlow;

use tracing::debug;

use super::Pattern;
use crate::error::{Error, Result};
use crate::memory::layout::scan::WINDOW_SIZE;
use crate::memory::{Process, Region, read_full_at};

/// Searches a process's memory for compiled patterns
///
/// Regions are streamed through a fixed-size window. Consecutive windows
/// overlap by the pattern length so a match straddling a boundary is still
/// seen whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scanner {
    window_size: usize,
}

impl Default for Scanner {
    fn default() -> Self {
        Self {
            window_size: WINDOW_SIZE,
        }
    }
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window_size(window_size: usize) -> Self {
        Self { window_size }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Address of the first match, in region order then offset order
    pub fn scan<P: Process + ?Sized>(&self, process: &P, pattern: &Pattern) -> Result<u64> {
        let mut found = None;
        self.for_each_match(process, pattern, |address| {
            found = Some(address);
            ControlFlow::Break(())
        })?;

        match found {
            Some(address) => {
                debug!("Pattern '{}' found at {:#x}", pattern.source(), address);
                Ok(address)
            }
            None => Err(Error::PatternNotFound(pattern.source().to_string())),
        }
    }

    /// Up to `limit` match addresses, in scan order
    pub fn scan_all<P: Process + ?Sized>(
        &self,
        process: &P,
        pattern: &Pattern,
        limit: usize,
    ) -> Result<Vec<u64>> {
        let mut found = Vec::new();
        if limit == 0 {
            return Ok(found);
        }
        self.for_each_match(process, pattern, |address| {
            found.push(address);
            if found.len() >= limit {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        Ok(found)
    }

    fn for_each_match<P, F>(&self, process: &P, pattern: &Pattern, mut on_match: F) -> Result<()>
    where
        P: Process + ?Sized,
        F: FnMut(u64) -> ControlFlow<()>,
    {
        for region in process.regions()? {
            if self.scan_region(process, region, pattern, &mut on_match)?.is_break() {
                break;
            }
        }
        Ok(())
    }

    fn scan_region<P, F>(
        &self,
        process: &P,
        region: Region,
        pattern: &Pattern,
        on_match: &mut F,
    ) -> Result<ControlFlow<()>>
    where
        P: Process + ?Sized,
        F: FnMut(u64) -> ControlFlow<()>,
    {
        let len = pattern.len();
        let window = self.window_size.max(len * 2);
        let mut buf = vec![0u8; window];
        let mut cursor = region.start;
        // Matches inside the overlap are seen twice
        let mut next_reportable = region.start;

        while cursor < region.end() {
            let wanted = window.min((region.end() - cursor) as usize);
            let n = match read_full_at(process, &mut buf[..wanted], cursor) {
                Ok(n) => n,
                Err(e) if cursor == region.start => {
                    if still_mapped(process, cursor)? {
                        return Err(Error::read_failed(cursor, e.to_string()));
                    }
                    debug!("Region {:#x} was unmapped before it could be read", region.start);
                    break;
                }
                Err(e) => {
                    debug!("Region {:#x} ended early at {:#x}: {}", region.start, cursor, e);
                    break;
                }
            };

            let mut offset = 0;
            while let Some(hit) = pattern.find_in(&buf[offset..n]) {
                let address = cursor + (offset + hit) as u64;
                offset += hit + 1;
                if address < next_reportable {
                    continue;
                }
                next_reportable = address + 1;
                if on_match(address).is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }

            if n < wanted {
                debug!(
                    "Region {:#x} shrank during scan at {:#x}",
                    region.start,
                    cursor + n as u64
                );
                break;
            }
            if cursor + n as u64 >= region.end() {
                break;
            }
            cursor += n.saturating_sub(len).max(1) as u64;
        }

        Ok(ControlFlow::Continue(()))
    }
}

/// Whether `address` still lies in a readable region of the current map
fn still_mapped<P: Process + ?Sized>(process: &P, address: u64) -> Result<bool> {
    Ok(process.regions()?.iter().any(|r| r.contains(address)))
}
