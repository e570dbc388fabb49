//! In-memory [`Process`] for tests

use std::cell::Cell;
use std::io;
use std::path::PathBuf;

use super::{Process, Region, Scalar};
use crate::error::Result;

#[derive(Debug, Clone)]
struct MockRegion {
    start: u64,
    bytes: Vec<u8>,
    unreadable: bool,
    /// Listed by the first `regions()` call only, unmapped afterwards
    vanishing: bool,
}

/// A fake process whose memory is a set of byte buffers
#[derive(Debug, Clone)]
pub struct MockProcess {
    pid: u32,
    path: PathBuf,
    regions: Vec<MockRegion>,
    max_read: Option<usize>,
    listings: Cell<usize>,
}

impl MockProcess {
    fn region_at(&self, address: u64) -> Option<&MockRegion> {
        self.regions.iter().find(|r| {
            !(r.vanishing && self.listings.get() > 0)
                && address >= r.start
                && address < r.start + r.bytes.len() as u64
        })
    }
}

impl Process for MockProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn read_at(&self, buf: &mut [u8], address: u64) -> io::Result<usize> {
        let region = self
            .region_at(address)
            .ok_or_else(|| io::Error::other(format!("address {:#x} is not mapped", address)))?;
        if region.unreadable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "region is not readable",
            ));
        }

        let offset = (address - region.start) as usize;
        let mut n = buf.len().min(region.bytes.len() - offset);
        if let Some(max) = self.max_read {
            n = n.min(max);
        }
        buf[..n].copy_from_slice(&region.bytes[offset..offset + n]);
        Ok(n)
    }

    fn regions(&self) -> Result<Vec<Region>> {
        let first = self.listings.get() == 0;
        self.listings.set(self.listings.get() + 1);
        Ok(self
            .regions
            .iter()
            .filter(|r| first || !r.vanishing)
            .map(|r| Region::new(r.start, r.bytes.len() as u64))
            .collect())
    }

    fn executable_path(&self) -> Result<PathBuf> {
        Ok(self.path.clone())
    }
}

/// Builder for [`MockProcess`]
///
/// Regions must be declared before anything is written into them.
#[derive(Debug, Clone)]
pub struct MockProcessBuilder {
    process: MockProcess,
}

impl Default for MockProcessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProcessBuilder {
    pub fn new() -> Self {
        Self {
            process: MockProcess {
                pid: 1234,
                path: PathBuf::from(r"C:\osu!\osu!.exe"),
                regions: Vec::new(),
                max_read: None,
                listings: Cell::new(0),
            },
        }
    }

    pub fn pid(mut self, pid: u32) -> Self {
        self.process.pid = pid;
        self
    }

    pub fn executable<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.process.path = path.into();
        self
    }

    /// Map a zero-filled region
    pub fn region(mut self, start: u64, size: usize) -> Self {
        self.process.regions.push(MockRegion {
            start,
            bytes: vec![0; size],
            unreadable: false,
            vanishing: false,
        });
        self.process.regions.sort_by_key(|r| r.start);
        self
    }

    /// Map a region that is listed but fails every read
    pub fn unreadable_region(mut self, start: u64, size: usize) -> Self {
        self = self.region(start, size);
        if let Some(region) = self.process.regions.iter_mut().find(|r| r.start == start) {
            region.unreadable = true;
        }
        self
    }

    /// Map a region that is unmapped right after the first memory map is
    /// taken, as if the game freed it mid-scan
    pub fn vanishing_region(mut self, start: u64, size: usize) -> Self {
        self = self.region(start, size);
        if let Some(region) = self.process.regions.iter_mut().find(|r| r.start == start) {
            region.vanishing = true;
        }
        self
    }

    /// Cap the number of bytes returned by a single read
    pub fn max_read(mut self, max: usize) -> Self {
        self.process.max_read = Some(max);
        self
    }

    pub fn write_bytes(mut self, address: u64, bytes: &[u8]) -> Self {
        let region = self
            .process
            .regions
            .iter_mut()
            .find(|r| address >= r.start && address + bytes.len() as u64 <= r.start + r.bytes.len() as u64)
            .unwrap_or_else(|| panic!("write at {:#x} is outside every mock region", address));
        let offset = (address - region.start) as usize;
        region.bytes[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn write<T: Scalar>(self, address: u64, value: T) -> Self {
        let bytes = value.to_le_vec();
        self.write_bytes(address, &bytes)
    }

    /// Write a 4-byte pointer
    pub fn write_ptr(self, address: u64, target: u32) -> Self {
        self.write(address, target)
    }

    /// Lay out a `System.String` object at `address`
    pub fn write_string(self, address: u64, text: &str) -> Self {
        let units: Vec<u16> = text.encode_utf16().collect();
        let payload: Vec<u8> = units.iter().flat_map(|u| u.to_le_bytes()).collect();
        self.write(address + 4, units.len() as i32)
            .write_bytes(address + 8, &payload)
    }

    /// Lay out a `List<T>` at `list` whose backing array lives at `items`
    pub fn write_list<T: Scalar>(self, list: u64, items: u64, values: &[T]) -> Self {
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_vec()).collect();
        self.write_ptr(list + 4, items as u32)
            .write(list + 0xC, values.len() as i32)
            .write(items + 4, values.len() as i32)
            .write_bytes(items + 8, &payload)
    }

    pub fn build(self) -> MockProcess {
        self.process
    }
}
