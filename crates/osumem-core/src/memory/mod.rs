//! Process memory access
//!
//! The engine only ever talks to a target through the [`Process`] trait. The
//! Windows implementation lives in [`WindowsProcess`]; tests use
//! [`MockProcess`].

pub mod layout;
mod reader;
mod value;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(test)]
pub mod mock;

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use reader::MemoryReader;
pub use value::{ArrayValue, FieldValue, Scalar, ScalarType, ScalarValue, Shape, Value};
#[cfg(target_os = "windows")]
pub use windows::WindowsProcess;

#[cfg(test)]
pub use mock::{MockProcess, MockProcessBuilder};

/// A contiguous span of the target's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub start: u64,
    pub size: u64,
}

impl Region {
    pub fn new(start: u64, size: u64) -> Self {
        Self { start, size }
    }

    /// Exclusive end address
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size)
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.start && address < self.end()
    }
}

/// Read access to another process's address space.
///
/// Implementations report the target's memory map fresh on every call to
/// [`Process::regions`]; the map of a running game is not static.
pub trait Process {
    /// Process identifier
    fn pid(&self) -> u32;

    /// Read up to `buf.len()` bytes at `address`.
    ///
    /// May return fewer bytes than requested. Returning `Ok(0)` means nothing
    /// more can be read at that address.
    fn read_at(&self, buf: &mut [u8], address: u64) -> io::Result<usize>;

    /// Readable memory regions, in ascending address order
    fn regions(&self) -> Result<Vec<Region>>;

    /// Full path of the process image
    fn executable_path(&self) -> Result<PathBuf>;
}

impl<T: Process + ?Sized> Process for &T {
    fn pid(&self) -> u32 {
        (**self).pid()
    }

    fn read_at(&self, buf: &mut [u8], address: u64) -> io::Result<usize> {
        (**self).read_at(buf, address)
    }

    fn regions(&self) -> Result<Vec<Region>> {
        (**self).regions()
    }

    fn executable_path(&self) -> Result<PathBuf> {
        (**self).executable_path()
    }
}

impl<T: Process + ?Sized> Process for Box<T> {
    fn pid(&self) -> u32 {
        (**self).pid()
    }

    fn read_at(&self, buf: &mut [u8], address: u64) -> io::Result<usize> {
        (**self).read_at(buf, address)
    }

    fn regions(&self) -> Result<Vec<Region>> {
        (**self).regions()
    }

    fn executable_path(&self) -> Result<PathBuf> {
        (**self).executable_path()
    }
}

/// Open the first running process named `name`.
///
/// Processes owning a window whose title contains one of `blacklisted_titles`
/// are skipped.
#[cfg(target_os = "windows")]
pub fn attach(name: &str, blacklisted_titles: &[String]) -> Result<Box<dyn Process>> {
    Ok(Box::new(WindowsProcess::find(name, blacklisted_titles)?))
}

#[cfg(not(target_os = "windows"))]
pub fn attach(_name: &str, _blacklisted_titles: &[String]) -> Result<Box<dyn Process>> {
    Err(crate::error::Error::UnsupportedPlatform)
}

/// Open a process by id
#[cfg(target_os = "windows")]
pub fn attach_pid(pid: u32) -> Result<Box<dyn Process>> {
    Ok(Box::new(WindowsProcess::open(pid)?))
}

#[cfg(not(target_os = "windows"))]
pub fn attach_pid(_pid: u32) -> Result<Box<dyn Process>> {
    Err(crate::error::Error::UnsupportedPlatform)
}

/// Fill `buf` from `address`, retrying short reads.
///
/// Returns the number of bytes read before the provider stopped making
/// progress. Only an error on the very first read is propagated; a failure
/// after partial progress is reported as a short count.
pub(crate) fn read_full_at<P: Process + ?Sized>(
    process: &P,
    buf: &mut [u8],
    address: u64,
) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match process.read_at(&mut buf[filled..], address + filled as u64) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if filled == 0 => return Err(e),
            Err(_) => break,
        }
    }
    Ok(filled)
}
