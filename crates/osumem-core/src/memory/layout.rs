//! Memory layout constants for the osu! (.NET Framework, 32-bit) process
//!
//! This module centralizes the layout of the managed objects the reader
//! decodes and the sizing limits that protect it from garbage pointers.

/// Width of a pointer in the target process
pub const POINTER_SIZE: usize = 4;

/// Memory layout of `System.Collections.Generic.List<T>`
///
/// ```text
/// list + 0x0  method table
/// list + 0x4  _items   -> T[]   (array + 0x8 is the first element)
/// list + 0x8  _syncRoot
/// list + 0xC  _size
/// ```
pub mod array {
    /// Offset of the element count inside the list object
    pub const LENGTH: u64 = 0xC;
    /// Offset of the pointer to the backing array
    pub const ITEMS: u64 = 0x4;
    /// Offset of the first element inside the backing array
    pub const DATA: u64 = 0x8;
    /// Upper bound on element count
    pub const MAX_LENGTH: i32 = 65536;
}

/// Memory layout of `System.String`
///
/// ```text
/// string + 0x0  method table
/// string + 0x4  length in UTF-16 code units
/// string + 0x8  UTF-16LE payload
/// ```
pub mod string {
    pub const LENGTH: u64 = 0x4;
    pub const DATA: u64 = 0x8;
    /// Upper bound on UTF-16 code units
    pub const MAX_LENGTH: i32 = 4096;
}

/// Signature scanning parameters
pub mod scan {
    /// Bytes read from the process per scan window (64KB)
    pub const WINDOW_SIZE: usize = 64 * 1024;
}

/// Win32 page protection values, as reported by `VirtualQueryEx`
pub mod protection {
    pub const PAGE_NOACCESS: u32 = 0x01;
    pub const PAGE_READONLY: u32 = 0x02;
    pub const PAGE_READWRITE: u32 = 0x04;
    pub const PAGE_WRITECOPY: u32 = 0x08;
    pub const PAGE_EXECUTE: u32 = 0x10;
    pub const PAGE_EXECUTE_READ: u32 = 0x20;
    pub const PAGE_EXECUTE_READWRITE: u32 = 0x40;
    pub const PAGE_EXECUTE_WRITECOPY: u32 = 0x80;
    pub const PAGE_GUARD: u32 = 0x100;

    /// Whether pages with this protection can be read.
    ///
    /// The low byte is the access mode; modifier bits above it are ignored
    /// except `PAGE_GUARD`, whose first touch raises an exception.
    pub fn is_readable(protect: u32) -> bool {
        if protect & PAGE_GUARD != 0 {
            return false;
        }
        matches!(
            protect & 0xFF,
            PAGE_READONLY
                | PAGE_READWRITE
                | PAGE_WRITECOPY
                | PAGE_EXECUTE_READ
                | PAGE_EXECUTE_READWRITE
                | PAGE_EXECUTE_WRITECOPY
        )
    }
}
