//! Win32 process access

use std::cell::RefCell;
use std::collections::HashSet;
use std::ffi::c_void;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use windows::Win32::Foundation::{BOOL, CloseHandle, HANDLE, HWND, LPARAM};
use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
use windows::Win32::System::Memory::{MEM_COMMIT, MEMORY_BASIC_INFORMATION, VirtualQueryEx};
use windows::Win32::System::ProcessStatus::EnumProcesses;
use windows::Win32::System::Threading::{
    OpenProcess, PROCESS_NAME_WIN32, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
    QueryFullProcessImageNameW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetWindowTextW, GetWindowThreadProcessId,
};
use windows::core::PWSTR;

use super::layout::protection;
use super::{Process, Region};
use crate::error::{Error, Result};

/// An open handle to another process
///
/// The handle is opened with query and read rights and closed on drop.
pub struct WindowsProcess {
    pid: u32,
    handle: HANDLE,
}

impl WindowsProcess {
    pub fn open(pid: u32) -> Result<Self> {
        // SAFETY: OpenProcess has no preconditions; failure is reported as an error.
        let handle = unsafe {
            OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, false, pid)
        }
        .map_err(|e| Error::ProcessOpenFailed(format!("pid {}: {}", pid, e)))?;
        Ok(Self { pid, handle })
    }

    /// Open the first process whose image name is `name`.
    ///
    /// Processes owning a window whose title contains any of
    /// `blacklisted_titles` are skipped; osu!lazer ships an `osu!.exe` too.
    pub fn find(name: &str, blacklisted_titles: &[String]) -> Result<Self> {
        let banned = pids_with_window_titles(blacklisted_titles);

        for pid in enumerate_pids()? {
            if pid == 0 || banned.contains(&pid) {
                continue;
            }
            let Ok(process) = Self::open(pid) else {
                continue;
            };
            let Ok(path) = process.executable_path() else {
                continue;
            };
            if image_name_matches(&path, name) {
                info!("Found {} (pid {})", name, pid);
                return Ok(process);
            }
        }

        Err(Error::ProcessNotFound(name.to_string()))
    }
}

impl Drop for WindowsProcess {
    fn drop(&mut self) {
        // SAFETY: the handle was returned by OpenProcess and is closed once.
        unsafe { CloseHandle(self.handle).ok() };
    }
}

impl Process for WindowsProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn read_at(&self, buf: &mut [u8], address: u64) -> io::Result<usize> {
        let mut bytes_read = 0usize;
        // SAFETY: buf is valid for buf.len() bytes and bytes_read outlives the call.
        let result = unsafe {
            ReadProcessMemory(
                self.handle,
                address as usize as *const c_void,
                buf.as_mut_ptr() as *mut c_void,
                buf.len(),
                Some(&mut bytes_read),
            )
        };

        match result {
            Ok(()) => Ok(bytes_read),
            // ERROR_PARTIAL_COPY still reports how much was copied
            Err(_) if bytes_read > 0 => Ok(bytes_read),
            Err(e) => Err(io::Error::other(e)),
        }
    }

    fn regions(&self) -> Result<Vec<Region>> {
        let mut regions = Vec::new();
        let mut address = 0usize;

        loop {
            let mut mbi = MEMORY_BASIC_INFORMATION::default();
            // SAFETY: mbi is a properly sized, writable MEMORY_BASIC_INFORMATION.
            let written = unsafe {
                VirtualQueryEx(
                    self.handle,
                    Some(address as *const c_void),
                    &mut mbi,
                    std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
                )
            };
            if written == 0 {
                if address == 0 {
                    return Err(Error::Io(io::Error::last_os_error()));
                }
                break;
            }

            let base = mbi.BaseAddress as usize;
            let readable = mbi.State == MEM_COMMIT && protection::is_readable(mbi.Protect.0);
            if readable {
                regions.push(Region::new(base as u64, mbi.RegionSize as u64));
            }

            let next = base.saturating_add(mbi.RegionSize);
            if next <= address {
                break;
            }
            address = next;
        }

        debug!("pid {}: {} readable regions", self.pid, regions.len());
        Ok(regions)
    }

    fn executable_path(&self) -> Result<PathBuf> {
        let mut buf = [0u16; 1024];
        let mut len = buf.len() as u32;
        // SAFETY: buf holds len UTF-16 units; len is updated to the written length.
        unsafe {
            QueryFullProcessImageNameW(
                self.handle,
                PROCESS_NAME_WIN32,
                PWSTR(buf.as_mut_ptr()),
                &mut len,
            )
        }
        .map_err(|e| Error::ProcessOpenFailed(format!("pid {}: {}", self.pid, e)))?;

        Ok(PathBuf::from(String::from_utf16_lossy(&buf[..len as usize])))
    }
}

fn image_name_matches(path: &Path, name: &str) -> bool {
    path.file_name()
        .map(|file| file.to_string_lossy().eq_ignore_ascii_case(name))
        .unwrap_or(false)
}

fn enumerate_pids() -> Result<Vec<u32>> {
    let mut pids = vec![0u32; 1024];
    loop {
        let mut needed = 0u32;
        let capacity = (pids.len() * std::mem::size_of::<u32>()) as u32;
        // SAFETY: pids is writable for `capacity` bytes.
        unsafe { EnumProcesses(pids.as_mut_ptr(), capacity, &mut needed) }
            .map_err(|e| Error::Io(io::Error::other(e)))?;

        // A full buffer may have been truncated
        if needed < capacity {
            pids.truncate(needed as usize / std::mem::size_of::<u32>());
            return Ok(pids);
        }
        pids.resize(pids.len() * 2, 0);
    }
}

thread_local! {
    static TITLE_MATCHES: RefCell<(Vec<String>, HashSet<u32>)> =
        RefCell::new((Vec::new(), HashSet::new()));
}

/// Pids that own a top-level window whose title contains one of `titles`
fn pids_with_window_titles(titles: &[String]) -> HashSet<u32> {
    if titles.is_empty() {
        return HashSet::new();
    }

    TITLE_MATCHES.with(|cell| *cell.borrow_mut() = (titles.to_vec(), HashSet::new()));
    // SAFETY: the callback only touches the thread-local above.
    unsafe {
        EnumWindows(Some(title_callback), LPARAM(0)).ok();
    }
    TITLE_MATCHES.with(|cell| std::mem::take(&mut cell.borrow_mut().1))
}

unsafe extern "system" fn title_callback(hwnd: HWND, _lparam: LPARAM) -> BOOL {
    let mut buf = [0u16; 256];
    // SAFETY: buf is a valid output buffer for the window text.
    let len = unsafe { GetWindowTextW(hwnd, &mut buf) };
    if len <= 0 {
        return BOOL(1);
    }
    let title = String::from_utf16_lossy(&buf[..len as usize]);

    TITLE_MATCHES.with(|cell| {
        let mut state = cell.borrow_mut();
        if state.0.iter().any(|banned| title.contains(banned.as_str())) {
            let mut pid = 0u32;
            // SAFETY: pid outlives the call.
            unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid)) };
            debug!("Skipping pid {} (window '{}')", pid, title);
            state.1.insert(pid);
        }
    });
    BOOL(1)
}
