//! Windows backend: console-mode bits through `winapi`, one stream handle
//! per standard device. `CtrlChar` axis operations are rejected with
//! `NotSupportedOnPlatform`; callers reach for `Pseudo` there instead (see
//! `termmode-core::ops::no_interrupt_char`).

use std::io;
use std::ptr;

use winapi::shared::minwindef::DWORD;
use winapi::um::consoleapi::{GetConsoleMode, SetConsoleMode};
use winapi::um::handleapi::INVALID_HANDLE_VALUE;
use winapi::um::processenv::GetStdHandle;
use winapi::um::winbase::{STD_ERROR_HANDLE, STD_INPUT_HANDLE, STD_OUTPUT_HANDLE};
use winapi::um::winnt::HANDLE;

use termmode_core::adapter::PlatformAdapter;
use termmode_core::error::{EnvError, EnvResult};
use termmode_core::model::{Axis, CcSpec, CtrlSlot, DriverState, FlagOp, StreamId, StreamSelector, Timing, WindowsState};

fn std_handle(selector: StreamSelector) -> EnvResult<HANDLE> {
    let id = match selector {
        StreamSelector::Stdin => STD_INPUT_HANDLE,
        StreamSelector::Stdout => STD_OUTPUT_HANDLE,
        StreamSelector::Stderr => STD_ERROR_HANDLE,
    };
    let handle = unsafe { GetStdHandle(id) };
    if handle.is_null() || handle == INVALID_HANDLE_VALUE {
        return Err(EnvError::InvalidHandle { selector });
    }
    Ok(handle)
}

fn get_mode(handle: HANDLE) -> EnvResult<DWORD> {
    let mut mode: DWORD = 0;
    if unsafe { GetConsoleMode(handle, &mut mode) } == 0 {
        let err = io::Error::last_os_error();
        return Err(EnvError::NotATerminal { source: Some(err) });
    }
    Ok(mode)
}

/// Reports the running Windows build via the registry's
/// `CurrentBuildNumber` value, avoiding the version-lie `GetVersionEx`
/// returns for processes without an explicit application manifest.
fn current_build() -> EnvResult<u32> {
    use winapi::um::winnt::REG_SZ;
    use winapi::um::winreg::{RegGetValueW, HKEY_LOCAL_MACHINE};

    let subkey: Vec<u16> = "SOFTWARE\\Microsoft\\Windows NT\\CurrentVersion"
        .encode_utf16()
        .chain(std::iter::once(0))
        .collect();
    let value: Vec<u16> = "CurrentBuildNumber".encode_utf16().chain(std::iter::once(0)).collect();
    let mut buf = [0u16; 32];
    let mut buf_len: DWORD = (buf.len() * 2) as DWORD;

    let status = unsafe {
        RegGetValueW(
            HKEY_LOCAL_MACHINE,
            subkey.as_ptr(),
            value.as_ptr(),
            REG_SZ,
            ptr::null_mut(),
            buf.as_mut_ptr() as *mut _,
            &mut buf_len,
        )
    };
    if status != 0 {
        return Err(EnvError::ApplyFailed {
            source: io::Error::new(io::ErrorKind::Other, "RegGetValueW(CurrentBuildNumber) failed"),
        });
    }
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    let text = String::from_utf16_lossy(&buf[..len]);
    text.parse::<u32>().map_err(|_| EnvError::ApplyFailed {
        source: io::Error::new(io::ErrorKind::InvalidData, "CurrentBuildNumber was not an integer"),
    })
}

/// Talks to the real console through `winapi`'s `GetConsoleMode`/
/// `SetConsoleMode`. Mirrors the POSIX adapter's statelessness: every
/// call re-queries the handle rather than caching it.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsAdapter;

impl WindowsAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl PlatformAdapter for WindowsAdapter {
    fn handle(&self, selector: StreamSelector) -> EnvResult<StreamId> {
        let handle = std_handle(selector)?;
        Ok(StreamId::new(selector, handle as i64))
    }

    fn get_state(&self, stream: StreamId) -> EnvResult<DriverState> {
        let mode = get_mode(stream.raw as HANDLE)?;
        Ok(DriverState::Windows(WindowsState { mode }))
    }

    fn set_state(&self, stream: StreamId, state: &DriverState, _timing: Timing) -> EnvResult<()> {
        let w = state
            .as_windows()
            .ok_or(EnvError::NotSupportedOnPlatform { operation: "set_state (non-Windows state)" })?;
        if unsafe { SetConsoleMode(stream.raw as HANDLE, w.mode) } == 0 {
            return Err(EnvError::ApplyFailed { source: io::Error::last_os_error() });
        }
        Ok(())
    }

    fn read_flag(&self, state: &DriverState, _axis: Axis, bits: u64) -> EnvResult<bool> {
        let w = state
            .as_windows()
            .ok_or(EnvError::NotSupportedOnPlatform { operation: "read_flag (non-Windows state)" })?;
        Ok(w.mode as u64 & bits == bits)
    }

    fn write_flag(&self, state: &DriverState, _axis: Axis, bits: u64, op: FlagOp) -> EnvResult<DriverState> {
        let w = state
            .as_windows()
            .ok_or(EnvError::NotSupportedOnPlatform { operation: "write_flag (non-Windows state)" })?;
        let mut mode = w.mode as u64;
        match op {
            FlagOp::Set => mode |= bits,
            FlagOp::Clear => mode &= !bits,
        }
        Ok(DriverState::Windows(WindowsState { mode: mode as DWORD }))
    }

    fn read_cc(&self, _state: &DriverState, _slot: CtrlSlot) -> EnvResult<CcSpec> {
        Err(EnvError::NotSupportedOnPlatform { operation: "read_cc" })
    }

    fn write_cc(&self, _state: &DriverState, _slot: CtrlSlot, _value: CcSpec) -> EnvResult<DriverState> {
        Err(EnvError::NotSupportedOnPlatform { operation: "write_cc" })
    }

    fn build_check(&self, required_build: u32) -> EnvResult<()> {
        let actual = current_build()?;
        if actual < required_build {
            return Err(EnvError::BuildTooOld { required: required_build, actual });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "windows"
    }
}
