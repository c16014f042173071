//! The Platform Adapter: the only place OS vocabulary is allowed to leak
//! through. `termmode-io` provides the concrete POSIX, Windows, and mock
//! implementations of this trait; this crate only depends on the trait.

use crate::error::EnvResult;
use crate::model::{Axis, CcSpec, DriverState, FlagOp, StreamId, StreamSelector, Timing};

/// Minimal portable surface every platform backend implements.
///
/// Object-safe so the rest of the crate can hold `Box<dyn PlatformAdapter>`
/// without generic parameters leaking into `Coordinator`, `ModItem`, etc.
pub trait PlatformAdapter: Send + Sync {
    /// Resolves a symbolic selector to a concrete stream handle.
    fn handle(&self, selector: StreamSelector) -> EnvResult<StreamId>;

    /// Queries the current driver state of `stream`.
    fn get_state(&self, stream: StreamId) -> EnvResult<DriverState>;

    /// Applies `state` to `stream`. `timing` is the POSIX `tcsetattr`
    /// timing code; ignored on Windows.
    fn set_state(&self, stream: StreamId, state: &DriverState, timing: Timing) -> EnvResult<()>;

    /// Reads whether `bits` is currently asserted on `axis` of `state`.
    fn read_flag(&self, state: &DriverState, axis: Axis, bits: u64) -> EnvResult<bool>;

    /// Returns a copy of `state` with `bits` set or cleared on `axis`.
    fn write_flag(&self, state: &DriverState, axis: Axis, bits: u64, op: FlagOp) -> EnvResult<DriverState>;

    /// Reads the current value of a control-character slot.
    ///
    /// Windows adapters reject this with
    /// [`crate::error::EnvError::NotSupportedOnPlatform`].
    fn read_cc(&self, state: &DriverState, slot: crate::model::CtrlSlot) -> EnvResult<CcSpec>;

    /// Returns a copy of `state` with a control-character slot set to
    /// `value`. Windows adapters reject this the same way as `read_cc`.
    fn write_cc(
        &self,
        state: &DriverState,
        slot: crate::model::CtrlSlot,
        value: CcSpec,
    ) -> EnvResult<DriverState>;

    /// Checks the current platform build against `required_build`.
    /// No-op on POSIX; on Windows fails with
    /// [`crate::error::EnvError::BuildTooOld`] when `GetVersionEx` reports
    /// a lower build.
    fn build_check(&self, required_build: u32) -> EnvResult<()>;

    /// Short name for logging (`"posix"`, `"windows"`, `"mock"`, ...).
    fn name(&self) -> &'static str;
}

/// Symbolic constants exposed to callers so no component other than the
/// adapter mentions termios/console vocabulary directly.
pub mod consts {
    /// Windows build (as reported by `GetVersionEx`) that introduced
    /// `ENABLE_VIRTUAL_TERMINAL_INPUT`/`ENABLE_VIRTUAL_TERMINAL_PROCESSING`
    /// support (Windows 10 version 1607, "Anniversary Update").
    pub const VT_MODE_MIN_BUILD: u32 = 14393;

    /// Windows console-mode bits, under the `CMD_` prefix. Values match
    /// `wincon.h`; kept here (rather than only inside
    /// `termmode-io`) so a pure-function caller (e.g. the registry-edit
    /// string helper) can reference them on any target.
    pub const CMD_ENABLE_PROCESSED_INPUT: u32 = 0x0001;
    pub const CMD_ENABLE_LINE_INPUT: u32 = 0x0002;
    pub const CMD_ENABLE_ECHO_INPUT: u32 = 0x0004;
    pub const CMD_ENABLE_WINDOW_INPUT: u32 = 0x0008;
    pub const CMD_ENABLE_MOUSE_INPUT: u32 = 0x0010;
    pub const CMD_ENABLE_QUICK_EDIT_MODE: u32 = 0x0040;
    pub const CMD_ENABLE_EXTENDED_FLAGS: u32 = 0x0080;
    pub const CMD_ENABLE_VIRTUAL_TERMINAL_INPUT: u32 = 0x0200;
    pub const CMD_ENABLE_VIRTUAL_TERMINAL_PROCESSING: u32 = 0x0004;

    /// POSIX symbolic names, sourced from `libc` so their values always
    /// match the target's actual headers.
    #[cfg(unix)]
    pub mod posix {
        pub const ECHO: u64 = libc::ECHO as u64;
        pub const ICANON: u64 = libc::ICANON as u64;
        pub const ISIG: u64 = libc::ISIG as u64;
        pub const IEXTEN: u64 = libc::IEXTEN as u64;
        pub const IXON: u64 = libc::IXON as u64;
        pub const IXOFF: u64 = libc::IXOFF as u64;
        pub const OPOST: u64 = libc::OPOST as u64;
        pub const VMIN: usize = libc::VMIN;
        pub const VTIME: usize = libc::VTIME;
    }
}
