//! Cross-platform terminal driver mode controller.
//!
//! Wires the process-wide [`termmode_core::registry::Coordinator`] to the
//! live platform adapter ([`termmode_io::current_adapter`]) and exposes the
//! programmatic surface from one place: `handle`, `check_build`,
//! `add_flag`/`sub_flag`, `request`, the six named High-Level Operations,
//! `cache_purge`, and [`InappropriateDeviceGuard`].

use std::sync::{Arc, OnceLock};

pub use termmode_core::prelude::*;
use termmode_core::model::{Axis, ModValue, StreamSelector, Timing};

static COORDINATOR: OnceLock<Arc<Coordinator>> = OnceLock::new();

fn coordinator() -> &'static Arc<Coordinator> {
    COORDINATOR.get_or_init(|| Coordinator::new(termmode_io::current_adapter()))
}

/// `handle(selector) -> StreamId`.
pub fn handle(selector: StreamSelector) -> EnvResult<termmode_core::model::StreamId> {
    coordinator().handle(selector)
}

/// `check_build(min) -> void|Err`.
pub fn check_build(min: u32) -> EnvResult<()> {
    coordinator().check_build(min)
}

/// `add_flag(stream, value, axis, timing, reset_atexit, note) -> ModItem`.
#[allow(clippy::too_many_arguments)]
pub fn add_flag(
    stream: termmode_core::model::StreamId,
    value: ModValue,
    axis: Axis,
    timing: Timing,
    reset_atexit: bool,
    note: Option<String>,
) -> EnvResult<ModItem> {
    coordinator().add_flag(stream, value, axis, timing, reset_atexit, note)
}

/// `sub_flag(stream, value, axis, timing, reset_atexit, note) -> ModItem`.
#[allow(clippy::too_many_arguments)]
pub fn sub_flag(
    stream: termmode_core::model::StreamId,
    value: ModValue,
    axis: Axis,
    timing: Timing,
    reset_atexit: bool,
    note: Option<String>,
) -> EnvResult<ModItem> {
    coordinator().sub_flag(stream, value, axis, timing, reset_atexit, note)
}

/// `request(stream, value, axis) -> bool`.
pub fn request(stream: termmode_core::model::StreamId, value: ModValue, axis: Axis) -> bool {
    coordinator().request(stream, value, axis)
}

/// `cache_purge() -> void`: on-demand LIFO reset of every live modification.
pub fn cache_purge() {
    coordinator().cache_purge()
}

/// Enables virtual-terminal-sequence processing on stdin.
pub fn ansi_in() -> EnvResult<Box<dyn Modification>> {
    termmode_core::ops::ansi_in(coordinator())
}

/// Enables virtual-terminal-sequence processing on stdout.
pub fn ansi_out() -> EnvResult<Box<dyn Modification>> {
    termmode_core::ops::ansi_out(coordinator())
}

/// Suppresses local echo on stdin.
pub fn no_echo() -> EnvResult<Box<dyn Modification>> {
    termmode_core::ops::no_echo(coordinator())
}

/// Puts stdin reads into non-blocking/non-canonical mode.
pub fn non_block() -> EnvResult<Box<dyn Modification>> {
    termmode_core::ops::non_block(coordinator())
}

/// Disables driver-level signal/flow-control interception on stdin.
pub fn no_process() -> EnvResult<Box<dyn Modification>> {
    termmode_core::ops::no_process(coordinator())
}

/// Disables implementation-defined input processing and output
/// post-processing.
pub fn no_impl_def() -> EnvResult<Box<dyn Modification>> {
    termmode_core::ops::no_impl_def(coordinator())
}

/// Disables the interrupt control character (`Ctrl-C` delivery) via the
/// generic `CtrlChar` axis.
pub fn no_interrupt_char() -> EnvResult<Box<dyn Modification>> {
    termmode_core::ops::no_interrupt_char(coordinator())
}

/// Formats a `.reg`-importable string that permanently enables
/// `ENABLE_VIRTUAL_TERMINAL_PROCESSING` for the user's console host
/// (`HKCU\Console\VirtualTerminalLevel`). Pure function of `enable`, no
/// I/O — ancillary tooling for users who want the setting to survive
/// process exit rather than reapplying it every run.
pub fn virtual_terminal_registry_edit(enable: bool) -> String {
    let value = if enable { 1 } else { 0 };
    format!(
        "Windows Registry Editor Version 5.00\r\n\r\n\
         [HKEY_CURRENT_USER\\Console]\r\n\
         \"VirtualTerminalLevel\"=dword:{value:08x}\r\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_edit_is_a_pure_string_function() {
        let on = virtual_terminal_registry_edit(true);
        let off = virtual_terminal_registry_edit(false);
        assert!(on.contains("dword:00000001"));
        assert!(off.contains("dword:00000000"));
        assert!(on.contains("VirtualTerminalLevel"));
    }
}
