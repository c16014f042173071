//! Named, idempotent high-level terminal-mode operations. Each selects
//! the axis/bit values appropriate to the compile target but always goes
//! through [`crate::adapter::PlatformAdapter`]; no OS vocabulary appears
//! here beyond the `cfg(unix)`/`cfg(windows)` split itself.

use std::sync::Arc;

use crate::adapter::consts;
use crate::composite::Composite;
use crate::error::EnvResult;
use crate::model::{Axis, CcSpec, CtrlSlot, ModValue, StreamSelector, Timing};
use crate::modification::Modification;
use crate::pseudo::Pseudo;
use crate::registry::Coordinator;

fn stdin(coordinator: &Arc<Coordinator>) -> EnvResult<crate::model::StreamId> {
    coordinator.handle(StreamSelector::Stdin)
}

fn stdout(coordinator: &Arc<Coordinator>) -> EnvResult<crate::model::StreamId> {
    coordinator.handle(StreamSelector::Stdout)
}

/// Enable virtual-terminal-sequence processing on input. No-op on POSIX
/// (VT sequences are always interpreted by the application there).
#[cfg(unix)]
pub fn ansi_in(_coordinator: &Arc<Coordinator>) -> EnvResult<Box<dyn Modification>> {
    Ok(Box::new(Pseudo::new("ansi_in")))
}

#[cfg(windows)]
pub fn ansi_in(coordinator: &Arc<Coordinator>) -> EnvResult<Box<dyn Modification>> {
    coordinator.check_build(consts::VT_MODE_MIN_BUILD)?;
    let item = coordinator.add_flag(
        stdin(coordinator)?,
        ModValue::Bits(consts::CMD_ENABLE_VIRTUAL_TERMINAL_INPUT as u64),
        Axis::In,
        Timing::Immediate,
        true,
        Some("ansi_in".to_string()),
    )?;
    Ok(Box::new(item))
}

/// Enable virtual-terminal-sequence processing on output. No-op on POSIX.
#[cfg(unix)]
pub fn ansi_out(_coordinator: &Arc<Coordinator>) -> EnvResult<Box<dyn Modification>> {
    Ok(Box::new(Pseudo::new("ansi_out")))
}

#[cfg(windows)]
pub fn ansi_out(coordinator: &Arc<Coordinator>) -> EnvResult<Box<dyn Modification>> {
    coordinator.check_build(consts::VT_MODE_MIN_BUILD)?;
    let item = coordinator.add_flag(
        stdout(coordinator)?,
        ModValue::Bits(consts::CMD_ENABLE_VIRTUAL_TERMINAL_PROCESSING as u64),
        Axis::Out,
        Timing::Immediate,
        true,
        Some("ansi_out".to_string()),
    )?;
    Ok(Box::new(item))
}

/// Clear `ECHO` (POSIX local flags) / clear echo-input (Windows).
#[cfg(unix)]
pub fn no_echo(coordinator: &Arc<Coordinator>) -> EnvResult<Box<dyn Modification>> {
    let item = coordinator.sub_flag(
        stdin(coordinator)?,
        ModValue::Bits(consts::posix::ECHO),
        Axis::Local,
        Timing::Immediate,
        true,
        Some("no_echo".to_string()),
    )?;
    Ok(Box::new(item))
}

#[cfg(windows)]
pub fn no_echo(coordinator: &Arc<Coordinator>) -> EnvResult<Box<dyn Modification>> {
    let item = coordinator.sub_flag(
        stdin(coordinator)?,
        ModValue::Bits(consts::CMD_ENABLE_ECHO_INPUT as u64),
        Axis::In,
        Timing::Immediate,
        true,
        Some("no_echo".to_string()),
    )?;
    Ok(Box::new(item))
}

/// Non-blocking read: clear `ICANON` and set `VMIN=0`/`VTIME=0` on POSIX
/// (bundled into one item, see `termmode-io`'s POSIX adapter for how
/// clearing `ICANON` on the `Local` axis also zeroes the timing slots);
/// clear echo-input and line-input on Windows (a two-item `Composite`,
/// since those are independent console-mode bits).
#[cfg(unix)]
pub fn non_block(coordinator: &Arc<Coordinator>) -> EnvResult<Box<dyn Modification>> {
    let item = coordinator.sub_flag(
        stdin(coordinator)?,
        ModValue::Bits(consts::posix::ICANON),
        Axis::Local,
        Timing::Immediate,
        true,
        Some("non_block".to_string()),
    )?;
    Ok(Box::new(item))
}

#[cfg(windows)]
pub fn non_block(coordinator: &Arc<Coordinator>) -> EnvResult<Box<dyn Modification>> {
    let stream = stdin(coordinator)?;
    let echo_off = coordinator.sub_flag(
        stream,
        ModValue::Bits(consts::CMD_ENABLE_ECHO_INPUT as u64),
        Axis::In,
        Timing::Immediate,
        true,
        Some("non_block:echo".to_string()),
    )?;
    let line_off = coordinator.sub_flag(
        stream,
        ModValue::Bits(consts::CMD_ENABLE_LINE_INPUT as u64),
        Axis::In,
        Timing::Immediate,
        true,
        Some("non_block:line".to_string()),
    )?;
    Ok(Box::new(Composite::new(vec![echo_off, line_off])))
}

/// Disable driver control-character interception: `ISIG`+`IXON` on POSIX
/// (a two-item `Composite`, since they live on different axes); clear
/// processed-input on Windows.
#[cfg(unix)]
pub fn no_process(coordinator: &Arc<Coordinator>) -> EnvResult<Box<dyn Modification>> {
    let stream = stdin(coordinator)?;
    let isig_off = coordinator.sub_flag(
        stream,
        ModValue::Bits(consts::posix::ISIG),
        Axis::Local,
        Timing::Immediate,
        true,
        Some("no_process:isig".to_string()),
    )?;
    let ixon_off = coordinator.sub_flag(
        stream,
        ModValue::Bits(consts::posix::IXON),
        Axis::In,
        Timing::Immediate,
        true,
        Some("no_process:ixon".to_string()),
    )?;
    Ok(Box::new(Composite::new(vec![isig_off, ixon_off])))
}

#[cfg(windows)]
pub fn no_process(coordinator: &Arc<Coordinator>) -> EnvResult<Box<dyn Modification>> {
    let item = coordinator.sub_flag(
        stdin(coordinator)?,
        ModValue::Bits(consts::CMD_ENABLE_PROCESSED_INPUT as u64),
        Axis::In,
        Timing::Immediate,
        true,
        Some("no_process".to_string()),
    )?;
    Ok(Box::new(item))
}

/// Disable implementation-defined processing: `IEXTEN`+`OPOST` on POSIX
/// (a two-item `Composite`); enable extended-flags and clear
/// quick-edit-mode on Windows (also a two-item `Composite`, mixing one
/// `add_flag` and one `sub_flag` direction).
#[cfg(unix)]
pub fn no_impl_def(coordinator: &Arc<Coordinator>) -> EnvResult<Box<dyn Modification>> {
    let stream = stdin(coordinator)?;
    let iexten_off = coordinator.sub_flag(
        stream,
        ModValue::Bits(consts::posix::IEXTEN),
        Axis::Local,
        Timing::Immediate,
        true,
        Some("no_impl_def:iexten".to_string()),
    )?;
    let opost_off = coordinator.sub_flag(
        stream,
        ModValue::Bits(consts::posix::OPOST),
        Axis::Out,
        Timing::Immediate,
        true,
        Some("no_impl_def:opost".to_string()),
    )?;
    Ok(Box::new(Composite::new(vec![iexten_off, opost_off])))
}

#[cfg(windows)]
pub fn no_impl_def(coordinator: &Arc<Coordinator>) -> EnvResult<Box<dyn Modification>> {
    let stream = stdin(coordinator)?;
    let extended_on = coordinator.add_flag(
        stream,
        ModValue::Bits(consts::CMD_ENABLE_EXTENDED_FLAGS as u64),
        Axis::In,
        Timing::Immediate,
        true,
        Some("no_impl_def:extended".to_string()),
    )?;
    let quick_edit_off = coordinator.sub_flag(
        stream,
        ModValue::Bits(consts::CMD_ENABLE_QUICK_EDIT_MODE as u64),
        Axis::In,
        Timing::Immediate,
        true,
        Some("no_impl_def:quick_edit".to_string()),
    )?;
    Ok(Box::new(Composite::new(vec![extended_on, quick_edit_off])))
}

/// Disables a control-character slot (e.g. `Ctrl-C` interrupt delivery)
/// via the generic `CtrlChar` axis. Not one of the table-driven named
/// operations above, but exposed so callers can reach the `CtrlChar` axis
/// without hand-building the `CtrlSlot`/`CcSpec` plumbing themselves.
#[cfg(unix)]
pub fn no_interrupt_char(coordinator: &Arc<Coordinator>) -> EnvResult<Box<dyn Modification>> {
    let item = coordinator.add_flag(
        stdin(coordinator)?,
        ModValue::CtrlChar(CcSpec::Disabled),
        Axis::CtrlChar(CtrlSlot::Intr),
        Timing::Immediate,
        true,
        Some("no_interrupt_char".to_string()),
    )?;
    Ok(Box::new(item))
}

#[cfg(windows)]
pub fn no_interrupt_char(_coordinator: &Arc<Coordinator>) -> EnvResult<Box<dyn Modification>> {
    Ok(Box::new(Pseudo::new("no_interrupt_char")))
}
