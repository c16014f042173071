//! POSIX backend: `termios`/`ioctl` through `libc`, one stream handle per
//! standard descriptor.

use std::io;
use std::os::unix::io::RawFd;

use termmode_core::adapter::PlatformAdapter;
use termmode_core::error::{EnvError, EnvResult};
use termmode_core::model::{
    Axis, CcSpec, CtrlChars, CtrlSlot, DriverState, FlagOp, PosixState, StreamId, StreamSelector,
    Timing,
};

fn raw_fd(selector: StreamSelector) -> RawFd {
    use std::os::unix::io::AsRawFd;
    match selector {
        StreamSelector::Stdin => io::stdin().as_raw_fd(),
        StreamSelector::Stdout => io::stdout().as_raw_fd(),
        StreamSelector::Stderr => io::stderr().as_raw_fd(),
    }
}

fn vdisable() -> libc::cc_t {
    libc::_POSIX_VDISABLE as libc::cc_t
}

fn cc_from_raw(raw: &libc::termios) -> CtrlChars {
    let disabled = |b: libc::cc_t| -> Option<u8> {
        if b == vdisable() {
            None
        } else {
            Some(b)
        }
    };
    CtrlChars {
        intr: disabled(raw.c_cc[libc::VINTR]),
        quit: disabled(raw.c_cc[libc::VQUIT]),
        xon: disabled(raw.c_cc[libc::VSTART]),
        xoff: disabled(raw.c_cc[libc::VSTOP]),
    }
}

fn apply_cc_to_raw(raw: &mut libc::termios, cc: &CtrlChars) {
    let set = |slot: &mut libc::cc_t, value: Option<u8>| {
        *slot = value.unwrap_or(vdisable());
    };
    set(&mut raw.c_cc[libc::VINTR], cc.intr);
    set(&mut raw.c_cc[libc::VQUIT], cc.quit);
    set(&mut raw.c_cc[libc::VSTART], cc.xon);
    set(&mut raw.c_cc[libc::VSTOP], cc.xoff);
}

fn to_posix_state(raw: &libc::termios) -> PosixState {
    PosixState {
        iflag: raw.c_iflag as u64,
        oflag: raw.c_oflag as u64,
        cflag: raw.c_cflag as u64,
        lflag: raw.c_lflag as u64,
        ispeed: unsafe { libc::cfgetispeed(raw) } as u64,
        ospeed: unsafe { libc::cfgetospeed(raw) } as u64,
        cc: cc_from_raw(raw),
    }
}

fn merge_into_raw(state: &PosixState, mut raw: libc::termios) -> libc::termios {
    raw.c_iflag = state.iflag as libc::tcflag_t;
    raw.c_oflag = state.oflag as libc::tcflag_t;
    raw.c_cflag = state.cflag as libc::tcflag_t;
    raw.c_lflag = state.lflag as libc::tcflag_t;
    apply_cc_to_raw(&mut raw, &state.cc);
    // Clearing ICANON always drops VMIN/VTIME to 0 so the read becomes
    // fully non-blocking, matching non_block's POSIX recipe without
    // modeling VMIN/VTIME as a named CtrlChar slot.
    if state.lflag as libc::tcflag_t & libc::ICANON == 0 {
        raw.c_cc[libc::VMIN] = 0;
        raw.c_cc[libc::VTIME] = 0;
    }
    raw
}

fn timing_to_action(timing: Timing) -> libc::c_int {
    match timing {
        Timing::Immediate => libc::TCSANOW,
        Timing::Drain => libc::TCSADRAIN,
        Timing::Flush => libc::TCSAFLUSH,
    }
}

fn tcgetattr_checked(fd: RawFd) -> EnvResult<libc::termios> {
    let mut raw: libc::termios = unsafe { std::mem::zeroed() };
    if unsafe { libc::tcgetattr(fd, &mut raw) } != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ENOTTY) {
            return Err(EnvError::NotATerminal { source: Some(err) });
        }
        return Err(EnvError::ApplyFailed { source: err });
    }
    Ok(raw)
}

/// Talks to the real terminal driver through `libc`'s `termios`/`ioctl`
/// bindings. Stateless: every call re-derives what it needs from the
/// descriptor, matching the snapshot-registry design (`termmode-core`
/// owns the only cached copy of driver state).
#[derive(Debug, Default, Clone, Copy)]
pub struct PosixAdapter;

impl PosixAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl PlatformAdapter for PosixAdapter {
    fn handle(&self, selector: StreamSelector) -> EnvResult<StreamId> {
        let fd = raw_fd(selector);
        if fd < 0 {
            return Err(EnvError::InvalidHandle { selector });
        }
        Ok(StreamId::new(selector, fd as i64))
    }

    fn get_state(&self, stream: StreamId) -> EnvResult<DriverState> {
        let raw = tcgetattr_checked(stream.raw as RawFd)?;
        Ok(DriverState::Posix(to_posix_state(&raw)))
    }

    fn set_state(&self, stream: StreamId, state: &DriverState, timing: Timing) -> EnvResult<()> {
        let posix_state = state
            .as_posix()
            .ok_or(EnvError::NotSupportedOnPlatform { operation: "set_state (non-POSIX state)" })?;
        let fd = stream.raw as RawFd;
        let current = tcgetattr_checked(fd)?;
        let next = merge_into_raw(posix_state, current);
        if unsafe { libc::tcsetattr(fd, timing_to_action(timing), &next) } != 0 {
            return Err(EnvError::ApplyFailed { source: io::Error::last_os_error() });
        }
        Ok(())
    }

    fn read_flag(&self, state: &DriverState, axis: Axis, bits: u64) -> EnvResult<bool> {
        let p = state
            .as_posix()
            .ok_or(EnvError::NotSupportedOnPlatform { operation: "read_flag (non-POSIX state)" })?;
        let field = match axis {
            Axis::In => p.iflag,
            Axis::Out => p.oflag,
            Axis::Ctrl => p.cflag,
            Axis::Local => p.lflag,
            Axis::CtrlChar(_) => {
                return Err(EnvError::ApplyFailed {
                    source: io::Error::new(io::ErrorKind::InvalidInput, "CtrlChar axis has no flag field"),
                })
            }
        };
        Ok(field & bits == bits)
    }

    fn write_flag(&self, state: &DriverState, axis: Axis, bits: u64, op: FlagOp) -> EnvResult<DriverState> {
        let p = state
            .as_posix()
            .ok_or(EnvError::NotSupportedOnPlatform { operation: "write_flag (non-POSIX state)" })?;
        let mut next = p.clone();
        let field = match axis {
            Axis::In => &mut next.iflag,
            Axis::Out => &mut next.oflag,
            Axis::Ctrl => &mut next.cflag,
            Axis::Local => &mut next.lflag,
            Axis::CtrlChar(_) => {
                return Err(EnvError::ApplyFailed {
                    source: io::Error::new(io::ErrorKind::InvalidInput, "CtrlChar axis has no flag field"),
                })
            }
        };
        match op {
            FlagOp::Set => *field |= bits,
            FlagOp::Clear => *field &= !bits,
        }
        Ok(DriverState::Posix(next))
    }

    fn read_cc(&self, state: &DriverState, slot: CtrlSlot) -> EnvResult<CcSpec> {
        let p = state
            .as_posix()
            .ok_or(EnvError::NotSupportedOnPlatform { operation: "read_cc (non-POSIX state)" })?;
        Ok(match p.cc.get(slot) {
            Some(b) => CcSpec::Byte(b),
            None => CcSpec::Disabled,
        })
    }

    fn write_cc(&self, state: &DriverState, slot: CtrlSlot, value: CcSpec) -> EnvResult<DriverState> {
        let p = state
            .as_posix()
            .ok_or(EnvError::NotSupportedOnPlatform { operation: "write_cc (non-POSIX state)" })?;
        let mut next = p.clone();
        next.cc.set(
            slot,
            match value {
                CcSpec::Byte(b) => Some(b),
                CcSpec::Disabled => None,
            },
        );
        Ok(DriverState::Posix(next))
    }

    fn build_check(&self, _required_build: u32) -> EnvResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "posix"
    }
}
