//! The platform-independent vocabulary every other module shares.
//!
//! Nothing in here mentions termios or console modes by name; that
//! vocabulary lives behind [`crate::adapter::PlatformAdapter`].

/// Symbolic selector for one of the process's standard streams. Callers
/// never pass raw descriptors or handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamSelector {
    Stdin,
    Stdout,
    Stderr,
}

/// Opaque handle to an open standard stream, acquired only through
/// [`crate::adapter::PlatformAdapter::handle`].
///
/// `raw` carries the fd on POSIX, the `HANDLE` (as `isize`) on Windows, or a
/// synthetic id from [`crate::adapter::PlatformAdapter`] mock/test
/// implementations. Its meaning is adapter-private; core only uses it as an
/// identity key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StreamId {
    pub selector: StreamSelector,
    pub raw: i64,
}

impl StreamId {
    pub fn new(selector: StreamSelector, raw: i64) -> Self {
        Self { selector, raw }
    }
}

/// The four control-character slots this crate knows how to address.
/// POSIX drivers have many more `c_cc` slots; these are the ones a
/// High-Level Operation or caller can name symbolically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CtrlSlot {
    Intr,
    Quit,
    Xon,
    Xoff,
}

/// Which field of the driver state a modification targets.
///
/// On Windows there is exactly one axis (a single mode bitmask per
/// stream); adapters on that platform ignore the selector for the
/// flag-bearing variants and reject `CtrlChar` outright with
/// [`crate::error::EnvError::NotSupportedOnPlatform`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    In,
    Out,
    Ctrl,
    Local,
    CtrlChar(CtrlSlot),
}

/// A control-character target value: a literal byte (0x00-0x7F) or the
/// "disabled" sentinel (POSIX `_POSIX_VDISABLE`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CcSpec {
    Byte(u8),
    Disabled,
}

impl CcSpec {
    /// Normalizes a raw byte-or-none spec, validating the 0x00-0x7F range.
    pub fn normalize(byte: Option<u8>) -> Result<Self, crate::error::EnvError> {
        match byte {
            None => Ok(CcSpec::Disabled),
            Some(b) if b <= 0x7F => Ok(CcSpec::Byte(b)),
            Some(_) => Err(crate::error::EnvError::ApplyFailed {
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "control character byte must be in 0x00-0x7F",
                ),
            }),
        }
    }
}

/// Either an integer bit constant (flag axes) or a control-character
/// specification (`CtrlChar` axis). Part of a `ModItem`'s identity triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModValue {
    Bits(u64),
    CtrlChar(CcSpec),
}

/// Direction a flag-axis modification asserts. Fixed at `ModItem`
/// construction by which top-level factory built it (`add_flag` vs
/// `sub_flag`); see `ModItem::apply_forward` for how it drives direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagOp {
    Set,
    Clear,
}

impl FlagOp {
    pub fn invert(self) -> Self {
        match self {
            FlagOp::Set => FlagOp::Clear,
            FlagOp::Clear => FlagOp::Set,
        }
    }
}

/// POSIX `tcsetattr` timing code. Ignored on Windows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timing {
    Immediate,
    Drain,
    Flush,
}

impl Default for Timing {
    fn default() -> Self {
        Timing::Immediate
    }
}

/// The four control-character slots this crate manages, bundled as part of
/// a [`PosixState`]. `None` means "disabled" (`_POSIX_VDISABLE`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CtrlChars {
    pub intr: Option<u8>,
    pub quit: Option<u8>,
    pub xon: Option<u8>,
    pub xoff: Option<u8>,
}

impl CtrlChars {
    pub fn get(&self, slot: CtrlSlot) -> Option<u8> {
        match slot {
            CtrlSlot::Intr => self.intr,
            CtrlSlot::Quit => self.quit,
            CtrlSlot::Xon => self.xon,
            CtrlSlot::Xoff => self.xoff,
        }
    }

    pub fn set(&mut self, slot: CtrlSlot, value: Option<u8>) {
        match slot {
            CtrlSlot::Intr => self.intr = value,
            CtrlSlot::Quit => self.quit = value,
            CtrlSlot::Xon => self.xon = value,
            CtrlSlot::Xoff => self.xoff = value,
        }
    }
}

/// The POSIX half of an opaque driver state: the 6-field attribute tuple
/// plus the control-character slots this crate addresses.
#[derive(Clone, Debug, PartialEq)]
pub struct PosixState {
    pub iflag: u64,
    pub oflag: u64,
    pub cflag: u64,
    pub lflag: u64,
    pub ispeed: u64,
    pub ospeed: u64,
    pub cc: CtrlChars,
}

/// The Windows half of an opaque driver state: a single mode bitmask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowsState {
    pub mode: u32,
}

/// An opaque, platform-dependent snapshot of a stream's driver state.
#[derive(Clone, Debug, PartialEq)]
pub enum DriverState {
    Posix(PosixState),
    Windows(WindowsState),
}

impl DriverState {
    pub fn as_posix(&self) -> Option<&PosixState> {
        match self {
            DriverState::Posix(s) => Some(s),
            DriverState::Windows(_) => None,
        }
    }

    pub fn as_windows(&self) -> Option<&WindowsState> {
        match self {
            DriverState::Windows(s) => Some(s),
            DriverState::Posix(_) => None,
        }
    }
}
