//! In-memory spy adapter for the test suite: no real OS resource is
//! touched. Can impersonate either driver shape (`Flavor::Posix` /
//! `Flavor::Windows`) independent of the host the tests actually run on,
//! so Windows-shaped behavior (e.g. the `non_block`/`no_impl_def`
//! composites) is exercised on any CI machine.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use termmode_core::adapter::PlatformAdapter;
use termmode_core::error::{EnvError, EnvResult};
use termmode_core::model::{
    Axis, CcSpec, CtrlChars, CtrlSlot, DriverState, FlagOp, PosixState, StreamId, StreamSelector,
    Timing, WindowsState,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flavor {
    Posix,
    Windows,
}

struct Inner {
    flavor: Flavor,
    states: HashMap<StreamId, DriverState>,
    set_state_calls: u64,
    is_terminal: bool,
    build: u32,
}

fn stream_for(selector: StreamSelector) -> StreamId {
    let raw = match selector {
        StreamSelector::Stdin => 0,
        StreamSelector::Stdout => 1,
        StreamSelector::Stderr => 2,
    };
    StreamId::new(selector, raw)
}

fn default_state(flavor: Flavor) -> DriverState {
    match flavor {
        Flavor::Posix => DriverState::Posix(PosixState {
            iflag: 0,
            oflag: 0,
            cflag: 0,
            lflag: 0,
            ispeed: 0,
            ospeed: 0,
            cc: CtrlChars::default(),
        }),
        Flavor::Windows => DriverState::Windows(WindowsState { mode: 0 }),
    }
}

/// Record-and-replay spy adapter, in the spirit of the teacher's own
/// `MockConsoleInput` (queue-and-drain for input events; here, a
/// recorded driver state plus a `set_state` call counter).
#[derive(Clone)]
pub struct MockAdapter(Arc<Mutex<Inner>>);

impl MockAdapter {
    /// POSIX-shaped mock: the default used by `termmode-core`'s own tests.
    pub fn new() -> Self {
        Self::with_flavor(Flavor::Posix)
    }

    /// Windows-shaped mock, for exercising the Windows High-Level
    /// Operation recipes without a Windows host.
    pub fn new_windows() -> Self {
        Self::with_flavor(Flavor::Windows)
    }

    fn with_flavor(flavor: Flavor) -> Self {
        let mut states = HashMap::new();
        for selector in [StreamSelector::Stdin, StreamSelector::Stdout, StreamSelector::Stderr] {
            states.insert(stream_for(selector), default_state(flavor));
        }
        Self(Arc::new(Mutex::new(Inner {
            flavor,
            states,
            set_state_calls: 0,
            is_terminal: true,
            build: 20348,
        })))
    }

    /// Test hook: mutate a stream's recorded state directly, bypassing
    /// `set_state`, to set up a baseline before constructing a `ModItem`.
    pub fn mutate_for_test(&self, stream: StreamId, f: impl FnOnce(&mut DriverState)) {
        let mut inner = self.0.lock().expect("mock adapter poisoned");
        if let Some(state) = inner.states.get_mut(&stream) {
            f(state);
        }
    }

    /// Test hook: simulate the stream being attached to a non-TTY (piped,
    /// redirected, IDE console) — `get_state` starts failing with
    /// `EnvError::NotATerminal`.
    pub fn set_is_terminal(&self, value: bool) {
        self.0.lock().expect("mock adapter poisoned").is_terminal = value;
    }

    /// Test hook: report a specific Windows build from `build_check`.
    pub fn set_build(&self, build: u32) {
        self.0.lock().expect("mock adapter poisoned").build = build;
    }

    /// Spy accessor: how many times `set_state` has been called, for
    /// driver-write idempotence assertions.
    pub fn set_state_call_count(&self) -> u64 {
        self.0.lock().expect("mock adapter poisoned").set_state_calls
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformAdapter for MockAdapter {
    fn handle(&self, selector: StreamSelector) -> EnvResult<StreamId> {
        Ok(stream_for(selector))
    }

    fn get_state(&self, stream: StreamId) -> EnvResult<DriverState> {
        let inner = self.0.lock().expect("mock adapter poisoned");
        if !inner.is_terminal {
            return Err(EnvError::NotATerminal { source: None });
        }
        inner
            .states
            .get(&stream)
            .cloned()
            .ok_or(EnvError::InvalidHandle { selector: stream.selector })
    }

    fn set_state(&self, stream: StreamId, state: &DriverState, _timing: Timing) -> EnvResult<()> {
        let mut inner = self.0.lock().expect("mock adapter poisoned");
        if !inner.is_terminal {
            return Err(EnvError::NotATerminal { source: None });
        }
        inner.set_state_calls += 1;
        inner.states.insert(stream, state.clone());
        Ok(())
    }

    fn read_flag(&self, state: &DriverState, axis: Axis, bits: u64) -> EnvResult<bool> {
        match state {
            DriverState::Posix(p) => {
                let field = posix_field(p, axis)?;
                Ok(field & bits == bits)
            }
            DriverState::Windows(w) => Ok(w.mode as u64 & bits == bits),
        }
    }

    fn write_flag(&self, state: &DriverState, axis: Axis, bits: u64, op: FlagOp) -> EnvResult<DriverState> {
        match state {
            DriverState::Posix(p) => {
                let mut next = p.clone();
                let field = posix_field_mut(&mut next, axis)?;
                match op {
                    FlagOp::Set => *field |= bits,
                    FlagOp::Clear => *field &= !bits,
                }
                Ok(DriverState::Posix(next))
            }
            DriverState::Windows(w) => {
                let mut mode = w.mode as u64;
                match op {
                    FlagOp::Set => mode |= bits,
                    FlagOp::Clear => mode &= !bits,
                }
                Ok(DriverState::Windows(WindowsState { mode: mode as u32 }))
            }
        }
    }

    fn read_cc(&self, state: &DriverState, slot: CtrlSlot) -> EnvResult<CcSpec> {
        match state {
            DriverState::Posix(p) => Ok(match p.cc.get(slot) {
                Some(b) => CcSpec::Byte(b),
                None => CcSpec::Disabled,
            }),
            DriverState::Windows(_) => Err(EnvError::NotSupportedOnPlatform { operation: "read_cc" }),
        }
    }

    fn write_cc(&self, state: &DriverState, slot: CtrlSlot, value: CcSpec) -> EnvResult<DriverState> {
        match state {
            DriverState::Posix(p) => {
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
            DriverState::Windows(_) => Err(EnvError::NotSupportedOnPlatform { operation: "write_cc" }),
        }
    }

    fn build_check(&self, required_build: u32) -> EnvResult<()> {
        let inner = self.0.lock().expect("mock adapter poisoned");
        if inner.flavor == Flavor::Windows && inner.build < required_build {
            return Err(EnvError::BuildTooOld {
                required: required_build,
                actual: inner.build,
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn posix_field(state: &PosixState, axis: Axis) -> EnvResult<u64> {
    match axis {
        Axis::In => Ok(state.iflag),
        Axis::Out => Ok(state.oflag),
        Axis::Ctrl => Ok(state.cflag),
        Axis::Local => Ok(state.lflag),
        Axis::CtrlChar(_) => Err(EnvError::ApplyFailed {
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "CtrlChar axis has no flag field"),
        }),
    }
}

fn posix_field_mut(state: &mut PosixState, axis: Axis) -> EnvResult<&mut u64> {
    match axis {
        Axis::In => Ok(&mut state.iflag),
        Axis::Out => Ok(&mut state.oflag),
        Axis::Ctrl => Ok(&mut state.cflag),
        Axis::Local => Ok(&mut state.lflag),
        Axis::CtrlChar(_) => Err(EnvError::ApplyFailed {
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "CtrlChar axis has no flag field"),
        }),
    }
}
