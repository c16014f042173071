//! Concrete [`termmode_core::adapter::PlatformAdapter`] implementations:
//! the real POSIX and Windows backends, plus an in-memory mock for tests.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

pub mod mock;

#[cfg(unix)]
pub use unix::PosixAdapter;
#[cfg(windows)]
pub use windows::WindowsAdapter;

use termmode_core::adapter::PlatformAdapter;

/// Picks the live backend for the compile target. The root `termmode`
/// crate's process-wide `Coordinator` is built from this.
#[cfg(unix)]
pub fn current_adapter() -> Box<dyn PlatformAdapter> {
    Box::new(PosixAdapter::new())
}

#[cfg(windows)]
pub fn current_adapter() -> Box<dyn PlatformAdapter> {
    Box::new(WindowsAdapter::new())
}
