//! Platform-agnostic core of the terminal-mode controller.
//!
//! Mutates a stream's driver state through a [`adapter::PlatformAdapter`],
//! tracks every outstanding modification in a process-wide
//! [`registry::Coordinator`], and guarantees LIFO rollback before process
//! exit. This crate never mentions termios or console-mode vocabulary by
//! name; `termmode-io` supplies the concrete adapters.

pub mod adapter;
pub mod composite;
pub mod error;
pub mod guard;
pub mod mod_item;
pub mod model;
pub mod modification;
pub mod ops;
pub mod pseudo;
pub mod registry;
pub mod snapshot;

pub mod prelude {
    //! Re-exports the surface most callers need in one `use`.
    pub use crate::adapter::{consts, PlatformAdapter};
    pub use crate::composite::Composite;
    pub use crate::error::{EnvError, EnvResult};
    pub use crate::guard::InappropriateDeviceGuard;
    pub use crate::mod_item::ModItem;
    pub use crate::model::{
        Axis, CcSpec, CtrlChars, CtrlSlot, DriverState, FlagOp, ModValue, PosixState,
        StreamId, StreamSelector, Timing, WindowsState,
    };
    pub use crate::modification::Modification;
    pub use crate::pseudo::Pseudo;
    pub use crate::registry::Coordinator;
}
