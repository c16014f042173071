//! The capability set `ModItem`, `Composite`, and `Pseudo` all satisfy, so
//! callers of a high-level operation never match on the concrete shape
//! returned.

use crate::error::EnvResult;

/// A revertible, composable terminal driver modification.
pub trait Modification: Send + Sync {
    /// Baseline bit/value this item's target already had at construction.
    fn origin(&self) -> bool;

    /// Asks the adapter whether the value is presently set; no caching.
    fn request(&self) -> bool;

    /// Applies the modification (idempotent with respect to driver state,
    /// always goes through the adapter).
    fn add_flag(&self) -> EnvResult<()>;

    /// Un-applies the modification.
    fn sub_flag(&self) -> EnvResult<()>;

    /// Restores this item's contribution to its baseline, independent of
    /// current active state.
    fn reset(&self) -> EnvResult<()>;

    /// Runs pre-reset hooks, resets, and removes from the registry.
    /// Idempotent: a second call is a no-op.
    fn purge(&self);
}
