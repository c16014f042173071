//! Pseudo-Modification: a no-op stand-in returned when the platform makes
//! an operation meaningless, preserving the `Modification` capability set.

use crate::error::EnvResult;
use crate::modification::Modification;

/// Responds truthfully to every `Modification` query as a well-defined
/// no-op: `origin`/`request`/boolean coercion are `false`,
/// `add_flag`/`sub_flag`/`reset`/`purge` never raise.
#[derive(Clone, Copy, Debug)]
pub struct Pseudo {
    operation: &'static str,
}

impl Pseudo {
    pub fn new(operation: &'static str) -> Self {
        Self { operation }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl Modification for Pseudo {
    fn origin(&self) -> bool {
        false
    }

    fn request(&self) -> bool {
        false
    }

    fn add_flag(&self) -> EnvResult<()> {
        log::debug!(target: "termmode_core::pseudo", "{} is a no-op on this platform", self.operation);
        Ok(())
    }

    fn sub_flag(&self) -> EnvResult<()> {
        Ok(())
    }

    fn reset(&self) -> EnvResult<()> {
        Ok(())
    }

    fn purge(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every capability in the shared `Modification` set must return a
    /// well-defined value and never raise, regardless of platform.
    #[test]
    fn pseudo_is_a_well_defined_no_op_over_every_capability() {
        let p = Pseudo::new("ansi_in");
        assert!(!p.origin());
        assert!(!p.request());
        assert!(p.add_flag().is_ok());
        assert!(p.sub_flag().is_ok());
        assert!(p.reset().is_ok());
        p.purge();
    }
}
