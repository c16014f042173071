//! Composite Handle: an ordered bundle of `ModItem`s treated as one
//! logical modification. Applies FIFO, reverts LIFO.

use crate::error::EnvResult;
use crate::mod_item::ModItem;
use crate::modification::Modification;

/// An ordered tuple of items. Used by High-Level Operations that must
/// toggle more than one flag as an atomic unit.
#[derive(Clone)]
pub struct Composite {
    items: Vec<ModItem>,
}

impl Composite {
    pub fn new(items: Vec<ModItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ModItem] {
        &self.items
    }
}

impl Modification for Composite {
    fn origin(&self) -> bool {
        // A single bool summary is exposed here as "all members already
        // matched baseline", matching how high-level operations report a
        // composite result.
        self.items.iter().all(Modification::origin)
    }

    fn request(&self) -> bool {
        self.items.iter().all(Modification::request)
    }

    fn add_flag(&self) -> EnvResult<()> {
        for item in &self.items {
            item.add_flag()?;
        }
        Ok(())
    }

    fn sub_flag(&self) -> EnvResult<()> {
        for item in self.items.iter().rev() {
            item.sub_flag()?;
        }
        Ok(())
    }

    fn reset(&self) -> EnvResult<()> {
        for item in self.items.iter().rev() {
            item.reset()?;
        }
        Ok(())
    }

    fn purge(&self) {
        for item in self.items.iter().rev() {
            item.purge();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Axis, FlagOp, ModValue, StreamSelector, Timing};
    use crate::registry::Coordinator;
    use termmode_io::mock::MockAdapter;

    /// A two-item Composite standing in for `non_block`'s Windows recipe
    /// (clear echo-input, clear line-input). Exercised against
    /// `MockAdapter::new_windows()` so the Windows-shaped bundling behavior
    /// is verified on any host, not only a Windows CI runner.
    #[test]
    fn composite_lifo_reverts_in_reverse_apply_order() {
        let adapter = MockAdapter::new_windows();
        let coord = Coordinator::new(Box::new(adapter.clone()));
        let stream = coord.adapter().handle(StreamSelector::Stdin).unwrap();

        const ECHO_INPUT: u64 = 0x0004;
        const LINE_INPUT: u64 = 0x0002;

        let echo_off = coord
            .instance(stream, ModValue::Bits(ECHO_INPUT), Axis::In, Timing::Immediate, FlagOp::Clear, false, None)
            .unwrap();
        let line_off = coord
            .instance(stream, ModValue::Bits(LINE_INPUT), Axis::In, Timing::Immediate, FlagOp::Clear, false, None)
            .unwrap();
        let composite = Composite::new(vec![echo_off, line_off]);

        assert!(!composite.request(), "both bits must read as cleared together");

        let order: std::sync::Arc<std::sync::Mutex<Vec<&'static str>>> =
            std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let order_echo = order.clone();
        composite.items()[0].add_before_reset_atexit(move || order_echo.lock().unwrap().push("echo"));
        let order_line = order.clone();
        composite.items()[1].add_before_reset_atexit(move || order_line.lock().unwrap().push("line"));

        composite.purge();
        assert_eq!(*order.lock().unwrap(), vec!["line", "echo"], "revert runs LIFO over apply order");
    }
}
