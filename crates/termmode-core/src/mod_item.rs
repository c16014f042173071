//! `ModItem`: the unit of terminal mutation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{EnvError, EnvResult};
use crate::model::{Axis, CcSpec, CtrlSlot, FlagOp, ModValue, StreamId, Timing};
use crate::modification::Modification;
use crate::registry::Coordinator;

type IdentityTriple = (StreamId, ModValue, Axis);

struct ModItemInner {
    coordinator: Arc<Coordinator>,
    stream: StreamId,
    value: ModValue,
    axis: Axis,
    timing: Timing,
    kind: FlagOp,
    reset_atexit: bool,
    #[allow(dead_code)]
    note: Option<String>,
    /// Whether the target bit was already set (flag axis) or a live byte
    /// already present (`CtrlChar` axis) at the moment this item was
    /// constructed.
    origin: bool,
    /// For `CtrlChar` axis only: the literal baseline byte (`None` meaning
    /// baseline was `Disabled`), needed because `reset()` must restore the
    /// exact prior character, not merely a boolean.
    origin_cc: Option<CcSpec>,
    active: AtomicBool,
    purged: AtomicBool,
    pre_reset_hooks: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
}

/// A reified, revertible change to driver state. Cheap to clone: all
/// clones share the same underlying bookkeeping (`active`/`purged` bits,
/// hook stack).
#[derive(Clone)]
pub struct ModItem(Arc<ModItemInner>);

impl ModItem {
    pub(crate) fn identity(&self) -> IdentityTriple {
        (self.0.stream, self.0.value, self.0.axis)
    }

    pub(crate) fn same_item(&self, other: &ModItem) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Whether this item opted into the atexit walk at construction. Only
    /// `rollback_all` (the Exit Coordinator's LIFO walk) consults this;
    /// `cache_purge()`'s on-demand walk purges every live item regardless.
    pub(crate) fn reset_atexit(&self) -> bool {
        self.0.reset_atexit
    }

    /// Drops a freshly-constructed item that lost a race against an
    /// existing duplicate, without running its `reset()`/hooks — the
    /// adapter write it already performed is harmless because the
    /// survivor's state supersedes it for the same identity triple.
    pub(crate) fn discard_without_reset(&self) {
        self.0.purged.store(true, Ordering::SeqCst);
    }

    fn cc_slot(&self) -> Option<CtrlSlot> {
        match self.0.axis {
            Axis::CtrlChar(slot) => Some(slot),
            _ => None,
        }
    }

    fn bits(&self) -> Option<u64> {
        match self.0.value {
            ModValue::Bits(b) => Some(b),
            ModValue::CtrlChar(_) => None,
        }
    }

    fn cc_target(&self) -> Option<CcSpec> {
        match self.0.value {
            ModValue::CtrlChar(spec) => Some(spec),
            ModValue::Bits(_) => None,
        }
    }

    /// Reads and writes against the stream's *live* driver state, not the
    /// frozen `SnapshotRegistry` baseline — otherwise a second item touching
    /// the same stream would recompute its target from pre-modification
    /// state and silently undo whatever the first item already applied.
    /// The baseline is only ever used for `origin`/rollback bookkeeping.
    fn write_flag(&self, op: FlagOp) -> EnvResult<()> {
        let bits = self.bits().expect("write_flag called on a CtrlChar item");
        let coordinator = &self.0.coordinator;
        let current = coordinator.adapter().get_state(self.0.stream)?;
        let next = coordinator.adapter().write_flag(&current, self.0.axis, bits, op)?;
        coordinator.adapter().set_state(self.0.stream, &next, self.0.timing)
    }

    fn write_cc(&self, slot: CtrlSlot, value: CcSpec) -> EnvResult<()> {
        let coordinator = &self.0.coordinator;
        let current = coordinator.adapter().get_state(self.0.stream)?;
        let next = coordinator.adapter().write_cc(&current, slot, value)?;
        coordinator.adapter().set_state(self.0.stream, &next, self.0.timing)
    }

    /// Registers `hook` to run, LIFO, before `reset()` on purge/exit.
    pub fn add_before_reset_atexit<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.0
            .pre_reset_hooks
            .lock()
            .expect("pre-reset hook stack poisoned")
            .push(Box::new(hook));
    }

    fn run_hooks(&self) {
        let hooks = std::mem::take(
            &mut *self.0.pre_reset_hooks.lock().expect("pre-reset hook stack poisoned"),
        );
        for hook in hooks.into_iter().rev() {
            hook();
        }
    }

    /// Invoked only by the Exit Coordinator's LIFO walk: hooks then reset,
    /// guarded by the same `purged` flag `purge()` uses so rollback runs at
    /// most once per item even if a caller already purged manually.
    pub(crate) fn run_exit_routine(&self) {
        if self.0.purged.swap(true, Ordering::SeqCst) {
            return;
        }
        self.run_hooks();
        if let Err(e) = self.reset() {
            log::warn!(target: "termmode_core::mod_item", "exit-time reset failed: {e}");
        }
    }
}

impl Modification for ModItem {
    fn origin(&self) -> bool {
        self.0.origin
    }

    fn request(&self) -> bool {
        let coordinator = &self.0.coordinator;
        let current = match coordinator.adapter().get_state(self.0.stream) {
            Ok(s) => s,
            Err(e) => {
                log::warn!(target: "termmode_core::mod_item", "request() failed to read state: {e}");
                return false;
            }
        };
        match self.cc_slot() {
            Some(slot) => match coordinator.adapter().read_cc(&current, slot) {
                Ok(spec) => Some(spec) == self.cc_target(),
                Err(_) => false,
            },
            None => {
                let bits = self.bits().expect("non-CtrlChar item must carry Bits value");
                coordinator
                    .adapter()
                    .read_flag(&current, self.0.axis, bits)
                    .unwrap_or(false)
            }
        }
    }

    fn add_flag(&self) -> EnvResult<()> {
        let result = match self.cc_slot() {
            Some(slot) => self.write_cc(slot, self.cc_target().expect("CtrlChar item must carry CcSpec value")),
            None => self.write_flag(self.0.kind),
        };
        if result.is_ok() {
            self.0.active.store(true, Ordering::SeqCst);
        }
        result
    }

    fn sub_flag(&self) -> EnvResult<()> {
        let result = match self.cc_slot() {
            Some(slot) => self.write_cc(slot, self.0.origin_cc.unwrap_or(CcSpec::Disabled)),
            None => self.write_flag(self.0.kind.invert()),
        };
        if result.is_ok() {
            self.0.active.store(false, Ordering::SeqCst);
        }
        result
    }

    fn reset(&self) -> EnvResult<()> {
        match self.cc_slot() {
            Some(slot) => self.write_cc(slot, self.0.origin_cc.unwrap_or(CcSpec::Disabled)),
            None => {
                let op = if self.0.origin { FlagOp::Set } else { FlagOp::Clear };
                self.write_flag(op)
            }
        }
    }

    fn purge(&self) {
        if self.0.purged.swap(true, Ordering::SeqCst) {
            return;
        }
        self.run_hooks();
        if let Err(e) = self.reset() {
            log::warn!(target: "termmode_core::mod_item", "purge() reset failed: {e}");
        }
        self.0.coordinator.registry_remove(&self.identity());
    }
}

/// Builds a new item: captures the snapshot baseline on first touch,
/// reads the origin bit/byte, applies the modification, and returns the
/// active item. Duplicate detection happens one layer up in
/// `Coordinator::instance`; this function always constructs.
pub(crate) fn construct(
    coordinator: Arc<Coordinator>,
    stream: StreamId,
    value: ModValue,
    axis: Axis,
    timing: Timing,
    kind: FlagOp,
    reset_atexit: bool,
    note: Option<String>,
) -> EnvResult<ModItem> {
    let baseline = coordinator.snapshots.get_or_init(coordinator.adapter(), stream)?;

    let (origin, origin_cc) = match axis {
        Axis::CtrlChar(slot) => {
            let current = coordinator.adapter().read_cc(&baseline, slot)?;
            let origin_cc = Some(current);
            let origin = !matches!(current, CcSpec::Disabled);
            (origin, origin_cc)
        }
        _ => {
            let bits = match value {
                ModValue::Bits(b) => b,
                ModValue::CtrlChar(_) => {
                    return Err(EnvError::ApplyFailed {
                        source: std::io::Error::new(
                            std::io::ErrorKind::InvalidInput,
                            "flag axis requires a Bits value",
                        ),
                    })
                }
            };
            let origin = coordinator.adapter().read_flag(&baseline, axis, bits)?;
            (origin, None)
        }
    };

    let inner = Arc::new(ModItemInner {
        coordinator,
        stream,
        value,
        axis,
        timing,
        kind,
        reset_atexit,
        note,
        origin,
        origin_cc,
        active: AtomicBool::new(false),
        purged: AtomicBool::new(false),
        pre_reset_hooks: Mutex::new(Vec::new()),
    });
    let item = ModItem(inner);
    item.add_flag()?;
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::consts;
    use crate::model::StreamSelector;
    use termmode_io::mock::MockAdapter;

    fn coordinator_with(adapter: MockAdapter) -> Arc<Coordinator> {
        Coordinator::new(Box::new(adapter))
    }

    #[test]
    fn origin_fidelity_round_trip() {
        let adapter = MockAdapter::new();
        let coord = coordinator_with(adapter.clone());
        let stream = coord.adapter().handle(StreamSelector::Stdin).unwrap();
        adapter.mutate_for_test(stream, |s| {
            if let crate::model::DriverState::Posix(p) = s {
                p.iflag |= 0b0010;
            }
        });

        let item = coord
            .instance(stream, ModValue::Bits(0b0010), Axis::In, Timing::Immediate, FlagOp::Set, false, None)
            .unwrap();
        assert!(item.origin(), "baseline already had the bit set");
        item.reset().unwrap();
        assert!(item.request(), "after reset the bit remains set");
    }

    #[test]
    fn ctrl_char_disable_and_restore() {
        let adapter = MockAdapter::new();
        let coord = coordinator_with(adapter.clone());
        let stream = coord.adapter().handle(StreamSelector::Stdin).unwrap();
        adapter.mutate_for_test(stream, |s| {
            if let crate::model::DriverState::Posix(p) = s {
                p.cc.intr = Some(0x03);
            }
        });

        let item = coord
            .instance(
                stream,
                ModValue::CtrlChar(CcSpec::Disabled),
                Axis::CtrlChar(CtrlSlot::Intr),
                Timing::Immediate,
                FlagOp::Set,
                false,
                None,
            )
            .unwrap();
        assert!(item.origin(), "baseline had a live byte");
        assert!(item.request(), "now disabled");
        item.reset().unwrap();
        assert!(!item.request(), "reset must restore the original byte, not Disabled");
    }

    #[test]
    fn independent_items_on_the_same_stream_compose() {
        // Two items targeting different axes of the same stream must not
        // clobber each other: applying the second must not undo the first.
        let adapter = MockAdapter::new();
        let coord = coordinator_with(adapter.clone());
        let stream = coord.adapter().handle(StreamSelector::Stdin).unwrap();

        let echo_off = coord
            .instance(
                stream,
                ModValue::Bits(consts::posix::ECHO),
                Axis::Local,
                Timing::Immediate,
                FlagOp::Clear,
                false,
                None,
            )
            .unwrap();
        let ixon_off = coord
            .instance(
                stream,
                ModValue::Bits(consts::posix::IXON),
                Axis::In,
                Timing::Immediate,
                FlagOp::Clear,
                false,
                None,
            )
            .unwrap();

        assert!(!echo_off.request(), "echo must still be off after a second item touches the stream");
        assert!(!ixon_off.request(), "ixon was just cleared by its own item");
    }

    #[test]
    fn add_flag_is_idempotent_at_the_driver_level() {
        let adapter = MockAdapter::new();
        let coord = coordinator_with(adapter.clone());
        let stream = coord.adapter().handle(StreamSelector::Stdin).unwrap();

        let first = coord
            .instance(
                stream,
                ModValue::Bits(consts::posix::ECHO),
                Axis::Local,
                Timing::Immediate,
                FlagOp::Clear,
                false,
                None,
            )
            .unwrap();
        let before = adapter.set_state_call_count();
        let second = coord
            .instance(
                stream,
                ModValue::Bits(consts::posix::ECHO),
                Axis::Local,
                Timing::Immediate,
                FlagOp::Clear,
                false,
                None,
            )
            .unwrap();
        assert!(first.same_item(&second), "dedup must return the same item reference");
        assert_eq!(
            adapter.set_state_call_count(),
            before,
            "the second instance() call must not re-apply the driver write"
        );
    }
}
