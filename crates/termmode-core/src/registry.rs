//! Process-wide, ordered collection of live `ModItem`s — enforces
//! uniqueness on the identity triple and drives correct LIFO rollback —
//! plus the `Coordinator` that bundles it with the adapter and the
//! snapshot registry, and the Exit Coordinator that walks it LIFO at
//! process exit.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, Once, OnceLock};

use crate::adapter::PlatformAdapter;
use crate::error::EnvResult;
use crate::mod_item::ModItem;
use crate::model::{Axis, ModValue, StreamId};
use crate::snapshot::SnapshotRegistry;

type IdentityTriple = (StreamId, ModValue, Axis);

/// Insertion-ordered list of live items, dual-indexed by identity triple
/// for O(1) duplicate detection.
#[derive(Default)]
pub(crate) struct ModRegistryState {
    items: Vec<ModItem>,
    index: HashSet<IdentityTriple>,
}

impl ModRegistryState {
    fn contains(&self, triple: &IdentityTriple) -> bool {
        self.index.contains(triple)
    }

    fn insert(&mut self, triple: IdentityTriple, item: ModItem) {
        self.index.insert(triple);
        self.items.push(item);
    }

    fn remove(&mut self, triple: &IdentityTriple) {
        self.index.remove(triple);
        self.items.retain(|existing| existing.identity() != *triple);
    }

    fn find(&self, triple: &IdentityTriple) -> Option<ModItem> {
        self.items.iter().find(|i| i.identity() == *triple).cloned()
    }

    /// Snapshot of the current insertion order, for LIFO exit rollback.
    fn ordered_snapshot(&self) -> Vec<ModItem> {
        self.items.clone()
    }
}

/// Bundles the adapter, the snapshot baseline registry, and the live
/// modification registry into a single coordinator object, owned by a
/// one-time initializer, so tests can construct an isolated instance
/// against a fake adapter.
pub struct Coordinator {
    adapter: Box<dyn PlatformAdapter>,
    pub(crate) snapshots: SnapshotRegistry,
    registry: Mutex<ModRegistryState>,
    exit_registered: std::sync::atomic::AtomicBool,
}

impl Coordinator {
    pub fn new(adapter: Box<dyn PlatformAdapter>) -> Arc<Self> {
        Arc::new(Self {
            adapter,
            snapshots: SnapshotRegistry::new(),
            registry: Mutex::new(ModRegistryState::default()),
            exit_registered: std::sync::atomic::AtomicBool::new(false),
        })
    }

    pub fn adapter(&self) -> &dyn PlatformAdapter {
        self.adapter.as_ref()
    }

    /// Resolves a symbolic stream selector to a concrete `StreamId`.
    pub fn handle(&self, selector: crate::model::StreamSelector) -> EnvResult<StreamId> {
        self.adapter.handle(selector)
    }

    /// Checks the current platform build against `min`.
    pub fn check_build(&self, min: u32) -> EnvResult<()> {
        self.adapter.build_check(min)
    }

    /// Top-level `add_flag(...)`: constructs (or dedups against) an item
    /// whose forward direction sets `value` on `axis`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_flag(
        self: &Arc<Self>,
        stream: StreamId,
        value: ModValue,
        axis: Axis,
        timing: crate::model::Timing,
        reset_atexit: bool,
        note: Option<String>,
    ) -> EnvResult<ModItem> {
        self.instance(stream, value, axis, timing, crate::model::FlagOp::Set, reset_atexit, note)
    }

    /// Top-level `sub_flag(...)`: constructs (or dedups against) an item
    /// whose forward direction clears `value` on `axis`.
    #[allow(clippy::too_many_arguments)]
    pub fn sub_flag(
        self: &Arc<Self>,
        stream: StreamId,
        value: ModValue,
        axis: Axis,
        timing: crate::model::Timing,
        reset_atexit: bool,
        note: Option<String>,
    ) -> EnvResult<ModItem> {
        self.instance(stream, value, axis, timing, crate::model::FlagOp::Clear, reset_atexit, note)
    }

    /// Top-level `request(stream, value, axis) -> bool`: asks the adapter
    /// directly, with no registry lookup and no caching.
    pub fn request(&self, stream: StreamId, value: ModValue, axis: Axis) -> bool {
        let current = match self.adapter.get_state(stream) {
            Ok(s) => s,
            Err(_) => return false,
        };
        match (axis, value) {
            (Axis::CtrlChar(slot), ModValue::CtrlChar(target)) => self
                .adapter
                .read_cc(&current, slot)
                .map(|v| v == target)
                .unwrap_or(false),
            (_, ModValue::Bits(bits)) => self.adapter.read_flag(&current, axis, bits).unwrap_or(false),
            _ => false,
        }
    }

    /// `add_flag`/`sub_flag` top-level factory shared by both: attempts
    /// construction, deduplicating against an existing item with the same
    /// identity triple.
    pub(crate) fn instance(
        self: &Arc<Self>,
        stream: StreamId,
        value: ModValue,
        axis: Axis,
        timing: crate::model::Timing,
        kind: crate::model::FlagOp,
        reset_atexit: bool,
        note: Option<String>,
    ) -> EnvResult<ModItem> {
        let triple = (stream, value, axis);
        {
            let guard = self.registry.lock().expect("mod registry poisoned");
            if let Some(existing) = guard.find(&triple) {
                log::debug!(
                    target: "termmode_core::registry",
                    "instance() deduplicated against existing item for {triple:?}"
                );
                return Ok(existing);
            }
        }

        let item = crate::mod_item::construct(
            Arc::clone(self),
            stream,
            value,
            axis,
            timing,
            kind,
            reset_atexit,
            note,
        )?;

        let mut guard = self.registry.lock().expect("mod registry poisoned");
        // Re-check under lock: another thread may have won the race between
        // our pre-check above and adapter application.
        if let Some(existing) = guard.find(&triple) {
            item.discard_without_reset();
            return Ok(existing);
        }
        if reset_atexit {
            self.ensure_exit_hook_installed();
        }
        guard.insert(triple, item.clone());
        Ok(item)
    }

    pub(crate) fn registry_contains(&self, triple: &IdentityTriple) -> bool {
        self.registry.lock().expect("mod registry poisoned").contains(triple)
    }

    pub(crate) fn registry_remove(&self, triple: &IdentityTriple) {
        self.registry.lock().expect("mod registry poisoned").remove(triple);
    }

    fn ensure_exit_hook_installed(self: &Arc<Self>) {
        if self
            .exit_registered
            .swap(true, std::sync::atomic::Ordering::SeqCst)
        {
            return;
        }
        register_for_exit(Arc::clone(self));
    }

    /// Walks the live registry in reverse insertion order and runs the exit
    /// routine (hooks then reset) of every item that was constructed with
    /// `reset_atexit=true`, swallowing per-item errors so one failure does
    /// not skip the rest. Items constructed with `reset_atexit=false`
    /// opted out of this walk and are left untouched, active, in the
    /// registry.
    pub(crate) fn rollback_all(&self) {
        let snapshot = self
            .registry
            .lock()
            .expect("mod registry poisoned")
            .ordered_snapshot();
        for item in snapshot.iter().rev().filter(|item| item.reset_atexit()) {
            item.run_exit_routine();
        }
    }

    /// Global on-demand equivalent of the exit-time walk: `cache_purge()`.
    pub fn cache_purge(&self) {
        let snapshot = self
            .registry
            .lock()
            .expect("mod registry poisoned")
            .ordered_snapshot();
        for item in snapshot.iter().rev() {
            item.purge();
        }
    }
}

static EXIT_TARGETS: OnceLock<Mutex<Vec<Arc<Coordinator>>>> = OnceLock::new();
static EXIT_HOOK_ONCE: Once = Once::new();

fn exit_targets() -> &'static Mutex<Vec<Arc<Coordinator>>> {
    EXIT_TARGETS.get_or_init(|| Mutex::new(Vec::new()))
}

fn register_for_exit(coordinator: Arc<Coordinator>) {
    exit_targets()
        .lock()
        .expect("exit target list poisoned")
        .push(coordinator);
    EXIT_HOOK_ONCE.call_once(|| {
        // SAFETY: `extern "C" fn run_exit_rollback()` takes no captures and
        // only touches the process-wide statics above.
        unsafe {
            libc::atexit(run_exit_rollback);
        }
    });
}

extern "C" fn run_exit_rollback() {
    if let Some(lock) = EXIT_TARGETS.get() {
        if let Ok(targets) = lock.lock() {
            for coordinator in targets.iter() {
                coordinator.rollback_all();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CtrlSlot, StreamSelector};
    use termmode_io::mock::MockAdapter;

    fn coordinator() -> Arc<Coordinator> {
        Coordinator::new(Box::new(MockAdapter::new()))
    }

    #[test]
    fn duplicate_instance_returns_existing_reference() {
        let coord = coordinator();
        let stream = coord.adapter().handle(StreamSelector::Stdin).unwrap();
        let a = coord
            .instance(
                stream,
                ModValue::Bits(0b0010),
                Axis::In,
                crate::model::Timing::Immediate,
                crate::model::FlagOp::Set,
                false,
                None,
            )
            .unwrap();
        let b = coord
            .instance(
                stream,
                ModValue::Bits(0b0010),
                Axis::In,
                crate::model::Timing::Immediate,
                crate::model::FlagOp::Set,
                false,
                None,
            )
            .unwrap();
        assert!(a.same_item(&b), "dedup must return the same item reference");
    }

    #[test]
    fn cache_purge_reverts_lifo() {
        let coord = coordinator();
        let stream = coord.adapter().handle(StreamSelector::Stdin).unwrap();
        let _a = coord
            .instance(
                stream,
                ModValue::CtrlChar(crate::model::CcSpec::Byte(3)),
                Axis::CtrlChar(CtrlSlot::Intr),
                crate::model::Timing::Immediate,
                crate::model::FlagOp::Set,
                false,
                None,
            )
            .unwrap();
        coord.cache_purge();
        assert!(!coord.registry_contains(&(
            stream,
            ModValue::CtrlChar(crate::model::CcSpec::Byte(3)),
            Axis::CtrlChar(CtrlSlot::Intr)
        )));
    }

    #[test]
    fn cache_purge_resets_items_in_lifo_order() {
        // Given A applied then B, rollback calls B.reset before A.reset.
        use std::sync::Mutex as StdMutex;

        let coord = coordinator();
        let stream = coord.adapter().handle(StreamSelector::Stdin).unwrap();
        let order: Arc<StdMutex<Vec<&'static str>>> = Arc::new(StdMutex::new(Vec::new()));

        let a = coord
            .instance(
                stream,
                ModValue::Bits(0b0010),
                Axis::In,
                crate::model::Timing::Immediate,
                crate::model::FlagOp::Clear,
                false,
                None,
            )
            .unwrap();
        let order_a = Arc::clone(&order);
        a.add_before_reset_atexit(move || order_a.lock().unwrap().push("A"));

        let b = coord
            .instance(
                stream,
                ModValue::Bits(0b0100),
                Axis::Local,
                crate::model::Timing::Immediate,
                crate::model::FlagOp::Clear,
                false,
                None,
            )
            .unwrap();
        let order_b = Arc::clone(&order);
        b.add_before_reset_atexit(move || order_b.lock().unwrap().push("B"));

        coord.cache_purge();
        assert_eq!(*order.lock().unwrap(), vec!["B", "A"], "B resets before A");
    }

    #[test]
    fn rollback_all_skips_items_that_opted_out_of_atexit() {
        use crate::modification::Modification;

        let coord = coordinator();
        let stream = coord.adapter().handle(StreamSelector::Stdin).unwrap();

        // Opted out: reset_atexit=false. Must survive the exit-time walk.
        let opted_out = coord
            .instance(
                stream,
                ModValue::Bits(0b0010),
                Axis::In,
                crate::model::Timing::Immediate,
                crate::model::FlagOp::Set,
                false,
                None,
            )
            .unwrap();
        // Opted in: reset_atexit=true. Must be reset by the exit-time walk.
        let opted_in = coord
            .instance(
                stream,
                ModValue::Bits(0b0100),
                Axis::Local,
                crate::model::Timing::Immediate,
                crate::model::FlagOp::Set,
                true,
                None,
            )
            .unwrap();

        coord.rollback_all();

        assert!(opted_out.request(), "reset_atexit=false item must not be touched by the exit walk");
        assert!(!opted_in.request(), "reset_atexit=true item must be reset by the exit walk");
    }

    #[test]
    fn inappropriate_device_on_first_touch_creates_no_item_and_no_snapshot() {
        // get_state raises NotATerminal on first touch; the guard's handler
        // absorbs it; no Item is constructed and the SnapshotRegistry stays
        // empty for that stream.
        use crate::guard::InappropriateDeviceGuard;

        let adapter = MockAdapter::new();
        adapter.set_is_terminal(false);
        let coord = Coordinator::new(Box::new(adapter));
        let stream = StreamId::new(crate::model::StreamSelector::Stdin, 0);

        let guard: InappropriateDeviceGuard<&'static str> =
            InappropriateDeviceGuard::new().on_inappropriate_device(|_| "handled");
        let result = guard.run(|| {
            coord
                .instance(
                    stream,
                    ModValue::Bits(0b0010),
                    Axis::In,
                    crate::model::Timing::Immediate,
                    crate::model::FlagOp::Set,
                    false,
                    None,
                )
                .map(|_| "constructed")
        });

        assert_eq!(result.unwrap(), "handled");
        assert!(coord.snapshots.peek(stream).is_none(), "snapshot must stay unpopulated");
        assert!(!coord.registry_contains(&(stream, ModValue::Bits(0b0010), Axis::In)));
    }
}
