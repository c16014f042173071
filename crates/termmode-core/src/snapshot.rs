//! Process-wide mapping from stream to the driver state observed the first
//! time that stream was touched — the ground-truth baseline for rollback.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::adapter::PlatformAdapter;
use crate::error::EnvResult;
use crate::model::{DriverState, StreamId};

/// Write-once-per-key registry: never overwritten once populated.
#[derive(Default)]
pub struct SnapshotRegistry {
    entries: Mutex<HashMap<StreamId, DriverState>>,
}

impl SnapshotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the baseline for `stream`, querying and storing it via
    /// `adapter` on first touch. Subsequent calls return the stored value
    /// unconditionally, even if the live driver state has since changed.
    pub fn get_or_init(
        &self,
        adapter: &dyn PlatformAdapter,
        stream: StreamId,
    ) -> EnvResult<DriverState> {
        let mut entries = self.entries.lock().expect("snapshot registry poisoned");
        if let Some(existing) = entries.get(&stream) {
            return Ok(existing.clone());
        }
        let state = adapter.get_state(stream)?;
        entries.insert(stream, state.clone());
        log::debug!(target: "termmode_core::snapshot", "captured baseline for {stream:?}");
        Ok(state)
    }

    /// Returns the stored baseline without touching the adapter, if one
    /// has already been captured.
    pub fn peek(&self, stream: StreamId) -> Option<DriverState> {
        self.entries
            .lock()
            .expect("snapshot registry poisoned")
            .get(&stream)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termmode_io::mock::MockAdapter;

    #[test]
    fn first_touch_is_captured_once() {
        let adapter = MockAdapter::new();
        let stream = adapter.handle(crate::model::StreamSelector::Stdin).unwrap();
        let registry = SnapshotRegistry::new();

        let first = registry.get_or_init(&adapter, stream).unwrap();
        adapter.mutate_for_test(stream, |s| {
            if let DriverState::Posix(p) = s {
                p.lflag |= 0xFF;
            }
        });
        let second = registry.get_or_init(&adapter, stream).unwrap();

        assert_eq!(first, second, "snapshot must not reflect later mutation");
    }
}
