//! Registry of active layout runs.
//!
//! Whoever needs to act on every in-flight layout (a "relayout all" or a
//! bulk abort) holds a registry and passes it by reference; there is no
//! process-wide singleton.

use crate::lifecycle::AbortHandle;
use indexmap::IndexMap;

#[derive(Debug, Default)]
pub struct LayoutRegistry {
    handles: IndexMap<String, AbortHandle>,
}

impl LayoutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handle under `key`, replacing any previous entry.
    pub fn register(&mut self, key: impl Into<String>, handle: AbortHandle) {
        self.handles.insert(key.into(), handle);
    }

    pub fn unregister(&mut self, key: &str) -> Option<AbortHandle> {
        self.handles.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&AbortHandle> {
        self.handles.get(key)
    }

    /// Visits every registered handle in registration order.
    pub fn for_each(&self, mut f: impl FnMut(&str, &AbortHandle)) {
        for (key, handle) in &self.handles {
            f(key, handle);
        }
    }

    /// Requests cancellation of every registered run.
    pub fn abort_all(&self) {
        for handle in self.handles.values() {
            handle.abort();
        }
    }
}
