//! Change detection over a textual snapshot of a page region.

use tracing::debug;

/// Remembers the last region snapshot and reports when a new one differs.
#[derive(Debug, Default, Clone)]
pub struct ChangeWatcher {
    last: String,
}

impl ChangeWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the startup snapshot. An absent region leaves the watcher
    /// empty.
    pub fn prime(&mut self, snapshot: Option<String>) {
        if let Some(snapshot) = snapshot {
            self.last = snapshot;
        }
    }

    /// Returns true when `snapshot` differs from the last one seen, and
    /// remembers it. An absent region never counts as a change.
    pub fn observe(&mut self, snapshot: Option<&str>) -> bool {
        let Some(snapshot) = snapshot else {
            return false;
        };
        if snapshot == self.last {
            return false;
        }
        debug!(len = snapshot.len(), "Region snapshot changed");
        self.last = snapshot.to_string();
        true
    }

    pub fn last(&self) -> &str {
        &self.last
    }
}
