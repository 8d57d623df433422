//! External allocation accounting
//!
//! Tracks native memory that hangs off script objects (callback
//! registrations) but is invisible to the collector. Each instance owns
//! one account; teardown disposes it after every registration has been
//! finalized, so a non-zero balance at that point is a leak.

use std::cell::Cell;

#[derive(Debug, Default)]
pub(crate) struct ExternalAllocations {
    bytes: Cell<usize>,
}

impl ExternalAllocations {
    pub(crate) fn reserve(&self, bytes: usize) {
        self.bytes.set(self.bytes.get() + bytes);
    }

    pub(crate) fn release(&self, bytes: usize) {
        self.bytes.set(self.bytes.get().saturating_sub(bytes));
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.bytes.get()
    }

    /// Settles the account at teardown; returns the leaked byte count.
    pub(crate) fn dispose(&self, instance_id: u64) -> usize {
        let leaked = self.bytes.replace(0);
        if leaked > 0 {
            log::warn!(
                "[tether] instance {} disposed with {} external bytes outstanding",
                instance_id,
                leaked
            );
        }
        leaked
    }
}
