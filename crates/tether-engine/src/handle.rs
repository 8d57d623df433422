//! Owning handles into the engine heap
//!
//! A [`Handle`] is the host's explicit reference to a heap value. It is
//! move-only: [`Clone`] is the only way to get a second reference, and
//! dropping a handle releases it. Every instance keeps a [`HandleLedger`]
//! so tests can check that creations plus clones minus releases equals the
//! number of live handles.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use boa_engine::{JsObject, JsValue};
use tether_sdk::OpaqueHandle;

// ============================================================================
// Ledger
// ============================================================================

/// Per-instance handle counters
#[derive(Debug, Default)]
pub struct HandleLedger {
    created: Cell<u64>,
    cloned: Cell<u64>,
    released: Cell<u64>,
}

/// Snapshot of a [`HandleLedger`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleStats {
    /// Handles currently held by the host
    pub live: u64,
    /// Handles materialized from engine values
    pub created: u64,
    /// Handles produced by `clone`
    pub cloned: u64,
    /// Handles released (dropped or consumed by decode)
    pub released: u64,
}

impl HandleLedger {
    pub fn stats(&self) -> HandleStats {
        let created = self.created.get();
        let cloned = self.cloned.get();
        let released = self.released.get();
        HandleStats {
            live: created + cloned - released,
            created,
            cloned,
            released,
        }
    }

    fn bump(counter: &Cell<u64>) {
        counter.set(counter.get() + 1);
    }
}

// ============================================================================
// Handle
// ============================================================================

struct HandleCell {
    value: JsValue,
    ledger: Rc<HandleLedger>,
}

impl Drop for HandleCell {
    fn drop(&mut self) {
        HandleLedger::bump(&self.ledger.released);
    }
}

/// Owning reference to an engine heap value
///
/// Boxed so that its address is stable across the C boundary.
pub struct Handle(Box<HandleCell>);

impl Handle {
    pub(crate) fn new(ledger: &Rc<HandleLedger>, value: JsValue) -> Self {
        HandleLedger::bump(&ledger.created);
        Handle(Box::new(HandleCell {
            value,
            ledger: Rc::clone(ledger),
        }))
    }

    pub(crate) fn js_value(&self) -> &JsValue {
        &self.0.value
    }

    pub(crate) fn as_object(&self) -> Option<&JsObject> {
        self.0.value.as_object()
    }

    /// Releases the handle, yielding the engine value it referenced.
    pub(crate) fn into_js_value(self) -> JsValue {
        self.0.value.clone()
    }

    /// Whether both handles reference the same heap value
    pub fn same_value(&self, other: &Handle) -> bool {
        JsValue::same_value(&self.0.value, &other.0.value)
    }

    /// Transfers ownership to a raw pointer for the C surface.
    pub fn into_raw(self) -> *mut OpaqueHandle {
        Box::into_raw(self.0).cast()
    }

    /// Reclaims a handle produced by [`Handle::into_raw`].
    ///
    /// # Safety
    /// `ptr` must come from `into_raw` and must not have been reclaimed
    /// before.
    pub unsafe fn from_raw(ptr: *mut OpaqueHandle) -> Self {
        Handle(Box::from_raw(ptr.cast::<HandleCell>()))
    }
}

impl Clone for Handle {
    fn clone(&self) -> Self {
        HandleLedger::bump(&self.0.ledger.cloned);
        Handle(Box::new(HandleCell {
            value: self.0.value.clone(),
            ledger: Rc::clone(&self.0.ledger),
        }))
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.0.value.type_of())
    }
}
