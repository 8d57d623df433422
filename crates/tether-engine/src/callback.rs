//! Host callback bridge
//!
//! Host functions become script-callable function objects. Each one is
//! backed by a [`Registration`] in the instance's [`CallbackTable`]:
//!
//! ```text
//! JsFunction ──captures──> Gc<CallbackAnchor { id }> <──weak── Registration { callback, instance }
//!                                   │ Finalize                       ▲
//!                                   └─────── table.finalize(id) ─────┘
//! ```
//!
//! The anchor is only reachable through the function object, and scripts
//! cannot see it. Once the function becomes garbage, the collector
//! finalizes the anchor, which finalizes the registration and drops the host
//! callback. Instance teardown force-finalizes whatever is still live,
//! before the runtime goes away.

use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::{Rc, Weak};

use boa_engine::object::builtins::JsFunction;
use boa_engine::object::FunctionObjectBuilder;
use boa_engine::{Context, JsError, JsResult, JsValue, NativeFunction};
use boa_gc::{Finalize, Gc, Trace, WeakGc};
use rustc_hash::FxHashMap;

use crate::codec;
use crate::external::ExternalAllocations;
use crate::instance::Instance;
use crate::result::ExceptionResult;
use crate::value::Value;

/// Class marker stamped on the weak handle of every callback registration
pub const NATIVE_CALLBACK_CLASS_ID: u16 = 1001;

/// Host code callable from scripts
///
/// `this` and `args` are owned by the callback. Nested operations on
/// `instance` are allowed while the call is running.
///
/// A callback is dropped exactly once, either during a collector pass or
/// at instance teardown. Its destructor must not touch any engine.
pub trait NativeCallback: 'static {
    fn call(&self, instance: &Instance, this: Value, args: Vec<Value>) -> ExceptionResult;
}

impl<F> NativeCallback for F
where
    F: Fn(&Instance, Value, Vec<Value>) -> ExceptionResult + 'static,
{
    fn call(&self, instance: &Instance, this: Value, args: Vec<Value>) -> ExceptionResult {
        self(instance, this, args)
    }
}

// ============================================================================
// Anchor
// ============================================================================

/// Collector-managed token captured by a callback's function object
#[derive(Trace)]
#[boa_gc(unsafe_empty_trace)]
pub(crate) struct CallbackAnchor {
    id: u64,
    table: Weak<CallbackTable>,
}

impl Finalize for CallbackAnchor {
    fn finalize(&self) {
        // Runs inside a collector pass: native state only.
        if let Some(table) = self.table.upgrade() {
            table.finalize(self.id);
        }
    }
}

// ============================================================================
// Registration
// ============================================================================

struct WeakHandle {
    anchor: WeakGc<CallbackAnchor>,
    class_id: u16,
}

struct Registration {
    callback: Rc<dyn NativeCallback>,
    instance: Weak<Instance>,
    weak: Option<WeakHandle>,
}

impl Registration {
    /// Clears the weak status so no collector pass finalizes it again.
    fn disarm(&mut self) {
        self.weak = None;
    }
}

// ============================================================================
// CallbackTable
// ============================================================================

/// Side table of live registrations, keyed by anchor id
pub(crate) struct CallbackTable {
    entries: RefCell<FxHashMap<u64, Registration>>,
    next_id: Cell<u64>,
    finalized: Cell<u64>,
    external: Rc<ExternalAllocations>,
}

impl CallbackTable {
    pub(crate) fn new(external: Rc<ExternalAllocations>) -> Self {
        Self {
            entries: RefCell::new(FxHashMap::default()),
            next_id: Cell::new(1),
            finalized: Cell::new(0),
            external,
        }
    }

    /// Creates the function object for `callback` and records its
    /// registration.
    pub(crate) fn register(
        table: &Rc<Self>,
        instance: Weak<Instance>,
        callback: Rc<dyn NativeCallback>,
        context: &mut Context,
    ) -> JsFunction {
        let id = table.next_id.get();
        table.next_id.set(id + 1);

        let anchor = Gc::new(CallbackAnchor {
            id,
            table: Rc::downgrade(table),
        });
        let weak = WeakHandle {
            anchor: WeakGc::new(&anchor),
            class_id: NATIVE_CALLBACK_CLASS_ID,
        };
        let function = FunctionObjectBuilder::new(
            context.realm(),
            NativeFunction::from_copy_closure_with_captures(trampoline, anchor),
        )
        .build();

        // No allocation happens while `entries` is borrowed, so a collector
        // pass can never observe the borrow.
        table.entries.borrow_mut().insert(
            id,
            Registration {
                callback,
                instance,
                weak: Some(weak),
            },
        );
        table.external.reserve(mem::size_of::<Registration>());
        log::trace!("[tether] registered callback {}", id);
        function
    }

    fn lookup(&self, id: u64) -> Option<(Rc<dyn NativeCallback>, Rc<Instance>)> {
        let entries = self.entries.borrow();
        let registration = entries.get(&id)?;
        let instance = registration.instance.upgrade()?;
        Some((Rc::clone(&registration.callback), instance))
    }

    /// Collector-driven finalization; a no-op for unknown or retired ids.
    fn finalize(&self, id: u64) {
        let removed = self.entries.borrow_mut().remove(&id);
        if let Some(registration) = removed {
            log::trace!("[tether] finalizing unreachable callback {}", id);
            self.retire(registration);
        }
    }

    /// Finalizes every live registration. Runs at teardown, before the
    /// runtime is disposed.
    pub(crate) fn force_finalize_all(&self) -> usize {
        let mut drained: Vec<(u64, Registration)> = self.entries.borrow_mut().drain().collect();
        drained.sort_unstable_by_key(|(id, _)| *id);

        let count = drained.len();
        for (_, mut registration) in drained {
            registration.disarm();
            self.retire(registration);
        }
        count
    }

    fn retire(&self, registration: Registration) {
        self.external.release(mem::size_of::<Registration>());
        self.finalized.set(self.finalized.get() + 1);
        drop(registration);
    }

    /// Armed registrations whose weak handle carries `class_id` and whose
    /// anchor has not been collected
    pub(crate) fn live_with_class(&self, class_id: u16) -> usize {
        self.entries
            .borrow()
            .values()
            .filter(|registration| {
                registration
                    .weak
                    .as_ref()
                    .is_some_and(|weak| weak.class_id == class_id && weak.anchor.upgrade().is_some())
            })
            .count()
    }

    pub(crate) fn finalized(&self) -> u64 {
        self.finalized.get()
    }
}

// ============================================================================
// Trampoline
// ============================================================================

fn trampoline(
    this: &JsValue,
    args: &[JsValue],
    anchor: &Gc<CallbackAnchor>,
    context: &mut Context,
) -> JsResult<JsValue> {
    let Some(table) = anchor.table.upgrade() else {
        return Ok(JsValue::undefined());
    };
    let Some((callback, instance)) = table.lookup(anchor.id) else {
        return Ok(JsValue::undefined());
    };

    let ledger = instance.ledger();
    let this = codec::encode(ledger, this, context);
    let args = args
        .iter()
        .map(|arg| codec::encode(ledger, arg, context))
        .collect();

    let outcome = instance.enter(context, || callback.call(&instance, this, args));

    let value = codec::decode(outcome.value, context);
    if outcome.is_exception {
        Err(JsError::from_opaque(value))
    } else {
        Ok(value)
    }
}
