//! Engine instance lifecycle
//!
//! An [`Engine`] owns one boa runtime (a `Context` with its realm and
//! global object). Every other operation runs inside it through
//! [`Instance`], which `Engine` derefs to.
//!
//! # Teardown order
//!
//! Dropping the engine (or calling [`Engine::destroy`]) runs, in order:
//!
//! 1. force-finalize every live callback registration
//! 2. release the global object reference
//! 3. dispose the external allocation account
//! 4. dispose the runtime, then collect its heap
//!
//! Callback teardown may run host destructors that still expect the runtime
//! to exist, so step 1 must come first.
//!
//! # Threading
//!
//! boa's collector is thread-local, so instances and handles are `!Send`:
//! an instance is only ever used on the thread that created it.

use std::cell::{Cell, RefCell};
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::os::raw::c_void;
use std::ptr::{self, NonNull};
use std::rc::{Rc, Weak};

use boa_engine::{Context, JsError, JsNativeError, JsObject, JsResult, JsValue, Source};
use rustc_hash::FxHashMap;

use crate::callback::{CallbackTable, NATIVE_CALLBACK_CLASS_ID};
use crate::codec;
use crate::external::ExternalAllocations;
use crate::handle::{Handle, HandleLedger, HandleStats};
use crate::options::EngineOptions;
use crate::platform;
use crate::result::ExceptionResult;
use crate::value::Value;

// ============================================================================
// Engine
// ============================================================================

/// Owning handle to an engine instance
pub struct Engine {
    instance: Rc<Instance>,
}

impl Engine {
    /// Creates an instance with default options.
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    /// Creates an instance, bootstrapping the process-wide platform on
    /// first use.
    pub fn with_options(options: EngineOptions) -> Self {
        let id = platform::platform().next_instance_id();

        let mut context = Context::default();
        options.apply(context.runtime_limits_mut());
        let global = context.global_object();

        let external = Rc::new(ExternalAllocations::default());
        let callbacks = Rc::new(CallbackTable::new(Rc::clone(&external)));

        let instance = Rc::new_cyclic(|this| Instance {
            id,
            context: ManuallyDrop::new(RefCell::new(context)),
            transient: Cell::new(None),
            global: ManuallyDrop::new(global),
            external,
            ledger: Rc::new(HandleLedger::default()),
            callbacks,
            slots: RefCell::new(FxHashMap::default()),
            this: this.clone(),
        });
        log::debug!("[tether] created instance {} ({:?})", id, options);
        Engine { instance }
    }

    /// Tears the instance down. Equivalent to dropping it.
    pub fn destroy(self) {
        drop(self);
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Engine {
    type Target = Instance;

    fn deref(&self) -> &Instance {
        &self.instance
    }
}

// ============================================================================
// Instance
// ============================================================================

/// One isolated runtime plus its global execution context
pub struct Instance {
    id: u64,
    context: ManuallyDrop<RefCell<Context>>,
    /// Context lent out by a callback trampoline further up the stack
    transient: Cell<Option<NonNull<Context>>>,
    global: ManuallyDrop<JsObject>,
    external: Rc<ExternalAllocations>,
    ledger: Rc<HandleLedger>,
    callbacks: Rc<CallbackTable>,
    slots: RefCell<FxHashMap<u32, *mut c_void>>,
    this: Weak<Instance>,
}

impl Instance {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Owning handle to the global object
    pub fn global(&self) -> Handle {
        Handle::new(&self.ledger, JsValue::from((*self.global).clone()))
    }

    /// Compiles and runs `source` in the global context.
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD before parsing.
    pub fn eval(&self, source: impl AsRef<[u8]>) -> ExceptionResult {
        let source = String::from_utf8_lossy(source.as_ref());
        self.try_catch(|context| {
            context
                .eval(Source::from_bytes(source.as_bytes()))
                .map(Some)
        })
    }

    /// Stores an opaque pointer in `slot`. The instance never dereferences
    /// or frees it.
    pub fn set_slot(&self, slot: u32, data: *mut c_void) {
        self.slots.borrow_mut().insert(slot, data);
    }

    /// Pointer stored in `slot`, or null if unset
    pub fn get_slot(&self, slot: u32) -> *mut c_void {
        self.slots
            .borrow()
            .get(&slot)
            .copied()
            .unwrap_or(ptr::null_mut())
    }

    /// Forces a collector pass. Callbacks whose function objects are no
    /// longer reachable are finalized before this returns.
    pub fn collect_garbage(&self) {
        let before = self.callbacks.finalized();
        boa_gc::force_collect();
        log::debug!(
            "[tether] instance {}: collection finalized {} callbacks",
            self.id,
            self.callbacks.finalized() - before
        );
    }

    pub fn handle_stats(&self) -> HandleStats {
        self.ledger.stats()
    }

    /// Callback registrations not yet finalized
    pub fn live_callbacks(&self) -> usize {
        self.callbacks.live_with_class(NATIVE_CALLBACK_CLASS_ID)
    }

    /// Callback registrations finalized so far, by collector or teardown
    pub fn finalized_callbacks(&self) -> u64 {
        self.callbacks.finalized()
    }

    /// Native bytes attached to script objects and not yet reclaimed
    pub fn external_bytes(&self) -> usize {
        self.external.outstanding()
    }

    // ========================================================================
    // Internal plumbing
    // ========================================================================

    pub(crate) fn ledger(&self) -> &Rc<HandleLedger> {
        &self.ledger
    }

    pub(crate) fn callbacks(&self) -> &Rc<CallbackTable> {
        &self.callbacks
    }

    pub(crate) fn weak(&self) -> Weak<Instance> {
        self.this.clone()
    }

    /// Runs `f` against the active context: the one lent out by a running
    /// callback, if any, otherwise the instance's own.
    pub(crate) fn with_context<T>(&self, f: impl FnOnce(&mut Context) -> T) -> T {
        if let Some(mut active) = self.transient.get() {
            // SAFETY: `transient` is only set by `enter`, whose caller holds
            // the `&mut Context` this points to and does not touch it until
            // `enter` returns.
            return f(unsafe { active.as_mut() });
        }
        f(&mut *self.context.borrow_mut())
    }

    /// Lends `context` to nested operations for the duration of `f`.
    pub(crate) fn enter<T>(&self, context: &mut Context, f: impl FnOnce() -> T) -> T {
        struct Restore<'a> {
            slot: &'a Cell<Option<NonNull<Context>>>,
            previous: Option<NonNull<Context>>,
        }

        impl Drop for Restore<'_> {
            fn drop(&mut self) {
                self.slot.set(self.previous);
            }
        }

        let _restore = Restore {
            slot: &self.transient,
            previous: self.transient.replace(Some(NonNull::from(context))),
        };
        f()
    }

    /// Runs an operation that can throw and wraps its outcome.
    ///
    /// `Ok(None)` is a void success. A thrown value is encoded like any
    /// other result.
    pub(crate) fn try_catch<F>(&self, f: F) -> ExceptionResult
    where
        F: FnOnce(&mut Context) -> JsResult<Option<JsValue>>,
    {
        self.with_context(|context| match f(context) {
            Ok(Some(value)) => ExceptionResult::ok(codec::encode(&self.ledger, &value, context)),
            Ok(None) => ExceptionResult::ok_empty(),
            Err(error) => {
                let thrown = thrown_value(&error, context);
                ExceptionResult::exception(codec::encode(&self.ledger, &thrown, context))
            }
        })
    }

    /// Builds a script error object carrying `message`.
    pub(crate) fn error_value(&self, type_error: bool, message: &str) -> Value {
        let native = if type_error {
            JsNativeError::typ()
        } else {
            JsNativeError::error()
        };
        let error = JsError::from(native.with_message(message.to_owned()));
        self.with_context(|context| {
            let value = error.to_opaque(context);
            codec::encode(&self.ledger, &value, context)
        })
    }
}

/// Script-visible value of a thrown error.
///
/// Runtime-limit errors have no script representation, so they surface as
/// a `RangeError` with the same message.
fn thrown_value(error: &JsError, context: &mut Context) -> JsValue {
    match error.as_native() {
        Some(native) if native.is_runtime_limit() => {
            JsError::from(JsNativeError::range().with_message(native.message().to_owned()))
                .to_opaque(context)
        }
        _ => error.to_opaque(context),
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        let finalized = self.callbacks.force_finalize_all();

        // SAFETY: each field is dropped exactly once, here, and never used
        // afterwards.
        unsafe { ManuallyDrop::drop(&mut self.global) };
        let leaked = self.external.dispose(self.id);
        unsafe { ManuallyDrop::drop(&mut self.context) };

        // Anchors of this instance's functions now report to an empty table.
        boa_gc::force_collect();

        log::debug!(
            "[tether] destroyed instance {} ({} callbacks force-finalized, {} external bytes leaked, {} handles live)",
            self.id,
            finalized,
            leaked,
            self.ledger.stats().live
        );
    }
}
