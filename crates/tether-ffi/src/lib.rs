//! C FFI bindings for the tether engine
//!
//! This module exposes the boundary layer to non-Rust hosts. The API follows
//! these principles:
//! - ABI-stable (only the `#[repr(C)]` shapes from `tether-sdk`)
//! - Opaque pointers for instances and handles
//! - Exceptions reported in-band through [`TryCatchDesc`]
//! - Manual memory management: every owning handle is released exactly once
//!
//! Instances are single-threaded: every call for an instance, and every
//! handle it produced, must happen on the thread that created it.
//!
//! Null instance or handle pointers are treated as no-ops and yield null,
//! `false`, `0` or `Undefined`.

use std::mem::ManuallyDrop;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;
use std::slice;

use parking_lot::RwLock;
use tether_engine::abi::{
    desc_to_result, desc_to_value, drop_utf8_value, result_to_desc, text_to_utf8_value,
    value_to_desc,
};
use tether_engine::{Engine, EngineError, ExceptionResult, Handle, Instance, NativeCallback, Value};
use tether_sdk::{
    CallbackDropFn, CallbackWrapperFn, OpaqueHandle, OpaqueInstance, TryCatchDesc, Utf8Value,
    ValueDesc,
};

// ============================================================================
// Callback Lifecycle
// ============================================================================

#[derive(Clone, Copy)]
struct LifecycleFuncs {
    wrapper: CallbackWrapperFn,
    drop: CallbackDropFn,
}

static LIFECYCLE: RwLock<Option<LifecycleFuncs>> = parking_lot::const_rwlock(None);

fn lifecycle() -> Option<LifecycleFuncs> {
    *LIFECYCLE.read()
}

/// Install the process-wide callback wrapper and drop functions
///
/// Must be called before the first `tether_function_create`. Installing
/// again replaces the previous pair for every later call and drop.
///
/// # Safety
/// Both functions must stay valid for the rest of the process.
#[no_mangle]
pub unsafe extern "C" fn tether_init_set_callback_lifecycle_funcs(
    wrapper: CallbackWrapperFn,
    drop: CallbackDropFn,
) {
    *LIFECYCLE.write() = Some(LifecycleFuncs { wrapper, drop });
}

/// Host callback registered through the C surface
struct ForeignCallback {
    instance: *const OpaqueInstance,
    callback: *mut c_void,
}

impl NativeCallback for ForeignCallback {
    fn call(&self, instance: &Instance, this: Value, args: Vec<Value>) -> ExceptionResult {
        let Some(funcs) = lifecycle() else {
            let error = EngineError::from("no callback lifecycle functions installed");
            return ExceptionResult::exception(error.to_exception(instance));
        };

        let Some(argc) = arg_count(args.len()) else {
            let error = EngineError::from("too many arguments for a host callback");
            return ExceptionResult::exception(error.to_exception(instance));
        };

        let this = value_to_desc(this);
        let args: Vec<ValueDesc> = args.into_iter().map(value_to_desc).collect();

        // SAFETY: the wrapper was installed for this purpose and takes
        // ownership of `this` and every argument.
        unsafe {
            let result = (funcs.wrapper)(self.instance, self.callback, this, args.as_ptr(), argc);
            desc_to_result(result)
        }
    }
}

impl Drop for ForeignCallback {
    fn drop(&mut self) {
        match lifecycle() {
            // SAFETY: a registration is dropped exactly once.
            Some(funcs) => unsafe { (funcs.drop)(self.callback) },
            None => log::warn!("[tether] no drop function installed; leaking callback {:p}", self.callback),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn arg_count(len: usize) -> Option<c_int> {
    c_int::try_from(len).ok()
}

unsafe fn instance<'a>(ptr: *const OpaqueInstance) -> Option<&'a Engine> {
    ptr.cast::<Engine>().as_ref()
}

/// Borrow the handle behind `ptr` without taking ownership.
unsafe fn with_handle<T>(ptr: *mut OpaqueHandle, f: impl FnOnce(&Handle) -> T) -> Option<T> {
    if ptr.is_null() {
        return None;
    }
    let handle = ManuallyDrop::new(Handle::from_raw(ptr));
    Some(f(&handle))
}

fn undefined_result() -> TryCatchDesc {
    TryCatchDesc::ok_empty()
}

/// Reclaim an argument so it is released even when the call is rejected.
unsafe fn consume(desc: ValueDesc) -> Value {
    desc_to_value(desc)
}

// ============================================================================
// Instance Functions
// ============================================================================

/// Create a new engine instance
///
/// The first call in a process bootstraps the shared platform.
///
/// # Safety
/// The returned instance must be freed with `tether_instance_drop()`.
#[no_mangle]
pub unsafe extern "C" fn tether_instance_new() -> *mut OpaqueInstance {
    Box::into_raw(Box::new(Engine::new())).cast()
}

/// Destroy an instance and free all its resources
///
/// Live callback registrations are finalized first, so the drop function
/// runs for each of them before this returns.
///
/// # Safety
/// - `instance` must come from `tether_instance_new()` and not have been
///   dropped before
/// - Handles produced by the instance may still be released afterwards, but
///   must not be used otherwise
#[no_mangle]
pub unsafe extern "C" fn tether_instance_drop(instance: *mut OpaqueInstance) {
    if instance.is_null() {
        return;
    }
    drop(Box::from_raw(instance.cast::<Engine>()));
}

/// Owning handle to the global object
///
/// # Safety
/// `instance` must be a live instance.
#[no_mangle]
pub unsafe extern "C" fn tether_instance_global(instance: *const OpaqueInstance) -> *mut OpaqueHandle {
    match self::instance(instance) {
        Some(engine) => engine.global().into_raw(),
        None => ptr::null_mut(),
    }
}

/// Evaluate `length` bytes of UTF-8 source in the global context
///
/// # Example (C)
/// ```c
/// const char* src = "1 + 1";
/// TryCatchDesc r = tether_instance_eval(instance, src, strlen(src));
/// if (r.is_exception) { /* r.value is the thrown value */ }
/// ```
///
/// # Safety
/// - `instance` must be a live instance
/// - `data` must be valid for `length` bytes
#[no_mangle]
pub unsafe extern "C" fn tether_instance_eval(
    instance: *const OpaqueInstance,
    data: *const c_char,
    length: usize,
) -> TryCatchDesc {
    let Some(engine) = self::instance(instance) else {
        return undefined_result();
    };
    let source: &[u8] = if data.is_null() {
        &[]
    } else {
        slice::from_raw_parts(data.cast::<u8>(), length)
    };
    result_to_desc(engine.eval(source))
}

/// Store an opaque pointer in `slot`
///
/// # Safety
/// `instance` must be a live instance. `data` is never dereferenced.
#[no_mangle]
pub unsafe extern "C" fn tether_instance_set_data(
    instance: *const OpaqueInstance,
    slot: u32,
    data: *mut c_void,
) {
    if let Some(engine) = self::instance(instance) {
        engine.set_slot(slot, data);
    }
}

/// Pointer stored in `slot`, or NULL if unset
///
/// # Safety
/// `instance` must be a live instance.
#[no_mangle]
pub unsafe extern "C" fn tether_instance_get_data(
    instance: *const OpaqueInstance,
    slot: u32,
) -> *mut c_void {
    match self::instance(instance) {
        Some(engine) => engine.get_slot(slot),
        None => ptr::null_mut(),
    }
}

/// Force a collector pass, finalizing unreachable callbacks
///
/// # Safety
/// `instance` must be a live instance.
#[no_mangle]
pub unsafe extern "C" fn tether_instance_collect_garbage(instance: *const OpaqueInstance) {
    if let Some(engine) = self::instance(instance) {
        engine.collect_garbage();
    }
}

// ============================================================================
// Value Functions
// ============================================================================

/// New owning handle to the same value
///
/// # Safety
/// `value` must be a live handle from the same thread.
#[no_mangle]
pub unsafe extern "C" fn tether_value_clone(
    _instance: *const OpaqueInstance,
    value: *mut OpaqueHandle,
) -> *mut OpaqueHandle {
    with_handle(value, |handle| handle.clone().into_raw()).unwrap_or(ptr::null_mut())
}

/// Release an owning handle
///
/// # Safety
/// `value` must be a live handle, released exactly once.
#[no_mangle]
pub unsafe extern "C" fn tether_value_drop(value: *mut OpaqueHandle) {
    if !value.is_null() {
        drop(Handle::from_raw(value));
    }
}

// ============================================================================
// String Functions
// ============================================================================

/// New string from `length` bytes of UTF-8; invalid sequences become U+FFFD
///
/// # Safety
/// - `instance` must be a live instance
/// - `data` must be valid for `length` bytes
#[no_mangle]
pub unsafe extern "C" fn tether_string_create(
    instance: *const OpaqueInstance,
    data: *const c_char,
    length: usize,
) -> *mut OpaqueHandle {
    let Some(engine) = self::instance(instance) else {
        return ptr::null_mut();
    };
    let bytes: &[u8] = if data.is_null() {
        &[]
    } else {
        slice::from_raw_parts(data.cast::<u8>(), length)
    };
    engine.create_string(bytes).into_raw()
}

/// UTF-8 copy of a string, released with `tether_utf8_value_drop()`
///
/// `length` is capped at `INT32_MAX`; longer strings report only their
/// first `INT32_MAX` bytes.
///
/// # Safety
/// `instance` and `value` must be live.
#[no_mangle]
pub unsafe extern "C" fn tether_string_to_utf8_value(
    instance: *const OpaqueInstance,
    value: *mut OpaqueHandle,
) -> Utf8Value {
    let Some(engine) = self::instance(instance) else {
        return Utf8Value::empty();
    };
    with_handle(value, |handle| text_to_utf8_value(engine.string_to_utf8(handle)))
        .unwrap_or_else(Utf8Value::empty)
}

/// Release a UTF-8 copy
///
/// # Safety
/// `value` must come from `tether_string_to_utf8_value()` and be released
/// exactly once.
#[no_mangle]
pub unsafe extern "C" fn tether_utf8_value_drop(value: Utf8Value) {
    drop_utf8_value(value);
}

// ============================================================================
// Array Functions
// ============================================================================

/// # Safety
/// `instance` must be a live instance.
#[no_mangle]
pub unsafe extern "C" fn tether_array_create(instance: *const OpaqueInstance) -> *mut OpaqueHandle {
    match self::instance(instance) {
        Some(engine) => engine.create_array().into_raw(),
        None => ptr::null_mut(),
    }
}

/// Length of an array, or 0 if `array` is not one
///
/// # Safety
/// `instance` and `array` must be live.
#[no_mangle]
pub unsafe extern "C" fn tether_array_length(
    instance: *const OpaqueInstance,
    array: *mut OpaqueHandle,
) -> u32 {
    let Some(engine) = self::instance(instance) else {
        return 0;
    };
    with_handle(array, |handle| engine.array_length(handle)).unwrap_or(0)
}

// ============================================================================
// Object Functions
// ============================================================================

/// # Safety
/// `instance` must be a live instance.
#[no_mangle]
pub unsafe extern "C" fn tether_object_create(instance: *const OpaqueInstance) -> *mut OpaqueHandle {
    match self::instance(instance) {
        Some(engine) => engine.create_object().into_raw(),
        None => ptr::null_mut(),
    }
}

/// `object[key]`; consumes `key`
///
/// # Safety
/// `instance` and `object` must be live; `key` must be a valid descriptor.
#[no_mangle]
pub unsafe extern "C" fn tether_object_get(
    instance: *const OpaqueInstance,
    object: *mut OpaqueHandle,
    key: ValueDesc,
) -> TryCatchDesc {
    let key = consume(key);
    let Some(engine) = self::instance(instance) else {
        return undefined_result();
    };
    with_handle(object, |handle| result_to_desc(engine.get(handle, key)))
        .unwrap_or_else(undefined_result)
}

/// `object[key] = value`; consumes `key` and `value`
///
/// # Safety
/// See `tether_object_get()`.
#[no_mangle]
pub unsafe extern "C" fn tether_object_set(
    instance: *const OpaqueInstance,
    object: *mut OpaqueHandle,
    key: ValueDesc,
    value: ValueDesc,
) -> TryCatchDesc {
    let key = consume(key);
    let value = consume(value);
    let Some(engine) = self::instance(instance) else {
        return undefined_result();
    };
    with_handle(object, |handle| result_to_desc(engine.set(handle, key, value)))
        .unwrap_or_else(undefined_result)
}

/// `delete object[key]`; consumes `key`
///
/// # Safety
/// See `tether_object_get()`.
#[no_mangle]
pub unsafe extern "C" fn tether_object_remove(
    instance: *const OpaqueInstance,
    object: *mut OpaqueHandle,
    key: ValueDesc,
) -> TryCatchDesc {
    let key = consume(key);
    let Some(engine) = self::instance(instance) else {
        return undefined_result();
    };
    with_handle(object, |handle| result_to_desc(engine.remove(handle, key)))
        .unwrap_or_else(undefined_result)
}

/// `key in object`; consumes `key`
///
/// # Safety
/// See `tether_object_get()`.
#[no_mangle]
pub unsafe extern "C" fn tether_object_has(
    instance: *const OpaqueInstance,
    object: *mut OpaqueHandle,
    key: ValueDesc,
) -> TryCatchDesc {
    let key = consume(key);
    let Some(engine) = self::instance(instance) else {
        return undefined_result();
    };
    with_handle(object, |handle| result_to_desc(engine.has(handle, key)))
        .unwrap_or_else(undefined_result)
}

/// Array of enumerable property names
///
/// Own names come first; with `include_inherited != 0` the prototype chain
/// follows. Enumeration errors yield an empty array.
///
/// # Safety
/// `instance` and `object` must be live.
#[no_mangle]
pub unsafe extern "C" fn tether_object_keys(
    instance: *const OpaqueInstance,
    object: *mut OpaqueHandle,
    include_inherited: u8,
) -> *mut OpaqueHandle {
    let Some(engine) = self::instance(instance) else {
        return ptr::null_mut();
    };
    with_handle(object, |handle| engine.keys(handle, include_inherited != 0).into_raw())
        .unwrap_or(ptr::null_mut())
}

/// `object[index]`
///
/// # Safety
/// `instance` and `object` must be live.
#[no_mangle]
pub unsafe extern "C" fn tether_object_get_index(
    instance: *const OpaqueInstance,
    object: *mut OpaqueHandle,
    index: u32,
) -> TryCatchDesc {
    let Some(engine) = self::instance(instance) else {
        return undefined_result();
    };
    with_handle(object, |handle| result_to_desc(engine.get_index(handle, index)))
        .unwrap_or_else(undefined_result)
}

/// `object[index] = value`; consumes `value`
///
/// # Safety
/// `instance` and `object` must be live; `value` must be a valid descriptor.
#[no_mangle]
pub unsafe extern "C" fn tether_object_set_index(
    instance: *const OpaqueInstance,
    object: *mut OpaqueHandle,
    index: u32,
    value: ValueDesc,
) -> TryCatchDesc {
    let value = consume(value);
    let Some(engine) = self::instance(instance) else {
        return undefined_result();
    };
    with_handle(object, |handle| result_to_desc(engine.set_index(handle, index, value)))
        .unwrap_or_else(undefined_result)
}

// ============================================================================
// Coercion Functions
// ============================================================================

/// `ToBoolean`; consumes `value`
///
/// # Safety
/// `instance` must be live; `value` must be a valid descriptor.
#[no_mangle]
pub unsafe extern "C" fn tether_coerce_boolean(instance: *const OpaqueInstance, value: ValueDesc) -> u8 {
    let value = consume(value);
    match self::instance(instance) {
        Some(engine) => u8::from(engine.to_boolean(value)),
        None => 0,
    }
}

/// `ToNumber`; consumes `value`
///
/// # Safety
/// See `tether_coerce_boolean()`.
#[no_mangle]
pub unsafe extern "C" fn tether_coerce_number(
    instance: *const OpaqueInstance,
    value: ValueDesc,
) -> TryCatchDesc {
    let value = consume(value);
    match self::instance(instance) {
        Some(engine) => result_to_desc(engine.to_number(value)),
        None => undefined_result(),
    }
}

/// `ToString`; consumes `value`
///
/// # Safety
/// See `tether_coerce_boolean()`.
#[no_mangle]
pub unsafe extern "C" fn tether_coerce_string(
    instance: *const OpaqueInstance,
    value: ValueDesc,
) -> TryCatchDesc {
    let value = consume(value);
    match self::instance(instance) {
        Some(engine) => result_to_desc(engine.to_string(value)),
        None => undefined_result(),
    }
}

// ============================================================================
// Function Functions
// ============================================================================

/// `function.call(this, ...args)`; consumes `this` and every argument
///
/// # Safety
/// - `instance` and `function` must be live
/// - `args` must point to `argc` valid descriptors (or be NULL when
///   `argc` is 0)
#[no_mangle]
pub unsafe extern "C" fn tether_function_call(
    instance: *const OpaqueInstance,
    function: *mut OpaqueHandle,
    this: ValueDesc,
    args: *const ValueDesc,
    argc: c_int,
) -> TryCatchDesc {
    let this = consume(this);
    let args: Vec<Value> = match usize::try_from(argc) {
        Ok(len) if len > 0 && !args.is_null() => slice::from_raw_parts(args, len)
            .iter()
            .map(|desc| consume(*desc))
            .collect(),
        _ => Vec::new(),
    };
    let Some(engine) = self::instance(instance) else {
        return undefined_result();
    };
    with_handle(function, |handle| result_to_desc(engine.call(handle, this, args)))
        .unwrap_or_else(undefined_result)
}

/// Expose a host callback to scripts as a function object
///
/// Calls go through the installed wrapper function with `callback` as its
/// context pointer. The drop function runs once for `callback` when the
/// function object is collected or the instance is dropped.
///
/// # Safety
/// - `instance` must be a live instance
/// - the lifecycle functions must be installed
#[no_mangle]
pub unsafe extern "C" fn tether_function_create(
    instance: *const OpaqueInstance,
    callback: *mut c_void,
) -> *mut OpaqueHandle {
    let Some(engine) = self::instance(instance) else {
        return ptr::null_mut();
    };
    let function = engine.register_callback(ForeignCallback { instance, callback });
    match function.into_handle() {
        Ok(handle) => handle.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Library version as a NUL-terminated string
///
/// The pointer is static; do not free it.
#[no_mangle]
pub extern "C" fn tether_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr().cast()
}
