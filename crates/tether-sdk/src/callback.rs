//! Host callback lifecycle function types
//!
//! A host installs one wrapper and one drop function per process. The
//! wrapper runs every time a script calls a host-backed function; the drop
//! function runs exactly once per registration, when the engine reclaims
//! the function object or when its instance is torn down.

use std::os::raw::{c_int, c_void};

use crate::desc::{OpaqueInstance, TryCatchDesc, ValueDesc};

/// Dispatches a script call into host code.
///
/// `this` and every element of `args` are owned by the callee: composite
/// descriptors must be released (or handed back) exactly once. The returned
/// descriptor is consumed by the engine.
pub type CallbackWrapperFn = unsafe extern "C" fn(
    instance: *const OpaqueInstance,
    callback: *mut c_void,
    this: ValueDesc,
    args: *const ValueDesc,
    argc: c_int,
) -> TryCatchDesc;

/// Releases the host resource behind a callback registration.
pub type CallbackDropFn = unsafe extern "C" fn(callback: *mut c_void);
