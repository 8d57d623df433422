//! Tether SDK - ABI-stable shapes for the host/engine boundary
//!
//! This crate holds the `#[repr(C)]` types that cross the boundary between
//! a host and an embedded script engine, without depending on the engine
//! itself:
//!
//! - [`ValueDesc`]: a tagged value whose numeric tags never change
//! - [`TryCatchDesc`]: the success/exception envelope
//! - [`Utf8Value`]: a borrowed UTF-8 view plus its owning backing buffer
//! - [`OpaqueHandle`] / [`OpaqueInstance`]: pointer targets the host never
//!   dereferences
//! - [`CallbackWrapperFn`] / [`CallbackDropFn`]: the host callback lifecycle
//!
//! # Ownership
//!
//! Descriptors tagged `Array`, `Function`, `Object` or `String` carry an
//! owning handle. Whoever receives one must release it exactly once, either
//! by handing it back to an operation that consumes it or by dropping it.

#![warn(missing_docs)]

pub mod callback;
pub mod desc;
pub mod error;

pub use callback::{CallbackDropFn, CallbackWrapperFn};
pub use desc::{OpaqueHandle, OpaqueInstance, TryCatchDesc, Utf8Value, ValueDesc, ValuePayload, ValueTag};
pub use error::{AbiError, AbiResult};
