//! Operation surface
//!
//! Each submodule adds an `impl Instance` block. Operations that can throw
//! return an [`ExceptionResult`](crate::ExceptionResult). Keys and values
//! passed in as [`Value`](crate::Value) are consumed, so their handles are
//! released even when the operation throws.

mod coerce;
mod function;
mod object;
mod string;

pub use string::Utf8Text;
