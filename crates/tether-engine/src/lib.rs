//! Tether Engine
//!
//! Boundary layer between a host program and an embedded, garbage-collected
//! script engine (boa):
//! - **Values**: the tagged [`Value`] model and its codec (`value`, `codec`)
//! - **Handles**: opaque owning references to heap values (`handle`)
//! - **Instances**: engine lifecycle, evaluation and teardown (`instance`)
//! - **Callbacks**: host functions exposed to scripts, finalized in step
//!   with the collector (`callback`)
//! - **Operations**: properties, collections, strings, coercions and calls
//!   (`ops`)
//! - **ABI**: conversion to and from the `#[repr(C)]` shapes (`abi`)
//!
//! # Example
//!
//! ```rust,ignore
//! use tether_engine::{Engine, ExceptionResult, Instance, Value};
//!
//! let engine = Engine::new();
//! let add = engine.register_callback(|_: &Instance, _this: Value, args: Vec<Value>| {
//!     let sum: f64 = args.iter().filter_map(|arg| arg.as_number().ok()).sum();
//!     ExceptionResult::ok(Value::Number(sum))
//! });
//!
//! let global = engine.global();
//! let _ = engine.set(&global, engine.string("add"), add);
//! let result = engine.eval("add(1, 2)").into_result().unwrap();
//! assert_eq!(result.as_number().unwrap(), 3.0);
//! ```

#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Boundary value model
pub mod value;

/// Opaque owning handles and their accounting
pub mod handle;

/// Value encoding and decoding against the engine
pub mod codec;

/// Success/exception envelope
pub mod result;

/// Error types
pub mod error;

// ============================================================================
// Runtime
// ============================================================================

/// Process-wide bootstrap
pub mod platform;

/// Per-instance runtime limits
pub mod options;

/// Engine instance lifecycle
pub mod instance;

/// Host callback bridge
pub mod callback;

/// Property, collection, string, coercion and call operations
pub mod ops;

/// Conversion to the C boundary shapes
pub mod abi;

mod external;

// ============================================================================
// Re-exports
// ============================================================================

pub use callback::{NativeCallback, NATIVE_CALLBACK_CLASS_ID};
pub use error::{EngineError, EngineResult};
pub use handle::{Handle, HandleStats};
pub use instance::{Engine, Instance};
pub use ops::Utf8Text;
pub use options::EngineOptions;
pub use platform::{bootstrap_count, platform, VERSION};
pub use result::ExceptionResult;
pub use value::{Composite, CompositeKind, Value, ValueTag};
