//! Boundary value model
//!
//! Primitives travel inline. Everything that lives on the engine heap
//! (arrays, functions, plain objects and strings) travels as a
//! [`Composite`]: one owning [`Handle`] plus a kind, so the handle
//! lifetime rules are written once instead of four times.

use std::fmt;

pub use tether_sdk::ValueTag;

use crate::error::{EngineError, EngineResult};
use crate::handle::Handle;

/// Kind of a heap-resident value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositeKind {
    Array,
    Function,
    Object,
    String,
}

impl CompositeKind {
    pub const fn tag(self) -> ValueTag {
        match self {
            CompositeKind::Array => ValueTag::Array,
            CompositeKind::Function => ValueTag::Function,
            CompositeKind::Object => ValueTag::Object,
            CompositeKind::String => ValueTag::String,
        }
    }

    pub const fn from_tag(tag: ValueTag) -> Option<Self> {
        match tag {
            ValueTag::Array => Some(CompositeKind::Array),
            ValueTag::Function => Some(CompositeKind::Function),
            ValueTag::Object => Some(CompositeKind::Object),
            ValueTag::String => Some(CompositeKind::String),
            _ => None,
        }
    }
}

/// A heap value together with the handle that keeps it referenced
#[derive(Debug, Clone)]
pub struct Composite {
    kind: CompositeKind,
    handle: Handle,
}

impl Composite {
    pub fn new(kind: CompositeKind, handle: Handle) -> Self {
        Self { kind, handle }
    }

    pub fn kind(&self) -> CompositeKind {
        self.kind
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn into_handle(self) -> Handle {
        self.handle
    }
}

/// A value crossing the boundary
///
/// Cloning a `Composite` value clones its handle; dropping it releases the
/// handle.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Undefined,
    Number(f64),
    Boolean(bool),
    /// Epoch milliseconds
    Date(f64),
    Composite(Composite),
}

impl Value {
    pub fn tag(&self) -> ValueTag {
        match self {
            Value::Null => ValueTag::Null,
            Value::Undefined => ValueTag::Undefined,
            Value::Number(_) => ValueTag::Number,
            Value::Boolean(_) => ValueTag::Boolean,
            Value::Date(_) => ValueTag::Date,
            Value::Composite(composite) => composite.kind.tag(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.tag().name()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Composite(_))
    }

    pub fn kind(&self) -> Option<CompositeKind> {
        match self {
            Value::Composite(composite) => Some(composite.kind),
            _ => None,
        }
    }

    pub fn is_kind(&self, kind: CompositeKind) -> bool {
        self.kind() == Some(kind)
    }

    pub fn as_number(&self) -> EngineResult<f64> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(EngineError::from_js(other.type_name(), "f64")),
        }
    }

    pub fn as_boolean(&self) -> EngineResult<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            other => Err(EngineError::from_js(other.type_name(), "bool")),
        }
    }

    /// Epoch milliseconds of a `Date`
    pub fn as_date(&self) -> EngineResult<f64> {
        match self {
            Value::Date(ms) => Ok(*ms),
            other => Err(EngineError::from_js(other.type_name(), "date")),
        }
    }

    pub fn handle(&self) -> Option<&Handle> {
        match self {
            Value::Composite(composite) => Some(&composite.handle),
            _ => None,
        }
    }

    pub fn into_handle(self) -> EngineResult<Handle> {
        match self {
            Value::Composite(composite) => Ok(composite.handle),
            other => Err(EngineError::NotComposite(other.tag())),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Composite> for Value {
    fn from(composite: Composite) -> Self {
        Value::Composite(composite)
    }
}

impl TryFrom<Value> for f64 {
    type Error = EngineError;

    fn try_from(value: Value) -> EngineResult<Self> {
        value.as_number()
    }
}

impl TryFrom<Value> for bool {
    type Error = EngineError;

    fn try_from(value: Value) -> EngineResult<Self> {
        value.as_boolean()
    }
}

impl TryFrom<Value> for Handle {
    type Error = EngineError;

    fn try_from(value: Value) -> EngineResult<Self> {
        value.into_handle()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Undefined => write!(f, "undefined"),
            Value::Number(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Date(ms) => write!(f, "Date({})", ms),
            Value::Composite(composite) => write!(f, "<{}>", composite.kind.tag()),
        }
    }
}
