//! Success/exception envelope

use crate::value::Value;

/// Outcome of an operation that can throw
///
/// When `is_exception` is set, `value` is the thrown value, which may be any
/// kind of [`Value`] including an owning composite.
#[derive(Debug, Clone)]
#[must_use]
pub struct ExceptionResult {
    pub value: Value,
    pub is_exception: bool,
}

impl ExceptionResult {
    pub fn ok(value: Value) -> Self {
        Self {
            value,
            is_exception: false,
        }
    }

    /// Success marker for operations without a result
    pub fn ok_empty() -> Self {
        Self::ok(Value::Undefined)
    }

    pub fn exception(value: Value) -> Self {
        Self {
            value,
            is_exception: true,
        }
    }

    pub fn is_ok(&self) -> bool {
        !self.is_exception
    }

    pub fn is_exception(&self) -> bool {
        self.is_exception
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// `Ok(value)` on success, `Err(thrown)` on exception
    pub fn into_result(self) -> Result<Value, Value> {
        if self.is_exception {
            Err(self.value)
        } else {
            Ok(self.value)
        }
    }
}

impl From<Result<Value, Value>> for ExceptionResult {
    fn from(result: Result<Value, Value>) -> Self {
        match result {
            Ok(value) => ExceptionResult::ok(value),
            Err(thrown) => ExceptionResult::exception(thrown),
        }
    }
}
