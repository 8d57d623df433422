//! Host-side error types
//!
//! Script exceptions never show up here: they travel as
//! [`ExceptionResult`](crate::ExceptionResult) values. `EngineError` covers
//! what goes wrong on the host side of the boundary, such as reading a
//! `Value` as the wrong kind or receiving a malformed descriptor.

use tether_sdk::{AbiError, ValueTag};

use crate::instance::Instance;
use crate::value::Value;

/// Result type for host-side conversions
pub type EngineResult<T> = Result<T, EngineError>;

/// Host-side error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// A script value could not be read as the requested host type
    #[error("error converting JavaScript {from} to {to}")]
    FromJs {
        /// Kind of the script value
        from: &'static str,
        /// Requested host type
        to: &'static str,
    },

    /// An inline value was asked for its handle
    #[error("value of kind {0} does not carry a handle")]
    NotComposite(ValueTag),

    /// A boundary descriptor was malformed
    #[error(transparent)]
    Abi(#[from] AbiError),

    /// Error raised by host code, e.g. from inside a callback
    #[error("{0}")]
    External(String),
}

impl EngineError {
    pub(crate) fn from_js(from: &'static str, to: &'static str) -> Self {
        EngineError::FromJs { from, to }
    }

    /// Whether this error describes a failed value conversion
    pub fn is_conversion(&self) -> bool {
        matches!(self, EngineError::FromJs { .. } | EngineError::NotComposite(_))
    }

    /// Normalizes the error into a script `Error` object owned by `instance`.
    ///
    /// Conversion failures become a `TypeError`, everything else a plain
    /// `Error`. Callbacks use this to fail with a host error.
    pub fn to_exception(&self, instance: &Instance) -> Value {
        instance.error_value(self.is_conversion(), &self.to_string())
    }
}

impl From<String> for EngineError {
    fn from(s: String) -> Self {
        EngineError::External(s)
    }
}

impl From<&str> for EngineError {
    fn from(s: &str) -> Self {
        EngineError::External(s.to_string())
    }
}
