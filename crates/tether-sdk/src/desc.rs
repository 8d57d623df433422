//! Tagged value descriptors
//!
//! # Layout
//!
//! ```text
//! ValueDesc    { tag: u8, payload: union { byte: u8, number: f64, handle: *mut OpaqueHandle } }
//! TryCatchDesc { value: ValueDesc, is_exception: u8 }
//! Utf8Value    { data: *const u8, length: i32, backing: *mut c_void }
//! ```
//!
//! Tag numbers are published and must stay fixed:
//!
//! | tag | kind      | payload  | owning |
//! |-----|-----------|----------|--------|
//! | 0   | Null      | -        | no     |
//! | 1   | Undefined | -        | no     |
//! | 2   | Number    | `number` | no     |
//! | 3   | Boolean   | `byte`   | no     |
//! | 4   | Array     | `handle` | yes    |
//! | 5   | Function  | `handle` | yes    |
//! | 6   | Date      | `number` | no     |
//! | 7   | Object    | `handle` | yes    |
//! | 8   | String    | `handle` | yes    |

use std::fmt;
use std::os::raw::c_void;
use std::ptr;

use crate::error::{AbiError, AbiResult};

// ============================================================================
// Opaque Types
// ============================================================================

/// Opaque target of an owning engine-heap handle
#[repr(C)]
pub struct OpaqueHandle {
    _private: [u8; 0],
}

/// Opaque target of an engine instance pointer
#[repr(C)]
pub struct OpaqueInstance {
    _private: [u8; 0],
}

// ============================================================================
// ValueTag
// ============================================================================

/// Kind of a value crossing the boundary
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTag {
    /// `null`
    Null = 0,
    /// `undefined`
    Undefined = 1,
    /// Any number, integers included
    Number = 2,
    /// `true` / `false`
    Boolean = 3,
    /// Array object (owning)
    Array = 4,
    /// Callable object (owning)
    Function = 5,
    /// Date, as epoch milliseconds
    Date = 6,
    /// Any other object (owning)
    Object = 7,
    /// String (owning)
    String = 8,
}

impl ValueTag {
    /// Whether descriptors with this tag carry an owning handle
    pub const fn is_owning(self) -> bool {
        matches!(
            self,
            ValueTag::Array | ValueTag::Function | ValueTag::Object | ValueTag::String
        )
    }

    /// Human-readable kind name
    pub const fn name(self) -> &'static str {
        match self {
            ValueTag::Null => "null",
            ValueTag::Undefined => "undefined",
            ValueTag::Number => "number",
            ValueTag::Boolean => "boolean",
            ValueTag::Array => "array",
            ValueTag::Function => "function",
            ValueTag::Date => "date",
            ValueTag::Object => "object",
            ValueTag::String => "string",
        }
    }
}

impl TryFrom<u8> for ValueTag {
    type Error = AbiError;

    fn try_from(tag: u8) -> AbiResult<Self> {
        Ok(match tag {
            0 => ValueTag::Null,
            1 => ValueTag::Undefined,
            2 => ValueTag::Number,
            3 => ValueTag::Boolean,
            4 => ValueTag::Array,
            5 => ValueTag::Function,
            6 => ValueTag::Date,
            7 => ValueTag::Object,
            8 => ValueTag::String,
            other => return Err(AbiError::UnknownTag(other)),
        })
    }
}

impl fmt::Display for ValueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// ValueDesc
// ============================================================================

/// Payload of a [`ValueDesc`]; which field is live depends on the tag
#[repr(C)]
#[derive(Clone, Copy)]
pub union ValuePayload {
    /// Boolean payload (0 or 1)
    pub byte: u8,
    /// Number and Date payload
    pub number: f64,
    /// Owning handle for composite tags
    pub handle: *mut OpaqueHandle,
}

/// A tagged value crossing the boundary
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ValueDesc {
    /// One of the [`ValueTag`] discriminants
    pub tag: u8,
    /// Tag-dependent payload
    pub payload: ValuePayload,
}

impl ValueDesc {
    /// `null`
    pub const fn null() -> Self {
        Self {
            payload: ValuePayload { byte: 0 },
            tag: ValueTag::Null as u8,
        }
    }

    /// `undefined`
    pub const fn undefined() -> Self {
        Self {
            payload: ValuePayload { byte: 0 },
            tag: ValueTag::Undefined as u8,
        }
    }

    /// Number
    pub const fn number(n: f64) -> Self {
        Self {
            payload: ValuePayload { number: n },
            tag: ValueTag::Number as u8,
        }
    }

    /// Boolean
    pub const fn boolean(b: bool) -> Self {
        Self {
            payload: ValuePayload { byte: b as u8 },
            tag: ValueTag::Boolean as u8,
        }
    }

    /// Date from epoch milliseconds
    pub const fn date(ms: f64) -> Self {
        Self {
            payload: ValuePayload { number: ms },
            tag: ValueTag::Date as u8,
        }
    }

    /// Owning descriptor around `handle`
    pub fn composite(tag: ValueTag, handle: *mut OpaqueHandle) -> AbiResult<Self> {
        if !tag.is_owning() {
            return Err(AbiError::NotOwning(tag.name()));
        }
        if handle.is_null() {
            return Err(AbiError::NullHandle(tag.name()));
        }
        Ok(Self {
            payload: ValuePayload { handle },
            tag: tag as u8,
        })
    }

    /// Decoded tag
    pub fn tag(&self) -> AbiResult<ValueTag> {
        ValueTag::try_from(self.tag)
    }

    /// Number or Date payload
    pub fn as_number(&self) -> Option<f64> {
        match self.tag() {
            // SAFETY: Number and Date descriptors always carry `number`.
            Ok(ValueTag::Number | ValueTag::Date) => Some(unsafe { self.payload.number }),
            _ => None,
        }
    }

    /// Boolean payload
    pub fn as_boolean(&self) -> Option<bool> {
        match self.tag() {
            // SAFETY: Boolean descriptors always carry `byte`.
            Ok(ValueTag::Boolean) => Some(unsafe { self.payload.byte } != 0),
            _ => None,
        }
    }

    /// Owning handle, for composite tags
    pub fn handle(&self) -> Option<*mut OpaqueHandle> {
        match self.tag() {
            // SAFETY: owning descriptors always carry `handle`.
            Ok(tag) if tag.is_owning() => Some(unsafe { self.payload.handle }),
            _ => None,
        }
    }
}

impl Default for ValueDesc {
    fn default() -> Self {
        Self::undefined()
    }
}

impl fmt::Debug for ValueDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag() {
            Ok(ValueTag::Null) => write!(f, "ValueDesc(null)"),
            Ok(ValueTag::Undefined) => write!(f, "ValueDesc(undefined)"),
            Ok(ValueTag::Boolean) => write!(f, "ValueDesc({:?})", self.as_boolean()),
            Ok(tag @ (ValueTag::Number | ValueTag::Date)) => {
                write!(f, "ValueDesc({}: {:?})", tag, self.as_number())
            }
            Ok(tag) => write!(f, "ValueDesc({}: {:p})", tag, self.handle().unwrap_or(ptr::null_mut())),
            Err(_) => write!(f, "ValueDesc(<tag {}>)", self.tag),
        }
    }
}

// ============================================================================
// TryCatchDesc
// ============================================================================

/// Success/exception envelope for operations that can throw
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TryCatchDesc {
    /// Result value, or the thrown value when `is_exception != 0`
    pub value: ValueDesc,
    /// Non-zero when `value` was thrown
    pub is_exception: u8,
}

impl TryCatchDesc {
    /// Successful completion carrying `value`
    pub const fn ok(value: ValueDesc) -> Self {
        Self {
            value,
            is_exception: 0,
        }
    }

    /// Successful completion without a value
    pub const fn ok_empty() -> Self {
        Self::ok(ValueDesc::undefined())
    }

    /// Exception carrying the thrown value
    pub const fn exception(value: ValueDesc) -> Self {
        Self {
            value,
            is_exception: 1,
        }
    }

    /// Whether the envelope holds a thrown value
    pub const fn is_exception(&self) -> bool {
        self.is_exception != 0
    }
}

// ============================================================================
// Utf8Value
// ============================================================================

/// Borrowed UTF-8 view plus the owning buffer behind it
///
/// The view is valid until `backing` is released; release it exactly once.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Utf8Value {
    /// First byte of the text
    pub data: *const u8,
    /// Byte length of the text
    pub length: i32,
    /// Opaque owner of `data`
    pub backing: *mut c_void,
}

impl Utf8Value {
    /// An empty view with no backing buffer
    pub const fn empty() -> Self {
        Self {
            data: ptr::null(),
            length: 0,
            backing: ptr::null_mut(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_published_layout() {
        use std::mem::{offset_of, size_of};

        assert_eq!(offset_of!(ValueDesc, tag), 0);
        assert_eq!(offset_of!(ValueDesc, payload), 8);
        assert_eq!(size_of::<ValueDesc>(), 16);
        assert_eq!(offset_of!(TryCatchDesc, value), 0);
        assert_eq!(offset_of!(TryCatchDesc, is_exception), 16);
    }

    #[test]
    fn test_published_tag_numbers() {
        assert_eq!(ValueTag::Null as u8, 0);
        assert_eq!(ValueTag::Undefined as u8, 1);
        assert_eq!(ValueTag::Number as u8, 2);
        assert_eq!(ValueTag::Boolean as u8, 3);
        assert_eq!(ValueTag::Array as u8, 4);
        assert_eq!(ValueTag::Function as u8, 5);
        assert_eq!(ValueTag::Date as u8, 6);
        assert_eq!(ValueTag::Object as u8, 7);
        assert_eq!(ValueTag::String as u8, 8);
    }

    #[test]
    fn test_tag_from_u8() {
        for raw in 0..=8u8 {
            assert_eq!(ValueTag::try_from(raw).unwrap() as u8, raw);
        }
        assert_eq!(ValueTag::try_from(9), Err(AbiError::UnknownTag(9)));
    }

    #[test]
    fn test_owning_tags() {
        assert!(ValueTag::Array.is_owning());
        assert!(ValueTag::Function.is_owning());
        assert!(ValueTag::Object.is_owning());
        assert!(ValueTag::String.is_owning());
        assert!(!ValueTag::Date.is_owning());
        assert!(!ValueTag::Number.is_owning());
    }

    #[test]
    fn test_inline_payloads() {
        assert_eq!(ValueDesc::number(3.5).as_number(), Some(3.5));
        assert_eq!(ValueDesc::date(1_000.0).as_number(), Some(1_000.0));
        assert_eq!(ValueDesc::boolean(true).as_boolean(), Some(true));
        assert_eq!(ValueDesc::boolean(false).as_boolean(), Some(false));
        assert_eq!(ValueDesc::null().as_number(), None);
        assert!(ValueDesc::undefined().handle().is_none());
    }

    #[test]
    fn test_composite_rejects_bad_input() {
        let fake = 0x10 as *mut OpaqueHandle;
        assert!(ValueDesc::composite(ValueTag::Object, fake).is_ok());
        assert_eq!(
            ValueDesc::composite(ValueTag::Number, fake).unwrap_err(),
            AbiError::NotOwning("number")
        );
        assert_eq!(
            ValueDesc::composite(ValueTag::String, ptr::null_mut()).unwrap_err(),
            AbiError::NullHandle("string")
        );
    }

    #[test]
    fn test_try_catch_flags() {
        assert!(!TryCatchDesc::ok_empty().is_exception());
        assert!(TryCatchDesc::exception(ValueDesc::number(42.0)).is_exception());
        assert_eq!(TryCatchDesc::ok_empty().value.tag, ValueTag::Undefined as u8);
    }
}
