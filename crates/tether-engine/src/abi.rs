//! Boundary descriptor conversion
//!
//! Moves values between the core [`Value`] model and the `#[repr(C)]`
//! shapes of `tether-sdk`. Converting a composite value into a descriptor
//! hands its handle to the raw side; converting back reclaims it. Either way
//! the handle count is unchanged.

use std::os::raw::c_void;

use tether_sdk::{TryCatchDesc, Utf8Value, ValueDesc, ValuePayload, ValueTag};

use crate::error::EngineResult;
use crate::handle::Handle;
use crate::ops::Utf8Text;
use crate::result::ExceptionResult;
use crate::value::{Composite, CompositeKind, Value};

// ============================================================================
// Values
// ============================================================================

/// Convert a core value into a descriptor, transferring ownership of its
/// handle to the descriptor.
pub fn value_to_desc(value: Value) -> ValueDesc {
    match value {
        Value::Null => ValueDesc::null(),
        Value::Undefined => ValueDesc::undefined(),
        Value::Number(n) => ValueDesc::number(n),
        Value::Boolean(b) => ValueDesc::boolean(b),
        Value::Date(ms) => ValueDesc::date(ms),
        Value::Composite(composite) => {
            let tag = composite.kind().tag();
            ValueDesc {
                payload: ValuePayload {
                    handle: composite.into_handle().into_raw(),
                },
                tag: tag as u8,
            }
        }
    }
}

/// Reclaim a descriptor as a core value.
///
/// # Safety
/// For composite tags the handle must come from this crate and must not
/// have been reclaimed before.
pub unsafe fn try_desc_to_value(desc: ValueDesc) -> EngineResult<Value> {
    let tag = desc.tag()?;
    Ok(match tag {
        ValueTag::Null => Value::Null,
        ValueTag::Undefined => Value::Undefined,
        ValueTag::Number => Value::Number(desc.payload.number),
        ValueTag::Boolean => Value::Boolean(desc.payload.byte != 0),
        ValueTag::Date => Value::Date(desc.payload.number),
        ValueTag::Array | ValueTag::Function | ValueTag::Object | ValueTag::String => {
            let handle = desc.payload.handle;
            let kind = match CompositeKind::from_tag(tag) {
                Some(kind) if !handle.is_null() => kind,
                _ => return Ok(Value::Undefined),
            };
            Value::Composite(Composite::new(kind, Handle::from_raw(handle)))
        }
    })
}

/// Like [`try_desc_to_value`], but an unknown tag decodes as `Undefined`.
///
/// # Safety
/// See [`try_desc_to_value`].
pub unsafe fn desc_to_value(desc: ValueDesc) -> Value {
    try_desc_to_value(desc).unwrap_or_else(|err| {
        log::debug!("[tether] decoding malformed descriptor as undefined: {}", err);
        Value::Undefined
    })
}

// ============================================================================
// Results
// ============================================================================

pub fn result_to_desc(result: ExceptionResult) -> TryCatchDesc {
    let is_exception = result.is_exception;
    let value = value_to_desc(result.value);
    if is_exception {
        TryCatchDesc::exception(value)
    } else {
        TryCatchDesc::ok(value)
    }
}

/// # Safety
/// See [`try_desc_to_value`].
pub unsafe fn desc_to_result(desc: TryCatchDesc) -> ExceptionResult {
    let value = desc_to_value(desc.value);
    if desc.is_exception() {
        ExceptionResult::exception(value)
    } else {
        ExceptionResult::ok(value)
    }
}

// ============================================================================
// UTF-8 text
// ============================================================================

/// Hand a text buffer to the raw side. Release it with [`drop_utf8_value`].
///
/// The reported length is capped at `i32::MAX` bytes.
pub fn text_to_utf8_value(text: Utf8Text) -> Utf8Value {
    let backing: Box<Box<str>> = Box::new(text.into_boxed_str());
    let data = backing.as_ptr();
    let length = utf8_length(backing.len());
    Utf8Value {
        data,
        length,
        backing: Box::into_raw(backing).cast::<c_void>(),
    }
}

fn utf8_length(len: usize) -> i32 {
    i32::try_from(len).unwrap_or_else(|_| {
        log::warn!("[tether] UTF-8 text of {} bytes truncated to {} in Utf8Value", len, i32::MAX);
        i32::MAX
    })
}

/// # Safety
/// `value.backing` must come from [`text_to_utf8_value`] and must not have
/// been released before.
pub unsafe fn drop_utf8_value(value: Utf8Value) {
    if !value.backing.is_null() {
        drop(Box::from_raw(value.backing.cast::<Box<str>>()));
    }
}
