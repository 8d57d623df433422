//! Value codec
//!
//! Converts between boa's `JsValue` and the boundary [`Value`].
//!
//! `encode` classifies in a fixed priority order: null, undefined, true,
//! false, int32, number, date, then string, array, function and plain
//! object. Anything else (symbols, bigints) degrades to `Undefined`.
//! Composite results get a fresh handle that the caller now owns.
//!
//! `decode` is the inverse and consumes the value's handle.

use std::rc::Rc;

use boa_engine::object::builtins::JsDate;
use boa_engine::{Context, JsValue};

use crate::handle::{Handle, HandleLedger};
use crate::value::{Composite, CompositeKind, Value};

/// Convert an engine value into a boundary value.
pub fn encode(ledger: &Rc<HandleLedger>, value: &JsValue, context: &mut Context) -> Value {
    let kind = match value {
        JsValue::Null => return Value::Null,
        JsValue::Undefined => return Value::Undefined,
        JsValue::Boolean(b) => return Value::Boolean(*b),
        JsValue::Integer(i) => return Value::Number(f64::from(*i)),
        JsValue::Rational(n) => return Value::Number(*n),
        JsValue::String(_) => CompositeKind::String,
        JsValue::Object(object) => {
            if let Ok(date) = JsDate::from_object(object.clone()) {
                return Value::Date(date_time(&date, context));
            }
            if object.is_array() {
                CompositeKind::Array
            } else if object.is_callable() {
                CompositeKind::Function
            } else {
                CompositeKind::Object
            }
        }
        JsValue::BigInt(_) | JsValue::Symbol(_) => return Value::Undefined,
    };
    Value::Composite(Composite::new(kind, Handle::new(ledger, value.clone())))
}

/// Convert a boundary value into an engine value, releasing its handle.
pub fn decode(value: Value, context: &mut Context) -> JsValue {
    match value {
        Value::Null => JsValue::null(),
        Value::Undefined => JsValue::undefined(),
        Value::Number(n) => JsValue::from(n),
        Value::Boolean(b) => JsValue::from(b),
        Value::Date(ms) => {
            let date = JsDate::new(context);
            // setTime on a fresh Date only applies TimeClip; it cannot throw for a number.
            let _ = date.set_time(ms, context);
            date.into()
        }
        Value::Composite(composite) => composite.into_handle().into_js_value(),
    }
}

fn date_time(date: &JsDate, context: &mut Context) -> f64 {
    date.get_time(context)
        .ok()
        .and_then(|time| time.as_number())
        .unwrap_or(f64::NAN)
}
