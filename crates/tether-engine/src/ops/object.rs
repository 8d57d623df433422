//! Property and collection operations

use boa_engine::builtins::object::OrdinaryObject;
use boa_engine::object::builtins::JsArray;
use boa_engine::{Context, JsObject, JsResult, JsString, JsValue};
use rustc_hash::FxHashSet;

use crate::codec;
use crate::handle::Handle;
use crate::instance::Instance;
use crate::result::ExceptionResult;
use crate::value::Value;

impl Instance {
    /// New empty object
    pub fn create_object(&self) -> Handle {
        self.with_context(|context| {
            let object = JsObject::with_object_proto(context.intrinsics());
            Handle::new(self.ledger(), object.into())
        })
    }

    /// New empty array
    pub fn create_array(&self) -> Handle {
        self.with_context(|context| Handle::new(self.ledger(), JsArray::new(context).into()))
    }

    /// `object[key]`
    pub fn get(&self, object: &Handle, key: Value) -> ExceptionResult {
        self.try_catch(|context| {
            let key = codec::decode(key, context).to_property_key(context)?;
            let object = object.js_value().to_object(context)?;
            object.get(key, context).map(Some)
        })
    }

    /// `object[key] = value`, with sloppy-mode semantics: a write to a
    /// read-only property is ignored rather than thrown.
    pub fn set(&self, object: &Handle, key: Value, value: Value) -> ExceptionResult {
        self.try_catch(|context| {
            let key = codec::decode(key, context);
            let value = codec::decode(value, context);
            let key = key.to_property_key(context)?;
            let object = object.js_value().to_object(context)?;
            object.set(key, value, false, context)?;
            Ok(None)
        })
    }

    /// `delete object[key]`, reported as a `Boolean`.
    ///
    /// Deleting a non-configurable property throws a `TypeError`.
    pub fn remove(&self, object: &Handle, key: Value) -> ExceptionResult {
        self.try_catch(|context| {
            let key = codec::decode(key, context).to_property_key(context)?;
            let object = object.js_value().to_object(context)?;
            object
                .delete_property_or_throw(key, context)
                .map(|deleted| Some(deleted.into()))
        })
    }

    /// `key in object`, reported as a `Boolean`. Walks the prototype chain.
    pub fn has(&self, object: &Handle, key: Value) -> ExceptionResult {
        self.try_catch(|context| {
            let key = codec::decode(key, context).to_property_key(context)?;
            let object = object.js_value().to_object(context)?;
            object.has_property(key, context).map(|found| Some(found.into()))
        })
    }

    /// `object[index]`
    pub fn get_index(&self, object: &Handle, index: u32) -> ExceptionResult {
        self.try_catch(|context| {
            let object = object.js_value().to_object(context)?;
            object.get(index, context).map(Some)
        })
    }

    /// `object[index] = value`
    pub fn set_index(&self, object: &Handle, index: u32, value: Value) -> ExceptionResult {
        self.try_catch(|context| {
            let value = codec::decode(value, context);
            let object = object.js_value().to_object(context)?;
            object.set(index, value, false, context)?;
            Ok(None)
        })
    }

    /// Array of property names.
    ///
    /// Own enumerable string keys come first; with `include_inherited` the
    /// prototype chain follows, each name kept at its first occurrence.
    /// If enumeration throws, the exception is dropped and an empty array
    /// is returned.
    pub fn keys(&self, object: &Handle, include_inherited: bool) -> Handle {
        self.with_context(|context| {
            let names = collect_keys(object.js_value(), include_inherited, context)
                .unwrap_or_else(|error| {
                    log::debug!("[tether] keys(): enumeration threw, returning empty: {}", error);
                    Vec::new()
                });
            let array = JsArray::from_iter(names.into_iter().map(JsValue::from), context);
            Handle::new(self.ledger(), array.into())
        })
    }

    /// Length of an array; 0 for anything that is not one.
    pub fn array_length(&self, array: &Handle) -> u32 {
        let Some(array) = array
            .as_object()
            .and_then(|object| JsArray::from_object(object.clone()).ok())
        else {
            return 0;
        };
        self.with_context(|context| {
            array
                .length(context)
                .map(|length| u32::try_from(length).unwrap_or(u32::MAX))
                .unwrap_or(0)
        })
    }
}

/// for-in style enumeration: a name seen at a nearer level, enumerable or
/// not, hides the same name further up the chain.
fn collect_keys(
    value: &JsValue,
    include_inherited: bool,
    context: &mut Context,
) -> JsResult<Vec<JsString>> {
    let mut names = Vec::new();
    let mut seen = FxHashSet::default();
    let mut current = Some(value.to_object(context)?);

    while let Some(object) = current {
        let target = [JsValue::from(object.clone())];
        let enumerable = OrdinaryObject::keys(&JsValue::undefined(), &target, context)?;
        for name in string_list(&enumerable, context)? {
            if !seen.contains(&name) {
                names.push(name);
            }
        }

        if !include_inherited {
            break;
        }
        let all = OrdinaryObject::get_own_property_names(&JsValue::undefined(), &target, context)?;
        seen.extend(string_list(&all, context)?);
        current = object.prototype();
    }

    Ok(names)
}

fn string_list(array: &JsValue, context: &mut Context) -> JsResult<Vec<JsString>> {
    let Some(array) = array.as_object() else {
        return Ok(Vec::new());
    };
    let array = JsArray::from_object(array.clone())?;
    let length = array.length(context)?;
    let mut strings = Vec::new();
    for index in 0..length {
        if let Some(name) = array.get(index, context)?.as_string() {
            strings.push(name.clone());
        }
    }
    Ok(strings)
}
