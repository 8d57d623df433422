//! Coercion operations

use boa_engine::JsValue;

use crate::codec;
use crate::instance::Instance;
use crate::result::ExceptionResult;
use crate::value::Value;

impl Instance {
    /// `ToBoolean`; never throws
    pub fn to_boolean(&self, value: Value) -> bool {
        self.with_context(|context| codec::decode(value, context).to_boolean())
    }

    /// `ToNumber`; throws for symbols and for objects whose `valueOf` throws
    pub fn to_number(&self, value: Value) -> ExceptionResult {
        self.try_catch(|context| {
            let value = codec::decode(value, context);
            value
                .to_number(context)
                .map(|number| Some(JsValue::from(number)))
        })
    }

    /// `ToString`; a success carries an owning `String` value
    pub fn to_string(&self, value: Value) -> ExceptionResult {
        self.try_catch(|context| {
            let value = codec::decode(value, context);
            value
                .to_string(context)
                .map(|string| Some(JsValue::from(string)))
        })
    }
}
