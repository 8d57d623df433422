//! Function calls and host callback registration

use std::rc::Rc;

use boa_engine::{JsNativeError, JsValue};

use crate::callback::{CallbackTable, NativeCallback};
use crate::codec;
use crate::handle::Handle;
use crate::instance::Instance;
use crate::result::ExceptionResult;
use crate::value::{Composite, CompositeKind, Value};

impl Instance {
    /// `function.call(this, ...args)`
    pub fn call(&self, function: &Handle, this: Value, args: Vec<Value>) -> ExceptionResult {
        self.try_catch(|context| {
            let this = codec::decode(this, context);
            let args: Vec<JsValue> = args
                .into_iter()
                .map(|arg| codec::decode(arg, context))
                .collect();

            let Some(function) = function.as_object().filter(|object| object.is_callable()) else {
                return Err(JsNativeError::typ()
                    .with_message("value is not a function")
                    .into());
            };
            function.call(&this, &args, context).map(Some)
        })
    }

    /// Exposes `callback` to scripts as a function object.
    ///
    /// The returned `Function` value is a strong, owning handle. The
    /// callback is dropped once the function object is collected, or at
    /// teardown at the latest.
    pub fn register_callback<C: NativeCallback>(&self, callback: C) -> Value {
        let callback: Rc<dyn NativeCallback> = Rc::new(callback);
        self.with_context(|context| {
            let function = CallbackTable::register(self.callbacks(), self.weak(), callback, context);
            let handle = Handle::new(self.ledger(), function.into());
            Value::Composite(Composite::new(CompositeKind::Function, handle))
        })
    }
}
