//! String creation and UTF-8 extraction

use std::fmt;
use std::ops::Deref;

use boa_engine::{JsString, JsValue};

use crate::handle::Handle;
use crate::instance::Instance;
use crate::value::{Composite, CompositeKind, Value};

/// Owned UTF-8 copy of a script string
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Utf8Text {
    text: Box<str>,
}

impl Utf8Text {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_boxed_str(self) -> Box<str> {
        self.text
    }
}

impl Deref for Utf8Text {
    type Target = str;

    fn deref(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Utf8Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&JsString> for Utf8Text {
    /// Lone surrogates become U+FFFD.
    fn from(string: &JsString) -> Self {
        Self {
            text: String::from_utf16_lossy(string.as_slice()).into_boxed_str(),
        }
    }
}

impl Instance {
    /// New script string from UTF-8 bytes; invalid sequences become U+FFFD.
    pub fn create_string(&self, bytes: impl AsRef<[u8]>) -> Handle {
        let text = String::from_utf8_lossy(bytes.as_ref());
        Handle::new(self.ledger(), JsString::from(text.as_ref()).into())
    }

    /// [`create_string`](Self::create_string) as a `String` value
    pub fn string(&self, bytes: impl AsRef<[u8]>) -> Value {
        Value::Composite(Composite::new(CompositeKind::String, self.create_string(bytes)))
    }

    /// UTF-8 copy of a string. Other values go through `ToString`; if that
    /// throws, the text is empty.
    pub fn string_to_utf8(&self, value: &Handle) -> Utf8Text {
        if let JsValue::String(string) = value.js_value() {
            return Utf8Text::from(string);
        }
        self.with_context(|context| {
            value
                .js_value()
                .to_string(context)
                .map(|string| Utf8Text::from(&string))
                .unwrap_or_default()
        })
    }
}
