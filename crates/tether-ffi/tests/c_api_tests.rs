use std::os::raw::{c_int, c_void};
use std::ptr;
use std::slice;
use std::sync::atomic::{AtomicU32, Ordering};

use tether_ffi::*;
use tether_sdk::{OpaqueInstance, TryCatchDesc, ValueDesc, ValueTag};

/// Per-test callback state; the callback pointer points at one of these
#[derive(Default)]
struct Counters {
    calls: AtomicU32,
    drops: AtomicU32,
}

impl Counters {
    fn as_callback(&self) -> *mut c_void {
        self as *const Counters as *mut c_void
    }
}

/// Sums numeric arguments and releases everything it was handed.
unsafe extern "C" fn sum_wrapper(
    _instance: *const OpaqueInstance,
    callback: *mut c_void,
    this: ValueDesc,
    args: *const ValueDesc,
    argc: c_int,
) -> TryCatchDesc {
    let counters = &*(callback as *const Counters);
    counters.calls.fetch_add(1, Ordering::SeqCst);

    release(this);
    let args = if argc > 0 {
        slice::from_raw_parts(args, argc as usize)
    } else {
        &[]
    };
    let mut sum = 0.0;
    for arg in args {
        match arg.as_number() {
            Some(n) => sum += n,
            None => release(*arg),
        }
    }
    if sum < 0.0 {
        return TryCatchDesc::exception(ValueDesc::number(sum));
    }
    TryCatchDesc::ok(ValueDesc::number(sum))
}

unsafe extern "C" fn count_drop(callback: *mut c_void) {
    let counters = &*(callback as *const Counters);
    counters.drops.fetch_add(1, Ordering::SeqCst);
}

unsafe fn release(desc: ValueDesc) {
    if let Some(handle) = desc.handle() {
        tether_value_drop(handle);
    }
}

unsafe fn install() {
    tether_init_set_callback_lifecycle_funcs(sum_wrapper, count_drop);
}

unsafe fn eval(instance: *mut OpaqueInstance, source: &str) -> TryCatchDesc {
    tether_instance_eval(instance, source.as_ptr().cast(), source.len())
}

unsafe fn string(instance: *mut OpaqueInstance, text: &str) -> ValueDesc {
    let handle = tether_string_create(instance, text.as_ptr().cast(), text.len());
    ValueDesc::composite(ValueTag::String, handle).unwrap()
}

unsafe fn utf8(instance: *mut OpaqueInstance, desc: ValueDesc) -> String {
    let handle = desc.handle().unwrap();
    let raw = tether_string_to_utf8_value(instance, handle);
    let text = String::from_utf8(slice::from_raw_parts(raw.data, raw.length as usize).to_vec()).unwrap();
    tether_utf8_value_drop(raw);
    tether_value_drop(handle);
    text
}

// ============================================================================
// Instance Tests
// ============================================================================

#[test]
fn test_eval_number() {
    unsafe {
        let instance = tether_instance_new();
        let result = eval(instance, "6 * 7");
        assert!(!result.is_exception());
        assert_eq!(result.value.as_number(), Some(42.0));
        tether_instance_drop(instance);
    }
}

#[test]
fn test_eval_exception() {
    unsafe {
        let instance = tether_instance_new();
        let result = eval(instance, "throw 'bad'");
        assert!(result.is_exception());
        assert_eq!(result.value.tag, ValueTag::String as u8);
        assert_eq!(utf8(instance, result.value), "bad");
        tether_instance_drop(instance);
    }
}

#[test]
fn test_data_slots() {
    unsafe {
        let instance = tether_instance_new();
        let mut marker = 0u8;
        let data = &mut marker as *mut u8 as *mut c_void;

        assert!(tether_instance_get_data(instance, 1).is_null());
        tether_instance_set_data(instance, 1, data);
        assert_eq!(tether_instance_get_data(instance, 1), data);
        tether_instance_drop(instance);
    }
}

// ============================================================================
// Object Tests
// ============================================================================

#[test]
fn test_object_properties() {
    unsafe {
        let instance = tether_instance_new();
        let object = tether_object_create(instance);

        let set = tether_object_set(instance, object, string(instance, "x"), ValueDesc::number(5.0));
        assert!(!set.is_exception());

        let has = tether_object_has(instance, object, string(instance, "x"));
        assert_eq!(has.value.as_boolean(), Some(true));

        let got = tether_object_get(instance, object, string(instance, "x"));
        assert_eq!(got.value.as_number(), Some(5.0));

        let removed = tether_object_remove(instance, object, string(instance, "x"));
        assert_eq!(removed.value.as_boolean(), Some(true));

        let has = tether_object_has(instance, object, string(instance, "x"));
        assert_eq!(has.value.as_boolean(), Some(false));

        tether_value_drop(object);
        tether_instance_drop(instance);
    }
}

#[test]
fn test_keys_and_arrays() {
    unsafe {
        let instance = tether_instance_new();
        let object = eval(instance, "var o = Object.create({ p: 1 }); o.q = 2; o").value;
        let object = object.handle().unwrap();

        let own = tether_object_keys(instance, object, 0);
        assert_eq!(tether_array_length(instance, own), 1);
        let all = tether_object_keys(instance, object, 1);
        assert_eq!(tether_array_length(instance, all), 2);

        let first = tether_object_get_index(instance, all, 0);
        assert_eq!(utf8(instance, first.value), "q");

        let array = tether_array_create(instance);
        let _ = tether_object_set_index(instance, array, 2, ValueDesc::boolean(true));
        assert_eq!(tether_array_length(instance, array), 3);

        for handle in [own, all, array, object] {
            tether_value_drop(handle);
        }
        tether_instance_drop(instance);
    }
}

#[test]
fn test_unknown_tag_decodes_as_undefined() {
    unsafe {
        let instance = tether_instance_new();
        let object = tether_object_create(instance);
        let bogus = ValueDesc {
            payload: ValueDesc::null().payload,
            tag: 99,
        };
        let _ = tether_object_set(instance, object, string(instance, "u"), bogus);

        let got = tether_object_get(instance, object, string(instance, "u"));
        assert_eq!(got.value.tag, ValueTag::Undefined as u8);
        tether_value_drop(object);
        tether_instance_drop(instance);
    }
}

// ============================================================================
// Coercion Tests
// ============================================================================

#[test]
fn test_coercions() {
    unsafe {
        let instance = tether_instance_new();
        assert_eq!(tether_coerce_boolean(instance, ValueDesc::number(0.0)), 0);
        assert_eq!(tether_coerce_boolean(instance, string(instance, "x")), 1);

        let n = tether_coerce_number(instance, string(instance, "3.5"));
        assert_eq!(n.value.as_number(), Some(3.5));

        let s = tether_coerce_string(instance, ValueDesc::number(3.5));
        assert_eq!(utf8(instance, s.value), "3.5");
        tether_instance_drop(instance);
    }
}

// ============================================================================
// Function Tests
// ============================================================================

#[test]
fn test_callback_round_trip() {
    unsafe {
        install();
        let counters = Counters::default();
        let instance = tether_instance_new();

        let function = tether_function_create(instance, counters.as_callback());
        assert!(!function.is_null());

        let args = [ValueDesc::number(1.0), ValueDesc::number(2.0), string(instance, "skip")];
        let result = tether_function_call(
            instance,
            function,
            ValueDesc::undefined(),
            args.as_ptr(),
            args.len() as c_int,
        );
        assert!(!result.is_exception());
        assert_eq!(result.value.as_number(), Some(3.0));

        let thrown = tether_function_call(
            instance,
            function,
            ValueDesc::undefined(),
            [ValueDesc::number(-1.0)].as_ptr(),
            1,
        );
        assert!(thrown.is_exception());
        assert_eq!(counters.calls.load(Ordering::SeqCst), 2);

        tether_value_drop(function);
        tether_instance_drop(instance);
        assert_eq!(counters.drops.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn test_callback_from_script() {
    unsafe {
        install();
        let counters = Counters::default();
        let instance = tether_instance_new();

        let function = tether_function_create(instance, counters.as_callback());
        let global = tether_instance_global(instance);
        let fn_desc = ValueDesc::composite(ValueTag::Function, function).unwrap();
        let _ = tether_object_set(instance, global, string(instance, "sum"), fn_desc);

        let result = eval(instance, "sum(10, 20, 12)");
        assert_eq!(result.value.as_number(), Some(42.0));

        tether_value_drop(global);
        tether_instance_drop(instance);
        assert_eq!(counters.drops.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn test_collected_callbacks_drop_once() {
    unsafe {
        install();
        let counters = Counters::default();
        let instance = tether_instance_new();

        for _ in 0..4 {
            let function = tether_function_create(instance, counters.as_callback());
            tether_value_drop(function);
        }
        tether_instance_collect_garbage(instance);
        assert_eq!(counters.drops.load(Ordering::SeqCst), 4);

        tether_instance_drop(instance);
        assert_eq!(counters.drops.load(Ordering::SeqCst), 4);
    }
}

#[test]
fn test_call_with_null_function_releases_arguments() {
    unsafe {
        let instance = tether_instance_new();
        let result = tether_function_call(
            instance,
            ptr::null_mut(),
            ValueDesc::undefined(),
            [string(instance, "leak?")].as_ptr(),
            1,
        );
        assert!(!result.is_exception());
        assert_eq!(result.value.tag, ValueTag::Undefined as u8);
        tether_instance_drop(instance);
    }
}
