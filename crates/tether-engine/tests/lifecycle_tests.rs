use std::thread;

use tether_engine::{bootstrap_count, platform, Engine, EngineOptions};

// ============================================================================
// Bootstrap Tests
// ============================================================================

#[test]
fn test_bootstrap_runs_once_across_threads() {
    let workers: Vec<_> = (0..8)
        .map(|_| {
            thread::spawn(|| {
                let engine = Engine::new();
                let result = engine.eval("1 + 1").into_result().unwrap();
                result.as_number().unwrap()
            })
        })
        .collect();

    for worker in workers {
        assert_eq!(worker.join().unwrap(), 2.0);
    }
    assert_eq!(bootstrap_count(), 1);
    assert!(platform().instances_created() >= 8);
}

#[test]
fn test_instance_ids_are_unique() {
    let a = Engine::new();
    let b = Engine::new();
    let c = Engine::new();
    assert_ne!(a.id(), b.id());
    assert_ne!(b.id(), c.id());
    assert_ne!(a.id(), c.id());
}

// ============================================================================
// Evaluation Tests
// ============================================================================

#[test]
fn test_eval_returns_completion_value() {
    let engine = Engine::new();
    let result = engine.eval("var x = 20; x * 2 + 2").into_result().unwrap();
    assert_eq!(result.as_number().unwrap(), 42.0);
}

#[test]
fn test_eval_state_persists_between_calls() {
    let engine = Engine::new();
    assert!(engine.eval("var counter = 1;").is_ok());
    assert!(engine.eval("counter += 1;").is_ok());
    let result = engine.eval("counter").into_result().unwrap();
    assert_eq!(result.as_number().unwrap(), 2.0);
}

#[test]
fn test_eval_syntax_error_is_exception() {
    let engine = Engine::new();
    let result = engine.eval("var = ;");
    assert!(result.is_exception());

    let thrown = result.into_value();
    let name = engine
        .get(thrown.handle().unwrap(), engine.string("name"))
        .into_result()
        .unwrap();
    assert_eq!(engine.string_to_utf8(name.handle().unwrap()).as_str(), "SyntaxError");
}

#[test]
fn test_eval_throw_primitive() {
    let engine = Engine::new();
    let result = engine.eval("throw 42");
    assert!(result.is_exception());
    assert_eq!(result.value.as_number().unwrap(), 42.0);
}

#[test]
fn test_eval_throw_object_keeps_identity() {
    let engine = Engine::new();
    assert!(engine.eval("var boom = { code: 7 };").is_ok());
    let result = engine.eval("throw boom");
    assert!(result.is_exception());

    let thrown = result.into_value();
    let boom = engine.eval("boom").into_value();
    assert!(thrown.handle().unwrap().same_value(boom.handle().unwrap()));
}

#[test]
fn test_eval_empty_source_is_undefined() {
    let engine = Engine::new();
    let result = engine.eval("").into_result().unwrap();
    assert!(result.is_undefined());
}

#[test]
fn test_eval_invalid_utf8_is_replaced() {
    let engine = Engine::new();
    let result = engine.eval(b"'a\xffb'.length").into_result().unwrap();
    assert_eq!(result.as_number().unwrap(), 3.0);
}

// ============================================================================
// Limits Tests
// ============================================================================

#[test]
fn test_recursion_limit_is_range_error() {
    let engine = Engine::with_options(EngineOptions::default().with_recursion_limit(64));
    let result = engine.eval("function f() { return f(); } f()");
    assert!(result.is_exception());

    let thrown = result.into_value();
    let name = engine
        .get(thrown.handle().unwrap(), engine.string("name"))
        .into_result()
        .unwrap();
    assert_eq!(engine.string_to_utf8(name.handle().unwrap()).as_str(), "RangeError");
}

#[test]
fn test_instance_survives_limit_exception() {
    let engine = Engine::with_options(EngineOptions::default().with_loop_iteration_limit(1_000));
    assert!(engine.eval("while (true) {}").is_exception());
    let result = engine.eval("'still alive'.length").into_result().unwrap();
    assert_eq!(result.as_number().unwrap(), 11.0);
}

// ============================================================================
// Teardown Tests
// ============================================================================

#[test]
fn test_destroy_with_outstanding_handles() {
    let engine = Engine::new();
    let object = engine.eval("({ a: 1 })").into_value();
    let global = engine.global();
    assert_eq!(engine.handle_stats().live, 2);

    engine.destroy();

    // Releasing handles after teardown must be harmless.
    drop(object);
    drop(global);
}

#[test]
fn test_destroy_in_reverse_and_creation_order() {
    let a = Engine::new();
    let b = Engine::new();
    a.destroy();
    b.destroy();

    let c = Engine::new();
    let d = Engine::new();
    d.destroy();
    assert!(c.eval("1").is_ok());
    c.destroy();
}
