//! Integration tests for helper operations against the in-memory heap

use std::panic::{self, AssertUnwindSafe};
use std::sync::Barrier;
use std::thread;
use weaver_runtime::{
    collect_inaccessible, pop_field_access, push_field_access, read_field, relax, unchecked,
    write_field, AccessStack, Failure, FieldRef, FieldSet, MemoryHeap, Modifiers, ObjectModel,
    Recoverable, Value,
};

fn heap() -> MemoryHeap {
    let heap = MemoryHeap::new();
    heap.define_class(
        "com.acme.Point",
        &[
            ("x", Modifiers::PRIVATE),
            ("y", Modifiers::PRIVATE),
            ("label", Modifiers::PUBLIC),
        ],
    );
    heap.define_class("com.acme.Canvas", &[("scale", Modifiers::PROTECTED)]);
    heap
}

fn fields(refs: &[(&str, &str)]) -> FieldSet {
    refs.iter().map(|(o, n)| FieldRef::new(*o, *n)).collect()
}

#[test]
fn test_read_own_private_field() {
    let heap = heap();
    let point = Value::Ref(heap.instantiate("com.acme.Point").unwrap());

    write_field(&heap, "com.acme.Point", "com.acme.Point", "x", &point, Value::Int(42)).unwrap();
    let x = read_field(&heap, "com.acme.Point", "com.acme.Point", "x", &point).unwrap();
    assert_eq!(x, Value::Int(42));
}

#[test]
fn test_foreign_private_field_needs_relaxation() {
    let heap = heap();
    let point = Value::Ref(heap.instantiate("com.acme.Point").unwrap());

    let err = read_field(&heap, "com.acme.Canvas", "com.acme.Point", "x", &point).unwrap_err();
    assert!(matches!(
        err,
        Failure::Recoverable(Recoverable::IllegalAccess { .. })
    ));

    let stack = AccessStack::new();
    push_field_access(&heap, &stack, fields(&[("com.acme.Point", "x")])).unwrap();
    let x = read_field(&heap, "com.acme.Canvas", "com.acme.Point", "x", &point).unwrap();
    assert_eq!(x, Value::Null);

    pop_field_access(&heap, &stack).unwrap();
    assert!(read_field(&heap, "com.acme.Canvas", "com.acme.Point", "x", &point).is_err());
}

#[test]
fn test_public_field_is_always_readable() {
    let heap = heap();
    let point = Value::Ref(heap.instantiate("com.acme.Point").unwrap());
    write_field(&heap, "com.acme.Canvas", "com.acme.Point", "label", &point, "p".into()).unwrap();
    assert_eq!(
        read_field(&heap, "com.acme.Canvas", "com.acme.Point", "label", &point).unwrap(),
        Value::Str("p".to_string())
    );
}

#[test]
fn test_nested_pushes_pop_in_lifo_order() {
    let heap = heap();
    let stack = AccessStack::new();
    let outer = fields(&[("com.acme.Point", "x"), ("com.acme.Point", "y")]);
    let inner = fields(&[("com.acme.Canvas", "scale")]);

    push_field_access(&heap, &stack, outer.clone()).unwrap();
    push_field_access(&heap, &stack, inner.clone()).unwrap();
    assert_eq!(heap.accessible_count(), 3);

    assert_eq!(pop_field_access(&heap, &stack).unwrap(), inner);
    assert_eq!(heap.accessible_count(), 2);
    assert!(stack.is_active());

    assert_eq!(pop_field_access(&heap, &stack).unwrap(), outer);
    assert_eq!(heap.accessible_count(), 0);
    assert!(!stack.is_active());
}

#[test]
fn test_unbalanced_pop_is_fatal() {
    let heap = heap();
    let stack = AccessStack::new();
    let err = pop_field_access(&heap, &stack).unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn test_collect_skips_already_accessible() {
    let heap = heap();
    let x = heap.declared_field("com.acme.Point", "x").unwrap();
    heap.grant_access(&x);

    let pending = collect_inaccessible(
        &heap,
        &fields(&[("com.acme.Point", "x"), ("com.acme.Point", "y")]),
    )
    .unwrap();
    assert_eq!(pending, fields(&[("com.acme.Point", "y")]));
}

#[test]
fn test_collect_unknown_field_is_recoverable() {
    let heap = heap();
    let err = collect_inaccessible(&heap, &fields(&[("com.acme.Point", "z")])).unwrap_err();
    assert!(!err.is_fatal());

    let fatal = unchecked(|| collect_inaccessible(&heap, &fields(&[("com.acme.Point", "z")])))
        .unwrap_err();
    assert!(matches!(
        fatal.cause(),
        Some(Recoverable::NoSuchField { name, .. }) if name == "z"
    ));
}

#[test]
fn test_scope_releases_on_drop() {
    let heap = heap();
    let stack = AccessStack::new();
    {
        let _scope = relax(&heap, &stack, &fields(&[("com.acme.Point", "x")])).unwrap();
        assert_eq!(stack.depth(), 1);
        assert_eq!(heap.accessible_count(), 1);
    }
    assert_eq!(stack.depth(), 0);
    assert_eq!(heap.accessible_count(), 0);
}

#[test]
fn test_scope_releases_on_unwind() {
    let heap = heap();
    let stack = AccessStack::new();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let _scope = relax(&heap, &stack, &fields(&[("com.acme.Point", "y")])).unwrap();
        panic!("instrumented body failed");
    }));

    assert!(result.is_err());
    assert!(!stack.is_active());
    assert_eq!(heap.accessible_count(), 0);
}

#[test]
fn test_scope_explicit_release_returns_set() {
    let heap = heap();
    let stack = AccessStack::new();
    let scope = relax(&heap, &stack, &fields(&[("com.acme.Canvas", "scale")])).unwrap();
    let popped = scope.release().unwrap();
    assert_eq!(popped, fields(&[("com.acme.Canvas", "scale")]));
    assert!(!stack.is_active());
}

#[test]
fn test_stacks_are_per_thread() {
    let heap = heap();
    let stack = AccessStack::new();

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for depth in 1..=3 {
                    stack.push(FieldSet::new());
                    assert_eq!(stack.depth(), depth);
                }
                for _ in 0..3 {
                    pop_field_access(&heap, &stack).unwrap();
                }
                assert!(!stack.is_active());
            });
        }
    });

    assert_eq!(stack.active_threads(), 0);
}

#[test]
fn test_relaxation_is_scoped_to_the_relaxing_thread() {
    let heap = heap();
    let stack = AccessStack::new();
    let point = Value::Ref(heap.instantiate("com.acme.Point").unwrap());
    let x = fields(&[("com.acme.Point", "x")]);
    let read_x = || read_field(&heap, "com.acme.Canvas", "com.acme.Point", "x", &point);

    let first_relaxed = Barrier::new(2);
    let second_relaxed = Barrier::new(2);
    let first_released = Barrier::new(2);

    thread::scope(|s| {
        s.spawn(|| {
            let scope = relax(&heap, &stack, &x).unwrap();
            assert_eq!(read_x().unwrap(), Value::Null);
            first_relaxed.wait();

            second_relaxed.wait();
            drop(scope);
            assert!(read_x().is_err());
            first_released.wait();
        });
        s.spawn(|| {
            first_relaxed.wait();
            // the other thread's relaxation does not apply here
            let err = read_x().unwrap_err();
            assert!(matches!(
                err,
                Failure::Recoverable(Recoverable::IllegalAccess { .. })
            ));

            let scope = relax(&heap, &stack, &x).unwrap();
            assert_eq!(stack.peek(), Some(x.clone()));
            second_relaxed.wait();

            first_released.wait();
            assert_eq!(read_x().unwrap(), Value::Null);
            drop(scope);
            assert!(read_x().is_err());
        });
    });

    assert_eq!(stack.active_threads(), 0);
    assert_eq!(heap.accessible_count(), 0);
}
