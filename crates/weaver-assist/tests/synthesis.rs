//! Integration tests for helper synthesis

use std::error::Error as _;
use weaver_assist::{
    AssistError, Assistant, AssistantConfig, FieldDecl, FieldHandle, HelperKind, InstallError,
    MemoryClass, MemoryPool, MethodDecl, MethodHandle, Param, TargetType, TypePool, TypeRef,
};
use weaver_runtime::{Fatal, MemoryHeap, Modifiers, Recoverable, Value};

fn point_heap() -> MemoryHeap {
    let heap = MemoryHeap::new();
    heap.define_class("com.acme.T", &[("x", Modifiers::PRIVATE)]);
    heap
}

#[test]
fn test_field_reader_reused_and_reads_private_field() {
    let pool = MemoryPool::with_defaults();
    let assistant = Assistant::new(&pool);
    let mut target = MemoryClass::new("com.acme.T");

    let first = assistant.field_reader(&mut target).unwrap();
    let second = assistant.field_reader(&mut target).unwrap();
    assert_eq!(first, second);
    assert_eq!(target.method_count(), 1);
    assert_eq!(first.name, "_weaver_assisted_readField");

    let heap = point_heap();
    let instance = Value::Ref(heap.instantiate("com.acme.T").unwrap());
    let writer = assistant.field_writer(&mut target).unwrap();
    target
        .invoke(
            &heap,
            &writer,
            &[
                Value::Class("com.acme.T".to_string()),
                "x".into(),
                instance.clone(),
                Value::Int(42),
            ],
        )
        .unwrap();

    let value = target
        .invoke(
            &heap,
            &second,
            &[Value::Class("com.acme.T".to_string()), "x".into(), instance],
        )
        .unwrap();
    assert_eq!(value, Value::Int(42));
}

#[test]
fn test_reader_and_writer_signatures() {
    let pool = MemoryPool::with_defaults();
    let assistant = Assistant::new(&pool);
    let mut target = MemoryClass::new("com.acme.T");

    let reader = assistant.field_reader(&mut target).unwrap();
    let writer = assistant.field_writer(&mut target).unwrap();

    let names: Vec<&str> = reader.signature.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["java.lang.Class", "java.lang.String", "java.lang.Object"]);
    assert_eq!(writer.signature.len(), 4);

    let decl = target.method(&writer).unwrap();
    assert_eq!(decl.helper, HelperKind::FieldWriter);
    assert!(decl
        .source()
        .starts_with("private static void _weaver_assisted_writeField(java.lang.Class type, java.lang.String name, java.lang.Object instance, java.lang.Object value) {"));
    assert!(decl.body.contains("type.getDeclaredField(name).set(instance, value);"));
    assert!(decl.body.contains("catch (Exception _weaver_assisted_lazyException)"));
}

#[test]
fn test_push_and_pop_share_one_stack_field() {
    let pool = MemoryPool::with_defaults();
    let assistant = Assistant::new(&pool);
    let mut target = MemoryClass::new("com.acme.T");

    let push = assistant.push_field_access(&mut target).unwrap();
    let pop = assistant.pop_field_access(&mut target).unwrap();
    assert_eq!(assistant.push_field_access(&mut target).unwrap(), push);
    assert_eq!(assistant.pop_field_access(&mut target).unwrap(), pop);

    assert_eq!(target.method_count(), 2);
    assert_eq!(target.fields().len(), 1);

    let field = &target.fields()[0];
    assert_eq!(field.name, "_weaver_assisted_fieldAccessStack");
    assert_eq!(
        field.modifiers,
        Modifiers::PRIVATE | Modifiers::STATIC | Modifiers::FINAL
    );
    assert_eq!(field.ty, TypeRef::new("java.lang.ThreadLocal"));
    assert!(target.stack(&field.name).is_some());

    let push_decl = target.method(&push).unwrap();
    assert_eq!(
        push.signature,
        vec![TypeRef::new("java.lang.reflect.Field[]")]
    );
    assert!(push_decl
        .body
        .contains("if (_weaver_assisted_stk == null) {"));
    assert!(pop.signature.is_empty());
    assert!(target
        .method(&pop)
        .unwrap()
        .body
        .contains("_weaver_assisted_fieldAccessStack.remove();"));
}

#[test]
fn test_stack_field_is_idempotent() {
    let pool = MemoryPool::with_defaults();
    let assistant = Assistant::new(&pool);
    let mut target = MemoryClass::new("com.acme.T");

    let first = assistant.field_access_stack(&mut target).unwrap();
    let second = assistant.field_access_stack(&mut target).unwrap();
    assert_eq!(first, second);
    assert_eq!(target.fields().len(), 1);
}

#[test]
fn test_methods_listed_by_name_then_signature() {
    let pool = MemoryPool::with_defaults();
    let assistant = Assistant::new(&pool);
    let mut target = MemoryClass::new("com.acme.T");

    assistant.field_writer(&mut target).unwrap();
    assistant.pop_field_access(&mut target).unwrap();
    assistant.field_reader(&mut target).unwrap();
    assistant.push_field_access(&mut target).unwrap();

    let names: Vec<&str> = target.methods().map(|m| m.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "_weaver_assisted_popFieldAccess",
            "_weaver_assisted_pushFieldAccess",
            "_weaver_assisted_readField",
            "_weaver_assisted_writeField",
        ]
    );
}

#[test]
fn test_same_name_other_signature_is_not_reused() {
    let pool = MemoryPool::with_defaults();
    let assistant = Assistant::new(&pool);
    let mut target = MemoryClass::new("com.acme.T");

    let user_method = MethodDecl {
        modifiers: Modifiers::PUBLIC,
        return_type: "void".to_string(),
        name: assistant.generate_name("readField"),
        params: vec![Param {
            ty: TypeRef::new("java.lang.Object"),
            name: "o".to_string(),
        }],
        body: "{\n}".to_string(),
        helper: HelperKind::FieldReader,
    };
    let user = target.add_method(user_method).unwrap();

    let reader = assistant.field_reader(&mut target).unwrap();
    assert_ne!(reader, user);
    assert_eq!(target.method_count(), 2);
}

#[test]
fn test_custom_prefix_from_config() {
    let pool = MemoryPool::with_defaults();
    let config = AssistantConfig::from_toml_str("[assistant]\nprefix = \"_woven_\"\n").unwrap();
    let assistant = Assistant::with_config(&pool, &config).unwrap();
    let mut target = MemoryClass::new("com.acme.T");

    let pop = assistant.pop_field_access(&mut target).unwrap();
    assert_eq!(pop.name, "_woven_popFieldAccess");
    assert!(target.field("_woven_fieldAccessStack").is_some());
    assert!(target
        .method(&pop)
        .unwrap()
        .body
        .contains("catch (Exception _woven_lazyException)"));
}

#[test]
fn test_invalid_config_prefix_rejected() {
    let pool = MemoryPool::with_defaults();
    let config = AssistantConfig {
        prefix: "not valid".to_string(),
    };
    let err = Assistant::with_config(&pool, &config).err().unwrap();
    assert!(matches!(err, AssistError::InvalidPrefix { .. }));
}

#[test]
fn test_missing_field_surfaces_as_one_unchecked_failure() {
    let pool = MemoryPool::with_defaults();
    let assistant = Assistant::new(&pool);
    let mut target = MemoryClass::new("com.acme.T");
    let reader = assistant.field_reader(&mut target).unwrap();

    let heap = point_heap();
    let instance = Value::Ref(heap.instantiate("com.acme.T").unwrap());
    let err = target
        .invoke(
            &heap,
            &reader,
            &[Value::Class("com.acme.T".to_string()), "nope".into(), instance],
        )
        .unwrap_err();

    assert!(matches!(
        err.cause(),
        Some(Recoverable::NoSuchField { name, .. }) if name == "nope"
    ));
    assert!(err.source().is_some());
}

#[test]
fn test_wrong_arity_is_wrapped() {
    let pool = MemoryPool::with_defaults();
    let assistant = Assistant::new(&pool);
    let mut target = MemoryClass::new("com.acme.T");
    let reader = assistant.field_reader(&mut target).unwrap();

    let err = target.invoke(&point_heap(), &reader, &[]).unwrap_err();
    assert!(matches!(
        err.cause(),
        Some(Recoverable::Arity { expected: 3, got: 0, .. })
    ));
}

#[test]
fn test_unbalanced_pop_propagates_unchanged() {
    let pool = MemoryPool::with_defaults();
    let assistant = Assistant::new(&pool);
    let mut target = MemoryClass::new("com.acme.T");
    let pop = assistant.pop_field_access(&mut target).unwrap();

    let err = target.invoke(&point_heap(), &pop, &[]).unwrap_err();
    assert!(matches!(err, Fatal::UnbalancedPop { .. }));
}

#[test]
fn test_unknown_type_is_fatal() {
    let mut pool = MemoryPool::new();
    pool.register("java.lang.Class");
    let assistant = Assistant::new(&pool);
    let mut target = MemoryClass::new("com.acme.T");

    let err = assistant.field_reader(&mut target).unwrap_err();
    assert!(matches!(err, AssistError::TypeNotFound { name } if name == "java.lang.String"));
    assert_eq!(target.method_count(), 0);
}

/// Host that refuses every member
struct RejectingType;

impl TargetType for RejectingType {
    fn name(&self) -> &str {
        "com.acme.Sealed"
    }

    fn declared_method(&self, _name: &str, _params: &[TypeRef]) -> Option<MethodHandle> {
        None
    }

    fn add_method(&mut self, _method: MethodDecl) -> Result<MethodHandle, InstallError> {
        Err(InstallError::Malformed {
            reason: "rejected".to_string(),
        })
    }

    fn field(&self, _name: &str) -> Option<FieldHandle> {
        None
    }

    fn add_field(&mut self, field: FieldDecl) -> Result<FieldHandle, InstallError> {
        Ok(FieldHandle {
            owner: "com.acme.Sealed".to_string(),
            name: field.name,
            ty: field.ty,
            slot: 0,
        })
    }
}

#[test]
fn test_install_failure_keeps_cause() {
    let pool = MemoryPool::with_defaults();
    let assistant = Assistant::new(&pool);

    let err = assistant.field_writer(&mut RejectingType).unwrap_err();
    match &err {
        AssistError::Install { owner, member, source } => {
            assert_eq!(owner, "com.acme.Sealed");
            assert_eq!(member, "_weaver_assisted_writeField");
            assert_eq!(
                *source,
                InstallError::Malformed {
                    reason: "rejected".to_string()
                }
            );
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(err.source().is_some());
}

#[test]
fn test_pool_is_usable_as_trait_object() {
    let pool = MemoryPool::with_defaults();
    let dyn_pool: &dyn TypePool = &pool;
    let assistant = Assistant::new(dyn_pool);
    let mut target = MemoryClass::new("com.acme.T");
    assert!(assistant.field_reader(&mut target).is_ok());
}
