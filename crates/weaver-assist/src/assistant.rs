//! Helper method synthesis
//!
//! Each request follows the same path: derive the synthetic name and
//! parameter signature, return the existing member if the target already
//! declares it, otherwise render a body and install a new method. Asking
//! again for the same helper on the same type is always safe.

use crate::body::Body;
use crate::config::AssistantConfig;
use crate::error::{AssistError, AssistResult};
use crate::model::{
    FieldInfo, HelperKind, MethodDecl, MethodHandle, Param, TargetType, TypePool, TypeRef,
};
use crate::naming::NameGenerator;
use weaver_runtime::{FieldSet, Modifiers};

pub(crate) const CLASS: &str = "java.lang.Class";
pub(crate) const STRING: &str = "java.lang.String";
pub(crate) const OBJECT: &str = "java.lang.Object";
pub(crate) const FIELD: &str = "java.lang.reflect.Field";
pub(crate) const THREAD_LOCAL: &str = "java.lang.ThreadLocal";

/// A rendered call site that relaxes a set of fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Body to splice into the instrumented method
    pub source: String,
    /// Non-public fields the call site asks to relax, first occurrence order
    pub fields: FieldSet,
    /// The push helper the call site invokes
    pub push: MethodHandle,
}

/// Synthesizes field-access helpers into target types
pub struct Assistant<'p, P: TypePool + ?Sized> {
    pub(crate) pool: &'p P,
    pub(crate) names: NameGenerator,
}

impl<'p, P: TypePool + ?Sized> Assistant<'p, P> {
    /// Create an assistant using the default name prefix
    pub fn new(pool: &'p P) -> Self {
        Self {
            pool,
            names: NameGenerator::default(),
        }
    }

    /// Create an assistant whose synthetic names start with `prefix`
    pub fn with_prefix(pool: &'p P, prefix: impl Into<String>) -> Self {
        Self {
            pool,
            names: NameGenerator::new(prefix),
        }
    }

    /// Create an assistant from a validated configuration
    pub fn with_config(pool: &'p P, config: &AssistantConfig) -> AssistResult<Self> {
        config.validate()?;
        Ok(Self::with_prefix(pool, config.prefix.clone()))
    }

    /// Synthetic name for `name` under this assistant's prefix
    pub fn generate_name(&self, name: &str) -> String {
        self.names.generate(name)
    }

    /// `private static Object readField(Class type, String name, Object instance)`
    pub fn field_reader<T: TargetType + ?Sized>(&self, target: &mut T) -> AssistResult<MethodHandle> {
        let name = self.names.generate("readField");
        let types = self.types(&[CLASS, STRING, OBJECT])?;
        if let Some(existing) = self.lookup(target, &name, &types) {
            return Ok(existing);
        }

        let mut body = Body::auto_wrap("fieldReader", &self.names);
        body.append_line("return type.getDeclaredField(name).get(instance);", &[])?;

        self.install(
            target,
            MethodDecl {
                modifiers: Modifiers::PRIVATE | Modifiers::STATIC,
                return_type: OBJECT.to_string(),
                name,
                params: params(types, &["type", "name", "instance"]),
                body: body.complete()?,
                helper: HelperKind::FieldReader,
            },
        )
    }

    /// `private static void writeField(Class type, String name, Object instance, Object value)`
    pub fn field_writer<T: TargetType + ?Sized>(&self, target: &mut T) -> AssistResult<MethodHandle> {
        let name = self.names.generate("writeField");
        let types = self.types(&[CLASS, STRING, OBJECT, OBJECT])?;
        if let Some(existing) = self.lookup(target, &name, &types) {
            return Ok(existing);
        }

        let mut body = Body::auto_wrap("fieldWriter", &self.names);
        body.append_line("type.getDeclaredField(name).set(instance, value);", &[])?;

        self.install(
            target,
            MethodDecl {
                modifiers: Modifiers::PRIVATE | Modifiers::STATIC,
                return_type: "void".to_string(),
                name,
                params: params(types, &["type", "name", "instance", "value"]),
                body: body.complete()?,
                helper: HelperKind::FieldWriter,
            },
        )
    }

    /// `private static void pushFieldAccess(Field[] fields)`
    pub fn push_field_access<T: TargetType + ?Sized>(
        &self,
        target: &mut T,
    ) -> AssistResult<MethodHandle> {
        let name = self.names.generate("pushFieldAccess");
        let types = vec![self.resolve(FIELD)?.array_of()];
        if let Some(existing) = self.lookup(target, &name, &types) {
            return Ok(existing);
        }

        let stk = self.names.generate("stk");
        let stack = self.field_access_stack(target)?.name;

        let mut body = Body::auto_wrap("pushFieldAccess", &self.names);
        body.append_line("java.lang.reflect.AccessibleObject.setAccessible(fields, true);", &[])?
            .append_line("java.util.Stack %s = (java.util.Stack) %s.get();", &[&stk, &stack])?
            .start_block("if (%s == null)", &[&stk])?
            .append_line("%s = new java.util.Stack();", &[&stk])?
            .append_line("%s.set(%s);", &[&stack, &stk])?
            .end_block()?
            .append_line("%s.push(fields);", &[&stk])?;

        self.install(
            target,
            MethodDecl {
                modifiers: Modifiers::PRIVATE | Modifiers::STATIC,
                return_type: "void".to_string(),
                name,
                params: params(types, &["fields"]),
                body: body.complete()?,
                helper: HelperKind::PushFieldAccess { stack },
            },
        )
    }

    /// `private static void popFieldAccess()`
    pub fn pop_field_access<T: TargetType + ?Sized>(
        &self,
        target: &mut T,
    ) -> AssistResult<MethodHandle> {
        let name = self.names.generate("popFieldAccess");
        if let Some(existing) = self.lookup(target, &name, &[]) {
            return Ok(existing);
        }

        let stk = self.names.generate("stk");
        let field_array = self.names.generate("fieldArray");
        let stack = self.field_access_stack(target)?.name;

        let mut body = Body::auto_wrap("popFieldAccess", &self.names);
        body.append_line("java.util.Stack %s = (java.util.Stack) %s.get();", &[&stk, &stack])?
            .append_line(
                "java.lang.reflect.Field[] %s = (java.lang.reflect.Field[]) %s.pop();",
                &[&field_array, &stk],
            )?
            .append_line(
                "java.lang.reflect.AccessibleObject.setAccessible(%s, false);",
                &[&field_array],
            )?
            .start_block("if (%s.isEmpty())", &[&stk])?
            .append_line("%s.remove();", &[&stack])?
            .end_block()?;

        self.install(
            target,
            MethodDecl {
                modifiers: Modifiers::PRIVATE | Modifiers::STATIC,
                return_type: "void".to_string(),
                name,
                params: Vec::new(),
                body: body.complete()?,
                helper: HelperKind::PopFieldAccess { stack },
            },
        )
    }

    /// Render a call site that relaxes the non-public fields among `fields`.
    ///
    /// Public fields are skipped and repeated `(owner, name)` pairs are
    /// emitted once. At run time the call site only pushes the fields that
    /// are not already accessible.
    pub fn call_push_field_access<'f, T, I>(&self, target: &mut T, fields: I) -> AssistResult<CallSite>
    where
        T: TargetType + ?Sized,
        I: IntoIterator<Item = &'f FieldInfo>,
    {
        let mut body = Body::auto_wrap("pushFieldAccess", &self.names);

        let flds = self.names.generate("flds");
        body.append_line("final java.util.List %s = new java.util.ArrayList();", &[&flds])?;

        let fld = self.names.generate("fld");
        let mut request = FieldSet::new();
        for info in fields {
            if info.modifiers.is_public() || !request.insert(info.field.clone()) {
                continue;
            }
            if request.len() == 1 {
                body.append_line("java.lang.reflect.Field %s;", &[&fld])?;
            }
            body.append_line(
                "%s = %s.class.getDeclaredField(\"%s\");",
                &[&fld, &info.field.owner, &info.field.name],
            )?
            .start_block("if (!%s.isAccessible())", &[&fld])?
            .append_line("%s.add(%s);", &[&flds, &fld])?
            .end_block()?;
        }

        let push = self.push_field_access(target)?;
        let field_array = self.names.generate("fieldArray");
        body.append_line(
            "final java.lang.reflect.Field[] %1$s = (java.lang.reflect.Field[]) %2$s.toArray(new java.lang.reflect.Field[%2$s.size()]);",
            &[&field_array, &flds],
        )?
        .append_line("%s(%s);", &[&push.name, &field_array])?;

        Ok(CallSite {
            source: body.complete()?,
            fields: request,
            push,
        })
    }

    pub(crate) fn resolve(&self, name: &str) -> AssistResult<TypeRef> {
        self.pool.resolve(name).ok_or_else(|| AssistError::TypeNotFound {
            name: name.to_string(),
        })
    }

    fn types(&self, names: &[&str]) -> AssistResult<Vec<TypeRef>> {
        names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                if name.is_empty() {
                    Err(AssistError::EmptyTypeName { index })
                } else {
                    self.resolve(name)
                }
            })
            .collect()
    }

    fn lookup<T: TargetType + ?Sized>(
        &self,
        target: &T,
        name: &str,
        params: &[TypeRef],
    ) -> Option<MethodHandle> {
        let existing = target.declared_method(name, params)?;
        tracing::debug!(owner = target.name(), member = name, outcome = "reused", "helper method");
        Some(existing)
    }

    fn install<T: TargetType + ?Sized>(
        &self,
        target: &mut T,
        method: MethodDecl,
    ) -> AssistResult<MethodHandle> {
        let owner = target.name().to_string();
        let member = method.name.clone();
        let handle = target.add_method(method).map_err(|source| AssistError::Install {
            owner: owner.clone(),
            member: member.clone(),
            source,
        })?;
        tracing::debug!(owner = %owner, member = %member, outcome = "created", "helper method");
        Ok(handle)
    }
}

fn params(types: Vec<TypeRef>, names: &[&str]) -> Vec<Param> {
    types
        .into_iter()
        .zip(names)
        .map(|(ty, name)| Param {
            ty,
            name: name.to_string(),
        })
        .collect()
}
