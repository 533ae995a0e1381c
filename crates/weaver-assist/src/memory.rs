//! In-memory host
//!
//! [`MemoryClass`] is a [`TargetType`] that keeps installed members in
//! memory, rejects sources with broken delimiters, and can run the helpers
//! it holds against any [`ObjectModel`] through `weaver-runtime`.
//! [`MemoryPool`] resolves a fixed set of type names.

use crate::assistant::{CallSite, CLASS, FIELD, OBJECT, STRING, THREAD_LOCAL};
use crate::error::InstallError;
use crate::model::{
    FieldDecl, FieldHandle, HelperKind, MethodDecl, MethodHandle, TargetType, TypePool, TypeRef,
};
use crate::naming::is_identifier;
use crate::signature::ParamSignature;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use weaver_runtime::helpers::{expect_class, expect_fields, expect_str};
use weaver_runtime::{
    collect_inaccessible, pop_field_access, push_field_access, read_field, unchecked,
    write_field, AccessStack, Failure, Fatal, FatalResult, HelperResult, ObjectModel, Recoverable,
    Value,
};

/// Type pool over a set of known names. `X[]` resolves when `X` does.
#[derive(Debug, Clone, Default)]
pub struct MemoryPool {
    known: FxHashSet<String>,
}

impl MemoryPool {
    /// Create a pool that resolves nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool that knows every type the assistant's helpers mention
    pub fn with_defaults() -> Self {
        let mut pool = Self::new();
        for name in [CLASS, STRING, OBJECT, FIELD, THREAD_LOCAL] {
            pool.register(name);
        }
        pool
    }

    /// Make `name` resolvable
    pub fn register(&mut self, name: &str) {
        self.known.insert(name.to_string());
    }
}

impl TypePool for MemoryPool {
    fn resolve(&self, name: &str) -> Option<TypeRef> {
        let element = name.trim_end_matches("[]");
        self.known.contains(element).then(|| TypeRef::new(name))
    }
}

/// A target type held in memory
pub struct MemoryClass {
    name: String,
    methods: Vec<MethodDecl>,
    index: BTreeMap<(String, ParamSignature), usize>,
    fields: Vec<FieldDecl>,
    stacks: FxHashMap<String, AccessStack>,
}

impl MemoryClass {
    /// Create an empty class named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
            index: BTreeMap::new(),
            fields: Vec::new(),
            stacks: FxHashMap::default(),
        }
    }

    /// Installed methods ordered by name, then by signature
    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.index.values().map(move |&slot| &self.methods[slot])
    }

    /// Installed method behind `handle`, if it belongs to this class
    pub fn method(&self, handle: &MethodHandle) -> Option<&MethodDecl> {
        self.methods
            .get(handle.slot)
            .filter(|m| m.name == handle.name && handle.owner == self.name)
    }

    /// Number of installed methods
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Installed fields in installation order
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    /// Live access stack behind a `ThreadLocal` static field
    pub fn stack(&self, field: &str) -> Option<&AccessStack> {
        self.stacks.get(field)
    }

    /// Run an installed helper. Every failure reaches the caller unchecked.
    pub fn invoke<M: ObjectModel + ?Sized>(
        &self,
        model: &M,
        handle: &MethodHandle,
        args: &[Value],
    ) -> FatalResult<Value> {
        let method = self.method(handle).ok_or_else(|| Fatal::Internal {
            message: format!("{} has no method {} in slot {}", self.name, handle.name, handle.slot),
        })?;

        unchecked(|| {
            if args.len() != method.params.len() {
                return Err(Recoverable::Arity {
                    method: method.name.clone(),
                    expected: method.params.len(),
                    got: args.len(),
                }
                .into());
            }

            match &method.helper {
                HelperKind::FieldReader => {
                    let owner = expect_class(&args[0])?;
                    let name = expect_str(&args[1])?;
                    read_field(model, &self.name, owner, name, &args[2])
                }
                HelperKind::FieldWriter => {
                    let owner = expect_class(&args[0])?;
                    let name = expect_str(&args[1])?;
                    write_field(model, &self.name, owner, name, &args[2], args[3].clone())?;
                    Ok(Value::Null)
                }
                HelperKind::PushFieldAccess { stack } => {
                    let fields = expect_fields(&args[0])?.clone();
                    push_field_access(model, self.stack_named(stack)?, fields)?;
                    Ok(Value::Null)
                }
                HelperKind::PopFieldAccess { stack } => {
                    pop_field_access(model, self.stack_named(stack)?)?;
                    Ok(Value::Null)
                }
            }
        })
    }

    /// Run a rendered push call site: look up each requested field, keep the
    /// inaccessible ones and hand them to the push helper
    pub fn run_call_site<M: ObjectModel + ?Sized>(
        &self,
        model: &M,
        site: &CallSite,
    ) -> FatalResult<()> {
        unchecked(|| {
            let pending = collect_inaccessible(model, &site.fields)?;
            self.invoke(model, &site.push, &[Value::Fields(pending)])
                .map_err(Failure::from)?;
            Ok(())
        })
    }

    fn stack_named(&self, field: &str) -> HelperResult<&AccessStack> {
        self.stacks.get(field).ok_or_else(|| {
            Fatal::Internal {
                message: format!("{} has no access stack field {}", self.name, field),
            }
            .into()
        })
    }
}

impl TargetType for MemoryClass {
    fn name(&self) -> &str {
        &self.name
    }

    fn declared_method(&self, name: &str, params: &[TypeRef]) -> Option<MethodHandle> {
        let key = (name.to_string(), ParamSignature::new(params));
        self.index.get(&key).map(|&slot| MethodHandle {
            owner: self.name.clone(),
            name: name.to_string(),
            signature: params.to_vec(),
            slot,
        })
    }

    fn add_method(&mut self, method: MethodDecl) -> Result<MethodHandle, InstallError> {
        identifier(&method.name)?;
        for param in &method.params {
            identifier(&param.name)?;
        }
        check_delimiters(&method.source())?;

        let signature = method.signature();
        let key = (method.name.clone(), ParamSignature(signature.clone()));
        if self.index.contains_key(&key) {
            return Err(InstallError::Duplicate { name: method.name });
        }

        let slot = self.methods.len();
        let handle = MethodHandle {
            owner: self.name.clone(),
            name: method.name.clone(),
            signature,
            slot,
        };
        self.index.insert(key, slot);
        self.methods.push(method);
        Ok(handle)
    }

    fn field(&self, name: &str) -> Option<FieldHandle> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .map(|slot| FieldHandle {
                owner: self.name.clone(),
                name: name.to_string(),
                ty: self.fields[slot].ty.clone(),
                slot,
            })
    }

    fn add_field(&mut self, field: FieldDecl) -> Result<FieldHandle, InstallError> {
        identifier(&field.name)?;
        if field.initializer.trim().is_empty() {
            return Err(InstallError::Malformed {
                reason: format!("field {} has an empty initializer", field.name),
            });
        }
        check_delimiters(&field.source())?;
        if self.fields.iter().any(|f| f.name == field.name) {
            return Err(InstallError::Duplicate { name: field.name });
        }

        if field.ty.name == THREAD_LOCAL {
            self.stacks.insert(field.name.clone(), AccessStack::new());
        }

        let slot = self.fields.len();
        let handle = FieldHandle {
            owner: self.name.clone(),
            name: field.name.clone(),
            ty: field.ty.clone(),
            slot,
        };
        self.fields.push(field);
        Ok(handle)
    }
}

fn identifier(name: &str) -> Result<(), InstallError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(InstallError::Malformed {
            reason: format!("`{}` is not an identifier", name),
        })
    }
}

/// Accept only sources whose (), [] and {} pair up outside literals
fn check_delimiters(source: &str) -> Result<(), InstallError> {
    let mut open = Vec::new();
    let mut chars = source.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                let quote = c;
                loop {
                    match chars.next() {
                        Some('\\') => {
                            chars.next();
                        }
                        Some(q) if q == quote => break,
                        Some(_) => {}
                        None => {
                            return Err(InstallError::Malformed {
                                reason: "unterminated literal".to_string(),
                            })
                        }
                    }
                }
            }
            '(' | '[' | '{' => open.push(c),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if open.pop() != Some(expected) {
                    return Err(InstallError::Malformed {
                        reason: format!("unbalanced `{}`", c),
                    });
                }
            }
            _ => {}
        }
    }
    match open.last() {
        Some(c) => Err(InstallError::Malformed {
            reason: format!("unclosed `{}`", c),
        }),
        None => Ok(()),
    }
}
