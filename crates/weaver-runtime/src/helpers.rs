//! Helper operations behind synthesized methods
//!
//! These are the semantics of the four synthesized helpers plus the runtime
//! half of a push call site, written against [`ObjectModel`].

use crate::access::{AccessStack, FieldSet};
use crate::error::{Failure, FatalResult, HelperResult, Recoverable};
use crate::object::{FieldRef, ObjectModel, Value};

/// Fail unless `caller` may touch `field`: the field is public, declared on
/// the caller itself, or relaxed on the current thread.
pub fn check_access<M: ObjectModel + ?Sized>(
    model: &M,
    caller: &str,
    field: &FieldRef,
) -> HelperResult<()> {
    if field.owner == caller || model.is_accessible(field) {
        return Ok(());
    }
    if model.modifiers(field)?.is_public() {
        return Ok(());
    }
    Err(Recoverable::IllegalAccess {
        owner: field.owner.clone(),
        name: field.name.clone(),
        caller: caller.to_string(),
    }
    .into())
}

/// Look up `owner.name` and read it from `instance`
pub fn read_field<M: ObjectModel + ?Sized>(
    model: &M,
    caller: &str,
    owner: &str,
    name: &str,
    instance: &Value,
) -> HelperResult<Value> {
    let field = model.declared_field(owner, name)?;
    check_access(model, caller, &field)?;
    model.load(&field, instance)
}

/// Look up `owner.name` and set it on `instance`
pub fn write_field<M: ObjectModel + ?Sized>(
    model: &M,
    caller: &str,
    owner: &str,
    name: &str,
    instance: &Value,
    value: Value,
) -> HelperResult<()> {
    let field = model.declared_field(owner, name)?;
    check_access(model, caller, &field)?;
    model.store(&field, instance, value)
}

/// Relax every field in `fields` and record them on the current thread
pub fn push_field_access<M: ObjectModel + ?Sized>(
    model: &M,
    stack: &AccessStack,
    fields: FieldSet,
) -> HelperResult<()> {
    for field in &fields {
        model.grant_access(field);
    }
    stack.push(fields);
    Ok(())
}

/// Pop the current thread's most recent push and restore its fields.
///
/// Returns the popped set. Only the holds this push took are dropped, so a
/// field an outer push on the same thread relaxed stays relaxed. The
/// thread's stack storage is released when this empties it.
pub fn pop_field_access<M: ObjectModel + ?Sized>(
    model: &M,
    stack: &AccessStack,
) -> HelperResult<FieldSet> {
    let fields = stack.pop()?;
    for field in &fields {
        model.revoke_access(field);
    }
    Ok(fields)
}

/// Resolve `candidates` and keep those not already accessible to the
/// current thread.
///
/// Fields an outer push on this thread already relaxed stay out of the
/// request, so the matching pop leaves them alone. Relaxations held by
/// other threads are not seen.
pub fn collect_inaccessible<M: ObjectModel + ?Sized>(
    model: &M,
    candidates: &FieldSet,
) -> HelperResult<FieldSet> {
    let mut pending = FieldSet::new();
    for candidate in candidates {
        let field = model.declared_field(&candidate.owner, &candidate.name)?;
        if !model.is_accessible(&field) {
            pending.insert(field);
        }
    }
    Ok(pending)
}

/// Relaxed fields held for the lifetime of the guard.
///
/// Dropping the guard pops and restores, so the relaxation is reverted on
/// every exit path, unwinding included.
pub struct AccessScope<'a, M: ObjectModel + ?Sized> {
    model: &'a M,
    stack: &'a AccessStack,
    released: bool,
}

impl<'a, M: ObjectModel + ?Sized> AccessScope<'a, M> {
    /// Pop now and report any failure instead of logging it
    pub fn release(mut self) -> FatalResult<FieldSet> {
        self.released = true;
        pop_field_access(self.model, self.stack).map_err(Into::into)
    }
}

impl<M: ObjectModel + ?Sized> Drop for AccessScope<'_, M> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = pop_field_access(self.model, self.stack) {
            tracing::warn!(error = %err, "access scope failed to release");
        }
    }
}

/// Filter `candidates` down to the inaccessible ones and push them, returning
/// a guard that pops on drop
pub fn relax<'a, M: ObjectModel + ?Sized>(
    model: &'a M,
    stack: &'a AccessStack,
    candidates: &FieldSet,
) -> HelperResult<AccessScope<'a, M>> {
    let pending = collect_inaccessible(model, candidates)?;
    push_field_access(model, stack, pending)?;
    Ok(AccessScope {
        model,
        stack,
        released: false,
    })
}

/// Unwrap a class literal argument
pub fn expect_class(value: &Value) -> HelperResult<&str> {
    match value {
        Value::Class(name) => Ok(name),
        other => Err(mismatch("class", other)),
    }
}

/// Unwrap a string argument
pub fn expect_str(value: &Value) -> HelperResult<&str> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(mismatch("string", other)),
    }
}

/// Unwrap a field array argument
pub fn expect_fields(value: &Value) -> HelperResult<&FieldSet> {
    match value {
        Value::Fields(fields) => Ok(fields),
        other => Err(mismatch("field[]", other)),
    }
}

fn mismatch(expected: &str, got: &Value) -> Failure {
    Recoverable::WrongType {
        expected: expected.to_string(),
        got: got.kind().to_string(),
    }
    .into()
}
