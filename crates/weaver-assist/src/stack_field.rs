//! Backing field for a type's access stack
//!
//! Each target type gets at most one `private static final ThreadLocal`
//! holding its stack of relaxed field arrays.

use crate::assistant::{Assistant, THREAD_LOCAL};
use crate::error::{AssistError, AssistResult};
use crate::model::{FieldDecl, FieldHandle, TargetType, TypePool};
use weaver_runtime::Modifiers;

impl<P: TypePool + ?Sized> Assistant<'_, P> {
    /// The target's access-stack field, declared on first use
    pub fn field_access_stack<T: TargetType + ?Sized>(
        &self,
        target: &mut T,
    ) -> AssistResult<FieldHandle> {
        let name = self.names.generate("fieldAccessStack");
        if let Some(existing) = target.field(&name) {
            return Ok(existing);
        }

        let decl = FieldDecl {
            modifiers: Modifiers::PRIVATE | Modifiers::STATIC | Modifiers::FINAL,
            ty: self.resolve(THREAD_LOCAL)?,
            name: name.clone(),
            initializer: format!("new {}()", THREAD_LOCAL),
        };

        let owner = target.name().to_string();
        let handle = target.add_field(decl).map_err(|source| AssistError::Install {
            owner: owner.clone(),
            member: name.clone(),
            source,
        })?;
        tracing::debug!(owner = %owner, member = %name, outcome = "created", "access stack field");
        Ok(handle)
    }
}
