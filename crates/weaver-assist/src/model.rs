//! Host type-model capability
//!
//! The assistant never owns the types it mutates. It drives them through
//! [`TargetType`] and resolves type names through [`TypePool`]; hosts
//! implement both over whatever class representation they carry.

use crate::error::InstallError;
use std::fmt;
use weaver_runtime::{FieldRef, Modifiers};

/// A resolved type, by fully-qualified name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef {
    pub name: String,
}

impl TypeRef {
    /// Reference a type by fully-qualified name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The array type with this element type
    pub fn array_of(&self) -> TypeRef {
        TypeRef::new(format!("{}[]", self.name))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Maps fully-qualified names to type references
pub trait TypePool {
    fn resolve(&self, name: &str) -> Option<TypeRef>;
}

/// Logical operation a synthesized method implements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HelperKind {
    FieldReader,
    FieldWriter,
    /// Push onto the access stack held in the named static field
    PushFieldAccess { stack: String },
    /// Pop from the access stack held in the named static field
    PopFieldAccess { stack: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub ty: TypeRef,
    pub name: String,
}

/// A method ready for installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub modifiers: Modifiers,
    pub return_type: String,
    pub name: String,
    pub params: Vec<Param>,
    /// Rendered body, braces included
    pub body: String,
    pub helper: HelperKind,
}

impl MethodDecl {
    /// Parameter types in declaration order
    pub fn signature(&self) -> Vec<TypeRef> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }

    /// Full declaration text
    pub fn source(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("{} {}", p.ty, p.name))
            .collect();
        let mut head = self.modifiers.keywords().join(" ");
        if !head.is_empty() {
            head.push(' ');
        }
        format!(
            "{}{} {}({}) {}",
            head,
            self.return_type,
            self.name,
            params.join(", "),
            self.body
        )
    }
}

/// A field ready for installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub modifiers: Modifiers,
    pub ty: TypeRef,
    pub name: String,
    pub initializer: String,
}

impl FieldDecl {
    /// Declaration text, initializer included
    pub fn source(&self) -> String {
        let mut head = self.modifiers.keywords().join(" ");
        if !head.is_empty() {
            head.push(' ');
        }
        format!("{}{} {} = {};", head, self.ty, self.name, self.initializer)
    }
}

/// Handle to a method on a target type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodHandle {
    pub owner: String,
    pub name: String,
    pub signature: Vec<TypeRef>,
    /// Host-assigned slot; equal handles name the same member
    pub slot: usize,
}

/// Handle to a field on a target type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldHandle {
    pub owner: String,
    pub name: String,
    pub ty: TypeRef,
    pub slot: usize,
}

/// A field as a transformation pass sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub field: FieldRef,
    pub modifiers: Modifiers,
}

impl FieldInfo {
    /// Describe field `owner.name` with its declared modifiers
    pub fn new(owner: &str, name: &str, modifiers: Modifiers) -> Self {
        Self {
            field: FieldRef::new(owner, name),
            modifiers,
        }
    }
}

/// A type definition under construction
pub trait TargetType {
    fn name(&self) -> &str;

    /// Method declared on this type with exactly this signature
    fn declared_method(&self, name: &str, params: &[TypeRef]) -> Option<MethodHandle>;

    fn add_method(&mut self, method: MethodDecl) -> Result<MethodHandle, InstallError>;

    fn field(&self, name: &str) -> Option<FieldHandle>;

    fn add_field(&mut self, field: FieldDecl) -> Result<FieldHandle, InstallError>;
}
