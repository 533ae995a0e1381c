//! Object-model capability
//!
//! Woven helpers never perform untyped reflection. They resolve a field by
//! `(owner, name)` through an [`ObjectModel`] and read or write it through
//! the typed handle they get back.

use crate::access::FieldSet;
use crate::error::HelperResult;
use std::fmt;

/// Identity of a heap object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Values passed to and returned from helpers
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    /// A class literal, by fully-qualified name
    Class(String),
    /// A heap object
    Ref(ObjectId),
    /// An array of resolved fields
    Fields(FieldSet),
}

impl Value {
    /// Short name of the value's shape, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Class(_) => "class",
            Value::Ref(_) => "object",
            Value::Fields(_) => "field[]",
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::Ref(id)
    }
}

/// Member modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const PUBLIC: Modifiers = Modifiers(1 << 0);
    pub const PRIVATE: Modifiers = Modifiers(1 << 1);
    pub const PROTECTED: Modifiers = Modifiers(1 << 2);
    pub const STATIC: Modifiers = Modifiers(1 << 3);
    pub const FINAL: Modifiers = Modifiers(1 << 4);

    /// Modifiers set in either operand
    pub const fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    /// Whether every flag in `other` is set
    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether `PUBLIC` is set
    pub const fn is_public(self) -> bool {
        self.contains(Modifiers::PUBLIC)
    }

    /// Whether `STATIC` is set
    pub const fn is_static(self) -> bool {
        self.contains(Modifiers::STATIC)
    }

    /// Source keywords in declaration order
    pub fn keywords(self) -> Vec<&'static str> {
        let table = [
            (Modifiers::PUBLIC, "public"),
            (Modifiers::PROTECTED, "protected"),
            (Modifiers::PRIVATE, "private"),
            (Modifiers::STATIC, "static"),
            (Modifiers::FINAL, "final"),
        ];
        table
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, kw)| *kw)
            .collect()
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        self.union(rhs)
    }
}

/// A field identified by declaring type and name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldRef {
    pub owner: String,
    pub name: String,
}

impl FieldRef {
    /// Reference `owner.name`
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}

/// Capability the host object model exposes to woven helpers.
///
/// Every method takes `&self`: helpers run on arbitrary threads of the
/// instrumented program, so implementations synchronize internally.
pub trait ObjectModel {
    /// Resolve a field declared directly on `owner`
    fn declared_field(&self, owner: &str, name: &str) -> HelperResult<FieldRef>;

    /// Declared modifiers of a resolved field
    fn modifiers(&self, field: &FieldRef) -> HelperResult<Modifiers>;

    /// Whether the calling thread currently has visibility checks
    /// suppressed for `field`
    fn is_accessible(&self, field: &FieldRef) -> bool;

    /// Take one hold on `field` for the calling thread. Other threads are
    /// unaffected.
    fn grant_access(&self, field: &FieldRef);

    /// Drop one hold taken by [`grant_access`](Self::grant_access) on this
    /// thread. The field stays relaxed while any hold remains.
    fn revoke_access(&self, field: &FieldRef);

    /// Read a field without visibility checks. `instance` is ignored for
    /// static fields.
    fn load(&self, field: &FieldRef, instance: &Value) -> HelperResult<Value>;

    /// Write a field without visibility checks
    fn store(&self, field: &FieldRef, instance: &Value, value: Value) -> HelperResult<()>;
}
