//! Ordering of parameter signatures
//!
//! Used to sort and key overloads of the same method name.

use crate::model::TypeRef;
use std::cmp::Ordering;

/// Compare two parameter lists position by position on full type names.
/// When one list is a prefix of the other, the shorter one is less.
pub fn compare_params(a: &[TypeRef], b: &[TypeRef]) -> Ordering {
    for (left, right) in a.iter().zip(b) {
        match left.name.cmp(&right.name) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// A parameter list ordered by [`compare_params`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ParamSignature(pub Vec<TypeRef>);

impl ParamSignature {
    /// Signature over a copy of `params`
    pub fn new(params: &[TypeRef]) -> Self {
        Self(params.to_vec())
    }

    /// Parameter types in order
    pub fn as_slice(&self) -> &[TypeRef] {
        &self.0
    }
}

impl Ord for ParamSignature {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_params(&self.0, &other.0)
    }
}

impl PartialOrd for ParamSignature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
