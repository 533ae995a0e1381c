//! Thread-scoped access stacks
//!
//! Each woven type owns one [`AccessStack`]. A push records the set of
//! fields a call relaxed; the matching pop hands it back so the relaxation
//! can be reverted. Stacks are keyed by thread, so pushes on one thread are
//! invisible to every other.

use crate::error::{Fatal, FatalResult};
use dashmap::DashMap;
use rustc_hash::FxHashSet;
use std::thread::{self, ThreadId};

use crate::object::FieldRef;

/// Ordered set of fields relaxed together.
///
/// Inserting a `(owner, name)` pair that is already present is a no-op, so
/// one relaxation request never names the same field twice.
#[derive(Debug, Clone, Default)]
pub struct FieldSet {
    fields: Vec<FieldRef>,
    seen: FxHashSet<FieldRef>,
}

impl FieldSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, returning false if it was already present
    pub fn insert(&mut self, field: FieldRef) -> bool {
        if !self.seen.insert(field.clone()) {
            return false;
        }
        self.fields.push(field);
        true
    }

    /// Whether `field` is in the set
    pub fn contains(&self, field: &FieldRef) -> bool {
        self.seen.contains(field)
    }

    /// Number of distinct fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the set has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, FieldRef> {
        self.fields.iter()
    }
}

impl PartialEq for FieldSet {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for FieldSet {}

impl FromIterator<FieldRef> for FieldSet {
    fn from_iter<I: IntoIterator<Item = FieldRef>>(iter: I) -> Self {
        let mut set = FieldSet::new();
        for field in iter {
            set.insert(field);
        }
        set
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = &'a FieldRef;
    type IntoIter = std::slice::Iter<'a, FieldRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Per-thread LIFO stacks of relaxed field sets
pub struct AccessStack {
    /// Only threads with at least one outstanding push have an entry
    stacks: DashMap<ThreadId, Vec<FieldSet>>,
}

impl AccessStack {
    /// Create a stack with no thread storage
    pub fn new() -> Self {
        Self {
            stacks: DashMap::new(),
        }
    }

    /// Push onto the current thread's stack, creating it on first use
    pub fn push(&self, fields: FieldSet) -> usize {
        let mut stack = self.stacks.entry(thread::current().id()).or_default();
        stack.push(fields);
        let depth = stack.len();
        tracing::trace!(depth, "access stack push");
        depth
    }

    /// Pop the current thread's most recent push.
    ///
    /// The thread's entry is removed once its stack is empty.
    pub fn pop(&self) -> FatalResult<FieldSet> {
        let id = thread::current().id();
        let (fields, remaining) = {
            let mut stack = self.stacks.get_mut(&id).ok_or_else(unbalanced)?;
            let fields = stack.pop().ok_or_else(unbalanced)?;
            (fields, stack.len())
        };
        if remaining == 0 {
            self.stacks.remove_if(&id, |_, stack| stack.is_empty());
        }
        tracing::trace!(depth = remaining, "access stack pop");
        Ok(fields)
    }

    /// Most recent push on the current thread
    pub fn peek(&self) -> Option<FieldSet> {
        self.stacks
            .get(&thread::current().id())
            .and_then(|stack| stack.last().cloned())
    }

    /// Outstanding pushes on the current thread
    pub fn depth(&self) -> usize {
        self.stacks
            .get(&thread::current().id())
            .map_or(0, |stack| stack.len())
    }

    /// Whether the current thread holds storage in this stack
    pub fn is_active(&self) -> bool {
        self.stacks.contains_key(&thread::current().id())
    }

    /// Number of threads currently holding storage
    pub fn active_threads(&self) -> usize {
        self.stacks.len()
    }
}

impl Default for AccessStack {
    fn default() -> Self {
        Self::new()
    }
}

fn unbalanced() -> Fatal {
    let current = thread::current();
    Fatal::UnbalancedPop {
        thread: current
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{:?}", current.id())),
    }
}
