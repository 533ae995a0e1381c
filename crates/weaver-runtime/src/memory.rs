//! In-memory object heap
//!
//! A small [`ObjectModel`] with classes, objects and per-thread
//! accessibility holds.
//! Hosts without a real object model and the test suites run woven helpers
//! against it.

use crate::error::{HelperResult, Recoverable};
use crate::object::{FieldRef, Modifiers, ObjectId, ObjectModel, Value};
use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

#[derive(Debug, Clone)]
struct ClassLayout {
    fields: FxHashMap<String, Modifiers>,
}

#[derive(Debug)]
struct Object {
    class: String,
    slots: FxHashMap<String, Value>,
}

/// Heap of classes and objects
pub struct MemoryHeap {
    classes: RwLock<FxHashMap<String, ClassLayout>>,
    objects: DashMap<ObjectId, Object>,
    statics: DashMap<FieldRef, Value>,
    /// Relaxation holds per thread. Entries are removed at zero.
    accessible: DashMap<(ThreadId, FieldRef), usize>,
    next_id: AtomicU64,
}

impl MemoryHeap {
    /// Create an empty heap
    pub fn new() -> Self {
        Self {
            classes: RwLock::new(FxHashMap::default()),
            objects: DashMap::new(),
            statics: DashMap::new(),
            accessible: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a class and its declared fields. Static fields start null.
    pub fn define_class(&self, name: &str, fields: &[(&str, Modifiers)]) {
        let mut layout = ClassLayout {
            fields: FxHashMap::default(),
        };
        for (field, modifiers) in fields {
            layout.fields.insert(field.to_string(), *modifiers);
            if modifiers.is_static() {
                self.statics.insert(FieldRef::new(name, *field), Value::Null);
            }
        }
        self.classes.write().insert(name.to_string(), layout);
    }

    /// Allocate an instance with every instance field null
    pub fn instantiate(&self, class: &str) -> HelperResult<ObjectId> {
        let slots = {
            let classes = self.classes.read();
            let layout = classes.get(class).ok_or_else(|| Recoverable::NoSuchClass {
                name: class.to_string(),
            })?;
            layout
                .fields
                .iter()
                .filter(|(_, m)| !m.is_static())
                .map(|(name, _)| (name.clone(), Value::Null))
                .collect()
        };
        let id = ObjectId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.objects.insert(
            id,
            Object {
                class: class.to_string(),
                slots,
            },
        );
        Ok(id)
    }

    /// Class an object was instantiated from
    pub fn class_of(&self, id: ObjectId) -> Option<String> {
        self.objects.get(&id).map(|obj| obj.class.clone())
    }

    /// Number of fields the current thread holds relaxed
    pub fn accessible_count(&self) -> usize {
        let id = thread::current().id();
        self.accessible
            .iter()
            .filter(|entry| entry.key().0 == id)
            .count()
    }

    fn instance_id(field: &FieldRef, instance: &Value) -> HelperResult<ObjectId> {
        match instance {
            Value::Ref(id) => Ok(*id),
            other => Err(Recoverable::WrongType {
                expected: format!("instance of {}", field.owner),
                got: other.kind().to_string(),
            }
            .into()),
        }
    }
}

impl Default for MemoryHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectModel for MemoryHeap {
    fn declared_field(&self, owner: &str, name: &str) -> HelperResult<FieldRef> {
        let classes = self.classes.read();
        let layout = classes.get(owner).ok_or_else(|| Recoverable::NoSuchClass {
            name: owner.to_string(),
        })?;
        if !layout.fields.contains_key(name) {
            return Err(Recoverable::NoSuchField {
                owner: owner.to_string(),
                name: name.to_string(),
            }
            .into());
        }
        Ok(FieldRef::new(owner, name))
    }

    fn modifiers(&self, field: &FieldRef) -> HelperResult<Modifiers> {
        self.classes
            .read()
            .get(&field.owner)
            .and_then(|layout| layout.fields.get(&field.name).copied())
            .ok_or_else(|| {
                Recoverable::NoSuchField {
                    owner: field.owner.clone(),
                    name: field.name.clone(),
                }
                .into()
            })
    }

    fn is_accessible(&self, field: &FieldRef) -> bool {
        self.accessible
            .contains_key(&(thread::current().id(), field.clone()))
    }

    fn grant_access(&self, field: &FieldRef) {
        *self
            .accessible
            .entry((thread::current().id(), field.clone()))
            .or_insert(0) += 1;
    }

    fn revoke_access(&self, field: &FieldRef) {
        let key = (thread::current().id(), field.clone());
        if let Some(mut holds) = self.accessible.get_mut(&key) {
            *holds = holds.saturating_sub(1);
        }
        self.accessible.remove_if(&key, |_, holds| *holds == 0);
    }

    fn load(&self, field: &FieldRef, instance: &Value) -> HelperResult<Value> {
        if self.modifiers(field)?.is_static() {
            return Ok(self
                .statics
                .get(field)
                .map(|v| v.clone())
                .unwrap_or(Value::Null));
        }
        let id = Self::instance_id(field, instance)?;
        let obj = self
            .objects
            .get(&id)
            .ok_or(Recoverable::NoSuchObject { id: id.0 })?;
        match obj.slots.get(&field.name) {
            Some(value) if obj.class == field.owner => Ok(value.clone()),
            _ => Err(Recoverable::WrongType {
                expected: format!("instance of {}", field.owner),
                got: format!("instance of {}", obj.class),
            }
            .into()),
        }
    }

    fn store(&self, field: &FieldRef, instance: &Value, value: Value) -> HelperResult<()> {
        if self.modifiers(field)?.is_static() {
            self.statics.insert(field.clone(), value);
            return Ok(());
        }
        let id = Self::instance_id(field, instance)?;
        let mut obj = self
            .objects
            .get_mut(&id)
            .ok_or(Recoverable::NoSuchObject { id: id.0 })?;
        if obj.class != field.owner {
            return Err(Recoverable::WrongType {
                expected: format!("instance of {}", field.owner),
                got: format!("instance of {}", obj.class),
            }
            .into());
        }
        obj.slots.insert(field.name.clone(), value);
        Ok(())
    }
}
