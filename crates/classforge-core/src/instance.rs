//! Instances of synthesized classes.
//!
//! An [`Instance`] is a cheap shared handle over a private store plus the
//! class entry it was built from. The store is only ever mutated through the
//! generated accessors; callers go through the unified accessor convention
//! (`call` with zero arguments reads, one argument writes).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::entries::{ClassEntry, TypeGraph, find_member};
use crate::error::{ForgeError, ObjectError};
use crate::type_hash::TypeHash;
use crate::value::Value;

/// Attribute storage: slot values plus the write-once latches of final
/// attributes. The same shape backs an instance's private store and a class's
/// static store.
#[derive(Debug, Default)]
pub struct AttrStore {
    /// Stored slot values.
    pub values: FxHashMap<String, Value>,
    /// Names whose final latch has fired.
    pub finalized: FxHashSet<String>,
}

struct InstanceInner {
    entry: Rc<ClassEntry>,
    graph: Rc<dyn TypeGraph>,
    store: RefCell<AttrStore>,
}

/// A constructed object. Clones share the same private store; equality is
/// identity.
#[derive(Clone)]
pub struct Instance {
    inner: Rc<InstanceInner>,
}

impl Instance {
    /// Create a blank instance of a class. Used by generated constructors;
    /// going through this directly bypasses required-attribute enforcement.
    pub fn new(entry: Rc<ClassEntry>, graph: Rc<dyn TypeGraph>) -> Self {
        Self {
            inner: Rc::new(InstanceInner {
                entry,
                graph,
                store: RefCell::new(AttrStore::default()),
            }),
        }
    }

    /// The class entry this instance was built from.
    pub fn entry(&self) -> &Rc<ClassEntry> {
        &self.inner.entry
    }

    /// The registry handle used for chain navigation.
    pub fn graph(&self) -> &Rc<dyn TypeGraph> {
        &self.inner.graph
    }

    /// The private store. Exposed for generated accessors; everything else
    /// should go through [`Instance::call`].
    pub fn store(&self) -> &RefCell<AttrStore> {
        &self.inner.store
    }

    /// The simple name of this instance's class.
    pub fn class_name(&self) -> &str {
        &self.inner.entry.name
    }

    /// The type identity of this instance's class.
    pub fn class_hash(&self) -> TypeHash {
        self.inner.entry.type_hash
    }

    /// Call a member through the unified accessor convention.
    ///
    /// Zero arguments read an attribute, one argument writes it; methods take
    /// whatever they take. The member is located by walking the ancestor
    /// chain nearest-first; static members found anywhere on the chain are
    /// callable here too and share the class slot.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, ForgeError> {
        let (_owner, slot) =
            find_member(&self.inner.entry, self.inner.graph.as_ref(), name).ok_or_else(|| {
                ObjectError::UnknownAttribute {
                    class: self.class_name().to_string(),
                    attribute: name.to_string(),
                }
            })?;
        let receiver = if slot.is_static { None } else { Some(self) };
        (slot.callable)(receiver, args)
    }

    /// Read an attribute (`call` with zero arguments).
    pub fn get(&self, name: &str) -> Result<Value, ForgeError> {
        self.call(name, &[])
    }

    /// Write an attribute (`call` with one argument); returns the stored,
    /// possibly transformed, value.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<Value, ForgeError> {
        self.call(name, &[value.into()])
    }

    /// Check whether this instance's class is, or extends, the given type.
    /// Interfaces are not considered; use the class-level implements query
    /// for those.
    pub fn is_instance_of(&self, target: TypeHash) -> bool {
        let mut current = Some(self.inner.entry.clone());
        while let Some(entry) = current {
            if entry.type_hash == target {
                return true;
            }
            current = entry
                .ancestor
                .and_then(|hash| self.inner.graph.entry(hash));
        }
        false
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", self.inner.entry.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::{ClassKind, MemberKind, MemberSlot};
    use crate::type_path::TypePath;

    struct EmptyGraph;

    impl TypeGraph for EmptyGraph {
        fn entry(&self, _hash: TypeHash) -> Option<Rc<ClassEntry>> {
            None
        }
    }

    fn person_entry() -> Rc<ClassEntry> {
        Rc::new(ClassEntry::new(TypePath::global("Person"), ClassKind::Concrete))
    }

    #[test]
    fn clones_share_identity() {
        let instance = Instance::new(person_entry(), Rc::new(EmptyGraph));
        let alias = instance.clone();
        assert!(instance.ptr_eq(&alias));
        assert_eq!(instance, alias);

        let other = Instance::new(person_entry(), Rc::new(EmptyGraph));
        assert_ne!(instance, other);
    }

    #[test]
    fn unknown_member_call_fails() {
        let instance = Instance::new(person_entry(), Rc::new(EmptyGraph));
        let err = instance.call("missing", &[]).unwrap_err();
        assert_eq!(
            err,
            ForgeError::from(ObjectError::UnknownAttribute {
                class: "Person".into(),
                attribute: "missing".into(),
            })
        );
    }

    #[test]
    fn call_routes_receiver_to_instance_members() {
        let entry = person_entry();
        entry.set_member(
            "probe",
            MemberSlot {
                kind: MemberKind::Method,
                is_static: false,
                callable: Rc::new(|receiver, _args| {
                    Ok(Value::Bool(receiver.is_some()))
                }),
            },
        );
        let instance = Instance::new(entry, Rc::new(EmptyGraph));
        assert_eq!(instance.call("probe", &[]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn call_strips_receiver_for_static_members() {
        let entry = person_entry();
        entry.set_member(
            "probe",
            MemberSlot {
                kind: MemberKind::Method,
                is_static: true,
                callable: Rc::new(|receiver, _args| {
                    Ok(Value::Bool(receiver.is_some()))
                }),
            },
        );
        let instance = Instance::new(entry, Rc::new(EmptyGraph));
        assert_eq!(instance.call("probe", &[]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn is_instance_of_self() {
        let entry = person_entry();
        let hash = entry.type_hash;
        let instance = Instance::new(entry, Rc::new(EmptyGraph));
        assert!(instance.is_instance_of(hash));
        assert!(!instance.is_instance_of(TypeHash::from_name("Vehicle")));
    }
}
