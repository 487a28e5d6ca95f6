//! Class handles.
//!
//! A [`Class`] is a cheap handle over a registered [`ClassEntry`] plus the
//! registry seam needed to navigate virtual inheritance. It is the public
//! construction surface: `create` runs the denial hook, the `__init__`
//! interception stages, and the recorded internal constructor.

use std::fmt;
use std::rc::Rc;

use classforge_core::{
    ClassEntry, ClassKind, ForgeError, Instance, ObjectError, TypeGraph, TypeHash, TypePath, Value,
    find_member,
};

/// A handle to a synthesized class.
#[derive(Clone)]
pub struct Class {
    entry: Rc<ClassEntry>,
    graph: Rc<dyn TypeGraph>,
}

impl Class {
    pub(crate) fn from_parts(entry: Rc<ClassEntry>, graph: Rc<dyn TypeGraph>) -> Self {
        Self { entry, graph }
    }

    /// The simple class name.
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    /// The qualified path.
    pub fn path(&self) -> &TypePath {
        &self.entry.path
    }

    /// The type identity.
    pub fn type_hash(&self) -> TypeHash {
        self.entry.type_hash
    }

    /// The flavor (concrete / abstract / interface).
    pub fn kind(&self) -> ClassKind {
        self.entry.kind
    }

    /// The underlying build metadata.
    pub fn entry(&self) -> &Rc<ClassEntry> {
        &self.entry
    }

    /// Construct an instance from keyword arguments.
    ///
    /// Runs in order: private store creation, the construction-denial hook
    /// (abstract and interface flavors fail here), the `__init__`
    /// interception stages (kwargs travel as one ordered map argument), and
    /// the recorded internal constructor, which delegates leftover kwargs to
    /// the ancestor's internal constructor.
    pub fn create(&self, kwargs: &[(&str, Value)]) -> Result<Instance, ForgeError> {
        let instance = Instance::new(self.entry.clone(), self.graph.clone());

        if let Some(deny) = self.entry.deny_ctor() {
            deny(&self.entry)?;
        }

        let owned: Vec<(String, Value)> = kwargs
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect();

        let stages = self.entry.ctor_stages();
        if stages.is_empty() {
            self.run_internal(&instance, &owned)?;
        } else {
            let packed = [Value::Map(owned)];
            let terminal = |args: &[Value]| -> Result<Value, ForgeError> {
                let kwargs = match args.first() {
                    None => Vec::new(),
                    Some(Value::Map(pairs)) => pairs.clone(),
                    Some(other) => {
                        return Err(ObjectError::TypeConstraint {
                            attribute: "__init__".to_string(),
                            expected: "map".to_string(),
                            actual: other.type_name(),
                        }
                        .into());
                    }
                };
                self.run_internal(&instance, &kwargs)?;
                Ok(Value::Null)
            };
            stages.run("__init__", &packed, &terminal)?;
        }

        Ok(instance)
    }

    fn run_internal(
        &self,
        instance: &Instance,
        kwargs: &[(String, Value)],
    ) -> Result<(), ForgeError> {
        let ctor = self.entry.internal_ctor().ok_or_else(|| {
            ForgeError::from(ObjectError::UnknownAttribute {
                class: self.entry.name.clone(),
                attribute: "__init__".to_string(),
            })
        })?;
        ctor(instance, kwargs)
    }

    /// Call a static member on the class itself. Instance members are not
    /// reachable without a receiver.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, ForgeError> {
        let slot = find_member(&self.entry, self.graph.as_ref(), name)
            .map(|(_owner, slot)| slot)
            .filter(|slot| slot.is_static)
            .ok_or_else(|| {
                ForgeError::from(ObjectError::UnknownAttribute {
                    class: self.entry.name.clone(),
                    attribute: name.to_string(),
                })
            })?;
        (slot.callable)(None, args)
    }

    /// Read a static attribute.
    pub fn get(&self, name: &str) -> Result<Value, ForgeError> {
        self.call(name, &[])
    }

    /// Write a static attribute; returns the stored value.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<Value, ForgeError> {
        self.call(name, &[value.into()])
    }

    /// Check whether this class is, or extends, the other class.
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        let target = other.type_hash();
        let mut current = Some(self.entry.clone());
        while let Some(entry) = current {
            if entry.type_hash == target {
                return true;
            }
            current = entry.ancestor.and_then(|hash| self.graph.entry(hash));
        }
        false
    }

    /// Check whether this class implements the interface, transitively:
    /// through the ancestor chain and through interfaces implementing
    /// interfaces.
    pub fn implements(&self, interface: &Class) -> bool {
        let target = interface.type_hash();

        let mut queue: Vec<TypeHash> = Vec::new();
        let mut current = Some(self.entry.clone());
        while let Some(entry) = current {
            queue.extend(entry.interfaces.iter().copied());
            current = entry.ancestor.and_then(|hash| self.graph.entry(hash));
        }

        let mut visited: Vec<TypeHash> = Vec::new();
        while let Some(hash) = queue.pop() {
            if hash == target {
                return true;
            }
            if visited.contains(&hash) {
                continue;
            }
            visited.push(hash);
            if let Some(entry) = self.graph.entry(hash) {
                queue.extend(entry.interfaces.iter().copied());
            }
        }
        false
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.entry.type_hash == other.entry.type_hash
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({}, {:?})", self.entry.path, self.entry.kind)
    }
}
