//! ClassRegistry - engine-wide storage of synthesized class metadata.
//!
//! This module provides [`ClassRegistry`], the map from type identity to
//! [`ClassEntry`] that makes virtual (non-native) inheritance navigable:
//! the generated constructors, member lookup, and the contract validator all
//! walk ancestry through it instead of relying on any language-level
//! inheritance.
//!
//! # Thread Safety
//!
//! `ClassRegistry` is **not** thread-safe by design. The usage pattern is:
//!
//! - **Registration phase**: classes are defined single-threaded during
//!   program initialization, each build appending one entry.
//! - **Use phase**: afterwards the registry is effectively read-only;
//!   instantiation and attribute access only perform lookups.
//!
//! The registry is shared as [`SharedRegistry`] (`Rc<RefCell<_>>`), which is
//! `!Send` and keeps the single-threaded contract unrepresentable to break.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use classforge_core::{BuildError, ClassEntry, TypeGraph, TypeHash, TypePath};

/// Engine-wide map from type identity to build metadata.
#[derive(Default)]
pub struct ClassRegistry {
    entries: FxHashMap<TypeHash, Rc<ClassEntry>>,
}

/// Shared handle to a registry: single-threaded, interior-mutable during the
/// registration phase only.
pub type SharedRegistry = Rc<RefCell<ClassRegistry>>;

impl ClassRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared handle to a fresh registry.
    pub fn shared() -> SharedRegistry {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Register a synthesized class.
    ///
    /// Fails if an entry with the same qualified name (and therefore the
    /// same hash) is already recorded.
    pub fn register(&mut self, entry: Rc<ClassEntry>) -> Result<(), BuildError> {
        if self.entries.contains_key(&entry.type_hash) {
            return Err(BuildError::DuplicateClass(entry.path.to_string()));
        }
        self.entries.insert(entry.type_hash, entry);
        Ok(())
    }

    /// Look up an entry by type identity.
    pub fn get(&self, hash: TypeHash) -> Option<Rc<ClassEntry>> {
        self.entries.get(&hash).cloned()
    }

    /// Look up an entry by qualified path.
    pub fn get_by_path(&self, path: &TypePath) -> Option<Rc<ClassEntry>> {
        self.get(path.to_type_hash())
    }

    /// Look up an entry by dotted name.
    pub fn get_by_name(&self, name: &str) -> Option<Rc<ClassEntry>> {
        self.get(TypeHash::from_name(name))
    }

    /// Check whether a type is registered.
    pub fn contains(&self, hash: TypeHash) -> bool {
        self.entries.contains_key(&hash)
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check for an empty registry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all registered entries.
    pub fn classes(&self) -> impl Iterator<Item = &Rc<ClassEntry>> {
        self.entries.values()
    }

    /// The ancestor chain of a type, nearest-first, excluding the type
    /// itself.
    pub fn ancestor_chain(&self, hash: TypeHash) -> Vec<Rc<ClassEntry>> {
        let mut chain = Vec::new();
        let mut current = self
            .entries
            .get(&hash)
            .and_then(|entry| entry.ancestor);
        while let Some(ancestor) = current {
            match self.entries.get(&ancestor) {
                Some(entry) => {
                    chain.push(entry.clone());
                    current = entry.ancestor;
                }
                None => break,
            }
        }
        chain
    }

    /// Check whether `hash` is `ancestor` or extends it.
    pub fn is_subclass(&self, hash: TypeHash, ancestor: TypeHash) -> bool {
        if hash == ancestor {
            return true;
        }
        self.ancestor_chain(hash)
            .iter()
            .any(|entry| entry.type_hash == ancestor)
    }

    /// Check whether `hash` implements `interface`, transitively: through
    /// the ancestor chain and through interfaces implementing interfaces.
    pub fn implements(&self, hash: TypeHash, interface: TypeHash) -> bool {
        let mut queue: Vec<TypeHash> = Vec::new();
        if let Some(entry) = self.get(hash) {
            queue.extend(entry.interfaces.iter().copied());
        }
        for entry in self.ancestor_chain(hash) {
            queue.extend(entry.interfaces.iter().copied());
        }

        let mut visited: Vec<TypeHash> = Vec::new();
        while let Some(current) = queue.pop() {
            if current == interface {
                return true;
            }
            if visited.contains(&current) {
                continue;
            }
            visited.push(current);
            if let Some(entry) = self.get(current) {
                queue.extend(entry.interfaces.iter().copied());
            }
        }
        false
    }
}

impl TypeGraph for ClassRegistry {
    fn entry(&self, hash: TypeHash) -> Option<Rc<ClassEntry>> {
        self.get(hash)
    }
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classforge_core::ClassKind;

    fn entry(name: &str, kind: ClassKind) -> ClassEntry {
        ClassEntry::new(TypePath::from_dotted(name), kind)
    }

    #[test]
    fn new_registry_is_empty() {
        let registry = ClassRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = ClassRegistry::new();
        let person = Rc::new(entry("Person", ClassKind::Concrete));
        let hash = person.type_hash;
        registry.register(person).unwrap();

        assert!(registry.contains(hash));
        assert!(registry.get_by_name("Person").is_some());
        assert!(registry.get_by_name("Ghost").is_none());
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = ClassRegistry::new();
        registry
            .register(Rc::new(entry("Person", ClassKind::Concrete)))
            .unwrap();
        let result = registry.register(Rc::new(entry("Person", ClassKind::Concrete)));
        assert_eq!(result, Err(BuildError::DuplicateClass("Person".into())));
    }

    #[test]
    fn ancestor_chain_order() {
        let mut registry = ClassRegistry::new();
        let vehicle = Rc::new(entry("Vehicle", ClassKind::Concrete));
        let vehicle_hash = vehicle.type_hash;
        registry.register(vehicle).unwrap();

        let car = Rc::new(entry("Car", ClassKind::Concrete).with_ancestor(vehicle_hash));
        let car_hash = car.type_hash;
        registry.register(car).unwrap();

        let sports = Rc::new(entry("SportsCar", ClassKind::Concrete).with_ancestor(car_hash));
        let sports_hash = sports.type_hash;
        registry.register(sports).unwrap();

        let chain = registry.ancestor_chain(sports_hash);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].name, "Car");
        assert_eq!(chain[1].name, "Vehicle");

        assert!(registry.is_subclass(sports_hash, vehicle_hash));
        assert!(registry.is_subclass(sports_hash, sports_hash));
        assert!(!registry.is_subclass(vehicle_hash, sports_hash));
    }

    #[test]
    fn implements_is_transitive() {
        let mut registry = ClassRegistry::new();
        let savable = Rc::new(entry("Savable", ClassKind::Interface));
        let savable_hash = savable.type_hash;
        registry.register(savable).unwrap();

        let safe = Rc::new(
            entry("ISafe", ClassKind::Interface).with_interfaces(vec![savable_hash]),
        );
        let safe_hash = safe.type_hash;
        registry.register(safe).unwrap();

        let class = Rc::new(
            entry("SafeClass", ClassKind::Concrete).with_interfaces(vec![safe_hash]),
        );
        let class_hash = class.type_hash;
        registry.register(class).unwrap();

        assert!(registry.implements(class_hash, safe_hash));
        assert!(registry.implements(class_hash, savable_hash));
        assert!(!registry.implements(savable_hash, class_hash));
    }

    #[test]
    fn implements_searches_ancestors() {
        let mut registry = ClassRegistry::new();
        let drawable = Rc::new(entry("Drawable", ClassKind::Interface));
        let drawable_hash = drawable.type_hash;
        registry.register(drawable).unwrap();

        let base = Rc::new(
            entry("Widget", ClassKind::Concrete).with_interfaces(vec![drawable_hash]),
        );
        let base_hash = base.type_hash;
        registry.register(base).unwrap();

        let button = Rc::new(entry("Button", ClassKind::Concrete).with_ancestor(base_hash));
        let button_hash = button.type_hash;
        registry.register(button).unwrap();

        assert!(registry.implements(button_hash, drawable_hash));
    }

    #[test]
    fn type_graph_seam_resolves_entries() {
        let shared = ClassRegistry::shared();
        let person = Rc::new(entry("Person", ClassKind::Concrete));
        let hash = person.type_hash;
        shared.borrow_mut().register(person).unwrap();

        let graph: Rc<dyn TypeGraph> = shared.clone();
        assert!(graph.entry(hash).is_some());
        assert!(graph.entry(TypeHash::from_name("Ghost")).is_none());
    }

    #[test]
    fn debug_impl() {
        let registry = ClassRegistry::new();
        assert!(format!("{registry:?}").contains("ClassRegistry"));
    }
}
