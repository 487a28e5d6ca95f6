//! Abstract-contract validation.
//!
//! Abstract classes and interfaces contribute required method names; every
//! concrete descendant must implement all of them before it can be built.
//! The validator walks the full contract graph of a freshly built class -
//! the `extends` edge plus every `implements` edge, transitively - carrying
//! the descendant path nearest-first, and checks each abstract/interface
//! node's required set against the methods the path implements.

use std::rc::Rc;

use classforge_core::{BuildError, ClassEntry};

use crate::registry::ClassRegistry;

/// Validate the contract chain of a class that just finished its member
/// partition. The entry itself is not expected to be registered yet; its
/// ancestors and interfaces are.
pub fn validate_contracts(
    registry: &ClassRegistry,
    entry: &Rc<ClassEntry>,
) -> Result<(), BuildError> {
    let mut descendants: Vec<Rc<ClassEntry>> = Vec::new();
    visit(registry, entry, &mut descendants)
}

fn visit(
    registry: &ClassRegistry,
    node: &Rc<ClassEntry>,
    descendants: &mut Vec<Rc<ClassEntry>>,
) -> Result<(), BuildError> {
    if !descendants.is_empty() && !node.kind.is_concrete() {
        check_node(node, descendants)?;
    }

    descendants.push(node.clone());
    let parents: Vec<_> = node
        .ancestor
        .into_iter()
        .chain(node.interfaces.iter().copied())
        .collect();
    for parent in parents {
        // A missing parent means the chain left the framework; nothing to
        // require there.
        if let Some(parent_entry) = registry.get(parent) {
            visit(registry, &parent_entry, descendants)?;
        }
    }
    descendants.pop();
    Ok(())
}

fn check_node(node: &Rc<ClassEntry>, descendants: &[Rc<ClassEntry>]) -> Result<(), BuildError> {
    let Some(newest) = descendants.first() else {
        return Ok(());
    };

    let mut required = node.abstract_methods.clone();
    for descendant in descendants {
        for name in &descendant.method_names {
            required.remove(name);
        }
    }

    let has_concrete = descendants.iter().any(|d| d.kind.is_concrete());
    if has_concrete && !required.is_empty() {
        let mut missing: Vec<String> = required.into_iter().collect();
        missing.sort();
        return Err(BuildError::UnimplementedAbstractMethods {
            class: newest.name.clone(),
            declared_by: node.name.clone(),
            missing,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use classforge_core::{ClassKind, TypePath};
    use rustc_hash::FxHashSet;

    fn names(items: &[&str]) -> FxHashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn abstract_shape() -> Rc<ClassEntry> {
        Rc::new(
            ClassEntry::new(TypePath::global("Shape"), ClassKind::Abstract)
                .with_abstract_methods(names(&["circumference"])),
        )
    }

    #[test]
    fn concrete_implementing_everything_passes() {
        let mut registry = ClassRegistry::new();
        let shape = abstract_shape();
        let shape_hash = shape.type_hash;
        registry.register(shape).unwrap();

        let quad = Rc::new(
            ClassEntry::new(TypePath::global("Quadrangle"), ClassKind::Concrete)
                .with_ancestor(shape_hash)
                .with_method_names(names(&["circumference"])),
        );
        assert!(validate_contracts(&registry, &quad).is_ok());
    }

    #[test]
    fn concrete_missing_method_fails() {
        let mut registry = ClassRegistry::new();
        let shape = abstract_shape();
        let shape_hash = shape.type_hash;
        registry.register(shape).unwrap();

        let quad = Rc::new(
            ClassEntry::new(TypePath::global("Quadrangle"), ClassKind::Concrete)
                .with_ancestor(shape_hash),
        );
        let err = validate_contracts(&registry, &quad).unwrap_err();
        assert_eq!(
            err,
            BuildError::UnimplementedAbstractMethods {
                class: "Quadrangle".into(),
                declared_by: "Shape".into(),
                missing: vec!["circumference".into()],
            }
        );
    }

    #[test]
    fn abstract_descendant_defers_the_contract() {
        let mut registry = ClassRegistry::new();
        let shape = abstract_shape();
        let shape_hash = shape.type_hash;
        registry.register(shape).unwrap();

        // An abstract class may leave the contract open.
        let polygon = Rc::new(
            ClassEntry::new(TypePath::global("Polygon"), ClassKind::Abstract)
                .with_ancestor(shape_hash),
        );
        assert!(validate_contracts(&registry, &polygon).is_ok());
    }

    #[test]
    fn contract_satisfied_mid_chain() {
        let mut registry = ClassRegistry::new();
        let shape = abstract_shape();
        let shape_hash = shape.type_hash;
        registry.register(shape).unwrap();

        // The abstract middle class implements the method; the concrete leaf
        // inherits the implementation.
        let polygon = Rc::new(
            ClassEntry::new(TypePath::global("Polygon"), ClassKind::Abstract)
                .with_ancestor(shape_hash)
                .with_method_names(names(&["circumference"])),
        );
        let polygon_hash = polygon.type_hash;
        registry.register(polygon).unwrap();

        let square = Rc::new(
            ClassEntry::new(TypePath::global("Square"), ClassKind::Concrete)
                .with_ancestor(polygon_hash),
        );
        assert!(validate_contracts(&registry, &square).is_ok());
    }

    #[test]
    fn interface_contracts_flow_through_implements() {
        let mut registry = ClassRegistry::new();
        let savable = Rc::new(
            ClassEntry::new(TypePath::global("Savable"), ClassKind::Interface)
                .with_abstract_methods(names(&["save"])),
        );
        let savable_hash = savable.type_hash;
        registry.register(savable).unwrap();

        let safe = Rc::new(
            ClassEntry::new(TypePath::global("ISafe"), ClassKind::Interface)
                .with_interfaces(vec![savable_hash]),
        );
        let safe_hash = safe.type_hash;
        registry.register(safe).unwrap();

        let good = Rc::new(
            ClassEntry::new(TypePath::global("SafeClass"), ClassKind::Concrete)
                .with_interfaces(vec![safe_hash])
                .with_method_names(names(&["save"])),
        );
        assert!(validate_contracts(&registry, &good).is_ok());

        let bad = Rc::new(
            ClassEntry::new(TypePath::global("UnsafeClass"), ClassKind::Concrete)
                .with_interfaces(vec![safe_hash]),
        );
        let err = validate_contracts(&registry, &bad).unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnimplementedAbstractMethods { declared_by, .. } if declared_by == "Savable"
        ));
    }

    #[test]
    fn several_missing_methods_are_sorted() {
        let mut registry = ClassRegistry::new();
        let shape = Rc::new(
            ClassEntry::new(TypePath::global("Shape"), ClassKind::Abstract)
                .with_abstract_methods(names(&["circumference", "area"])),
        );
        let shape_hash = shape.type_hash;
        registry.register(shape).unwrap();

        let quad = Rc::new(
            ClassEntry::new(TypePath::global("Quadrangle"), ClassKind::Concrete)
                .with_ancestor(shape_hash),
        );
        let err = validate_contracts(&registry, &quad).unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnimplementedAbstractMethods { missing, .. }
                if missing == vec!["area".to_string(), "circumference".to_string()]
        ));
    }
}
