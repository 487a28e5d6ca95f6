//! The engine facade.
//!
//! An [`Engine`] owns the process-wide pieces of the system: the class
//! registry, the global scope table, and the build diagnostics. All class
//! definitions go through it, sequentially, during an initialization phase;
//! afterwards the registry and scope are effectively read-only.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use classforge_core::{ClassKind, Diagnostics, ForgeError, TypeGraph};
use classforge_registry::{ClassRegistry, ScopeTable, SharedRegistry, SharedScope};

use crate::builder::build_class;
use crate::class::Class;
use crate::schema::ClassSchema;

/// The classforge engine.
pub struct Engine {
    pub(crate) registry: SharedRegistry,
    pub(crate) scope: SharedScope,
    pub(crate) diagnostics: Diagnostics,
}

impl Engine {
    /// Create an engine with an empty registry and the built-in value kinds
    /// bound in the global scope.
    pub fn new() -> Self {
        Self {
            registry: ClassRegistry::shared(),
            scope: Rc::new(RefCell::new(ScopeTable::with_primitives())),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Synthesize a concrete class from a description.
    pub fn define(&mut self, schema: ClassSchema) -> Result<Class, ForgeError> {
        build_class(self, schema, ClassKind::Concrete)
    }

    /// Synthesize an abstract class: extendable, not instantiable. Abstract
    /// method markers are permitted in the description.
    pub fn define_abstract(&mut self, schema: ClassSchema) -> Result<Class, ForgeError> {
        build_class(self, schema, ClassKind::Abstract)
    }

    /// Synthesize an interface: implementable, not extendable, not
    /// instantiable. Every member must be an abstract method marker.
    pub fn define_interface(&mut self, schema: ClassSchema) -> Result<Class, ForgeError> {
        build_class(self, schema, ClassKind::Interface)
    }

    /// Look up a previously defined class by dotted name.
    pub fn class(&self, name: &str) -> Option<Class> {
        let entry = self.registry.borrow().get_by_name(name)?;
        Some(Class::from_parts(entry, self.graph()))
    }

    /// Bind an extra alias for a class in the global scope.
    pub fn bind(&mut self, name: impl Into<String>, class: &Class) {
        self.scope
            .borrow_mut()
            .bind_type(name, class.type_hash());
    }

    /// The shared registry handle.
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// The shared global scope handle.
    pub fn scope(&self) -> &SharedScope {
        &self.scope
    }

    /// Diagnostics accumulated across builds.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub(crate) fn graph(&self) -> Rc<dyn TypeGraph> {
        self.registry.clone()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("classes", &self.registry.borrow().len())
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}
