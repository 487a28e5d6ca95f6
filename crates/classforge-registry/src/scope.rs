//! Scope tables and deferred type resolution.
//!
//! A [`ScopeTable`] maps names to types or nested namespaces, replacing the
//! original engine's call-frame introspection with an explicit, deterministic
//! lookup structure: the engine owns a global table, and a class description
//! may carry its own lexical table.
//!
//! [`ResolveCtx`] captures everything a descriptor needs to resolve a name
//! constraint at first use, long after the declaring class finished building.
//! Resolution order is strict precedence, first match wins:
//!
//! 1. exact match against the "currently defining" class name;
//! 2. dotted-path search of the declaring lexical scope;
//! 3. dotted-path search of the global scope;
//! 4. the name qualified under the declaring namespace, in the global scope.
//!
//! A match that lands on a namespace is a [`ResolveError::ModuleReference`];
//! no match at all is a [`ResolveError::UnknownType`].

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use classforge_core::{ResolveError, TypeConstraint, TypeHash, TypePath, primitives};

/// What a scope name is bound to.
#[derive(Debug, Clone)]
pub enum Binding {
    /// A concrete type.
    Type(TypeHash),
    /// A nested namespace.
    Module(ScopeTable),
}

/// A name → binding table with dotted-path traversal.
#[derive(Debug, Clone, Default)]
pub struct ScopeTable {
    bindings: FxHashMap<String, Binding>,
}

/// Shared handle to the engine's global scope.
pub type SharedScope = Rc<RefCell<ScopeTable>>;

impl ScopeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the built-in value kinds bound under their
    /// spelled-out names (`int`, `str`, ...).
    pub fn with_primitives() -> Self {
        let mut table = Self::new();
        for (name, hash) in primitives::ALL {
            table.bind_type(name, hash);
        }
        table
    }

    /// Bind a name to a type.
    pub fn bind_type(&mut self, name: impl Into<String>, hash: TypeHash) {
        self.bindings.insert(name.into(), Binding::Type(hash));
    }

    /// Bind a name to a nested namespace table.
    pub fn bind_module(&mut self, name: impl Into<String>, table: ScopeTable) {
        self.bindings.insert(name.into(), Binding::Module(table));
    }

    /// Bind a qualified path, creating intermediate namespace tables as
    /// needed. A type binding in the way of a namespace segment is replaced.
    pub fn bind_path(&mut self, path: &TypePath, hash: TypeHash) {
        let mut table = self;
        for segment in path.namespace_path() {
            let slot = table
                .bindings
                .entry(segment.clone())
                .or_insert_with(|| Binding::Module(ScopeTable::new()));
            if let Binding::Type(_) = slot {
                *slot = Binding::Module(ScopeTable::new());
            }
            table = match slot {
                Binding::Module(inner) => inner,
                Binding::Type(_) => return,
            };
        }
        table
            .bindings
            .insert(path.simple_name().to_string(), Binding::Type(hash));
    }

    /// Look up a single segment.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Look up a dotted path, descending through namespace bindings. A type
    /// binding hit before the last segment ends the search.
    pub fn lookup_path(&self, dotted: &str) -> Option<&Binding> {
        let mut segments = dotted.split('.');
        let mut current = self.bindings.get(segments.next()?)?;
        for segment in segments {
            match current {
                Binding::Module(table) => current = table.bindings.get(segment)?,
                Binding::Type(_) => return None,
            }
        }
        Some(current)
    }

    /// Number of direct bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check for an empty table.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

fn binding_type(binding: &Binding, name: &str) -> Result<TypeHash, ResolveError> {
    match binding {
        Binding::Type(hash) => Ok(*hash),
        Binding::Module(_) => Err(ResolveError::ModuleReference(name.to_string())),
    }
}

/// The resolution context a class captures at build time.
///
/// Cloned into every generated accessor; name constraints resolve against it
/// on first use, which is what makes self-referential and forward-declared
/// constraints work.
#[derive(Clone)]
pub struct ResolveCtx {
    /// Simple name of the class being defined (the self marker).
    pub self_name: String,
    /// Identity of the class being defined.
    pub self_hash: TypeHash,
    /// The declaring lexical scope, if the description carried one.
    pub lexical: Option<Rc<ScopeTable>>,
    /// The engine's global scope.
    pub globals: SharedScope,
    /// The declaring namespace segments (empty for global).
    pub namespace: Vec<String>,
}

impl ResolveCtx {
    /// Resolve a constraint to a concrete type identity.
    ///
    /// Returns `Ok(None)` for the unconstrained `Any` case.
    pub fn resolve(&self, constraint: &TypeConstraint) -> Result<Option<TypeHash>, ResolveError> {
        match constraint {
            TypeConstraint::Any => Ok(None),
            TypeConstraint::SelfType => Ok(Some(self.self_hash)),
            TypeConstraint::Exact(hash) => Ok(Some(*hash)),
            TypeConstraint::Named(name) => self.resolve_name(name).map(Some),
        }
    }

    /// Resolve a dotted name through the precedence chain.
    pub fn resolve_name(&self, name: &str) -> Result<TypeHash, ResolveError> {
        if name == self.self_name {
            return Ok(self.self_hash);
        }

        if let Some(lexical) = &self.lexical
            && let Some(binding) = lexical.lookup_path(name)
        {
            return binding_type(binding, name);
        }

        let globals = self.globals.borrow();
        if let Some(binding) = globals.lookup_path(name) {
            return binding_type(binding, name);
        }

        if !self.namespace.is_empty() {
            let qualified = format!("{}.{}", self.namespace.join("."), name);
            if let Some(binding) = globals.lookup_path(&qualified) {
                return binding_type(binding, &qualified);
            }
        }

        Err(ResolveError::UnknownType(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(globals: ScopeTable) -> ResolveCtx {
        ResolveCtx {
            self_name: "Node".into(),
            self_hash: TypeHash::from_name("Node"),
            lexical: None,
            globals: Rc::new(RefCell::new(globals)),
            namespace: Vec::new(),
        }
    }

    #[test]
    fn primitives_are_bound() {
        let table = ScopeTable::with_primitives();
        assert!(matches!(
            table.lookup("int"),
            Some(Binding::Type(hash)) if *hash == primitives::INT
        ));
    }

    #[test]
    fn bind_path_creates_namespaces() {
        let mut table = ScopeTable::new();
        let shape = TypeHash::from_name("geom.Shape");
        table.bind_path(&TypePath::from_dotted("geom.Shape"), shape);

        assert!(matches!(table.lookup("geom"), Some(Binding::Module(_))));
        assert!(matches!(
            table.lookup_path("geom.Shape"),
            Some(Binding::Type(hash)) if *hash == shape
        ));
        assert!(table.lookup_path("geom.Circle").is_none());
    }

    #[test]
    fn lookup_path_stops_at_type_binding() {
        let mut table = ScopeTable::new();
        table.bind_type("Shape", TypeHash::from_name("Shape"));
        assert!(table.lookup_path("Shape.inner").is_none());
    }

    #[test]
    fn self_name_wins() {
        let mut globals = ScopeTable::new();
        // A global with the same name would otherwise shadow the self marker.
        globals.bind_type("Node", TypeHash::from_name("other.Node"));
        let ctx = ctx(globals);

        let resolved = ctx.resolve_name("Node").unwrap();
        assert_eq!(resolved, TypeHash::from_name("Node"));
    }

    #[test]
    fn lexical_scope_precedes_globals() {
        let mut globals = ScopeTable::new();
        globals.bind_type("Shape", TypeHash::from_name("global.Shape"));
        let mut lexical = ScopeTable::new();
        lexical.bind_type("Shape", TypeHash::from_name("local.Shape"));

        let mut ctx = ctx(globals);
        ctx.lexical = Some(Rc::new(lexical));

        assert_eq!(
            ctx.resolve_name("Shape").unwrap(),
            TypeHash::from_name("local.Shape")
        );
    }

    #[test]
    fn namespace_fallback_resolves_siblings() {
        let mut globals = ScopeTable::new();
        let circle = TypeHash::from_name("geom.Circle");
        globals.bind_path(&TypePath::from_dotted("geom.Circle"), circle);

        let mut ctx = ctx(globals);
        ctx.namespace = vec!["geom".into()];

        assert_eq!(ctx.resolve_name("Circle").unwrap(), circle);
    }

    #[test]
    fn module_landing_is_an_error() {
        let mut globals = ScopeTable::new();
        globals.bind_path(
            &TypePath::from_dotted("geom.Shape"),
            TypeHash::from_name("geom.Shape"),
        );
        let ctx = ctx(globals);

        assert_eq!(
            ctx.resolve_name("geom"),
            Err(ResolveError::ModuleReference("geom".into()))
        );
    }

    #[test]
    fn unknown_name_is_an_error() {
        let ctx = ctx(ScopeTable::new());
        assert_eq!(
            ctx.resolve_name("Ghost"),
            Err(ResolveError::UnknownType("Ghost".into()))
        );
    }

    #[test]
    fn any_resolves_to_unconstrained() {
        let ctx = ctx(ScopeTable::new());
        assert_eq!(ctx.resolve(&TypeConstraint::Any), Ok(None));
        assert_eq!(
            ctx.resolve(&TypeConstraint::SelfType),
            Ok(Some(TypeHash::from_name("Node")))
        );
    }
}
