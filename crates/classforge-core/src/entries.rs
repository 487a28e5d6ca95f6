//! Class build metadata.
//!
//! A [`ClassEntry`] is the registry-recorded result of synthesizing one
//! class: its identity, inheritance wiring, contract sets, the generated
//! member callables, the static store, and the internal constructor that
//! descendants invoke directly when delegating construction upward.
//!
//! Entries are created once during the build phase and are semantically
//! immutable afterwards; the `RefCell` fields exist only because the member
//! closures need a handle to their own entry while it is being populated.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::descriptor::AttrSpec;
use crate::error::ForgeError;
use crate::instance::{AttrStore, Instance};
use crate::interceptor::InterceptStages;
use crate::type_hash::{TypeHash, primitives};
use crate::type_path::TypePath;
use crate::value::Value;

/// Navigation seam over the class registry.
///
/// Generated members and instances hold `Rc<dyn TypeGraph>` so the core data
/// model can walk virtual-inheritance chains without depending on the
/// registry crate.
pub trait TypeGraph {
    /// Look up a registered entry by type identity.
    fn entry(&self, hash: TypeHash) -> Option<Rc<ClassEntry>>;
}

impl<T: TypeGraph + ?Sized> TypeGraph for RefCell<T> {
    fn entry(&self, hash: TypeHash) -> Option<Rc<ClassEntry>> {
        self.borrow().entry(hash)
    }
}

/// The flavor of a synthesized type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    /// Instantiable, extendable.
    Concrete,
    /// Extendable, not instantiable, not implementable.
    Abstract,
    /// Implementable, not instantiable, not extendable.
    Interface,
}

impl ClassKind {
    /// Check for the concrete flavor.
    pub fn is_concrete(self) -> bool {
        matches!(self, ClassKind::Concrete)
    }

    /// Check for the abstract flavor.
    pub fn is_abstract(self) -> bool {
        matches!(self, ClassKind::Abstract)
    }

    /// Check for the interface flavor.
    pub fn is_interface(self) -> bool {
        matches!(self, ClassKind::Interface)
    }

    /// Human-readable flavor name for error messages.
    pub fn describe(self) -> &'static str {
        match self {
            ClassKind::Concrete => "class",
            ClassKind::Abstract => "abstract class",
            ClassKind::Interface => "interface",
        }
    }
}

/// A generated member callable.
///
/// The receiver is `Some` for instance members and `None` for statics;
/// interceptors never see it either way.
pub type MemberFn = Rc<dyn Fn(Option<&Instance>, &[Value]) -> Result<Value, ForgeError>>;

/// The recorded internal constructor: fills an instance's slots from keyword
/// arguments, delegating leftovers to the ancestor's internal constructor.
pub type InternalCtor = Rc<dyn Fn(&Instance, &[(String, Value)]) -> Result<(), ForgeError>>;

/// Construction-denial hook, invoked before anything else on public
/// construction. Abstract and interface flavors install one unconditionally.
pub type DenyHook = Rc<dyn Fn(&ClassEntry) -> Result<(), ForgeError>>;

/// What a member slot holds.
#[derive(Clone)]
pub enum MemberKind {
    /// An attribute with its descriptor.
    Attr(Rc<AttrSpec>),
    /// A method (or a generated forwarder).
    Method,
}

/// One generated member of a class.
#[derive(Clone)]
pub struct MemberSlot {
    /// What kind of member this is.
    pub kind: MemberKind,
    /// Whether the member is static (no receiver).
    pub is_static: bool,
    /// The composed callable (pipeline included).
    pub callable: MemberFn,
}

impl fmt::Debug for MemberSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            MemberKind::Attr(_) => "attr",
            MemberKind::Method => "method",
        };
        f.debug_struct("MemberSlot")
            .field("kind", &kind)
            .field("is_static", &self.is_static)
            .finish()
    }
}

/// Build metadata for one synthesized class.
pub struct ClassEntry {
    /// Simple name.
    pub name: String,
    /// Qualified path.
    pub path: TypePath,
    /// Type identity (hash of the qualified path).
    pub type_hash: TypeHash,
    /// Flavor.
    pub kind: ClassKind,
    /// Whether this type may appear as an ancestor.
    pub is_extendable: bool,
    /// Whether this type may appear in an implements list.
    pub is_implementable: bool,
    /// The single declared ancestor, if any.
    pub ancestor: Option<TypeHash>,
    /// Directly implemented interfaces.
    pub interfaces: Vec<TypeHash>,
    /// Names of methods this class implements (static methods included).
    pub method_names: FxHashSet<String>,
    /// Abstract method names declared directly on this class.
    pub abstract_methods: FxHashSet<String>,

    members: RefCell<FxHashMap<String, MemberSlot>>,
    statics: RefCell<AttrStore>,
    internal_ctor: RefCell<Option<InternalCtor>>,
    deny_ctor: RefCell<Option<DenyHook>>,
    ctor_stages: RefCell<InterceptStages>,
}

impl ClassEntry {
    /// Create an entry for a path and flavor. Inheritance wiring and contract
    /// sets are attached with the `with_*` builders before the entry is
    /// shared.
    pub fn new(path: TypePath, kind: ClassKind) -> Self {
        let type_hash = path.to_type_hash();
        Self {
            name: path.simple_name().to_string(),
            path,
            type_hash,
            kind,
            is_extendable: !kind.is_interface(),
            is_implementable: kind.is_interface(),
            ancestor: None,
            interfaces: Vec::new(),
            method_names: FxHashSet::default(),
            abstract_methods: FxHashSet::default(),
            members: RefCell::new(FxHashMap::default()),
            statics: RefCell::new(AttrStore::default()),
            internal_ctor: RefCell::new(None),
            deny_ctor: RefCell::new(None),
            ctor_stages: RefCell::new(InterceptStages::new()),
        }
    }

    /// Set the ancestor.
    pub fn with_ancestor(mut self, ancestor: TypeHash) -> Self {
        self.ancestor = Some(ancestor);
        self
    }

    /// Set the implemented interfaces.
    pub fn with_interfaces(mut self, interfaces: Vec<TypeHash>) -> Self {
        self.interfaces = interfaces;
        self
    }

    /// Set the implemented method names.
    pub fn with_method_names(mut self, names: FxHashSet<String>) -> Self {
        self.method_names = names;
        self
    }

    /// Set the declared abstract method names.
    pub fn with_abstract_methods(mut self, names: FxHashSet<String>) -> Self {
        self.abstract_methods = names;
        self
    }

    // === Generated-member plumbing ===

    /// Look up a member declared directly on this class.
    pub fn member(&self, name: &str) -> Option<MemberSlot> {
        self.members.borrow().get(name).cloned()
    }

    /// Install a generated member.
    pub fn set_member(&self, name: impl Into<String>, slot: MemberSlot) {
        self.members.borrow_mut().insert(name.into(), slot);
    }

    /// Number of generated members.
    pub fn member_count(&self) -> usize {
        self.members.borrow().len()
    }

    /// The shared static store.
    pub fn statics(&self) -> &RefCell<AttrStore> {
        &self.statics
    }

    /// The recorded internal constructor, once generated.
    pub fn internal_ctor(&self) -> Option<InternalCtor> {
        self.internal_ctor.borrow().clone()
    }

    /// Record the internal constructor.
    pub fn set_internal_ctor(&self, ctor: InternalCtor) {
        *self.internal_ctor.borrow_mut() = Some(ctor);
    }

    /// The construction-denial hook, if one is installed.
    pub fn deny_ctor(&self) -> Option<DenyHook> {
        self.deny_ctor.borrow().clone()
    }

    /// Install the construction-denial hook.
    pub fn set_deny_ctor(&self, hook: DenyHook) {
        *self.deny_ctor.borrow_mut() = Some(hook);
    }

    /// Interception stages attached to the `__init__` lifecycle slot.
    pub fn ctor_stages(&self) -> InterceptStages {
        self.ctor_stages.borrow().clone()
    }

    /// Attach the `__init__` interception stages.
    pub fn set_ctor_stages(&self, stages: InterceptStages) {
        *self.ctor_stages.borrow_mut() = stages;
    }

    /// Check a direct implements declaration.
    pub fn implements_direct(&self, interface: TypeHash) -> bool {
        self.interfaces.contains(&interface)
    }
}

impl fmt::Debug for ClassEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassEntry")
            .field("path", &self.path.to_string())
            .field("kind", &self.kind)
            .field("ancestor", &self.ancestor)
            .field("interfaces", &self.interfaces.len())
            .field("members", &self.member_count())
            .finish()
    }
}

/// Locate a member by walking the ancestor chain, nearest-first.
///
/// Interfaces do not participate in lookup; only the `extends` chain is
/// searched. Returns the owning entry together with the slot.
pub fn find_member(
    start: &Rc<ClassEntry>,
    graph: &dyn TypeGraph,
    name: &str,
) -> Option<(Rc<ClassEntry>, MemberSlot)> {
    let mut current = Some(start.clone());
    while let Some(entry) = current {
        if let Some(slot) = entry.member(name) {
            return Some((entry, slot));
        }
        current = entry.ancestor.and_then(|hash| graph.entry(hash));
    }
    None
}

/// Human-readable name of a type identity, for error messages.
pub fn type_display(hash: TypeHash, graph: &dyn TypeGraph) -> String {
    if let Some(name) = primitives::name_of(hash) {
        return name.to_string();
    }
    match graph.entry(hash) {
        Some(entry) => entry.path.to_string(),
        None => hash.to_string(),
    }
}
