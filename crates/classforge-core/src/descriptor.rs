//! Attribute descriptors.
//!
//! An [`AttrSpec`] is the declarative contract for one attribute: its type
//! constraint, flags (required / final / lazy / static / null-allowance),
//! default, and attached interception stages. A descriptor is owned
//! exclusively by the class that declares it; the builder wraps it in an `Rc`
//! that is captured by the generated accessor and never shared across types.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::instance::Instance;
use crate::interceptor::InterceptStages;
use crate::type_hash::{TypeHash, primitives};
use crate::value::Value;

/// A type constraint carried by a descriptor.
///
/// `Named` constraints stay unresolved until the attribute is first accessed,
/// which is what lets a field reference the enclosing class (`SelfType` or
/// its own name) or a class that is defined later.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeConstraint {
    /// Accept any value.
    Any,
    /// The class currently being defined.
    SelfType,
    /// A dotted name resolved against the declaring scope chain on first use.
    Named(String),
    /// An already-known type identity.
    Exact(TypeHash),
}

impl TypeConstraint {
    /// Check for the unconstrained case.
    pub fn is_any(&self) -> bool {
        matches!(self, TypeConstraint::Any)
    }

    /// Human-readable spelling for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TypeConstraint::Any => "any".to_string(),
            TypeConstraint::SelfType => "Self".to_string(),
            TypeConstraint::Named(name) => name.clone(),
            TypeConstraint::Exact(hash) => primitives::name_of(*hash)
                .map(str::to_string)
                .unwrap_or_else(|| hash.to_string()),
        }
    }
}

bitflags! {
    /// Flag set of an attribute descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AttrFlags: u8 {
        /// Must be supplied at construction.
        const REQUIRED = 1 << 0;
        /// Write-once after the first successful set.
        const FINAL = 1 << 1;
        /// Null stores are accepted regardless of the type constraint.
        const ALLOW_NULL = 1 << 2;
        /// No implicit materialization at construction; an unset read fails
        /// unless a default exists.
        const LAZY = 1 << 3;
        /// One slot shared by the class and all instances.
        const STATIC = 1 << 4;
    }
}

/// The default of an attribute, explicitly tagged.
///
/// The tag replaces the original engine's arity inspection: a caller states
/// whether a computed default is a plain thunk or needs the instance.
#[derive(Clone, Default)]
pub enum DefaultSpec {
    /// No default.
    #[default]
    None,
    /// A constant value.
    Value(Value),
    /// Computed fresh on each materialization.
    Computed(Rc<dyn Fn() -> Value>),
    /// Computed from the instance; may read sibling attributes.
    WithInstance(Rc<dyn Fn(&Instance) -> Value>),
}

impl DefaultSpec {
    /// Check whether no default was supplied.
    pub fn is_none(&self) -> bool {
        matches!(self, DefaultSpec::None)
    }

    /// Check whether this default counts as "supplied and non-null" for the
    /// required-flag invariant.
    pub fn is_effective(&self) -> bool {
        match self {
            DefaultSpec::None => false,
            DefaultSpec::Value(Value::Null) => false,
            _ => true,
        }
    }
}

impl fmt::Debug for DefaultSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultSpec::None => write!(f, "None"),
            DefaultSpec::Value(v) => f.debug_tuple("Value").field(v).finish(),
            DefaultSpec::Computed(_) => write!(f, "Computed(..)"),
            DefaultSpec::WithInstance(_) => write!(f, "WithInstance(..)"),
        }
    }
}

/// Declarative contract for one attribute.
///
/// Fresh descriptors start `REQUIRED | ALLOW_NULL`, matching the engine's
/// treatment of an untouched declaration; builder normalization clears
/// `REQUIRED` when a default or laziness makes it meaningless.
pub struct AttrSpec {
    /// The type constraint.
    pub constraint: TypeConstraint,
    /// The flag set.
    pub flags: AttrFlags,
    /// The default, if any.
    pub default: DefaultSpec,
    /// Interception stages attached by modifiers.
    pub stages: InterceptStages,
    /// Resolution cache: the constraint resolves once, on first use.
    resolved: OnceCell<TypeHash>,
}

impl AttrSpec {
    /// Create a descriptor with the given constraint.
    pub fn of(constraint: TypeConstraint) -> Self {
        Self {
            constraint,
            flags: AttrFlags::REQUIRED | AttrFlags::ALLOW_NULL,
            default: DefaultSpec::None,
            stages: InterceptStages::new(),
            resolved: OnceCell::new(),
        }
    }

    /// Unconstrained descriptor.
    pub fn any() -> Self {
        Self::of(TypeConstraint::Any)
    }

    /// Descriptor typed as the enclosing class.
    pub fn self_type() -> Self {
        Self::of(TypeConstraint::SelfType)
    }

    /// Descriptor with a name constraint resolved on first use.
    pub fn named(name: impl Into<String>) -> Self {
        Self::of(TypeConstraint::Named(name.into()))
    }

    /// Descriptor constrained to an exact type identity.
    pub fn exact(hash: TypeHash) -> Self {
        Self::of(TypeConstraint::Exact(hash))
    }

    /// `bool`-typed descriptor.
    pub fn boolean() -> Self {
        Self::exact(primitives::BOOL)
    }

    /// `int`-typed descriptor.
    pub fn int() -> Self {
        Self::exact(primitives::INT)
    }

    /// `float`-typed descriptor.
    pub fn float() -> Self {
        Self::exact(primitives::FLOAT)
    }

    /// `str`-typed descriptor.
    pub fn string() -> Self {
        Self::exact(primitives::STR)
    }

    /// `list`-typed descriptor.
    pub fn list() -> Self {
        Self::exact(primitives::LIST)
    }

    /// `map`-typed descriptor.
    pub fn map() -> Self {
        Self::exact(primitives::MAP)
    }

    // === Builder methods ===

    /// Clear the required flag.
    pub fn optional(mut self) -> Self {
        self.flags.remove(AttrFlags::REQUIRED);
        self
    }

    /// Mark write-once.
    pub fn as_final(mut self) -> Self {
        self.flags.insert(AttrFlags::FINAL);
        self
    }

    /// Reject null stores.
    pub fn disallow_null(mut self) -> Self {
        self.flags.remove(AttrFlags::ALLOW_NULL);
        self
    }

    /// Mark lazy: skipped at construction, unset reads fail unless a default
    /// exists.
    pub fn lazy(mut self) -> Self {
        self.flags.insert(AttrFlags::LAZY);
        self
    }

    /// Mark static: one slot shared by the class and all instances. Statics
    /// are never required.
    pub fn as_static(mut self) -> Self {
        self.flags.insert(AttrFlags::STATIC);
        self.flags.remove(AttrFlags::REQUIRED);
        self
    }

    /// Attach a constant default.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = DefaultSpec::Value(value.into());
        self
    }

    /// Attach a computed (zero-argument) default.
    pub fn with_computed_default(mut self, f: impl Fn() -> Value + 'static) -> Self {
        self.default = DefaultSpec::Computed(Rc::new(f));
        self
    }

    /// Attach an instance-computed default.
    pub fn with_instance_default(mut self, f: impl Fn(&Instance) -> Value + 'static) -> Self {
        self.default = DefaultSpec::WithInstance(Rc::new(f));
        self
    }

    // === Queries ===

    /// Check a flag.
    pub fn has(&self, flag: AttrFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Apply the required-flag invariant: `REQUIRED` is meaningless next to
    /// an effective default or laziness. Returns whether anything changed.
    pub fn normalize(&mut self) -> bool {
        if self.flags.contains(AttrFlags::REQUIRED)
            && (self.default.is_effective() || self.flags.contains(AttrFlags::LAZY))
        {
            self.flags.remove(AttrFlags::REQUIRED);
            true
        } else {
            false
        }
    }

    /// The cached resolution of the constraint, if it resolved before.
    pub fn cached_type(&self) -> Option<TypeHash> {
        self.resolved.get().copied()
    }

    /// Cache the constraint's resolution. Later calls keep the first value.
    pub fn cache_type(&self, hash: TypeHash) {
        let _ = self.resolved.set(hash);
    }
}

impl fmt::Debug for AttrSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrSpec")
            .field("constraint", &self.constraint)
            .field("flags", &self.flags)
            .field("default", &self.default)
            .field("stages", &self.stages)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_spec_is_required_and_nullable() {
        let spec = AttrSpec::string();
        assert!(spec.has(AttrFlags::REQUIRED));
        assert!(spec.has(AttrFlags::ALLOW_NULL));
        assert!(!spec.has(AttrFlags::FINAL));
    }

    #[test]
    fn builder_flags() {
        let spec = AttrSpec::int().as_final().lazy().disallow_null();
        assert!(spec.has(AttrFlags::FINAL));
        assert!(spec.has(AttrFlags::LAZY));
        assert!(!spec.has(AttrFlags::ALLOW_NULL));
    }

    #[test]
    fn static_clears_required() {
        let spec = AttrSpec::string().as_static();
        assert!(spec.has(AttrFlags::STATIC));
        assert!(!spec.has(AttrFlags::REQUIRED));
    }

    #[test]
    fn normalize_clears_required_for_default() {
        let mut spec = AttrSpec::string().with_default("Noam");
        assert!(spec.normalize());
        assert!(!spec.has(AttrFlags::REQUIRED));
        // Second pass is a no-op.
        assert!(!spec.normalize());
    }

    #[test]
    fn normalize_clears_required_for_lazy() {
        let mut spec = AttrSpec::int().lazy();
        assert!(spec.normalize());
        assert!(!spec.has(AttrFlags::REQUIRED));
    }

    #[test]
    fn null_default_does_not_clear_required() {
        let mut spec = AttrSpec::string().with_default(Value::Null);
        assert!(!spec.normalize());
        assert!(spec.has(AttrFlags::REQUIRED));
    }

    #[test]
    fn resolution_cache_is_write_once() {
        let spec = AttrSpec::named("Person");
        assert_eq!(spec.cached_type(), None);

        let first = TypeHash::from_name("Person");
        spec.cache_type(first);
        spec.cache_type(TypeHash::from_name("Other"));
        assert_eq!(spec.cached_type(), Some(first));
    }

    #[test]
    fn constraint_descriptions() {
        assert_eq!(TypeConstraint::Any.describe(), "any");
        assert_eq!(TypeConstraint::SelfType.describe(), "Self");
        assert_eq!(TypeConstraint::Named("crm.Person".into()).describe(), "crm.Person");
        assert_eq!(TypeConstraint::Exact(primitives::INT).describe(), "int");
    }
}
