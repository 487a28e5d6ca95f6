//! Unified error types for classforge.
//!
//! This module provides a consistent error hierarchy for the two phases of
//! the engine: class construction (build time) and object use (call time).
//!
//! ## Error Hierarchy
//!
//! ```text
//! ForgeError (top-level wrapper)
//! ├── ResolveError - type-name resolution failures
//! ├── BuildError   - structural failures while synthesizing a class
//! └── ObjectError  - value failures during construction or attribute access
//! ```
//!
//! Each phase-specific type can be handled directly for fine-grained
//! recovery, or converted to [`ForgeError`] with `?` for unified handling.
//! Every failure is raised synchronously at the point of violation; nothing
//! is retried.

use thiserror::Error;

// ============================================================================
// Resolution Errors
// ============================================================================

/// Errors that occur while resolving a type constraint to a concrete type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// The name did not match anything in the scope chain.
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// The name resolved to a namespace rather than a type.
    #[error("'{0}' names a module, not a type")]
    ModuleReference(String),
}

// ============================================================================
// Build Errors
// ============================================================================

/// Errors that occur while a class description is being synthesized.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// A declared member uses a reserved dunder-style name.
    #[error("member name '{0}' is reserved")]
    ReservedMemberName(String),

    /// A declared member has a shape the builder does not accept here.
    #[error("class '{class}': member '{member}' is not valid in this description")]
    UnknownMember {
        /// The class being built.
        class: String,
        /// The offending member name.
        member: String,
    },

    /// A modifier targets a name that is not a member of the class or its
    /// ancestors.
    #[error("cannot attach modifier to unknown member '{target}' in class '{class}'")]
    UnknownModifierTarget {
        /// The class being built.
        class: String,
        /// The modifier's target name.
        target: String,
    },

    /// An interface declared a member that is not an abstract-method marker.
    #[error("interface '{class}': member '{member}' must be an abstract method")]
    InterfaceMember {
        /// The interface being built.
        class: String,
        /// The offending member name.
        member: String,
    },

    /// More than one ancestor was declared.
    #[error("class '{0}' declares more than one ancestor")]
    MultipleInheritance(String),

    /// An interface description declared an ancestor.
    #[error("interface '{0}' cannot declare an ancestor")]
    InterfaceAncestor(String),

    /// The declared ancestor is not extendable.
    #[error("type '{ancestor}' cannot be extended")]
    NonExtendableAncestor {
        /// The rejected ancestor's name.
        ancestor: String,
    },

    /// An implemented type is not an interface.
    #[error("type '{interface}' cannot be implemented")]
    NonImplementableInterface {
        /// The rejected interface's name.
        interface: String,
    },

    /// A class with this qualified name is already registered.
    #[error("duplicate class: {0}")]
    DuplicateClass(String),

    /// A static attribute declared an instance-computed default.
    #[error("class '{class}': static attribute '{attribute}' cannot use an instance default")]
    StaticInstanceDefault {
        /// The class being built.
        class: String,
        /// The offending attribute name.
        attribute: String,
    },

    /// A concrete descendant is missing abstract methods from its chain.
    #[error("methods \"{}\" are not implemented for class '{class}'; required by '{declared_by}'", missing.join(", "))]
    UnimplementedAbstractMethods {
        /// The concrete class that fails the contract.
        class: String,
        /// The abstract/interface type that declared the methods.
        declared_by: String,
        /// The missing method names.
        missing: Vec<String>,
    },
}

// ============================================================================
// Object Errors
// ============================================================================

/// Errors that occur while constructing or using an instance.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObjectError {
    /// A stored value violates an attribute's type constraint.
    #[error("'{attribute}' must be of type {expected}, got {actual}")]
    TypeConstraint {
        /// The attribute being written.
        attribute: String,
        /// The constraint's type name.
        expected: String,
        /// The offending value's type name.
        actual: String,
    },

    /// A required attribute was omitted at construction.
    #[error("'{attribute}' is missing in instance creation for class '{class}'")]
    MissingAttribute {
        /// The class being constructed.
        class: String,
        /// The missing attribute name.
        attribute: String,
    },

    /// A second write was attempted on a final slot.
    #[error("tried to modify final attribute '{0}'")]
    FinalAttribute(String),

    /// A lazy attribute was read before any write.
    #[error("lazy attribute '{0}' read before initialization")]
    UninitializedAttribute(String),

    /// A member lookup failed at call time.
    #[error("unknown attribute '{attribute}' for class '{class}'")]
    UnknownAttribute {
        /// The class searched.
        class: String,
        /// The attribute name.
        attribute: String,
    },

    /// Direct instantiation of an abstract or interface type.
    #[error("cannot instantiate {kind} '{class}'")]
    AbstractInstantiation {
        /// The non-instantiable class.
        class: String,
        /// "abstract class" or "interface".
        kind: &'static str,
    },
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// The unified error type for all classforge operations.
///
/// Wraps the phase-specific error types; each variant uses `#[from]` so `?`
/// converts automatically.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForgeError {
    /// A type-resolution error.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A build-phase error.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// A call-time object error.
    #[error(transparent)]
    Object(#[from] ObjectError),
}

impl ForgeError {
    /// Check if this is a resolution error.
    pub fn is_resolve(&self) -> bool {
        matches!(self, ForgeError::Resolve(_))
    }

    /// Check if this is a build error.
    pub fn is_build(&self) -> bool {
        matches!(self, ForgeError::Build(_))
    }

    /// Check if this is an object error.
    pub fn is_object(&self) -> bool {
        matches!(self, ForgeError::Object(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_error_display() {
        let err = ResolveError::UnknownType("Widget".into());
        assert_eq!(format!("{err}"), "unknown type 'Widget'");
    }

    #[test]
    fn build_error_display() {
        let err = BuildError::UnimplementedAbstractMethods {
            class: "Quadrangle".into(),
            declared_by: "Shape".into(),
            missing: vec!["circumference".into(), "area".into()],
        };
        let text = format!("{err}");
        assert!(text.contains("circumference, area"));
        assert!(text.contains("Quadrangle"));
        assert!(text.contains("Shape"));
    }

    #[test]
    fn object_error_display() {
        let err = ObjectError::TypeConstraint {
            attribute: "name".into(),
            expected: "str".into(),
            actual: "int".into(),
        };
        assert_eq!(format!("{err}"), "'name' must be of type str, got int");
    }

    #[test]
    fn forge_error_from_phases() {
        let err: ForgeError = ResolveError::UnknownType("X".into()).into();
        assert!(err.is_resolve());
        assert!(!err.is_build());

        let err: ForgeError = BuildError::MultipleInheritance("X".into()).into();
        assert!(err.is_build());

        let err: ForgeError = ObjectError::FinalAttribute("x".into()).into();
        assert!(err.is_object());
    }

    #[test]
    fn forge_error_transparent_display() {
        let err: ForgeError = ObjectError::FinalAttribute("name".into()).into();
        assert_eq!(format!("{err}"), "tried to modify final attribute 'name'");
    }
}
