//! Core data model for the classforge engine.
//!
//! This crate holds the leaf types the rest of the workspace builds on:
//! dynamic [`Value`]s, deterministic [`TypeHash`] identity, attribute
//! descriptors ([`AttrSpec`]), the interception pipeline, class build
//! metadata ([`ClassEntry`]), instances, diagnostics, and the unified error
//! taxonomy.
//!
//! Nothing in here touches the registry directly; chain navigation goes
//! through the [`TypeGraph`] seam so the data model stays leaf-shaped.

pub mod descriptor;
pub mod diagnostics;
pub mod entries;
pub mod error;
pub mod instance;
pub mod interceptor;
pub mod type_hash;
pub mod type_path;
pub mod value;

pub use descriptor::{AttrFlags, AttrSpec, DefaultSpec, TypeConstraint};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use entries::{
    ClassEntry, ClassKind, DenyHook, InternalCtor, MemberFn, MemberKind, MemberSlot, TypeGraph,
    find_member, type_display,
};
pub use error::{BuildError, ForgeError, ObjectError, ResolveError};
pub use instance::{AttrStore, Instance};
pub use interceptor::{
    AfterFn, AroundFn, BeforeFn, InterceptResult, InterceptStages, NextFn, getter_stage,
    setter_stage,
};
pub use type_hash::{TypeHash, primitives};
pub use type_path::TypePath;
pub use value::{Value, value_conforms};
