//! classforge - a runtime engine that constructs object types from
//! declarative attribute descriptions.
//!
//! A caller describes a type's fields and methods as data - descriptors
//! carrying type constraint, default, mutability, laziness, and scope, plus
//! before / around / after interceptors attached to named members - and the
//! engine synthesizes a fully working class: constructible, with unified
//! get/set accessors, abstract-contract enforcement, and explicit
//! (non-native) single inheritance plus multi-interface implementation.
//!
//! # Quick start
//!
//! ```
//! use classforge::{AttrSpec, ClassSchema, Engine, Value};
//!
//! let mut engine = Engine::new();
//!
//! let person = engine
//!     .define(ClassSchema::new("Person").attr("name", AttrSpec::string()))
//!     .unwrap();
//!
//! let noam = person.create(&[("name", Value::from("Noam"))]).unwrap();
//! assert_eq!(noam.get("name").unwrap(), Value::from("Noam"));
//!
//! // The unified accessor convention: one argument writes, zero reads.
//! noam.set("name", "Nisanov").unwrap();
//! assert_eq!(noam.get("name").unwrap(), Value::from("Nisanov"));
//! ```
//!
//! # Architecture
//!
//! - [`classforge_core`]: values, type identity, descriptors, the
//!   interception pipeline, class metadata, instances, errors.
//! - [`classforge_registry`]: the class registry (virtual-inheritance
//!   navigation), scope tables and deferred type resolution, the
//!   abstract-contract validator.
//! - this crate: the [`ClassSchema`] description surface, the construction
//!   engine, and the [`Engine`] facade.
//!
//! Everything is single-threaded by construction (`Rc`/`RefCell`): class
//! definition is an initialization-phase activity, after which registry and
//! scope are effectively read-only.

mod builder;
mod class;
mod engine;
mod schema;

pub use class::Class;
pub use engine::Engine;
pub use schema::{ClassSchema, MethodBody, StaticMethodBody};

pub use classforge_core::{
    AttrFlags, AttrSpec, BuildError, ClassEntry, ClassKind, DefaultSpec, Diagnostic,
    DiagnosticKind, Diagnostics, ForgeError, Instance, InterceptStages, NextFn, ObjectError,
    ResolveError, TypeConstraint, TypeGraph, TypeHash, TypePath, Value, primitives,
    value_conforms,
};
pub use classforge_registry::{Binding, ClassRegistry, ResolveCtx, ScopeTable, validate_contracts};
