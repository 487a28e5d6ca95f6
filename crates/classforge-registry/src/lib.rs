//! Registry and resolution layer for the classforge engine.
//!
//! This crate provides the engine-wide [`ClassRegistry`] (virtual-inheritance
//! navigation over synthesized classes), the [`ScopeTable`] / [`ResolveCtx`]
//! machinery for deferred type resolution, and the abstract-contract
//! validator that runs at the end of every class build.

pub mod contract;
pub mod registry;
pub mod scope;

pub use contract::validate_contracts;
pub use registry::{ClassRegistry, SharedRegistry};
pub use scope::{Binding, ResolveCtx, ScopeTable, SharedScope};
