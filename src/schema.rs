//! Declarative class descriptions.
//!
//! A [`ClassSchema`] is the engine's input: an ordered collection of
//! attribute descriptors, method bodies, abstract-method markers, and
//! interception modifiers, plus the inheritance wiring. Declaration order is
//! significant - it drives default materialization order and the
//! registration order of interceptors that share a target.
//!
//! # Example
//!
//! ```
//! use classforge::{AttrSpec, ClassSchema, Engine, Value};
//!
//! let mut engine = Engine::new();
//! let person = engine
//!     .define(
//!         ClassSchema::new("Person")
//!             .attr("name", AttrSpec::string())
//!             .method("greet", |inst, _args| {
//!                 let name = inst.get("name")?;
//!                 Ok(Value::Str(format!("hello, {}", name.as_str().unwrap_or(""))))
//!             }),
//!     )
//!     .unwrap();
//!
//! let noam = person.create(&[("name", Value::from("Noam"))]).unwrap();
//! assert_eq!(noam.get("name").unwrap(), Value::from("Noam"));
//! ```

use std::rc::Rc;

use classforge_core::{
    AfterFn, AroundFn, AttrSpec, BeforeFn, ForgeError, Instance, NextFn, Value, getter_stage,
    setter_stage,
};
use classforge_registry::ScopeTable;

use crate::class::Class;

/// An instance method body. Receives the instance and the call arguments.
pub type MethodBody = Rc<dyn Fn(&Instance, &[Value]) -> Result<Value, ForgeError>>;

/// A static method body. No receiver.
pub type StaticMethodBody = Rc<dyn Fn(&[Value]) -> Result<Value, ForgeError>>;

/// A declared member, before the builder partitions the description.
pub(crate) enum MemberDecl {
    Attr(AttrSpec),
    Method(MethodBody),
    StaticMethod(StaticMethodBody),
    AbstractMethod,
}

/// One interception stage carried by a modifier declaration.
#[derive(Clone)]
pub(crate) enum ModifierStage {
    Before(BeforeFn),
    Around(AroundFn),
    After(AfterFn),
}

/// A modifier declaration: a stage plus the member names it attaches to.
pub(crate) struct ModifierDecl {
    pub targets: Vec<String>,
    pub stage: ModifierStage,
}

/// A declarative class description.
pub struct ClassSchema {
    pub(crate) name: String,
    pub(crate) namespace: Vec<String>,
    pub(crate) lexical: Option<Rc<ScopeTable>>,
    pub(crate) ancestors: Vec<Class>,
    pub(crate) interfaces: Vec<Class>,
    pub(crate) members: Vec<(String, MemberDecl)>,
    pub(crate) modifiers: Vec<ModifierDecl>,
}

impl ClassSchema {
    /// Start a description for a class with the given simple name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Vec::new(),
            lexical: None,
            ancestors: Vec::new(),
            interfaces: Vec::new(),
            members: Vec::new(),
            modifiers: Vec::new(),
        }
    }

    /// Place the class under a dotted namespace (e.g. `"geom.core"`).
    pub fn in_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace
            .split('.')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    /// Attach the lexical scope visible at the point of definition. Name
    /// constraints consult it before the engine's global scope.
    pub fn with_scope(mut self, scope: ScopeTable) -> Self {
        self.lexical = Some(Rc::new(scope));
        self
    }

    /// Declare the single ancestor. Declaring more than one fails the build
    /// with `MultipleInheritance`.
    pub fn extends(mut self, ancestor: &Class) -> Self {
        self.ancestors.push(ancestor.clone());
        self
    }

    /// Declare an implemented interface. May be called any number of times.
    pub fn implements(mut self, interface: &Class) -> Self {
        self.interfaces.push(interface.clone());
        self
    }

    /// Declare an attribute.
    pub fn attr(mut self, name: impl Into<String>, spec: AttrSpec) -> Self {
        self.members.push((name.into(), MemberDecl::Attr(spec)));
        self
    }

    /// Declare an instance method. Methods are implicitly final.
    pub fn method(
        mut self,
        name: impl Into<String>,
        body: impl Fn(&Instance, &[Value]) -> Result<Value, ForgeError> + 'static,
    ) -> Self {
        self.members
            .push((name.into(), MemberDecl::Method(Rc::new(body))));
        self
    }

    /// Declare a static method.
    pub fn static_method(
        mut self,
        name: impl Into<String>,
        body: impl Fn(&[Value]) -> Result<Value, ForgeError> + 'static,
    ) -> Self {
        self.members
            .push((name.into(), MemberDecl::StaticMethod(Rc::new(body))));
        self
    }

    /// Declare an abstract method. Valid only in abstract and interface
    /// descriptions.
    pub fn abstract_method(mut self, name: impl Into<String>) -> Self {
        self.members.push((name.into(), MemberDecl::AbstractMethod));
        self
    }

    /// Register a `before` interceptor for one or more named members.
    pub fn before(
        mut self,
        targets: &[&str],
        stage: impl Fn(&str, &[Value]) + 'static,
    ) -> Self {
        self.modifiers.push(ModifierDecl {
            targets: targets.iter().map(|s| s.to_string()).collect(),
            stage: ModifierStage::Before(Rc::new(stage)),
        });
        self
    }

    /// Register an `around` interceptor for one or more named members.
    pub fn around(
        mut self,
        targets: &[&str],
        stage: impl Fn(&str, &NextFn<'_>, &[Value]) -> Result<Value, ForgeError> + 'static,
    ) -> Self {
        self.modifiers.push(ModifierDecl {
            targets: targets.iter().map(|s| s.to_string()).collect(),
            stage: ModifierStage::Around(Rc::new(stage)),
        });
        self
    }

    /// Register an `after` interceptor for one or more named members.
    pub fn after(
        mut self,
        targets: &[&str],
        stage: impl Fn(&str, &[Value]) + 'static,
    ) -> Self {
        self.modifiers.push(ModifierDecl {
            targets: targets.iter().map(|s| s.to_string()).collect(),
            stage: ModifierStage::After(Rc::new(stage)),
        });
        self
    }

    /// Register a getter transform: sugar over around-interception that
    /// fires on pure gets only and maps the returned value. The stored value
    /// stays raw.
    pub fn getter(mut self, target: &str, transform: impl Fn(Value) -> Value + 'static) -> Self {
        self.modifiers.push(ModifierDecl {
            targets: vec![target.to_string()],
            stage: ModifierStage::Around(getter_stage(Rc::new(transform))),
        });
        self
    }

    /// Register a setter transform: sugar over around-interception that
    /// fires on pure sets only and maps the incoming value. The stored value
    /// is the transformed one.
    pub fn setter(mut self, target: &str, transform: impl Fn(Value) -> Value + 'static) -> Self {
        self.modifiers.push(ModifierDecl {
            targets: vec![target.to_string()],
            stage: ModifierStage::Around(setter_stage(Rc::new(transform))),
        });
        self
    }
}
