//! The class-construction engine.
//!
//! `build_class` turns a [`ClassSchema`] into a registered, constructible
//! class. Build order:
//!
//! 1. inheritance wiring checks (single ancestor, extendable ancestor,
//!    implementable interfaces);
//! 2. member partition into attributes, methods, and abstract markers, with
//!    reserved-name and flavor policy enforcement;
//! 3. modifier attachment - stages land on their target's descriptor, method
//!    slot, the `__init__` lifecycle slot, or a generated forwarder for a
//!    target declared on a framework ancestor;
//! 4. member generation - one unified accessor per attribute, pipeline-
//!    wrapped methods, the internal constructor, and the denial hook for
//!    non-concrete flavors;
//! 5. abstract-contract validation over the registry-recorded chain;
//! 6. eager materialization of non-lazy static defaults;
//! 7. registration and scope binding.
//!
//! Statics materialize before registration so a failed build leaves no trace
//! in the registry or scope.

use std::rc::{Rc, Weak};

use rustc_hash::{FxHashMap, FxHashSet};

use classforge_core::{
    AttrFlags, AttrSpec, BuildError, ClassEntry, ClassKind, DefaultSpec, ForgeError, Instance,
    InterceptStages, InternalCtor, MemberFn, MemberKind, MemberSlot, ObjectError, TypeGraph,
    TypeHash, TypePath, Value, find_member, type_display, value_conforms,
};
use classforge_registry::{ResolveCtx, validate_contracts};

use crate::class::Class;
use crate::engine::Engine;
use crate::schema::{ClassSchema, MemberDecl, MethodBody, ModifierDecl, ModifierStage};

/// The recognized lifecycle slot reachable by modifiers.
const CTOR_SLOT: &str = "__init__";

enum MethodDecl {
    Instance(MethodBody),
    Static(crate::schema::StaticMethodBody),
}

pub(crate) fn build_class(
    engine: &mut Engine,
    schema: ClassSchema,
    kind: ClassKind,
) -> Result<Class, ForgeError> {
    let ClassSchema {
        name,
        namespace,
        lexical,
        ancestors,
        interfaces,
        members,
        modifiers,
    } = schema;

    let path = TypePath::new(name.clone(), namespace.clone());
    if engine.registry.borrow().contains(path.to_type_hash()) {
        return Err(BuildError::DuplicateClass(path.to_string()).into());
    }

    // --- inheritance wiring ---

    if kind.is_interface() && !ancestors.is_empty() {
        return Err(BuildError::InterfaceAncestor(name).into());
    }
    if ancestors.len() > 1 {
        return Err(BuildError::MultipleInheritance(name).into());
    }
    let ancestor_entry: Option<Rc<ClassEntry>> =
        ancestors.first().map(|class| class.entry().clone());
    if let Some(ancestor) = &ancestor_entry
        && !ancestor.is_extendable
    {
        return Err(BuildError::NonExtendableAncestor {
            ancestor: ancestor.name.clone(),
        }
        .into());
    }
    let mut interface_hashes = Vec::new();
    for interface in &interfaces {
        let entry = interface.entry();
        if !entry.is_implementable {
            return Err(BuildError::NonImplementableInterface {
                interface: entry.name.clone(),
            }
            .into());
        }
        interface_hashes.push(entry.type_hash);
    }

    // --- member partition ---

    let mut vars: Vec<(String, AttrSpec)> = Vec::new();
    let mut methods: Vec<(String, MethodDecl)> = Vec::new();
    let mut abstracts: FxHashSet<String> = FxHashSet::default();

    for (member_name, decl) in members {
        if is_reserved(&member_name) {
            return Err(BuildError::ReservedMemberName(member_name).into());
        }
        match decl {
            MemberDecl::Attr(mut spec) => {
                if kind.is_interface() {
                    return Err(interface_member(&name, &member_name).into());
                }
                if spec.has(AttrFlags::STATIC)
                    && matches!(spec.default, DefaultSpec::WithInstance(_))
                {
                    return Err(BuildError::StaticInstanceDefault {
                        class: name,
                        attribute: member_name,
                    }
                    .into());
                }
                if spec.normalize() {
                    engine.diagnostics.info(
                        &name,
                        format!(
                            "attribute '{member_name}': required flag cleared by default or laziness"
                        ),
                    );
                }
                vars.push((member_name, spec));
            }
            MemberDecl::Method(body) => {
                if kind.is_interface() {
                    return Err(interface_member(&name, &member_name).into());
                }
                methods.push((member_name, MethodDecl::Instance(body)));
            }
            MemberDecl::StaticMethod(body) => {
                if kind.is_interface() {
                    return Err(interface_member(&name, &member_name).into());
                }
                methods.push((member_name, MethodDecl::Static(body)));
            }
            MemberDecl::AbstractMethod => {
                if kind.is_concrete() {
                    return Err(BuildError::UnknownMember {
                        class: name,
                        member: member_name,
                    }
                    .into());
                }
                abstracts.insert(member_name);
            }
        }
    }

    let method_names: FxHashSet<String> = methods.iter().map(|(n, _)| n.clone()).collect();

    // --- entry and resolution context ---

    let mut entry = ClassEntry::new(path.clone(), kind)
        .with_method_names(method_names)
        .with_abstract_methods(abstracts)
        .with_interfaces(interface_hashes);
    if let Some(ancestor) = &ancestor_entry {
        entry = entry.with_ancestor(ancestor.type_hash);
    }
    let entry = Rc::new(entry);

    let graph: Rc<dyn TypeGraph> = engine.registry.clone();
    let ctx = Rc::new(ResolveCtx {
        self_name: name.clone(),
        self_hash: entry.type_hash,
        lexical,
        globals: engine.scope.clone(),
        namespace,
    });

    for (attr_name, _) in &vars {
        if ancestor_member_exists(&ancestor_entry, graph.as_ref(), attr_name) {
            engine.diagnostics.warning(
                &name,
                format!("attribute '{attr_name}' shadows an ancestor member"),
            );
        }
    }

    // --- modifier attachment ---

    let var_index: FxHashMap<String, usize> = vars
        .iter()
        .enumerate()
        .map(|(i, (n, _))| (n.clone(), i))
        .collect();
    let method_index: FxHashSet<String> = methods.iter().map(|(n, _)| n.clone()).collect();

    let mut method_stages: FxHashMap<String, InterceptStages> = FxHashMap::default();
    let mut ctor_stages = InterceptStages::new();
    let mut inherited: Vec<(String, InterceptStages)> = Vec::new();

    for ModifierDecl { targets, stage } in modifiers {
        for target in targets {
            let stage = stage.clone();
            if let Some(&index) = var_index.get(&target) {
                push_stage(&mut vars[index].1.stages, stage);
            } else if method_index.contains(&target) {
                push_stage(method_stages.entry(target).or_default(), stage);
            } else if target == CTOR_SLOT {
                push_stage(&mut ctor_stages, stage);
            } else if ancestor_member_exists(&ancestor_entry, graph.as_ref(), &target) {
                match inherited.iter_mut().find(|(n, _)| *n == target) {
                    Some((_, stages)) => push_stage(stages, stage),
                    None => {
                        let mut stages = InterceptStages::new();
                        push_stage(&mut stages, stage);
                        inherited.push((target, stages));
                    }
                }
            } else {
                return Err(BuildError::UnknownModifierTarget {
                    class: name,
                    target,
                }
                .into());
            }
        }
    }

    // --- attribute accessors ---

    let mut ordered_vars: Vec<(String, Rc<AttrSpec>)> = Vec::new();
    for (attr_name, spec) in vars {
        let is_static = spec.has(AttrFlags::STATIC);
        let spec = Rc::new(spec);
        ordered_vars.push((attr_name.clone(), spec.clone()));
        let callable = make_accessor(
            attr_name.clone(),
            spec.clone(),
            Rc::downgrade(&entry),
            graph.clone(),
            ctx.clone(),
        );
        entry.set_member(
            attr_name,
            MemberSlot {
                kind: MemberKind::Attr(spec),
                is_static,
                callable,
            },
        );
    }

    // --- methods ---

    for (method_name, decl) in methods {
        let stages = method_stages.remove(&method_name).unwrap_or_default();
        let (is_static, callable): (bool, MemberFn) = match decl {
            MethodDecl::Instance(body) => {
                let slot_name = method_name.clone();
                let class_name = name.clone();
                let callable: MemberFn = Rc::new(move |receiver, args| {
                    let instance = match receiver {
                        Some(instance) => instance.clone(),
                        None => {
                            return Err(ObjectError::UnknownAttribute {
                                class: class_name.clone(),
                                attribute: slot_name.clone(),
                            }
                            .into());
                        }
                    };
                    let terminal = |call_args: &[Value]| body(&instance, call_args);
                    stages.run(&slot_name, args, &terminal)
                });
                (false, callable)
            }
            MethodDecl::Static(body) => {
                let slot_name = method_name.clone();
                let callable: MemberFn = Rc::new(move |_receiver, args| {
                    let terminal = |call_args: &[Value]| body(call_args);
                    stages.run(&slot_name, args, &terminal)
                });
                (true, callable)
            }
        };
        entry.set_member(
            method_name,
            MemberSlot {
                kind: MemberKind::Method,
                is_static,
                callable,
            },
        );
    }

    // --- forwarders for modifiers targeting ancestor members ---

    for (target, stages) in inherited {
        let Some(ancestor) = ancestor_entry.clone() else {
            continue;
        };
        let slot_name = target.clone();
        let class_name = name.clone();
        let forward_graph = graph.clone();
        let callable: MemberFn = Rc::new(move |receiver, args| {
            let terminal = |call_args: &[Value]| -> Result<Value, ForgeError> {
                let (_owner, slot) = find_member(&ancestor, forward_graph.as_ref(), &slot_name)
                    .ok_or_else(|| {
                        ForgeError::from(ObjectError::UnknownAttribute {
                            class: class_name.clone(),
                            attribute: slot_name.clone(),
                        })
                    })?;
                let forwarded_receiver = if slot.is_static { None } else { receiver };
                (slot.callable)(forwarded_receiver, call_args)
            };
            stages.run(&slot_name, args, &terminal)
        });
        entry.set_member(
            target,
            MemberSlot {
                kind: MemberKind::Method,
                is_static: false,
                callable,
            },
        );
    }

    // --- constructor ---

    let internal = make_internal_ctor(
        name.clone(),
        ordered_vars.clone(),
        entry.ancestor,
        graph.clone(),
    );
    entry.set_internal_ctor(internal);
    entry.set_ctor_stages(ctor_stages);

    if !kind.is_concrete() {
        let flavor = kind.describe();
        entry.set_deny_ctor(Rc::new(move |class| {
            Err(ObjectError::AbstractInstantiation {
                class: class.name.clone(),
                kind: flavor,
            }
            .into())
        }));
    }

    // --- contracts, statics, registration ---

    validate_contracts(&engine.registry.borrow(), &entry)?;

    for (attr_name, spec) in &ordered_vars {
        if spec.has(AttrFlags::STATIC) && !spec.has(AttrFlags::LAZY) {
            let value = eval_default(spec, None, attr_name, &name)?;
            call_own(&entry, attr_name, None, &[value])?;
        }
    }

    engine.registry.borrow_mut().register(entry.clone())?;
    engine.scope.borrow_mut().bind_path(&path, entry.type_hash);

    Ok(Class::from_parts(entry, graph))
}

// ============================================================================
// Accessor generation
// ============================================================================

/// Compile one attribute into its unified accessor: zero arguments read, one
/// or more write the first argument, with the descriptor's interception
/// stages composed around the terminal.
fn make_accessor(
    name: String,
    spec: Rc<AttrSpec>,
    owner: Weak<ClassEntry>,
    graph: Rc<dyn TypeGraph>,
    ctx: Rc<ResolveCtx>,
) -> MemberFn {
    Rc::new(move |receiver, args| {
        let entry = owner.upgrade().ok_or_else(|| released_class(&name))?;
        let terminal = |call_args: &[Value]| -> Result<Value, ForgeError> {
            if call_args.is_empty() {
                accessor_get(&name, &spec, &entry, receiver)
            } else {
                accessor_set(&name, &spec, &entry, receiver, &call_args[0], graph.as_ref(), &ctx)
            }
        };
        spec.stages.run(&name, args, &terminal)
    })
}

fn accessor_get(
    name: &str,
    spec: &Rc<AttrSpec>,
    entry: &Rc<ClassEntry>,
    receiver: Option<&Instance>,
) -> Result<Value, ForgeError> {
    let is_static = spec.has(AttrFlags::STATIC);

    let unset = if is_static {
        !entry.statics().borrow().values.contains_key(name)
    } else {
        let instance = receiver.ok_or_else(|| unbound(entry, name))?;
        !instance.store().borrow().values.contains_key(name)
    };

    if unset {
        if spec.has(AttrFlags::LAZY) && spec.default.is_none() {
            return Err(ObjectError::UninitializedAttribute(name.to_string()).into());
        }
        let value = eval_default(spec, receiver, name, &entry.name)?;
        // Write through the member's own pipeline so transforms and the
        // constraint check apply to materialized defaults too.
        call_own(entry, name, receiver, &[value])?;
    }

    let stored = if is_static {
        entry.statics().borrow().values.get(name).cloned()
    } else {
        let instance = receiver.ok_or_else(|| unbound(entry, name))?;
        let value = instance.store().borrow().values.get(name).cloned();
        value
    };
    stored.ok_or_else(|| ObjectError::UninitializedAttribute(name.to_string()).into())
}

fn accessor_set(
    name: &str,
    spec: &Rc<AttrSpec>,
    entry: &Rc<ClassEntry>,
    receiver: Option<&Instance>,
    value: &Value,
    graph: &dyn TypeGraph,
    ctx: &ResolveCtx,
) -> Result<Value, ForgeError> {
    if !spec.constraint.is_any() {
        if value.is_null() {
            if !spec.has(AttrFlags::ALLOW_NULL) {
                return Err(ObjectError::TypeConstraint {
                    attribute: name.to_string(),
                    expected: spec.constraint.describe(),
                    actual: "null".to_string(),
                }
                .into());
            }
        } else if let Some(target) = resolve_cached(spec, ctx)?
            && !value_conforms(value, target)
        {
            return Err(ObjectError::TypeConstraint {
                attribute: name.to_string(),
                expected: type_display(target, graph),
                actual: value.type_name(),
            }
            .into());
        }
    }

    let store = if spec.has(AttrFlags::STATIC) {
        entry.statics()
    } else {
        receiver.ok_or_else(|| unbound(entry, name))?.store()
    };
    let mut slots = store.borrow_mut();
    if spec.has(AttrFlags::FINAL) && slots.finalized.contains(name) {
        return Err(ObjectError::FinalAttribute(name.to_string()).into());
    }
    slots.values.insert(name.to_string(), value.clone());
    if spec.has(AttrFlags::FINAL) {
        slots.finalized.insert(name.to_string());
    }
    Ok(value.clone())
}

// ============================================================================
// Constructor generation
// ============================================================================

fn make_internal_ctor(
    class_name: String,
    vars: Vec<(String, Rc<AttrSpec>)>,
    ancestor: Option<TypeHash>,
    graph: Rc<dyn TypeGraph>,
) -> InternalCtor {
    Rc::new(move |instance: &Instance, kwargs: &[(String, Value)]| {
        // Split the caller's kwargs into this type's attributes and the rest,
        // which delegate to the ancestor's recorded internal constructor.
        let own: FxHashSet<&str> = vars.iter().map(|(n, _)| n.as_str()).collect();
        let forwarded: Vec<(String, Value)> = kwargs
            .iter()
            .filter(|(key, _)| !own.contains(key.as_str()))
            .cloned()
            .collect();

        match ancestor {
            Some(hash) => {
                let ctor = graph
                    .entry(hash)
                    .and_then(|ancestor_entry| ancestor_entry.internal_ctor())
                    .ok_or_else(|| {
                        ForgeError::from(ObjectError::UnknownAttribute {
                            class: class_name.clone(),
                            attribute: "__init__".to_string(),
                        })
                    })?;
                ctor(instance, &forwarded)?;
            }
            None => {
                if let Some((key, _)) = forwarded.first() {
                    return Err(ObjectError::UnknownAttribute {
                        class: class_name.clone(),
                        attribute: key.clone(),
                    }
                    .into());
                }
            }
        }

        let mut defaults: Vec<&(String, Rc<AttrSpec>)> = Vec::new();
        for pair in &vars {
            let (attr_name, spec) = pair;
            if spec.has(AttrFlags::STATIC) {
                continue;
            }
            if let Some((_, value)) = kwargs.iter().find(|(key, _)| key == attr_name) {
                instance.call(attr_name, &[value.clone()])?;
            } else if spec.has(AttrFlags::REQUIRED) {
                return Err(ObjectError::MissingAttribute {
                    class: class_name.clone(),
                    attribute: attr_name.clone(),
                }
                .into());
            } else if spec.has(AttrFlags::LAZY) {
                continue;
            } else {
                defaults.push(pair);
            }
        }

        for (attr_name, spec) in defaults {
            // An earlier default may have read this slot through the get
            // path and materialized it already.
            if instance.store().borrow().values.contains_key(attr_name) {
                continue;
            }
            let value = eval_default(spec, Some(instance), attr_name, &class_name)?;
            instance.call(attr_name, &[value])?;
        }
        Ok(())
    })
}

// ============================================================================
// Helpers
// ============================================================================

fn is_reserved(name: &str) -> bool {
    name.len() >= 5 && name.starts_with("__") && name.ends_with("__")
}

fn interface_member(class: &str, member: &str) -> BuildError {
    BuildError::InterfaceMember {
        class: class.to_string(),
        member: member.to_string(),
    }
}

fn push_stage(stages: &mut InterceptStages, stage: ModifierStage) {
    match stage {
        ModifierStage::Before(f) => stages.add_before(f),
        ModifierStage::Around(f) => stages.add_around(f),
        ModifierStage::After(f) => stages.add_after(f),
    }
}

fn ancestor_member_exists(
    ancestor: &Option<Rc<ClassEntry>>,
    graph: &dyn TypeGraph,
    name: &str,
) -> bool {
    match ancestor {
        Some(entry) => find_member(entry, graph, name).is_some(),
        None => false,
    }
}

/// Invoke a member declared directly on `entry`, bypassing chain lookup.
fn call_own(
    entry: &Rc<ClassEntry>,
    name: &str,
    receiver: Option<&Instance>,
    args: &[Value],
) -> Result<Value, ForgeError> {
    let slot = entry.member(name).ok_or_else(|| unbound(entry, name))?;
    let slot_receiver = if slot.is_static { None } else { receiver };
    (slot.callable)(slot_receiver, args)
}

fn eval_default(
    spec: &AttrSpec,
    receiver: Option<&Instance>,
    attr: &str,
    class: &str,
) -> Result<Value, ForgeError> {
    match &spec.default {
        DefaultSpec::None => Ok(Value::Null),
        DefaultSpec::Value(value) => Ok(value.clone()),
        DefaultSpec::Computed(f) => Ok(f()),
        DefaultSpec::WithInstance(f) => match receiver {
            Some(instance) => Ok(f(instance)),
            None => Err(BuildError::StaticInstanceDefault {
                class: class.to_string(),
                attribute: attr.to_string(),
            }
            .into()),
        },
    }
}

fn resolve_cached(spec: &AttrSpec, ctx: &ResolveCtx) -> Result<Option<TypeHash>, ForgeError> {
    if let Some(hash) = spec.cached_type() {
        return Ok(Some(hash));
    }
    match ctx.resolve(&spec.constraint)? {
        Some(hash) => {
            spec.cache_type(hash);
            Ok(Some(hash))
        }
        None => Ok(None),
    }
}

fn unbound(entry: &Rc<ClassEntry>, name: &str) -> ForgeError {
    ObjectError::UnknownAttribute {
        class: entry.name.clone(),
        attribute: name.to_string(),
    }
    .into()
}

fn released_class(name: &str) -> ForgeError {
    ObjectError::UnknownAttribute {
        class: "<released class>".to_string(),
        attribute: name.to_string(),
    }
    .into()
}
