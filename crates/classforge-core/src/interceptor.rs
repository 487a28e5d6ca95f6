//! The interception pipeline.
//!
//! Generic function-wrapping machinery composing `before` / `around` / `after`
//! stages around a terminal callback (the real accessor or method body). The
//! same pipeline wraps every generated member, including the constructor's
//! `__init__` slot.
//!
//! Execution order for one call:
//!
//! 1. every `before` stage, in declaration order, with the full original
//!    argument list (member name first) — return values are discarded;
//! 2. the `around` stages folded so the first declared is outermost, each
//!    wrapping a `next` callable that invokes the remainder of the chain down
//!    to the terminal — the folded chain's result is the call's result;
//! 3. every `after` stage, in declaration order, with the original arguments.
//!
//! Stages never see the receiver: instance members have it stripped before
//! the interceptor argument list is built. An error from an `around` stage or
//! the terminal propagates immediately; `after` stages do not run.

use std::fmt;
use std::rc::Rc;

use crate::error::ForgeError;
use crate::value::Value;

/// Result type threaded through the pipeline.
pub type InterceptResult = Result<Value, ForgeError>;

/// The remainder of an interception chain, callable from an `around` stage.
pub type NextFn<'a> = dyn Fn(&[Value]) -> InterceptResult + 'a;

/// A `before` stage: side effects only.
pub type BeforeFn = Rc<dyn Fn(&str, &[Value])>;

/// An `around` stage: wraps the rest of the chain.
pub type AroundFn = Rc<dyn Fn(&str, &NextFn<'_>, &[Value]) -> InterceptResult>;

/// An `after` stage: side effects only.
pub type AfterFn = Rc<dyn Fn(&str, &[Value])>;

/// The ordered interception stages attached to one member.
#[derive(Clone, Default)]
pub struct InterceptStages {
    /// `before` stages, in declaration order.
    pub before: Vec<BeforeFn>,
    /// `around` stages, first declared outermost.
    pub around: Vec<AroundFn>,
    /// `after` stages, in declaration order.
    pub after: Vec<AfterFn>,
}

impl InterceptStages {
    /// Create an empty stage set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether no stages are attached.
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.around.is_empty() && self.after.is_empty()
    }

    /// Append a `before` stage.
    pub fn add_before(&mut self, stage: BeforeFn) {
        self.before.push(stage);
    }

    /// Append an `around` stage.
    pub fn add_around(&mut self, stage: AroundFn) {
        self.around.push(stage);
    }

    /// Append an `after` stage.
    pub fn add_after(&mut self, stage: AfterFn) {
        self.after.push(stage);
    }

    /// Run one call through the composed pipeline.
    pub fn run(&self, member: &str, args: &[Value], terminal: &NextFn<'_>) -> InterceptResult {
        for stage in &self.before {
            stage(member, args);
        }
        let result = run_chain(&self.around, member, args, terminal)?;
        for stage in &self.after {
            stage(member, args);
        }
        Ok(result)
    }
}

impl fmt::Debug for InterceptStages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptStages")
            .field("before", &self.before.len())
            .field("around", &self.around.len())
            .field("after", &self.after.len())
            .finish()
    }
}

fn run_chain(
    chain: &[AroundFn],
    member: &str,
    args: &[Value],
    terminal: &NextFn<'_>,
) -> InterceptResult {
    match chain.split_first() {
        None => terminal(args),
        Some((outer, rest)) => {
            let next = |inner: &[Value]| run_chain(rest, member, inner, terminal);
            outer(member, &next, args)
        }
    }
}

/// Build an `around` stage from a getter transform.
///
/// Fires on pure get calls (zero arguments) and maps the value the chain
/// returns; any other arity passes through unchanged. The stored value stays
/// raw.
pub fn getter_stage(transform: Rc<dyn Fn(Value) -> Value>) -> AroundFn {
    Rc::new(move |_member, next, args| {
        if args.is_empty() {
            Ok(transform(next(args)?))
        } else {
            next(args)
        }
    })
}

/// Build an `around` stage from a setter transform.
///
/// Fires on pure set calls (exactly one argument) and maps the incoming value
/// before handing it to the chain; any other arity passes through unchanged.
/// The stored value is the transformed one.
pub fn setter_stage(transform: Rc<dyn Fn(Value) -> Value>) -> AroundFn {
    Rc::new(move |_member, next, args| {
        if args.len() == 1 {
            next(&[transform(args[0].clone())])
        } else {
            next(args)
        }
    })
}
