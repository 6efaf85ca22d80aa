//! Unresolved call references.
//!
//! A reference holds the overload group for one call-site expression and
//! defers to [`resolve_overload`] to pick exactly one signature, then to
//! its [`FunctionFactory`] to materialize the concrete callable. The
//! reference is the *only* place generation is triggered, which — together
//! with the factory cache — guarantees each concrete signature is
//! generated at most once.
//!
//! Two variants, fixed at construction:
//!
//! - [`UnresolvedFunctionReference`] for free-function calls.
//! - [`UnresolvedMethodReference`] for instance calls. It wraps the base
//!   reference and overrides argument assembly: the receiver's IR value
//!   is prepended, becoming implicit parameter 0 of the materialized
//!   function — instance methods lower to free functions taking an
//!   explicit receiver.

use std::sync::Arc;

use smallvec::SmallVec;

use vela_ir::{
    CandidateSet, FuncId, IrModule, Linkage, ResolvedFunction, Span, Ty, TypedValue, ValueId,
};

use crate::error::CodegenError;
use crate::factory::FunctionFactory;
use crate::resolve::resolve_overload;
use crate::template::TemplateStore;

/// Assembled call arguments; small calls stay off the heap.
pub type CallArgs = SmallVec<[ValueId; 4]>;

/// The resolve-then-materialize contract shared by both reference kinds.
///
/// `resolve_and_call` is the combined operation the statement/expression
/// emitter uses; the step methods exist so the method variant can override
/// argument assembly and materialization while keeping the protocol.
pub trait CallTargetResolver {
    fn candidates(&self) -> &CandidateSet;
    fn factory(&self) -> &FunctionFactory;
    fn linkage(&self) -> Linkage;
    fn span(&self) -> Span;

    /// Pick exactly one signature for the passed argument types.
    fn resolve(&self, arg_tys: Option<&[Ty]>) -> Result<ResolvedFunction, CodegenError> {
        resolve_overload(self.candidates(), arg_tys, self.span())
    }

    /// Materialize the resolved target, using the passed-argument count
    /// when supplied and the full declared arity otherwise.
    fn materialize(
        &self,
        module: &mut IrModule,
        resolved: &ResolvedFunction,
        passed: Option<&[TypedValue]>,
    ) -> Result<FuncId, CodegenError> {
        let arg_count = passed.map_or(resolved.declared().declared_arity(), |args| args.len());
        self.factory()
            .get_or_create_function(module, resolved, arg_count, self.linkage())
    }

    /// Assemble the final ordered argument list for the call instruction.
    fn call_arguments(&self, resolved: &ResolvedFunction, passed: &[TypedValue]) -> CallArgs {
        passed
            .iter()
            .take(resolved.arg_count())
            .map(|arg| arg.value)
            .collect()
    }

    /// Resolve, materialize, and emit the call in one step.
    fn resolve_and_call(
        &self,
        module: &mut IrModule,
        passed: &[TypedValue],
    ) -> Result<(FuncId, ValueId), CodegenError> {
        let arg_tys: Vec<Ty> = passed.iter().map(|arg| arg.ty.clone()).collect();
        let resolved = self.resolve(Some(&arg_tys))?;
        let func = self.materialize(module, &resolved, Some(passed))?;
        let args = self.call_arguments(&resolved, passed);
        let call = module.emit_call(func, &args);
        Ok((func, call))
    }

    /// Materialize without a call — the function is referenced as a value,
    /// so the full declared arity is used.
    fn materialize_declared(&self, module: &mut IrModule) -> Result<FuncId, CodegenError> {
        let resolved = self.resolve(None)?;
        self.materialize(module, &resolved, None)
    }
}

/// Reference to a possibly overloaded free function.
#[derive(Debug)]
pub struct UnresolvedFunctionReference {
    candidates: CandidateSet,
    factory: FunctionFactory,
    linkage: Linkage,
    span: Span,
}

impl UnresolvedFunctionReference {
    #[must_use]
    pub fn new(
        candidates: CandidateSet,
        factory: FunctionFactory,
        linkage: Linkage,
        span: Span,
    ) -> Self {
        Self {
            candidates,
            factory,
            linkage,
            span,
        }
    }

    /// Reference to a free function in the fixed runtime library: stable
    /// names, external linkage, definitions pre-linked.
    #[must_use]
    pub fn runtime_function(candidates: CandidateSet, span: Span) -> Self {
        Self::new(
            candidates,
            FunctionFactory::runtime(),
            Linkage::External,
            span,
        )
    }

    /// Reference to a program-authored free function with the given
    /// overloads; bodies are generated on demand from `templates`.
    #[must_use]
    pub fn user_function(
        candidates: CandidateSet,
        templates: Arc<TemplateStore>,
        span: Span,
    ) -> Self {
        Self::new(
            candidates,
            FunctionFactory::user(templates),
            Linkage::Internal,
            span,
        )
    }
}

impl CallTargetResolver for UnresolvedFunctionReference {
    fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    fn factory(&self) -> &FunctionFactory {
        &self.factory
    }

    fn linkage(&self) -> Linkage {
        self.linkage
    }

    fn span(&self) -> Span {
        self.span
    }
}

/// Reference to a possibly overloaded instance method.
///
/// Holds the receiver as a shared handle into the caller's value arena;
/// the receiver's lifetime belongs to its own owning scope.
#[derive(Debug)]
pub struct UnresolvedMethodReference {
    base: UnresolvedFunctionReference,
    receiver: TypedValue,
}

impl UnresolvedMethodReference {
    /// Reference to an instance method in the runtime library.
    #[must_use]
    pub fn runtime_method(receiver: TypedValue, candidates: CandidateSet, span: Span) -> Self {
        Self {
            base: UnresolvedFunctionReference::runtime_function(candidates, span),
            receiver,
        }
    }

    /// Reference to a program-authored instance method.
    #[must_use]
    pub fn user_method(
        receiver: TypedValue,
        candidates: CandidateSet,
        templates: Arc<TemplateStore>,
        span: Span,
    ) -> Self {
        Self {
            base: UnresolvedFunctionReference::user_function(candidates, templates, span),
            receiver,
        }
    }

    #[must_use]
    pub fn receiver(&self) -> &TypedValue {
        &self.receiver
    }
}

impl CallTargetResolver for UnresolvedMethodReference {
    fn candidates(&self) -> &CandidateSet {
        self.base.candidates()
    }

    fn factory(&self) -> &FunctionFactory {
        self.base.factory()
    }

    fn linkage(&self) -> Linkage {
        self.base.linkage()
    }

    fn span(&self) -> Span {
        self.base.span()
    }

    fn materialize(
        &self,
        module: &mut IrModule,
        resolved: &ResolvedFunction,
        passed: Option<&[TypedValue]>,
    ) -> Result<FuncId, CodegenError> {
        let arg_count = passed.map_or(resolved.declared().declared_arity(), |args| args.len());
        self.factory().get_or_create_instance_method(
            module,
            &self.receiver.ty,
            resolved,
            arg_count,
            self.linkage(),
        )
    }

    /// The receiver becomes implicit parameter 0.
    fn call_arguments(&self, resolved: &ResolvedFunction, passed: &[TypedValue]) -> CallArgs {
        let mut args = CallArgs::with_capacity(passed.len() + 1);
        args.push(self.receiver.value);
        args.extend(
            passed
                .iter()
                .take(resolved.arg_count())
                .map(|arg| arg.value),
        );
        args
    }
}
