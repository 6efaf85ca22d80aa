//! Generic function templates and on-demand specialization.
//!
//! The front-end registers one [`FunctionTemplate`] per declared overload
//! of a user entity. When resolution picks a concrete instantiation, the
//! user factory specializes the template: declared parameter types are
//! already substituted with the bindings resolution recorded, and the
//! template body is lowered into the materialized function.
//!
//! Specialization is deterministic and never retried; a template that
//! references a type that cannot be lowered after substitution fails with
//! a [`Materialization`](CodegenError::Materialization) error naming the
//! entity and the concrete type arguments.

use rustc_hash::FxHashMap;
use tracing::debug;

use vela_ir::{BinOp, Entity, FuncId, FunctionBody, IrModule, ResolvedFunction, Ty, ValueId};

use crate::error::CodegenError;

/// Body expression of a generic template.
///
/// The subset the backend lowers itself: parameter references, literals,
/// binary arithmetic, and nothing else — richer bodies arrive from the
/// statement emitter, which is out of scope here.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateExpr {
    /// Declared parameter `index`. For instance methods, index 0 is the
    /// receiver and declared parameters start at 1.
    Param(u32),
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Binary {
        op: BinOp,
        lhs: Box<TemplateExpr>,
        rhs: Box<TemplateExpr>,
    },
}

impl TemplateExpr {
    /// Shorthand for a binary node.
    #[must_use]
    pub fn binary(op: BinOp, lhs: TemplateExpr, rhs: TemplateExpr) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

/// A generic function body awaiting instantiation.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionTemplate {
    body: TemplateExpr,
}

impl FunctionTemplate {
    #[must_use]
    pub fn new(body: TemplateExpr) -> Self {
        Self { body }
    }

    #[must_use]
    pub fn body(&self) -> &TemplateExpr {
        &self.body
    }
}

/// Templates keyed by declaring entity and declared arity.
///
/// Overloads share an entity, so the declared parameter count is part of
/// the key. For methods the arity excludes the receiver.
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: FxHashMap<(Entity, usize), FunctionTemplate>,
}

impl TemplateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entity: Entity, declared_arity: usize, template: FunctionTemplate) {
        self.templates.insert((entity, declared_arity), template);
    }

    #[must_use]
    pub fn get(&self, entity: &Entity, declared_arity: usize) -> Option<&FunctionTemplate> {
        self.templates.get(&(entity.clone(), declared_arity))
    }
}

fn materialization_error(
    module: &IrModule,
    func: FuncId,
    resolved: &ResolvedFunction,
    reason: impl Into<String>,
) -> CodegenError {
    CodegenError::Materialization {
        entity: resolved.entity().clone(),
        type_args: module.function(func).ty().params.clone(),
        reason: reason.into(),
    }
}

/// Specialize `template` into the (already declared) function `func`.
///
/// `func`'s declared type carries the concrete instantiation, receiver
/// included for methods. Every declared type must be lowerable; the body
/// is lowered bottom-up and attached exactly once.
pub(crate) fn specialize(
    module: &mut IrModule,
    func: FuncId,
    template: &FunctionTemplate,
    resolved: &ResolvedFunction,
) -> Result<(), CodegenError> {
    let fn_ty = module.function(func).ty().clone();

    for ty in fn_ty.params.iter().chain(std::iter::once(&fn_ty.ret)) {
        if !ty.is_concrete() {
            return Err(materialization_error(
                module,
                func,
                resolved,
                format!("type {ty} cannot be lowered"),
            ));
        }
    }

    let param_count = u32::try_from(fn_ty.params.len()).unwrap_or(u32::MAX);
    let params: Vec<ValueId> = (0..param_count).map(|i| module.param(func, i)).collect();

    let mut instrs = Vec::new();
    let root = lower(module, func, resolved, &params, &mut instrs, template.body())?;
    let ret = if fn_ty.ret == Ty::Unit { None } else { Some(root) };

    module.set_body(
        func,
        FunctionBody {
            params,
            instrs,
            ret,
        },
    );
    debug!(symbol = module.function(func).name(), "specialized template");
    Ok(())
}

fn lower(
    module: &mut IrModule,
    func: FuncId,
    resolved: &ResolvedFunction,
    params: &[ValueId],
    instrs: &mut Vec<ValueId>,
    expr: &TemplateExpr,
) -> Result<ValueId, CodegenError> {
    match expr {
        TemplateExpr::Param(index) => {
            params.get(*index as usize).copied().ok_or_else(|| {
                materialization_error(
                    module,
                    func,
                    resolved,
                    format!("template references parameter {index} beyond the declared arity"),
                )
            })
        }
        TemplateExpr::Int(v) => Ok(module.const_int(*v)),
        TemplateExpr::Float(v) => Ok(module.const_float(*v)),
        TemplateExpr::Bool(v) => Ok(module.const_bool(*v)),
        TemplateExpr::Str(v) => Ok(module.const_str(v.clone())),
        TemplateExpr::Binary { op, lhs, rhs } => {
            let lhs = lower(module, func, resolved, params, instrs, lhs)?;
            let rhs = lower(module, func, resolved, params, instrs, rhs)?;
            let result = module.binary(*op, lhs, rhs);
            instrs.push(result);
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vela_ir::{FnType, Linkage, Param, Signature};

    fn resolved_add() -> ResolvedFunction {
        let sig = Signature::new(
            Entity::free("add"),
            vec![
                Param::required("a", Ty::Int),
                Param::required("b", Ty::Int),
            ],
            Ty::Int,
        );
        ResolvedFunction::new(sig, vec![Ty::Int, Ty::Int], Ty::Int, 2)
    }

    #[test]
    fn specialization_lowers_the_body() {
        let mut module = IrModule::new("test");
        let func = module.declare_function(
            "_vela_add$Tint_int$Rint",
            FnType::new(vec![Ty::Int, Ty::Int], Ty::Int),
            Linkage::Internal,
        );
        let template = FunctionTemplate::new(TemplateExpr::binary(
            BinOp::Add,
            TemplateExpr::Param(0),
            TemplateExpr::Param(1),
        ));

        specialize(&mut module, func, &template, &resolved_add()).unwrap();

        let body = module.function(func).body().unwrap();
        assert_eq!(body.params.len(), 2);
        assert_eq!(body.instrs.len(), 1);
        assert!(body.ret.is_some());
    }

    #[test]
    fn out_of_range_parameter_is_a_materialization_error() {
        let mut module = IrModule::new("test");
        let func = module.declare_function(
            "_vela_add$Tint$Rint",
            FnType::new(vec![Ty::Int], Ty::Int),
            Linkage::Internal,
        );
        let template = FunctionTemplate::new(TemplateExpr::Param(1));

        let err = specialize(&mut module, func, &template, &resolved_add()).unwrap_err();
        assert!(matches!(err, CodegenError::Materialization { .. }));
        assert!(err.to_string().contains("beyond the declared arity"));
    }

    #[test]
    fn unlowerable_type_is_a_materialization_error() {
        let mut module = IrModule::new("test");
        let func = module.declare_function(
            "_vela_id$T$VT$R$VT",
            FnType::new(vec![Ty::var("T")], Ty::var("T")),
            Linkage::Internal,
        );
        let template = FunctionTemplate::new(TemplateExpr::Param(0));

        let err = specialize(&mut module, func, &template, &resolved_add()).unwrap_err();
        assert!(err.to_string().contains("cannot be lowered"));
        // The declared function exists but no body was attached.
        assert!(!module.function(func).has_body());
    }

    #[test]
    fn store_distinguishes_overloads_by_arity() {
        let mut store = TemplateStore::new();
        let entity = Entity::free("add");
        store.register(
            entity.clone(),
            1,
            FunctionTemplate::new(TemplateExpr::Param(0)),
        );
        store.register(
            entity.clone(),
            2,
            FunctionTemplate::new(TemplateExpr::binary(
                BinOp::Add,
                TemplateExpr::Param(0),
                TemplateExpr::Param(1),
            )),
        );

        assert_eq!(
            store.get(&entity, 1).map(FunctionTemplate::body),
            Some(&TemplateExpr::Param(0))
        );
        assert!(store.get(&entity, 2).is_some());
        assert!(store.get(&entity, 3).is_none());
    }
}
