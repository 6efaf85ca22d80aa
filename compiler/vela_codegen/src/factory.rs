//! Function factories: materialize each concrete call target at most once.
//!
//! A factory turns a [`ResolvedFunction`] into a [`FuncId`] in the module.
//! The cache key is the mangled name of the resolved signature plus the
//! effective argument count — arity-dependent specialization (elided
//! trailing optionals) produces distinct symbols.
//!
//! Enum dispatch over the two strategies, not trait objects:
//!
//! - `Runtime`: declares an external symbol with the stable runtime name.
//!   No body is generated; the definition is pre-linked in the runtime
//!   library.
//! - `User`: mangles the concrete instantiation and generates the body by
//!   specializing the entity's generic template on first use.
//!
//! Check-then-insert runs under one lock so concurrent resolutions of the
//! same concrete signature materialize exactly once. The module's symbol
//! table is the source of truth; the factory cache is the mangled-name
//! fast path in front of it. Cached functions are never mutated.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use vela_ir::{FnType, FuncId, IrModule, Linkage, ResolvedFunction, Ty};

use crate::error::CodegenError;
use crate::mangle::{RuntimeMangler, UserMangler};
use crate::template::{specialize, TemplateStore};

/// Factory for fixed runtime-library symbols.
#[derive(Debug, Default)]
pub struct RuntimeFunctionFactory {
    mangler: RuntimeMangler,
    cache: Mutex<FxHashMap<String, FuncId>>,
}

/// Factory for program-authored (possibly generic) code.
#[derive(Debug)]
pub struct UserFunctionFactory {
    mangler: UserMangler,
    templates: Arc<TemplateStore>,
    cache: Mutex<FxHashMap<String, FuncId>>,
}

/// Enum-dispatched function factory, selected at reference construction
/// and never switched thereafter.
#[derive(Debug)]
pub enum FunctionFactory {
    Runtime(RuntimeFunctionFactory),
    User(UserFunctionFactory),
}

impl FunctionFactory {
    /// Factory for runtime-bound references.
    #[must_use]
    pub fn runtime() -> Self {
        Self::Runtime(RuntimeFunctionFactory::default())
    }

    /// Factory for user-defined references, generating bodies from
    /// `templates` on demand.
    #[must_use]
    pub fn user(templates: Arc<TemplateStore>) -> Self {
        Self::User(UserFunctionFactory {
            mangler: UserMangler::new(),
            templates,
            cache: Mutex::new(FxHashMap::default()),
        })
    }

    /// Materialize (or retrieve) the function for a free-function call.
    pub fn get_or_create_function(
        &self,
        module: &mut IrModule,
        resolved: &ResolvedFunction,
        arg_count: usize,
        linkage: Linkage,
    ) -> Result<FuncId, CodegenError> {
        self.get_or_create(module, resolved, arg_count, None, linkage)
    }

    /// Materialize (or retrieve) the function for an instance-method call.
    ///
    /// The receiver's type becomes declared parameter 0 of the
    /// materialized function before mangling and lookup.
    pub fn get_or_create_instance_method(
        &self,
        module: &mut IrModule,
        receiver: &Ty,
        resolved: &ResolvedFunction,
        arg_count: usize,
        linkage: Linkage,
    ) -> Result<FuncId, CodegenError> {
        self.get_or_create(module, resolved, arg_count, Some(receiver), linkage)
    }

    fn get_or_create(
        &self,
        module: &mut IrModule,
        resolved: &ResolvedFunction,
        arg_count: usize,
        receiver: Option<&Ty>,
        linkage: Linkage,
    ) -> Result<FuncId, CodegenError> {
        let arg_count = arg_count.min(resolved.param_tys().len());
        let mut param_tys: Vec<Ty> = Vec::with_capacity(arg_count + 1);
        if let Some(recv) = receiver {
            param_tys.push(recv.clone());
        }
        param_tys.extend_from_slice(&resolved.param_tys()[..arg_count]);
        let ret = resolved.ret_ty().clone();

        let symbol = match self {
            Self::Runtime(factory) => factory.mangler.mangle(resolved.entity()),
            Self::User(factory) => factory.mangler.mangle(resolved.entity(), &param_tys, &ret),
        };

        let cache = match self {
            Self::Runtime(factory) => &factory.cache,
            Self::User(factory) => &factory.cache,
        };
        // Check-then-insert is a single critical section.
        let mut cache = cache.lock();

        if let Some(&id) = cache.get(&symbol) {
            trace!(symbol = %symbol, "factory cache hit");
            return Ok(id);
        }
        if let Some(id) = module.lookup_symbol(&symbol) {
            // Another call site already materialized this signature.
            cache.insert(symbol, id);
            return Ok(id);
        }

        let id = module.declare_function(&symbol, FnType::new(param_tys, ret), linkage);
        match self {
            Self::Runtime(_) => {
                debug!(symbol = %symbol, "declared external runtime symbol");
            }
            Self::User(factory) => {
                let declared_arity = resolved.declared().declared_arity();
                let template = factory
                    .templates
                    .get(resolved.entity(), declared_arity)
                    .ok_or_else(|| CodegenError::Materialization {
                        entity: resolved.entity().clone(),
                        type_args: module.function(id).ty().params.clone(),
                        reason: "no generic template registered for this entity".to_string(),
                    })?;
                specialize(module, id, template, resolved)?;
                debug!(symbol = %symbol, "materialized function body");
            }
        }

        cache.insert(symbol, id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vela_ir::{BinOp, Entity, Param, Signature};

    use crate::template::{FunctionTemplate, TemplateExpr};

    fn resolved(entity: Entity, param_tys: Vec<Ty>, ret: Ty, arg_count: usize) -> ResolvedFunction {
        let params = param_tys
            .iter()
            .map(|ty| Param::required("p", ty.clone()))
            .collect();
        let sig = Signature::new(entity, params, ret.clone());
        ResolvedFunction::new(sig, param_tys, ret, arg_count)
    }

    fn add_templates() -> Arc<TemplateStore> {
        let mut store = TemplateStore::new();
        store.register(
            Entity::free("add"),
            1,
            FunctionTemplate::new(TemplateExpr::Param(0)),
        );
        store.register(
            Entity::free("add"),
            2,
            FunctionTemplate::new(TemplateExpr::binary(
                BinOp::Add,
                TemplateExpr::Param(0),
                TemplateExpr::Param(1),
            )),
        );
        Arc::new(store)
    }

    #[test]
    fn runtime_strategy_declares_external_without_body() {
        let mut module = IrModule::new("test");
        let factory = FunctionFactory::runtime();
        let push = resolved(
            Entity::method(Ty::list(Ty::Int), "push"),
            vec![Ty::Int],
            Ty::Unit,
            1,
        );

        let id = factory
            .get_or_create_instance_method(
                &mut module,
                &Ty::list(Ty::Int),
                &push,
                1,
                Linkage::External,
            )
            .unwrap();

        let func = module.function(id);
        assert_eq!(func.name(), "vela_list_push");
        assert_eq!(func.linkage(), Linkage::External);
        assert!(!func.has_body());
        // Receiver type is declared parameter 0.
        assert_eq!(func.ty().params, vec![Ty::list(Ty::Int), Ty::Int]);
    }

    #[test]
    fn user_strategy_generates_internal_body() {
        let mut module = IrModule::new("test");
        let factory = FunctionFactory::user(add_templates());
        let add = resolved(Entity::free("add"), vec![Ty::Int, Ty::Int], Ty::Int, 2);

        let id = factory
            .get_or_create_function(&mut module, &add, 2, Linkage::Internal)
            .unwrap();

        let func = module.function(id);
        assert_eq!(func.name(), "_vela_add$Tint_int$Rint");
        assert_eq!(func.linkage(), Linkage::Internal);
        assert!(func.has_body());
    }

    #[test]
    fn repeated_resolution_reuses_the_materialized_function() {
        let mut module = IrModule::new("test");
        let factory = FunctionFactory::user(add_templates());
        let add = resolved(Entity::free("add"), vec![Ty::Int, Ty::Int], Ty::Int, 2);

        let first = factory
            .get_or_create_function(&mut module, &add, 2, Linkage::Internal)
            .unwrap();
        let second = factory
            .get_or_create_function(&mut module, &add, 2, Linkage::Internal)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(module.function_count(), 1);
    }

    #[test]
    fn independent_factories_share_through_the_module_symbol_table() {
        let mut module = IrModule::new("test");
        let templates = add_templates();
        let add = resolved(Entity::free("add"), vec![Ty::Int, Ty::Int], Ty::Int, 2);

        let first = FunctionFactory::user(Arc::clone(&templates))
            .get_or_create_function(&mut module, &add, 2, Linkage::Internal)
            .unwrap();
        let second = FunctionFactory::user(templates)
            .get_or_create_function(&mut module, &add, 2, Linkage::Internal)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(module.function_count(), 1);
    }

    #[test]
    fn argument_count_participates_in_the_cache_key() {
        let mut module = IrModule::new("test");
        let entity = Entity::free("first");
        let mut store = TemplateStore::new();
        // Body only touches parameter 0, so it specializes at either arity.
        store.register(
            entity.clone(),
            2,
            FunctionTemplate::new(TemplateExpr::Param(0)),
        );
        let factory = FunctionFactory::user(Arc::new(store));
        let sig = Signature::new(
            entity,
            vec![
                Param::required("a", Ty::Int),
                Param::optional("b", Ty::Int),
            ],
            Ty::Int,
        );
        let full = ResolvedFunction::new(sig.clone(), vec![Ty::Int, Ty::Int], Ty::Int, 2);
        let elided = ResolvedFunction::new(sig, vec![Ty::Int, Ty::Int], Ty::Int, 1);

        let a = factory
            .get_or_create_function(&mut module, &full, 2, Linkage::Internal)
            .unwrap();
        let b = factory
            .get_or_create_function(&mut module, &elided, 1, Linkage::Internal)
            .unwrap();

        assert_ne!(a, b);
        assert_eq!(module.function(a).name(), "_vela_first$Tint_int$Rint");
        assert_eq!(module.function(b).name(), "_vela_first$Tint$Rint");
        assert_eq!(module.function_count(), 2);
    }

    #[test]
    fn missing_template_is_a_materialization_error() {
        let mut module = IrModule::new("test");
        let factory = FunctionFactory::user(Arc::new(TemplateStore::new()));
        let add = resolved(Entity::free("add"), vec![Ty::Int], Ty::Int, 1);

        let err = factory
            .get_or_create_function(&mut module, &add, 1, Linkage::Internal)
            .unwrap_err();
        assert!(matches!(err, CodegenError::Materialization { .. }));
        assert!(err.to_string().contains("no generic template registered"));
    }
}
