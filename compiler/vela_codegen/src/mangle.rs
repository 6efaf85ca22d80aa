//! Symbol mangling strategies.
//!
//! Two strategies produce the linker names of materialized functions:
//!
//! - [`RuntimeMangler`]: stable names for the fixed runtime library. The
//!   runtime is a pre-built contract, never overloaded by the compiler, so
//!   its names carry no type information.
//! - [`UserMangler`]: instantiation-aware names for program-authored code.
//!   The concrete parameter and return types of the resolved call are
//!   encoded into the symbol so distinct instantiations of one generic
//!   entity never collide, and the same instantiation always mangles
//!   identically (the factory cache keys on this).
//!
//! # Scheme
//!
//! ```text
//! runtime:  vela_<name>            vela_gc
//!           vela_<owner>_<name>    vela_list_push
//! user:     _vela_[<module>$]<name>$T<params>$R<ret>
//!           _vela_add$Tint_int$Rint
//!           _vela_math$lerp$Tfloat_float$Rfloat
//!           _vela_list$LBint$RB$map$T...      (method on [int])
//! ```
//!
//! Both schemes are pure functions of their inputs; no global state.

use std::fmt::Write;

use vela_ir::{Entity, ResolvedFunction, Ty};

/// Prefix for program-authored (user) symbols.
pub const MANGLE_PREFIX: &str = "_vela_";

/// Prefix for runtime-library symbols.
pub const RUNTIME_PREFIX: &str = "vela_";

/// Separator between module path components and name segments.
const MODULE_SEP: char = '$';

/// Mangler for fixed runtime-library symbols.
///
/// Names derive solely from the declaring entity; the same method mangles
/// to the same symbol for every instantiation because the runtime is
/// type-erased.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeMangler;

impl RuntimeMangler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Mangle a runtime entity to its fixed contract name.
    #[must_use]
    pub fn mangle(&self, entity: &Entity) -> String {
        let mut result = String::with_capacity(32);
        result.push_str(RUNTIME_PREFIX);
        match entity {
            Entity::Method { owner, name } => {
                result.push_str(owner.runtime_name());
                result.push('_');
                encode_identifier(&mut result, name);
            }
            Entity::Free { name, .. } | Entity::Runtime { name } => {
                encode_identifier(&mut result, name);
            }
        }
        result
    }
}

/// Mangler for user code, encoding the concrete instantiation.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserMangler;

impl UserMangler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Mangle a resolved call target.
    ///
    /// `param_tys` is the effective parameter list — receiver-prepended for
    /// methods and truncated to the effective argument count, so elided
    /// trailing optionals yield a distinct symbol from the full-arity form.
    #[must_use]
    pub fn mangle(&self, entity: &Entity, param_tys: &[Ty], ret: &Ty) -> String {
        let mut result = String::with_capacity(64);
        result.push_str(MANGLE_PREFIX);

        match entity {
            Entity::Free { module, name } => {
                if !module.is_empty() {
                    encode_module_path(&mut result, module);
                    result.push(MODULE_SEP);
                }
                encode_identifier(&mut result, name);
            }
            Entity::Method { owner, name } => {
                encode_type(&mut result, owner);
                result.push(MODULE_SEP);
                encode_identifier(&mut result, name);
            }
            Entity::Runtime { name } => {
                encode_identifier(&mut result, name);
            }
        }

        result.push_str("$T");
        for (i, ty) in param_tys.iter().enumerate() {
            if i > 0 {
                result.push('_');
            }
            encode_type(&mut result, ty);
        }
        result.push_str("$R");
        encode_type(&mut result, ret);

        result
    }

    /// Mangle a resolved function, prepending `receiver` for methods.
    #[must_use]
    pub fn mangle_resolved(&self, resolved: &ResolvedFunction, receiver: Option<&Ty>) -> String {
        match receiver {
            Some(recv) => {
                let mut params = Vec::with_capacity(resolved.arg_count() + 1);
                params.push(recv.clone());
                params.extend_from_slice(resolved.effective_param_tys());
                self.mangle(resolved.entity(), &params, resolved.ret_ty())
            }
            None => self.mangle(
                resolved.entity(),
                resolved.effective_param_tys(),
                resolved.ret_ty(),
            ),
        }
    }
}

// -- Encoding helpers --
//
// Alphanumerics and '_' pass through; brackets get named escapes; anything
// else is hex-escaped. Every output is linker-clean ASCII.

fn encode_char_hex(out: &mut String, c: char) {
    let _ = write!(out, "${:02x}", c as u32);
}

fn encode_module_path(out: &mut String, path: &str) {
    for c in path.chars() {
        match c {
            '/' | '\\' | '.' | ':' => out.push(MODULE_SEP),
            c if c.is_alphanumeric() || c == '_' => out.push(c),
            _ => encode_char_hex(out, c),
        }
    }
}

fn encode_identifier(out: &mut String, name: &str) {
    for c in name.chars() {
        match c {
            c if c.is_alphanumeric() || c == '_' => out.push(c),
            _ => encode_char_hex(out, c),
        }
    }
}

fn encode_type(out: &mut String, ty: &Ty) {
    match ty {
        Ty::Bool | Ty::Int | Ty::Float | Ty::Str | Ty::Unit => {
            out.push_str(ty.runtime_name());
        }
        Ty::List(elem) => {
            out.push_str("list$LB");
            encode_type(out, elem);
            out.push_str("$RB");
        }
        Ty::Var(name) => {
            out.push_str("$V");
            encode_identifier(out, name);
        }
    }
}

/// Check if a symbol name was minted by either Vela mangling strategy.
#[must_use]
pub fn is_vela_symbol(name: &str) -> bool {
    name.starts_with(MANGLE_PREFIX) || name.starts_with(RUNTIME_PREFIX)
}

/// Extract the source-level function name from a user-mangled symbol.
#[must_use]
pub fn extract_function_name(mangled: &str) -> Option<&str> {
    let rest = mangled.strip_prefix(MANGLE_PREFIX)?;
    let head = match rest.rfind("$T") {
        Some(pos) => &rest[..pos],
        None => rest,
    };
    match head.rfind(MODULE_SEP) {
        Some(pos) => Some(&head[pos + 1..]),
        None => Some(head),
    }
}
