//! Signatures, overload groups, and resolved call targets.
//!
//! A [`Signature`] is what the front-end's type checker produces per
//! overload. A [`CandidateSet`] groups every signature sharing a call-site
//! name. Resolution picks exactly one and records it as a
//! [`ResolvedFunction`] together with the effective parameter count for
//! that call site (trailing optional parameters may be elided).
//!
//! All three are immutable once constructed.

use std::fmt;

use crate::entity::Entity;
use crate::ty::Ty;

/// A declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: Ty,
    /// Trailing optional parameters may be elided at the call site.
    pub optional: bool,
}

impl Param {
    #[must_use]
    pub fn required(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
        }
    }

    #[must_use]
    pub fn optional(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: true,
        }
    }
}

/// One overload of a callable entity: parameter types plus return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    entity: Entity,
    params: Vec<Param>,
    ret: Ty,
}

impl Signature {
    #[must_use]
    pub fn new(entity: Entity, params: Vec<Param>, ret: Ty) -> Self {
        Self {
            entity,
            params,
            ret,
        }
    }

    #[must_use]
    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    #[must_use]
    pub fn ret(&self) -> &Ty {
        &self.ret
    }

    /// Number of parameters that must be supplied at a call site.
    #[must_use]
    pub fn required_arity(&self) -> usize {
        self.params.iter().filter(|p| !p.optional).count()
    }

    /// Full declared parameter count.
    #[must_use]
    pub fn declared_arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.entity)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param.ty)?;
            if param.optional {
                write!(f, "?")?;
            }
        }
        write!(f, ") -> {}", self.ret)
    }
}

/// The overload group for one call-site name. Always non-empty; candidate
/// order is the front-end's enumeration order and is preserved for
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    name: String,
    signatures: Vec<Signature>,
}

impl CandidateSet {
    /// # Panics
    ///
    /// Panics if `signatures` is empty; the front-end never produces an
    /// empty overload group.
    #[must_use]
    pub fn new(name: impl Into<String>, signatures: Vec<Signature>) -> Self {
        assert!(
            !signatures.is_empty(),
            "candidate set must contain at least one signature"
        );
        Self {
            name: name.into(),
            signatures,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }
}

/// The single signature chosen for a specific call site.
///
/// `param_tys` and `ret_ty` are the signature's types after substituting
/// any generic parameters bound during resolution; `arg_count` is the
/// effective parameter count to materialize (less than the declared arity
/// when trailing optionals were elided).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFunction {
    signature: Signature,
    param_tys: Vec<Ty>,
    ret_ty: Ty,
    arg_count: usize,
}

impl ResolvedFunction {
    /// # Panics
    ///
    /// Panics if `arg_count` exceeds the substituted parameter list.
    #[must_use]
    pub fn new(signature: Signature, param_tys: Vec<Ty>, ret_ty: Ty, arg_count: usize) -> Self {
        assert!(
            arg_count <= param_tys.len(),
            "effective argument count exceeds declared arity"
        );
        Self {
            signature,
            param_tys,
            ret_ty,
            arg_count,
        }
    }

    #[must_use]
    pub fn entity(&self) -> &Entity {
        self.signature.entity()
    }

    /// The declared signature as produced by the front-end.
    #[must_use]
    pub fn declared(&self) -> &Signature {
        &self.signature
    }

    /// Substituted parameter types for the full declared arity.
    #[must_use]
    pub fn param_tys(&self) -> &[Ty] {
        &self.param_tys
    }

    /// Substituted parameter types, truncated to the effective count.
    #[must_use]
    pub fn effective_param_tys(&self) -> &[Ty] {
        &self.param_tys[..self.arg_count]
    }

    /// Substituted return type.
    #[must_use]
    pub fn ret_ty(&self) -> &Ty {
        &self.ret_ty
    }

    /// Effective parameter count for this call site.
    #[must_use]
    pub fn arg_count(&self) -> usize {
        self.arg_count
    }
}
