//! Overload resolution.
//!
//! Given a candidate set and the static types of the passed arguments,
//! pick exactly one signature. Candidates are ranked per parameter:
//! an exact type match beats the single widening coercion (`int ->
//! float`), which beats binding a generic parameter. A generic parameter
//! binds the first argument type it sees and must match it on every later
//! use within the same candidate.
//!
//! Zero compatible candidates or a tie at the top score is an
//! [`OverloadResolution`](CodegenError::OverloadResolution) error carrying
//! the call site and the full candidate list — ambiguity is never broken
//! by an arbitrary tie-break.

use rustc_hash::FxHashMap;
use tracing::trace;

use vela_ir::{CandidateSet, ResolvedFunction, Signature, Span, Ty};

use crate::error::{CodegenError, OverloadFailure};

const SCORE_EXACT: u32 = 4;
const SCORE_COERCE: u32 = 2;
const SCORE_BIND: u32 = 1;

type Bindings = FxHashMap<String, Ty>;

/// Score one parameter/argument pair, recording generic bindings.
fn match_param(param: &Ty, arg: &Ty, bindings: &mut Bindings) -> Option<u32> {
    if param == arg {
        return Some(SCORE_EXACT);
    }
    match (param, arg) {
        (Ty::Var(name), _) => match bindings.get(name) {
            Some(bound) if bound != arg => None,
            Some(_) => Some(SCORE_BIND),
            None => {
                bindings.insert(name.clone(), arg.clone());
                Some(SCORE_BIND)
            }
        },
        // The lattice's only widening coercion.
        (Ty::Float, Ty::Int) => Some(SCORE_COERCE),
        (Ty::List(p), Ty::List(a)) => match_param(p, a, bindings),
        _ => None,
    }
}

/// Rank a candidate against the argument types, or reject it.
fn rank(sig: &Signature, args: &[Ty]) -> Option<(u32, Bindings)> {
    if args.len() < sig.required_arity() || args.len() > sig.declared_arity() {
        return None;
    }
    let mut bindings = Bindings::default();
    let mut total = 0;
    for (param, arg) in sig.params().iter().zip(args) {
        total += match_param(&param.ty, arg, &mut bindings)?;
    }
    Some((total, bindings))
}

/// Apply recorded generic bindings; unbound `Var`s pass through unchanged
/// (they surface later as materialization errors if user code needs them).
fn substitute(ty: &Ty, bindings: &Bindings) -> Ty {
    match ty {
        Ty::Var(name) => bindings.get(name).cloned().unwrap_or_else(|| ty.clone()),
        Ty::List(elem) => Ty::list(substitute(elem, bindings)),
        _ => ty.clone(),
    }
}

fn resolution_error(
    failure: OverloadFailure,
    candidates: &CandidateSet,
    arg_tys: Option<&[Ty]>,
    call_site: Span,
) -> CodegenError {
    CodegenError::OverloadResolution {
        failure,
        call_site,
        arg_tys: arg_tys.map(<[Ty]>::to_vec).unwrap_or_default(),
        candidates: candidates.signatures().to_vec(),
    }
}

fn resolve_from(sig: &Signature, bindings: &Bindings, arg_count: usize) -> ResolvedFunction {
    let param_tys = sig
        .params()
        .iter()
        .map(|p| substitute(&p.ty, bindings))
        .collect();
    let ret_ty = substitute(sig.ret(), bindings);
    ResolvedFunction::new(sig.clone(), param_tys, ret_ty, arg_count)
}

/// Resolve a candidate set against the passed argument types.
///
/// With `arg_tys` absent (the function is referenced without a call, e.g.
/// taken as a value), the set must contain exactly one candidate and the
/// full declared arity is used.
///
/// Deterministic: identical inputs always yield the same chosen signature.
pub fn resolve_overload(
    candidates: &CandidateSet,
    arg_tys: Option<&[Ty]>,
    call_site: Span,
) -> Result<ResolvedFunction, CodegenError> {
    let Some(args) = arg_tys else {
        let signatures = candidates.signatures();
        if signatures.len() != 1 {
            return Err(resolution_error(
                OverloadFailure::Ambiguous,
                candidates,
                None,
                call_site,
            ));
        }
        let sig = &signatures[0];
        return Ok(resolve_from(sig, &Bindings::default(), sig.declared_arity()));
    };

    let mut ranked: Vec<(usize, u32, Bindings)> = Vec::new();
    for (index, sig) in candidates.signatures().iter().enumerate() {
        if let Some((score, bindings)) = rank(sig, args) {
            ranked.push((index, score, bindings));
        }
    }

    if ranked.is_empty() {
        return Err(resolution_error(
            OverloadFailure::NoMatch,
            candidates,
            Some(args),
            call_site,
        ));
    }

    let best = ranked.iter().map(|(_, score, _)| *score).max().unwrap_or(0);
    let mut top = ranked.into_iter().filter(|(_, score, _)| *score == best);
    let (index, _, bindings) = top.next().ok_or_else(|| {
        resolution_error(OverloadFailure::NoMatch, candidates, Some(args), call_site)
    })?;
    if top.next().is_some() {
        return Err(resolution_error(
            OverloadFailure::Ambiguous,
            candidates,
            Some(args),
            call_site,
        ));
    }

    let sig = &candidates.signatures()[index];
    trace!(signature = %sig, "resolved overload");
    Ok(resolve_from(sig, &bindings, args.len()))
}
