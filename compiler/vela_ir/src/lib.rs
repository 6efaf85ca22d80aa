//! Core IR types for the Vela compiler backend.
//!
//! This crate holds the data model shared between the front-end and the code
//! generator: the lowered type lattice ([`Ty`]), declared entities and
//! signatures ([`Entity`], [`Signature`], [`CandidateSet`]), and the slice of
//! the IR module surface that call-target resolution consumes ([`IrModule`],
//! [`MaterializedFunction`]).
//!
//! The module representation is deliberately narrow. Values are
//! arena-allocated and referred to by [`ValueId`], functions by [`FuncId`].
//! Handles are cheap to copy and keep ownership inside the arenas, so a
//! resolved call target is an index into a table rather than a shared object.

pub mod entity;
pub mod module;
pub mod sig;
pub mod span;
pub mod ty;

pub use entity::Entity;
pub use module::{
    BinOp, Constant, FnType, FuncId, FunctionBody, IrModule, Linkage, MaterializedFunction,
    TypedValue, Value, ValueId, ValueKind,
};
pub use sig::{CandidateSet, Param, ResolvedFunction, Signature};
pub use span::Span;
pub use ty::Ty;
