//! The IR module: arena-owned functions and values.
//!
//! Follows the id-based arena pattern: [`FuncId`] and [`ValueId`] are cheap
//! copyable handles into tables owned by [`IrModule`]. Declaring a symbol
//! that already exists returns the existing handle, so declaration is
//! idempotent and the symbol table never holds duplicates.
//!
//! A [`MaterializedFunction`]'s name, type, and linkage are fixed at
//! declaration. Bodies are attached exactly once (declare-then-define); an
//! `External` function never receives one.

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::ty::Ty;

/// Handle to a value in the module's value arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(u32);

impl ValueId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a materialized function in the module's function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncId(u32);

impl FuncId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Symbol linkage. Fixed at declaration, never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    /// Imported symbol, defined elsewhere (runtime library). Never
    /// internalized by whole-program optimization.
    External,
    /// Defined by this compilation; eligible for internalization and
    /// elimination unless allow-listed.
    Internal,
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::External => write!(f, "external"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// A function's declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnType {
    pub params: Vec<Ty>,
    pub ret: Ty,
}

impl FnType {
    #[must_use]
    pub fn new(params: Vec<Ty>, ret: Ty) -> Self {
        Self { params, ret }
    }
}

impl fmt::Display for FnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

/// A compile-time constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// What a value is: the instruction (or constant) that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Const(Constant),
    /// Formal parameter `index` of `func`.
    Param { func: FuncId, index: u32 },
    Binary {
        op: BinOp,
        lhs: ValueId,
        rhs: ValueId,
    },
    Call {
        callee: FuncId,
        args: SmallVec<[ValueId; 4]>,
    },
}

/// A value in the arena: its static type plus its defining instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub ty: Ty,
    pub kind: ValueKind,
}

/// An already-emitted IR value paired with its static type — what the
/// front-end hands over per call argument (and per method receiver).
///
/// The handle is shared, not owning: the value itself lives in the
/// module's arena for the lifetime of the compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    pub value: ValueId,
    pub ty: Ty,
}

impl TypedValue {
    #[must_use]
    pub fn new(value: ValueId, ty: Ty) -> Self {
        Self { value, ty }
    }
}

/// A generated function body: parameter values, instruction sequence, and
/// the returned value (`None` for unit functions).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBody {
    pub params: Vec<ValueId>,
    pub instrs: Vec<ValueId>,
    pub ret: Option<ValueId>,
}

/// A concrete, named, linked callable in the module.
///
/// Name, type, and linkage are immutable after declaration; the body is
/// attached at most once.
#[derive(Debug, Clone)]
pub struct MaterializedFunction {
    name: String,
    ty: FnType,
    linkage: Linkage,
    body: Option<FunctionBody>,
}

impl MaterializedFunction {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn ty(&self) -> &FnType {
        &self.ty
    }

    #[must_use]
    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    #[must_use]
    pub fn body(&self) -> Option<&FunctionBody> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

/// One compilation unit's worth of IR.
#[derive(Debug, Default)]
pub struct IrModule {
    name: String,
    functions: Vec<MaterializedFunction>,
    symbols: FxHashMap<String, FuncId>,
    values: Vec<Value>,
}

impl IrModule {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            symbols: FxHashMap::default(),
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a function, returning the existing handle if the symbol is
    /// already present.
    ///
    /// The type and linkage of an existing symbol are authoritative; a
    /// redeclaration with a different type is an internal invariant
    /// violation (checked in debug builds).
    pub fn declare_function(&mut self, name: &str, ty: FnType, linkage: Linkage) -> FuncId {
        if let Some(&existing) = self.symbols.get(name) {
            debug_assert_eq!(
                self.functions[existing.index()].ty,
                ty,
                "symbol {name} redeclared with a different type"
            );
            return existing;
        }

        let id = FuncId(u32::try_from(self.functions.len()).unwrap_or(u32::MAX));
        self.functions.push(MaterializedFunction {
            name: name.to_string(),
            ty,
            linkage,
            body: None,
        });
        self.symbols.insert(name.to_string(), id);
        id
    }

    #[must_use]
    pub fn lookup_symbol(&self, name: &str) -> Option<FuncId> {
        self.symbols.get(name).copied()
    }

    #[must_use]
    pub fn function(&self, id: FuncId) -> &MaterializedFunction {
        &self.functions[id.index()]
    }

    #[must_use]
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Attach a generated body to a declared function.
    ///
    /// # Panics
    ///
    /// Panics if the function already has a body: materialized functions
    /// are generated at most once.
    pub fn set_body(&mut self, id: FuncId, body: FunctionBody) {
        let func = &mut self.functions[id.index()];
        assert!(
            func.body.is_none(),
            "function {} generated twice",
            func.name
        );
        func.body = Some(body);
    }

    fn push_value(&mut self, value: Value) -> ValueId {
        let id = ValueId(u32::try_from(self.values.len()).unwrap_or(u32::MAX));
        self.values.push(value);
        id
    }

    #[must_use]
    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.index()]
    }

    pub fn const_int(&mut self, v: i64) -> ValueId {
        self.push_value(Value {
            ty: Ty::Int,
            kind: ValueKind::Const(Constant::Int(v)),
        })
    }

    pub fn const_float(&mut self, v: f64) -> ValueId {
        self.push_value(Value {
            ty: Ty::Float,
            kind: ValueKind::Const(Constant::Float(v)),
        })
    }

    pub fn const_bool(&mut self, v: bool) -> ValueId {
        self.push_value(Value {
            ty: Ty::Bool,
            kind: ValueKind::Const(Constant::Bool(v)),
        })
    }

    pub fn const_str(&mut self, v: impl Into<String>) -> ValueId {
        self.push_value(Value {
            ty: Ty::Str,
            kind: ValueKind::Const(Constant::Str(v.into())),
        })
    }

    /// Reference to formal parameter `index` of `func`, typed from the
    /// function's declared parameter list.
    pub fn param(&mut self, func: FuncId, index: u32) -> ValueId {
        let ty = self.functions[func.index()].ty.params[index as usize].clone();
        self.push_value(Value {
            ty,
            kind: ValueKind::Param { func, index },
        })
    }

    /// Binary arithmetic; the result takes the left operand's type.
    pub fn binary(&mut self, op: BinOp, lhs: ValueId, rhs: ValueId) -> ValueId {
        let ty = self.values[lhs.index()].ty.clone();
        self.push_value(Value {
            ty,
            kind: ValueKind::Binary { op, lhs, rhs },
        })
    }

    /// Emit a call instruction; the result takes the callee's return type.
    pub fn emit_call(&mut self, callee: FuncId, args: &[ValueId]) -> ValueId {
        let ty = self.functions[callee.index()].ty.ret.clone();
        self.push_value(Value {
            ty,
            kind: ValueKind::Call {
                callee,
                args: SmallVec::from_slice(args),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn declaration_is_idempotent() {
        let mut module = IrModule::new("test");
        let ty = FnType::new(vec![Ty::Int], Ty::Int);
        let a = module.declare_function("f", ty.clone(), Linkage::Internal);
        let b = module.declare_function("f", ty, Linkage::Internal);
        assert_eq!(a, b);
        assert_eq!(module.function_count(), 1);
    }

    #[test]
    fn call_takes_callee_return_type() {
        let mut module = IrModule::new("test");
        let f = module.declare_function(
            "f",
            FnType::new(vec![Ty::Int], Ty::Float),
            Linkage::External,
        );
        let arg = module.const_int(1);
        let call = module.emit_call(f, &[arg]);
        assert_eq!(module.value(call).ty, Ty::Float);
        match &module.value(call).kind {
            ValueKind::Call { callee, args } => {
                assert_eq!(*callee, f);
                assert_eq!(args.as_slice(), &[arg]);
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    #[should_panic(expected = "generated twice")]
    fn bodies_attach_exactly_once() {
        let mut module = IrModule::new("test");
        let f = module.declare_function("f", FnType::new(vec![], Ty::Unit), Linkage::Internal);
        let body = FunctionBody {
            params: Vec::new(),
            instrs: Vec::new(),
            ret: None,
        };
        module.set_body(f, body.clone());
        module.set_body(f, body);
    }
}
