//! Lowered type lattice.
//!
//! The front-end's restricted source language lowers to a small set of
//! concrete types plus `Var` for not-yet-instantiated generic parameters.
//! Overload resolution and name mangling both operate on this lattice.

use std::fmt;

/// A lowered type as seen by call resolution and code generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    Bool,
    Int,
    Float,
    Str,
    Unit,
    /// Homogeneous list with the given element type.
    List(Box<Ty>),
    /// Unsubstituted generic parameter, named as declared (`"T"`).
    Var(String),
}

impl Ty {
    /// Shorthand for a list type.
    #[must_use]
    pub fn list(elem: Ty) -> Self {
        Self::List(Box::new(elem))
    }

    /// Shorthand for a generic type parameter.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    /// Whether this type contains no generic parameters and can be lowered.
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        match self {
            Self::Bool | Self::Int | Self::Float | Self::Str | Self::Unit => true,
            Self::List(elem) => elem.is_concrete(),
            Self::Var(_) => false,
        }
    }

    /// The type-erased name used by the runtime library's fixed contracts.
    ///
    /// The runtime is not specialized per element type, so every list maps
    /// to `"list"` regardless of its element.
    #[must_use]
    pub fn runtime_name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Unit => "unit",
            Self::List(_) => "list",
            Self::Var(_) => "obj",
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Str => write!(f, "str"),
            Self::Unit => write!(f, "unit"),
            Self::List(elem) => write!(f, "[{elem}]"),
            Self::Var(name) => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn concrete_types() {
        assert!(Ty::Int.is_concrete());
        assert!(Ty::list(Ty::Str).is_concrete());
        assert!(!Ty::var("T").is_concrete());
        assert!(!Ty::list(Ty::var("T")).is_concrete());
    }

    #[test]
    fn display_forms() {
        assert_eq!(Ty::list(Ty::Int).to_string(), "[int]");
        assert_eq!(Ty::var("T").to_string(), "T");
        assert_eq!(Ty::Float.to_string(), "float");
    }

    #[test]
    fn runtime_names_are_type_erased() {
        assert_eq!(Ty::list(Ty::Int).runtime_name(), "list");
        assert_eq!(Ty::list(Ty::Str).runtime_name(), "list");
    }
}
