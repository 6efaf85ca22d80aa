//! Declaring entities for callable signatures.

use std::fmt;

use crate::ty::Ty;

/// The entity a [`Signature`](crate::sig::Signature) is declared on.
///
/// Mangling strategy selection keys off this: `Runtime` entities are fixed
/// contracts with the pre-built runtime library, everything else is
/// program-authored and mangled per instantiation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Entity {
    /// Free function declared in a module (`module` is empty for the root).
    Free { module: String, name: String },
    /// Instance method declared on a type.
    Method { owner: Ty, name: String },
    /// Fixed runtime-library intrinsic.
    Runtime { name: String },
}

impl Entity {
    /// Free function in the root module.
    #[must_use]
    pub fn free(name: impl Into<String>) -> Self {
        Self::Free {
            module: String::new(),
            name: name.into(),
        }
    }

    /// Free function in a named module.
    #[must_use]
    pub fn free_in(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Free {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Instance method on `owner`.
    #[must_use]
    pub fn method(owner: Ty, name: impl Into<String>) -> Self {
        Self::Method {
            owner,
            name: name.into(),
        }
    }

    /// Runtime-library intrinsic.
    #[must_use]
    pub fn runtime(name: impl Into<String>) -> Self {
        Self::Runtime { name: name.into() }
    }

    /// The source-level name of the entity.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Free { name, .. } | Self::Method { name, .. } | Self::Runtime { name } => name,
        }
    }

    /// Whether this entity belongs to the fixed runtime library.
    #[must_use]
    pub fn is_runtime(&self) -> bool {
        matches!(self, Self::Runtime { .. })
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free { module, name } if module.is_empty() => write!(f, "{name}"),
            Self::Free { module, name } => write!(f, "{module}.{name}"),
            Self::Method { owner, name } => write!(f, "{owner}.{name}"),
            Self::Runtime { name } => write!(f, "runtime.{name}"),
        }
    }
}
