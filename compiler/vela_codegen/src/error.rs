//! Error taxonomy for resolution, materialization, and optimization.
//!
//! All three families are deterministic given identical input, so none of
//! them is ever retried. Resolution and materialization errors abort the
//! enclosing call-site compilation; the optimization error is terminal for
//! the build.

use std::fmt;

use vela_ir::{Entity, Signature, Span, Ty};

/// Why overload resolution rejected a candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverloadFailure {
    /// No signature is compatible with the passed argument types.
    NoMatch,
    /// More than one signature is equally compatible.
    Ambiguous,
}

/// Error type for the codegen backend.
#[derive(Debug, Clone)]
pub enum CodegenError {
    /// Overload resolution failed at a call site. Carries the full
    /// candidate list, in front-end enumeration order, for diagnostics.
    OverloadResolution {
        failure: OverloadFailure,
        call_site: Span,
        arg_tys: Vec<Ty>,
        candidates: Vec<Signature>,
    },
    /// Specializing a generic template to concrete types failed.
    Materialization {
        entity: Entity,
        type_args: Vec<Ty>,
        reason: String,
    },
    /// The external optimizer binary could not be located.
    ToolNotFound { tool: String, message: String },
    /// The external optimizer exited non-zero.
    OptimizationTool {
        tool: String,
        exit_code: Option<i32>,
        stderr: String,
        command: String,
    },
    /// I/O error while staging the optimized artifact.
    Io { message: String },
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OverloadResolution {
                failure,
                call_site,
                arg_tys,
                candidates,
            } => {
                let args = arg_tys
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                match failure {
                    OverloadFailure::NoMatch => write!(
                        f,
                        "no overload matches argument types ({args}) at {call_site}"
                    )?,
                    OverloadFailure::Ambiguous => write!(
                        f,
                        "ambiguous call with argument types ({args}) at {call_site}"
                    )?,
                }
                writeln!(f, "\ncandidates:")?;
                for candidate in candidates {
                    writeln!(f, "  {candidate}")?;
                }
                Ok(())
            }
            Self::Materialization {
                entity,
                type_args,
                reason,
            } => {
                let args = type_args
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "cannot materialize {entity} for type arguments ({args}): {reason}"
                )
            }
            Self::ToolNotFound { tool, message } => {
                write!(f, "optimizer '{tool}' not found: {message}")
            }
            Self::OptimizationTool {
                tool,
                exit_code,
                stderr,
                command,
            } => {
                write!(f, "optimizing with '{tool}' failed")?;
                if let Some(code) = exit_code {
                    write!(f, " (exit code {code})")?;
                }
                if !stderr.is_empty() {
                    write!(f, "\n\nOptimizer stderr:\n{stderr}")?;
                }
                write!(f, "\n\nCommand: {command}")
            }
            Self::Io { message } => {
                write!(f, "I/O error during optimization: {message}")
            }
        }
    }
}

impl std::error::Error for CodegenError {}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_ir::Param;

    #[test]
    fn overload_error_lists_all_candidates() {
        let candidates = vec![
            Signature::new(
                Entity::free("add"),
                vec![Param::required("a", Ty::Int)],
                Ty::Int,
            ),
            Signature::new(
                Entity::free("add"),
                vec![Param::required("a", Ty::Str)],
                Ty::Int,
            ),
        ];
        let err = CodegenError::OverloadResolution {
            failure: OverloadFailure::NoMatch,
            call_site: Span::new(4, 9),
            arg_tys: vec![Ty::Bool],
            candidates,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("no overload matches argument types (bool)"));
        assert!(rendered.contains("add(int) -> int"));
        assert!(rendered.contains("add(str) -> int"));
    }

    #[test]
    fn tool_error_surfaces_stderr_verbatim() {
        let err = CodegenError::OptimizationTool {
            tool: "opt".to_string(),
            exit_code: Some(1),
            stderr: "opt: unknown pass".to_string(),
            command: "opt in.bc -o out.bc".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("exit code 1"));
        assert!(rendered.contains("opt: unknown pass"));
    }
}
