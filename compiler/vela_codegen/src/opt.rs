//! Whole-program optimization driver.
//!
//! Runs once, after every module has been emitted: internalize all symbols
//! not on the allow-list, eliminate unreachable code globally, and
//! simplify loops — without vectorizing. The ordering favors code-size
//! reduction and the correctness of hand-tuned runtime code over raw
//! throughput.
//!
//! The pipeline is linear with no branching states:
//!
//! ```text
//! input module → internalize → global DCE + loop simplification → artifact
//! ```
//!
//! The work happens in the external LLVM `opt` binary. The driver's own
//! side effects are limited to the tool invocation and an atomic move of
//! the optimized artifact into place: `opt` writes to a process-unique
//! staging path next to the target, which is renamed in on success and
//! removed on failure, so a failed build never leaves partial output at
//! the target path.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::CodegenError;

/// Name of the external optimizer binary.
const EXECUTABLE_NAME: &str = "opt";

/// Runtime intrinsics that must survive internalization regardless of the
/// caller's exported-name list: the collector entry point, allocator entry
/// points, and the C-runtime memory/exception-support primitives the
/// pre-built runtime depends on.
pub const RUNTIME_PUBLIC_API: &[&str] = &[
    "vela_gc",
    "malloc",
    "free",
    "__errno_location",
    "memcpy",
    "memmove",
    "memset",
    "__cxa_can_catch",
    "__cxa_is_pointer_type",
];

/// Fixed, non-configurable pass sequence: strip debug info, skip the
/// verifier, internalize against the allow-list, run global DCE, keep all
/// vectorization off, and run LICM + loop unswitching (+ inductive range
/// check elimination) for loop simplification.
const OPTIMIZATION_FLAGS: &[&str] = &[
    "-strip-debug",
    "-disable-verify",
    "-internalize",
    "-globaldce",
    "-disable-loop-vectorization",
    "-disable-slp-vectorization",
    "-vectorize-loops=false",
    "-vectorize-slp=false",
    "-licm",
    "-loop-unswitch",
    "-irce",
    "-licm",
    "-loop-unswitch",
];

/// Optimization level passed through to the external tool as `-O<flag>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptLevel {
    #[default]
    O0,
    O1,
    O2,
    O3,
    /// Optimize for size.
    Os,
    /// Optimize aggressively for size.
    Oz,
}

impl OptLevel {
    /// The `-O<flag>` suffix for the external tool.
    #[must_use]
    pub fn flag(&self) -> &'static str {
        match self {
            Self::O0 => "0",
            Self::O1 => "1",
            Self::O2 => "2",
            Self::O3 => "3",
            Self::Os => "s",
            Self::Oz => "z",
        }
    }

    /// Parse a level from its flag form (`"0"` through `"3"`, `"s"`, `"z"`).
    #[must_use]
    pub fn parse(flag: &str) -> Option<Self> {
        match flag {
            "0" => Some(Self::O0),
            "1" => Some(Self::O1),
            "2" => Some(Self::O2),
            "3" => Some(Self::O3),
            "s" => Some(Self::Os),
            "z" => Some(Self::Oz),
            _ => None,
        }
    }
}

impl fmt::Display for OptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "O{}", self.flag())
    }
}

/// Driver for the external whole-program optimizer.
#[derive(Debug, Clone, Default)]
pub struct OptDriver {
    /// Directory containing the toolchain binaries; `None` uses `PATH`.
    toolchain_dir: Option<PathBuf>,
    /// Override for the executable name (used by tests and non-standard
    /// toolchain installs).
    executable: Option<String>,
}

impl OptDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve tool binaries inside `dir` instead of `PATH`.
    #[must_use]
    pub fn with_toolchain_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.toolchain_dir = Some(dir.into());
        self
    }

    /// Use a different executable name.
    #[must_use]
    pub fn with_executable(mut self, name: impl Into<String>) -> Self {
        self.executable = Some(name.into());
        self
    }

    fn executable_path(&self) -> PathBuf {
        let name = self.executable.as_deref().unwrap_or(EXECUTABLE_NAME);
        match &self.toolchain_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    /// The effective allow-list: the caller's exported names followed by
    /// the fixed runtime intrinsics. Always a superset of
    /// [`RUNTIME_PUBLIC_API`], even for an empty export list.
    #[must_use]
    pub fn effective_public_api(exported: &[String]) -> Vec<String> {
        let mut api: Vec<String> = exported.to_vec();
        for intrinsic in RUNTIME_PUBLIC_API {
            if !api.iter().any(|name| name == intrinsic) {
                api.push((*intrinsic).to_string());
            }
        }
        api
    }

    /// Build the tool invocation writing to `staging`.
    #[must_use]
    pub fn build_command(
        &self,
        input: &Path,
        staging: &Path,
        exported: &[String],
        level: OptLevel,
    ) -> Command {
        let mut cmd = Command::new(self.executable_path());
        cmd.arg(input);
        cmd.arg("-o").arg(staging);
        cmd.arg(format!(
            "-internalize-public-api-list={}",
            Self::effective_public_api(exported).join(",")
        ));
        cmd.args(OPTIMIZATION_FLAGS);
        cmd.arg(format!("-O{}", level.flag()));
        cmd
    }

    /// Process-unique staging path next to the target, so the final move
    /// stays on one filesystem.
    fn staging_path(output: &Path) -> PathBuf {
        let file_name = output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());
        output.with_file_name(format!(".{file_name}.opt_{}.tmp", std::process::id()))
    }

    /// Optimize `input` into `output`.
    ///
    /// `exported` is the program's public function list; the fixed runtime
    /// intrinsics are always appended. Returns the output path on success.
    ///
    /// # Errors
    ///
    /// - [`CodegenError::ToolNotFound`] when the optimizer binary is absent.
    /// - [`CodegenError::OptimizationTool`] when it exits non-zero; stderr
    ///   is surfaced verbatim and nothing is written to `output`.
    ///
    /// The failure is deterministic for a fixed input, so it is never
    /// retried.
    pub fn optimize(
        &self,
        input: &Path,
        exported: &[String],
        output: &Path,
        level: OptLevel,
    ) -> Result<PathBuf, CodegenError> {
        let staging = Self::staging_path(output);
        let mut cmd = self.build_command(input, &staging, exported, level);
        let tool = self.executable_path().display().to_string();

        debug!(input = %input.display(), level = %level, "whole-program optimization");

        let captured = match cmd.output() {
            Ok(captured) => captured,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CodegenError::ToolNotFound {
                    tool,
                    message: e.to_string(),
                });
            }
            Err(e) => {
                return Err(CodegenError::Io {
                    message: e.to_string(),
                });
            }
        };

        if !captured.status.success() {
            // Never leave partial output behind.
            let _ = std::fs::remove_file(&staging);
            return Err(CodegenError::OptimizationTool {
                tool,
                exit_code: captured.status.code(),
                stderr: String::from_utf8_lossy(&captured.stderr).into_owned(),
                command: format!("{cmd:?}"),
            });
        }

        std::fs::rename(&staging, output).map_err(|e| CodegenError::Io {
            message: e.to_string(),
        })?;
        Ok(output.to_path_buf())
    }
}
