//! Native backend for the Vela compiler: call-target resolution, function
//! materialization, and the whole-program optimization driver.
//!
//! # Architecture
//!
//! ```text
//! front-end            this crate                              artifact
//! ──────────   ─────────────────────────────────────   ─────────────────
//! candidate    UnresolvedFunctionReference /
//! signatures ─▶ UnresolvedMethodReference ─▶ resolve ─▶ one signature
//! argument                                   │
//! IR values                                  ▼
//!              FunctionFactory ─▶ mangle ─▶ materialize (cache hit or
//!                                           declare / specialize once)
//!                                            │
//!                                            ▼
//!              call instruction emitted against the materialized function
//!
//!              OptDriver: internalize ─▶ global DCE + loop simplification
//! ```
//!
//! A call site resolves its overload group to exactly one signature, the
//! factory materializes (or retrieves) the concrete function keyed by
//! mangled name, and the call is emitted against it. After all modules
//! are emitted, [`OptDriver`] internalizes everything not on the
//! allow-list and lets the external optimizer eliminate dead code.
//!
//! # Debugging
//!
//! Enable tracing with environment variables:
//! - `RUST_LOG=vela_codegen=debug` — materialization decisions
//! - `RUST_LOG=vela_codegen=trace` — per-call-site resolution (verbose)

pub mod error;
pub mod factory;
pub mod mangle;
pub mod opt;
pub mod reference;
pub mod resolve;
pub mod template;

pub use error::{CodegenError, OverloadFailure};
pub use factory::{FunctionFactory, RuntimeFunctionFactory, UserFunctionFactory};
pub use mangle::{
    extract_function_name, is_vela_symbol, RuntimeMangler, UserMangler, MANGLE_PREFIX,
    RUNTIME_PREFIX,
};
pub use opt::{OptDriver, OptLevel, RUNTIME_PUBLIC_API};
pub use reference::{
    CallArgs, CallTargetResolver, UnresolvedFunctionReference, UnresolvedMethodReference,
};
pub use resolve::resolve_overload;
pub use template::{FunctionTemplate, TemplateExpr, TemplateStore};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call once at startup; safe to call multiple times. Enabled via
/// `RUST_LOG=vela_codegen=debug` or `RUST_LOG=vela_codegen=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
