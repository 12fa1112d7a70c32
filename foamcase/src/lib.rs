//! Compiles a simulation configuration into an OpenFOAM-style case
//! directory and manages that directory's lifecycle.
//!
//! The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (dictionary model, rendering,
//!   boundary rules, document builders). No filesystem access.
//! - **[`io`]**: Side-effecting operations (case directory state machine,
//!   settings and configuration loading, document writes).
//!
//! [`generate`] coordinates both to implement the `generate` CLI command.

pub mod core;
pub mod exit_codes;
pub mod generate;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
