//! Per-language execution engine.
//!
//! A [`Toolchain`](toolchain::Toolchain) describes how one language is
//! materialized, built and run; the [`ExecutionEngine`](executor::ExecutionEngine)
//! drives any toolchain through the same pipeline: isolated workspace,
//! optional build, deadline-bounded run with concurrent output capture, and
//! unconditional cleanup.

pub mod executor;
pub mod languages;
pub mod subprocess;
pub mod toolchain;
pub mod workspace;

pub use executor::{EngineSettings, ExecutionEngine, ExecutionError, ExecutionJob};
pub use toolchain::{SourceFile, Toolchain};
pub use workspace::Workspace;
