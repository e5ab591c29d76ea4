//! Per-language toolchain description.
//!
//! Defines [`Toolchain`], the trait every language implements, and
//! [`SourceFile`], one file materialized into the workspace before a build.

use std::path::Path;

use tokio::process::Command;

use crate::language::Language;

/// A file written into the workspace before the build stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File name relative to the workspace root.
    pub name: &'static str,
    pub contents: String,
}

impl SourceFile {
    pub fn new(name: &'static str, contents: impl Into<String>) -> Self {
        Self {
            name,
            contents: contents.into(),
        }
    }
}

/// How one language is materialized, built and run.
///
/// Commands are returned unconfigured; the engine sets the working
/// directory, stdio, environment and process group before spawning.
pub trait Toolchain: Send + Sync {
    fn language(&self) -> Language;

    /// Files to write for the given user code. The first entry holds the code.
    fn sources(&self, code: &str) -> Vec<SourceFile>;

    /// Compile/check command, or `None` for interpreted languages.
    fn build_command(&self, _workspace: &Path) -> Option<Command> {
        None
    }

    /// Command that runs the program. Caller args are appended by the engine.
    fn run_command(&self, workspace: &Path) -> Command;

    /// Cheap command proving the runtime is installed.
    fn probe_command(&self) -> Command;
}
