use std::path::Path;

use tokio::process::Command;

use crate::engine::toolchain::{SourceFile, Toolchain};
use crate::language::Language;

/// Runs `main.py` with `python3`; no build stage.
pub struct PythonToolchain;

impl Toolchain for PythonToolchain {
    fn language(&self) -> Language {
        Language::Python
    }

    fn sources(&self, code: &str) -> Vec<SourceFile> {
        vec![SourceFile::new("main.py", code)]
    }

    fn run_command(&self, _workspace: &Path) -> Command {
        let mut cmd = Command::new("python3");
        cmd.arg("main.py");
        cmd
    }

    fn probe_command(&self) -> Command {
        let mut cmd = Command::new("python3");
        cmd.arg("--version");
        cmd
    }
}
