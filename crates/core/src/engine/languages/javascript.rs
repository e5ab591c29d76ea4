use std::path::Path;

use tokio::process::Command;

use crate::engine::toolchain::{SourceFile, Toolchain};
use crate::language::Language;

/// Runs `main.js` with Node.js; no build stage.
pub struct JavaScriptToolchain;

impl Toolchain for JavaScriptToolchain {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn sources(&self, code: &str) -> Vec<SourceFile> {
        vec![SourceFile::new("main.js", code)]
    }

    fn run_command(&self, _workspace: &Path) -> Command {
        let mut cmd = Command::new("node");
        cmd.arg("main.js");
        cmd
    }

    fn probe_command(&self) -> Command {
        let mut cmd = Command::new("node");
        cmd.arg("--version");
        cmd
    }
}
