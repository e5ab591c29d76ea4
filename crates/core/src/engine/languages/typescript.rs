use std::path::Path;

use tokio::process::Command;

use crate::engine::toolchain::{SourceFile, Toolchain};
use crate::language::Language;

/// Transpiles `main.ts` with `tsc`, then runs the emitted `main.js` with Node.js.
pub struct TypeScriptToolchain;

impl Toolchain for TypeScriptToolchain {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn sources(&self, code: &str) -> Vec<SourceFile> {
        vec![SourceFile::new("main.ts", code)]
    }

    fn build_command(&self, _workspace: &Path) -> Option<Command> {
        let mut cmd = Command::new("tsc");
        cmd.args([
            "main.ts",
            "--target",
            "ES2020",
            "--module",
            "commonjs",
            "--outDir",
            ".",
        ]);
        Some(cmd)
    }

    fn run_command(&self, _workspace: &Path) -> Command {
        let mut cmd = Command::new("node");
        cmd.arg("main.js");
        cmd
    }

    fn probe_command(&self) -> Command {
        let mut cmd = Command::new("tsc");
        cmd.arg("--version");
        cmd
    }
}
