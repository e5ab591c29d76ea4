use std::path::Path;

use tokio::process::Command;

use crate::engine::toolchain::{SourceFile, Toolchain};
use crate::language::Language;

/// Name of the compiled binary inside the workspace.
const BINARY: &str = "runner";

const GO_MOD: &str = "module main\n\ngo 1.20\n";

/// Compiles with `go build` and runs the resulting binary.
pub struct GoToolchain;

impl Toolchain for GoToolchain {
    fn language(&self) -> Language {
        Language::Go
    }

    fn sources(&self, code: &str) -> Vec<SourceFile> {
        vec![
            SourceFile::new("main.go", code),
            SourceFile::new("go.mod", GO_MOD),
        ]
    }

    fn build_command(&self, workspace: &Path) -> Option<Command> {
        let mut cmd = Command::new("go");
        cmd.arg("build").arg("-o").arg(workspace.join(BINARY)).arg(".");
        Some(cmd)
    }

    fn run_command(&self, workspace: &Path) -> Command {
        Command::new(workspace.join(BINARY))
    }

    fn probe_command(&self) -> Command {
        let mut cmd = Command::new("go");
        cmd.arg("version");
        cmd
    }
}
