use std::path::Path;

use tokio::process::Command;

use crate::engine::toolchain::{SourceFile, Toolchain};
use crate::language::Language;

/// POSIX shell scripts. `sh -n` serves as the build stage so syntax errors
/// surface as build failures instead of partial runs.
pub struct ShellToolchain;

impl Toolchain for ShellToolchain {
    fn language(&self) -> Language {
        Language::Shell
    }

    fn sources(&self, code: &str) -> Vec<SourceFile> {
        vec![SourceFile::new("main.sh", code)]
    }

    fn build_command(&self, _workspace: &Path) -> Option<Command> {
        let mut cmd = Command::new("sh");
        cmd.args(["-n", "main.sh"]);
        Some(cmd)
    }

    fn run_command(&self, _workspace: &Path) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("main.sh");
        cmd
    }

    fn probe_command(&self) -> Command {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "true"]);
        cmd
    }
}
