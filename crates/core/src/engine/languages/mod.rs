//! Toolchains for every supported language.

mod go;
mod javascript;
mod python;
mod shell;
mod typescript;

pub use go::GoToolchain;
pub use javascript::JavaScriptToolchain;
pub use python::PythonToolchain;
pub use shell::ShellToolchain;
pub use typescript::TypeScriptToolchain;

use super::toolchain::Toolchain;
use crate::language::Language;

/// The toolchain that executes `language`.
pub fn toolchain_for(language: Language) -> Box<dyn Toolchain> {
    match language {
        Language::Go => Box::new(GoToolchain),
        Language::JavaScript => Box::new(JavaScriptToolchain),
        Language::TypeScript => Box::new(TypeScriptToolchain),
        Language::Python => Box::new(PythonToolchain),
        Language::Shell => Box::new(ShellToolchain),
    }
}
