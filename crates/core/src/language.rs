//! Statically known set of supported languages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A language the platform knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "go")]
    Go,
    #[serde(rename = "js")]
    JavaScript,
    #[serde(rename = "ts")]
    TypeScript,
    #[serde(rename = "python")]
    Python,
    #[serde(rename = "sh")]
    Shell,
}

impl Language {
    /// Every supported language, in routing-table order.
    pub const ALL: [Language; 5] = [
        Language::Go,
        Language::JavaScript,
        Language::TypeScript,
        Language::Python,
        Language::Shell,
    ];

    /// Canonical wire identifier. Used for routing and fingerprints.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::JavaScript => "js",
            Self::TypeScript => "ts",
            Self::Python => "python",
            Self::Shell => "sh",
        }
    }

    /// Port a runner for this language listens on by default.
    pub fn default_port(self) -> u16 {
        match self {
            Self::Go => 8081,
            Self::JavaScript => 8082,
            Self::TypeScript => 8083,
            Self::Python => 8084,
            Self::Shell => 8085,
        }
    }

    /// Default runner base URL inside the container network.
    pub fn default_runner_url(self) -> String {
        let service = match self {
            Self::Go => "golang",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Python => "python",
            Self::Shell => "shell",
        };
        format!("http://{service}-runner:{}", self.default_port())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "go" | "golang" => Ok(Self::Go),
            "js" | "javascript" | "node" => Ok(Self::JavaScript),
            "ts" | "typescript" => Ok(Self::TypeScript),
            "python" | "py" | "python3" => Ok(Self::Python),
            "sh" | "bash" | "shell" => Ok(Self::Shell),
            _ => Err(CoreError::UnsupportedLanguage(s.to_string())),
        }
    }
}
