//! Language to runner address table.

use std::collections::BTreeMap;

use coderun_core::Language;

/// Immutable map from language to runner base URL, built at startup.
#[derive(Debug, Clone, Default)]
pub struct RunnerRoutes {
    routes: BTreeMap<Language, String>,
}

impl RunnerRoutes {
    /// No routes at all. Every language is unsupported.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every language at its default in-network address.
    pub fn defaults() -> Self {
        Self::from_lookup(|_| None)
    }

    /// Defaults overridden by `RUNNER_URL_<LANG>` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the table, asking `lookup` for an override per language.
    ///
    /// An override that is empty removes the language.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut routes = BTreeMap::new();
        for language in Language::ALL {
            let url = lookup(&env_key(language)).unwrap_or_else(|| language.default_runner_url());
            let url = url.trim().trim_end_matches('/');
            if url.is_empty() {
                tracing::info!(%language, "Runner route disabled");
                continue;
            }
            routes.insert(language, url.to_string());
        }
        Self { routes }
    }

    /// Add or replace one route.
    pub fn with_route(mut self, language: Language, url: impl Into<String>) -> Self {
        let url = url.into();
        self.routes
            .insert(language, url.trim_end_matches('/').to_string());
        self
    }

    pub fn resolve(&self, language: Language) -> Option<&str> {
        self.routes.get(&language).map(String::as_str)
    }

    /// Languages that currently have a runner.
    pub fn languages(&self) -> Vec<Language> {
        self.routes.keys().copied().collect()
    }
}

fn env_key(language: Language) -> String {
    format!("RUNNER_URL_{}", language.as_str().to_ascii_uppercase())
}
