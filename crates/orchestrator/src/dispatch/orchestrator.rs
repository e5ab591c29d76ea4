use std::sync::Arc;
use std::time::{Duration, Instant};

use coderun_cache::SharedCache;
use coderun_core::{
    CoreError, ExecutionOutcome, ExecutionRequest, Fingerprint, NormalizedRequest, TimeoutPolicy,
};
use futures::FutureExt;

use super::inflight::{DispatchError, DispatchResult, InflightGuard, InflightRegistry};
use super::runner_client::RunnerClient;
use crate::config::ServerConfig;
use crate::error::AppError;
use crate::routing::RunnerRoutes;

/// Accepts execution requests and turns them into outcomes.
///
/// Each request is normalized, answered from the cache when possible, and
/// otherwise sent to the runner for its language. Identical requests in
/// flight at the same time share one runner call.
pub struct Orchestrator {
    routes: RunnerRoutes,
    cache: SharedCache,
    client: Arc<dyn RunnerClient>,
    inflight: InflightRegistry,
    policy: TimeoutPolicy,
    cache_ttl: Duration,
    call_margin: Duration,
}

impl Orchestrator {
    pub fn new(
        config: &ServerConfig,
        routes: RunnerRoutes,
        cache: SharedCache,
        client: Arc<dyn RunnerClient>,
    ) -> Self {
        Self {
            routes,
            cache,
            client,
            inflight: InflightRegistry::new(),
            policy: config.timeout_policy(),
            cache_ttl: config.cache_ttl(),
            call_margin: config.runner_call_margin(),
        }
    }

    pub fn routes(&self) -> &RunnerRoutes {
        &self.routes
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn inflight(&self) -> &InflightRegistry {
        &self.inflight
    }

    /// Produce the outcome for one request.
    pub async fn submit(&self, request: ExecutionRequest) -> Result<ExecutionOutcome, AppError> {
        let normalized = request.normalize(&self.policy)?;

        // Unroutable languages fail before the cache is ever consulted.
        let Some(base_url) = self.routes.resolve(normalized.language) else {
            return Err(CoreError::UnsupportedLanguage(normalized.language.to_string()).into());
        };

        let fingerprint = Fingerprint::of(&normalized);
        let key = fingerprint.cache_key();

        if let Some(pending) = self.inflight.get(&key) {
            tracing::debug!(fingerprint = %fingerprint.short(), "Joining in-flight execution");
            return Ok(pending.await?);
        }

        if let Some(outcome) = self.lookup(&key, &fingerprint).await {
            return Ok(outcome);
        }

        let base_url = base_url.to_string();
        let (pending, joined) = self.inflight.join_or_start(&key, |guard| {
            self.dispatch(guard, base_url, normalized, key.clone())
                .boxed()
        });
        if joined {
            tracing::debug!(fingerprint = %fingerprint.short(), "Joining in-flight execution");
        }
        Ok(pending.await?)
    }

    /// Cached outcome for `key`. Backend errors and bad entries count as misses.
    async fn lookup(&self, key: &str, fingerprint: &Fingerprint) -> Option<ExecutionOutcome> {
        let raw = match self.cache.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(fingerprint = %fingerprint.short(), "Cache miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    fingerprint = %fingerprint.short(),
                    error = %e,
                    "Cache lookup failed, treating as miss"
                );
                return None;
            }
        };

        match serde_json::from_str::<ExecutionOutcome>(&raw) {
            Ok(mut outcome) => {
                outcome.cached = true;
                tracing::info!(fingerprint = %fingerprint.short(), "Cache hit");
                Some(outcome)
            }
            Err(e) => {
                tracing::warn!(
                    fingerprint = %fingerprint.short(),
                    error = %e,
                    "Discarding undecodable cache entry"
                );
                None
            }
        }
    }

    /// The runner call plus cache write, run as a detached task.
    fn dispatch(
        &self,
        guard: InflightGuard,
        base_url: String,
        request: NormalizedRequest,
        key: String,
    ) -> impl std::future::Future<Output = DispatchResult> + Send + 'static {
        let client = Arc::clone(&self.client);
        let cache = Arc::clone(&self.cache);
        let cache_ttl = self.cache_ttl;
        let deadline = request.timeout() + self.call_margin;

        async move {
            // Held until the cache write below is done.
            let _guard = guard;
            let started = Instant::now();
            let language = request.language;
            let run_request = request.to_run_request();

            let outcome = match client.run(&base_url, &run_request, deadline).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                    tracing::warn!(
                        %language,
                        runner = %base_url,
                        elapsed_ms,
                        error = %e,
                        "Runner unavailable"
                    );
                    return Err(DispatchError::RunnerUnavailable {
                        message: e.to_string(),
                        elapsed_ms,
                    });
                }
            };

            tracing::info!(
                %language,
                exit_code = outcome.exit_code,
                error = outcome.error.map(|k| k.as_str()),
                elapsed_ms = outcome.execution_time_ms,
                "Runner returned outcome"
            );

            if outcome.is_cacheable() {
                match serde_json::to_string(&outcome) {
                    Ok(value) => {
                        if let Err(e) = cache.set(&key, &value, cache_ttl).await {
                            tracing::warn!(error = %e, "Failed to store outcome in cache");
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to serialize outcome"),
                }
            }

            Ok(outcome)
        }
    }
}
