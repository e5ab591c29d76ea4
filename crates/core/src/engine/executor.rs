//! The execution pipeline shared by every language.
//!
//! [`ExecutionEngine::execute`] always produces an [`ExecutionOutcome`]:
//! infrastructure failures are folded into an outcome with
//! [`ErrorKind::Infra`] instead of being returned as errors.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::languages::toolchain_for;
use super::subprocess::{run_command, ProcessOutput, ProcessStatus, RunLimits};
use super::toolchain::Toolchain;
use super::workspace::Workspace;
use crate::language::Language;
use crate::outcome::{ErrorKind, ExecutionOutcome};
use crate::request::{RunRequest, TimeoutPolicy};

/// Deadline for the runtime probe behind the health endpoint.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Output kept from a probe; only the exit code matters.
const PROBE_OUTPUT_BYTES: usize = 4096;

/// Engine-wide limits, fixed at startup.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Directory under which per-run workspaces are created.
    pub workspace_root: PathBuf,
    /// Deadline for the build stage, independent of the caller's timeout.
    pub build_timeout: Duration,
    /// Bytes kept per output stream.
    pub max_output_bytes: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            workspace_root: std::env::temp_dir().join("coderun"),
            build_timeout: Duration::from_secs(30),
            max_output_bytes: 16 * 1024 * 1024,
        }
    }
}

/// One unit of work for the engine.
#[derive(Debug, Clone)]
pub struct ExecutionJob {
    pub code: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    /// Deadline for the run stage.
    pub timeout: Duration,
}

impl ExecutionJob {
    /// Build a job from a runner request, re-clamping its timeout locally.
    pub fn from_run_request(request: RunRequest, policy: &TimeoutPolicy) -> Self {
        let requested = request
            .timeout
            .map(|secs| i64::try_from(secs).unwrap_or(i64::MAX));
        Self {
            code: request.code,
            args: request.args,
            env: request.env,
            timeout: policy.effective(requested),
        }
    }
}

/// Failures on the runner's own side. Reported to callers as `infra_error`.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Failed to prepare workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed waiting for process: {0}")]
    Wait(#[source] std::io::Error),
}

/// Pipeline stage, carried on log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Materializing,
    Building,
    Running,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Materializing => "materializing",
            Self::Building => "building",
            Self::Running => "running",
        })
    }
}

/// Runs jobs for a single language.
pub struct ExecutionEngine {
    toolchain: Box<dyn Toolchain>,
    settings: EngineSettings,
}

impl ExecutionEngine {
    pub fn new(toolchain: Box<dyn Toolchain>, settings: EngineSettings) -> Self {
        Self {
            toolchain,
            settings,
        }
    }

    /// Engine backed by the built-in toolchain for `language`.
    pub fn for_language(language: Language, settings: EngineSettings) -> Self {
        Self::new(toolchain_for(language), settings)
    }

    pub fn language(&self) -> Language {
        self.toolchain.language()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Materialize, build and run `job`, then release its workspace.
    pub async fn execute(&self, job: &ExecutionJob) -> ExecutionOutcome {
        let start = Instant::now();
        let mut stage = Stage::Materializing;

        match self.run_pipeline(job, &mut stage).await {
            Ok(outcome) => {
                tracing::info!(
                    language = %self.language(),
                    exit_code = outcome.exit_code,
                    error = outcome.error.map(ErrorKind::as_str),
                    elapsed_ms = outcome.execution_time_ms,
                    "Execution finished"
                );
                outcome
            }
            Err(e) => {
                tracing::error!(
                    language = %self.language(),
                    stage = %stage,
                    error = %e,
                    "Execution failed on runner side"
                );
                ExecutionOutcome::failure(ErrorKind::Infra, start.elapsed())
            }
        }
    }

    /// Whether the language runtime is installed and starts.
    pub async fn probe(&self) -> bool {
        let limits = RunLimits {
            timeout: PROBE_TIMEOUT,
            max_output_bytes: PROBE_OUTPUT_BYTES,
        };
        match run_command(&mut self.toolchain.probe_command(), &limits).await {
            Ok(output) => output.status == ProcessStatus::Exited(0),
            Err(e) => {
                tracing::warn!(language = %self.language(), error = %e, "Runtime probe failed");
                false
            }
        }
    }

    async fn run_pipeline(
        &self,
        job: &ExecutionJob,
        stage: &mut Stage,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let workspace = Workspace::create(&self.settings.workspace_root)
            .await
            .map_err(ExecutionError::Workspace)?;
        let result = self.run_stages(&workspace, job, stage).await;
        workspace.release().await;
        result
    }

    async fn run_stages(
        &self,
        workspace: &Workspace,
        job: &ExecutionJob,
        stage: &mut Stage,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        for source in self.toolchain.sources(&job.code) {
            workspace
                .write_file(source.name, &source.contents)
                .await
                .map_err(ExecutionError::Workspace)?;
        }

        if let Some(mut build) = self.toolchain.build_command(workspace.path()) {
            *stage = Stage::Building;
            build.current_dir(workspace.path());
            let limits = RunLimits {
                timeout: self.settings.build_timeout,
                max_output_bytes: self.settings.max_output_bytes,
            };
            let output = run_command(&mut build, &limits).await?;
            tracing::debug!(
                workspace = %workspace.id(),
                elapsed_ms = output.elapsed.as_millis() as u64,
                "Build stage finished"
            );
            match output.status {
                ProcessStatus::Exited(0) => {}
                ProcessStatus::Exited(code) => {
                    let elapsed = output.elapsed;
                    return Ok(ExecutionOutcome::build_failed(
                        diagnostics(output),
                        code,
                        elapsed,
                    ));
                }
                ProcessStatus::TimedOut => {
                    tracing::warn!(workspace = %workspace.id(), "Build stage timed out");
                    return Ok(ExecutionOutcome::timed_out(
                        output.stdout,
                        output.stderr,
                        output.elapsed,
                    ));
                }
            }
        }

        *stage = Stage::Running;
        let mut run = self.toolchain.run_command(workspace.path());
        run.current_dir(workspace.path())
            .args(&job.args)
            .envs(&job.env);
        let limits = RunLimits {
            timeout: job.timeout,
            max_output_bytes: self.settings.max_output_bytes,
        };
        let output = run_command(&mut run, &limits).await?;

        Ok(match output.status {
            ProcessStatus::Exited(code) => {
                ExecutionOutcome::completed(output.stdout, output.stderr, code, output.elapsed)
            }
            ProcessStatus::TimedOut => {
                ExecutionOutcome::timed_out(output.stdout, output.stderr, output.elapsed)
            }
        })
    }
}

/// Compiler diagnostics: stderr, or stdout for tools that report there (tsc).
fn diagnostics(output: ProcessOutput) -> String {
    if output.stderr.trim().is_empty() {
        output.stdout
    } else {
        output.stderr
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
