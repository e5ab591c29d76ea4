//! Request dispatch: cache consultation, in-flight coalescing, and the
//! synchronous call to a language runner.

pub mod inflight;
pub mod orchestrator;
pub mod runner_client;

pub use inflight::{DispatchError, InflightRegistry};
pub use orchestrator::Orchestrator;
pub use runner_client::{HttpRunnerClient, RunnerClient, RunnerError};
