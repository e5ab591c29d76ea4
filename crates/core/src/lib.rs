//! Shared domain logic for the coderun services.
//!
//! Holds the request/outcome data model, validation and timeout policy,
//! request fingerprinting, and the per-language execution engine. Nothing in
//! this crate touches the network.

pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod language;
pub mod outcome;
pub mod request;

pub use error::CoreError;
pub use fingerprint::Fingerprint;
pub use language::Language;
pub use outcome::{ErrorBody, ErrorKind, ExecutionOutcome};
pub use request::{ExecutionRequest, NormalizedRequest, RunRequest, TimeoutPolicy};
