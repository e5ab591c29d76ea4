//! Language runner service.
//!
//! Wraps one [`ExecutionEngine`](coderun_core::engine::ExecutionEngine) behind
//! `POST /run` and `GET /health`. The library half exists so integration tests
//! and the binary build the exact same router.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod state;
