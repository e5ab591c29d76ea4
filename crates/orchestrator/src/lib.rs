//! coderun orchestrator library.
//!
//! Exposes the building blocks (config, routing table, dispatch, handlers,
//! error mapping) so integration tests and the binary entrypoint share them.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod routing;
pub mod state;
