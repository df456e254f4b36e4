//! # Accrual server
//! This crate hosts the long-running accrual reconciliation service. It is responsible for:
//! * Loading configuration from the environment.
//! * Preparing the order store (including running migrations).
//! * Running the reconciliation worker in the background until shutdown.
//! * Serving a health check, so that orchestration can tell the process is alive.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
pub mod cli;
pub mod config;
pub mod errors;
pub mod reconciliation_worker;
pub mod routes;
pub mod server;
