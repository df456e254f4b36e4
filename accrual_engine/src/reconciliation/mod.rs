//! # Reconciliation
//!
//! Orders are submitted locally in `REGISTERED` status, but only the accrual authority decides whether they settle
//! and for how much. The [`ReconciliationWorker`] closes that gap: on every tick it walks every non-terminal order,
//! oldest first, asks the authority about each one in turn, and writes back any status change along with the accrual.
//!
//! Lookups are strictly sequential. The authority rate-limits per caller, so when it answers `429` the whole pass
//! backs off for the requested interval and the remaining orders wait for the next tick.
//!
//! Nothing in a pass is fatal. Transport failures and storage failures for one order are logged and the pass moves on;
//! a failure to list pending orders skips the tick. Only the cancellation token stops the worker.
mod pass_result;
mod worker;

pub use pass_result::PassResult;
pub use worker::{ReconciliationWorker, WorkerOptions, DEFAULT_CADENCE};
