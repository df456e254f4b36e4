//! Accrual Engine
//!
//! The accrual engine keeps a local record of customer orders in step with an external accrual authority, and derives
//! each customer's loyalty balance from the accruals and withdrawals on record.
//!
//! The library is divided into these sections:
//! 1. Storage contracts ([`mod@traits`]) and the SQLite backend that implements them ([`SqliteDatabase`]). The data
//!    types stored in the database are defined in [`mod@db_types`] and are public.
//! 2. The accrual source client ([`mod@accrual_client`]), which talks to the external authority and classifies every
//!    response into an [`AccrualOutcome`].
//! 3. The reconciliation worker ([`mod@reconciliation`]), a background task that drives pending orders towards their
//!    terminal status.
//! 4. The public API ([`OrderApi`] and [`LedgerApi`]) used by the HTTP layer to submit orders, query balances and
//!    record withdrawals.
//!
//! All amounts are held in [`Subunits`](accrual_common::Subunits). Decimal values only appear in the JSON views in
//! [`order_objects`].
pub mod accrual_client;
mod api;
pub mod db_types;
pub mod reconciliation;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

pub use accrual_client::{AccrualClient, AccrualClientConfig, AccrualClientError, AccrualOutcome, AccrualSource};
pub use api::{
    errors::{LedgerApiError, OrderApiError},
    ledger_api::LedgerApi,
    order_api::{OrderApi, SubmitOrderResult},
    order_objects,
};
pub use reconciliation::{PassResult, ReconciliationWorker, WorkerOptions};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use traits::{LedgerError, LedgerManagement, OrderManagement, OrderStoreError};
