//! # Accrual engine public API
//!
//! The API is what the HTTP layer (order submission, balance and withdrawal handlers) calls into. It validates input,
//! then delegates to a storage backend through the traits in [`crate::traits`].
//!
//! * [`order_api`] submits orders on behalf of users and lists their order history.
//! * [`ledger_api`] answers balance queries and records withdrawals.
//! * [`order_objects`] holds the JSON views handed back to clients. Amounts in these views are decimal numbers; all
//!   other layers work in [`Subunits`](accrual_common::Subunits).
//!
//! # API usage
//!
//! ```rust,ignore
//! use accrual_engine::{LedgerApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/accrual_store.db", 5).await?;
//! let api = LedgerApi::new(db);
//! let balance = api.current_balance(user_id).await?;
//! ```
pub mod errors;
pub mod ledger_api;
pub mod order_api;
pub mod order_objects;
