//! # Storage contracts
//!
//! This module defines the behaviour that a storage backend must expose to support the accrual engine.
//!
//! * [`OrderManagement`] is the Order State Store. It persists orders, exposes the set of orders the reconciliation
//!   worker must keep polling, and applies status transitions (with their accrual records) atomically.
//! * [`LedgerManagement`] aggregates accruals and withdrawals into balances, and records withdrawals under a per-user
//!   lock so that concurrent withdrawals cannot overdraw an account.
//!
//! Backends hold no ledger state of their own. Every balance is computed from authoritative storage at read time.
mod data_objects;
mod ledger_management;
mod order_management;

pub use data_objects::{admit, Admission, InsertOrderResult, LedgerTotals, Rejection, StatusUpdate, WithdrawalOutcome};
pub use ledger_management::{LedgerError, LedgerManagement};
pub use order_management::{OrderManagement, OrderStoreError};
