use std::future::Future;

use accrual_common::Subunits;
use thiserror::Error;

use crate::{
    db_types::{NewWithdrawal, Withdrawal},
    traits::data_objects::{LedgerTotals, WithdrawalOutcome},
};

/// Read-time aggregation over accruals and withdrawals.
///
/// Nothing here is cached: every call reads authoritative storage, because balances back admission decisions.
pub trait LedgerManagement: Clone + Send + Sync {
    /// The sum of all accrual records on orders owned by `user_id`.
    fn fetch_accrual_total(&self, user_id: i64) -> impl Future<Output = Result<Subunits, LedgerError>> + Send;

    /// The sum of all withdrawals made by `user_id`.
    fn fetch_withdrawal_total(&self, user_id: i64) -> impl Future<Output = Result<Subunits, LedgerError>> + Send;

    /// `accrual total - withdrawal total`, computed in a single query so that no partial state is observed.
    fn fetch_current_balance(&self, user_id: i64) -> impl Future<Output = Result<Subunits, LedgerError>> + Send;

    /// The accrual and withdrawal totals for `user_id`, read from the same snapshot.
    fn fetch_ledger_totals(&self, user_id: i64) -> impl Future<Output = Result<LedgerTotals, LedgerError>> + Send;

    /// Checks the balance and records the withdrawal in one transaction that holds the user's ledger lock, so two
    /// concurrent withdrawals for the same user are serialized and cannot both spend the same funds.
    fn insert_withdrawal_if_funded(
        &self,
        withdrawal: NewWithdrawal,
    ) -> impl Future<Output = Result<WithdrawalOutcome, LedgerError>> + Send;

    /// Fetches all withdrawals made by `user_id`, newest first.
    fn fetch_withdrawals_for_user(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<Withdrawal>, LedgerError>> + Send;
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The user {0} does not exist")]
    UserNotFound(i64),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
