//! Balances and withdrawals.
//!
//! Every figure returned here is computed from storage at the time of the call. There is no cached balance.
use std::fmt::Debug;

use accrual_common::{luhn::is_valid_luhn, Subunits};
use log::*;

use crate::{
    api::{errors::LedgerApiError, order_objects::BalanceSummary},
    db_types::{NewWithdrawal, Withdrawal},
    traits::{admit, Admission, LedgerManagement, WithdrawalOutcome},
};

pub struct LedgerApi<B> {
    db: B,
}

impl<B: Debug> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi ({:?})", self.db)
    }
}

impl<B> LedgerApi<B>
where B: LedgerManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Sum of settled accruals minus sum of withdrawals for the user.
    pub async fn current_balance(&self, user_id: i64) -> Result<Subunits, LedgerApiError> {
        let balance = self.db.fetch_current_balance(user_id).await?;
        Ok(balance)
    }

    pub async fn accrual_total(&self, user_id: i64) -> Result<Subunits, LedgerApiError> {
        let total = self.db.fetch_accrual_total(user_id).await?;
        Ok(total)
    }

    pub async fn withdrawal_total(&self, user_id: i64) -> Result<Subunits, LedgerApiError> {
        let total = self.db.fetch_withdrawal_total(user_id).await?;
        Ok(total)
    }

    /// The current balance and the amount withdrawn so far. Both figures come from one read, so `current` always
    /// equals accruals minus `withdrawn`.
    pub async fn balance_summary(&self, user_id: i64) -> Result<BalanceSummary, LedgerApiError> {
        let totals = self.db.fetch_ledger_totals(user_id).await?;
        Ok(BalanceSummary { current: totals.balance(), withdrawn: totals.withdrawn })
    }

    /// Checks whether a withdrawal of `amount` would currently be admitted. Nothing is written, and nothing is held, so
    /// the answer can be stale by the time it is acted on. Use [`Self::withdraw`] to record a withdrawal.
    pub async fn admit_withdrawal(&self, user_id: i64, amount: Subunits) -> Result<Admission, LedgerApiError> {
        let balance = self.current_balance(user_id).await?;
        Ok(admit(balance, amount))
    }

    /// Records a withdrawal if the user's balance covers it. The balance check and the insert happen under the user's
    /// ledger lock, so concurrent withdrawals can never take the balance below zero.
    pub async fn withdraw(&self, withdrawal: NewWithdrawal) -> Result<WithdrawalOutcome, LedgerApiError> {
        if !is_valid_luhn(withdrawal.order_number.as_str()) {
            return Err(LedgerApiError::InvalidOrderNumber(withdrawal.order_number.0));
        }
        let user_id = withdrawal.user_id;
        let outcome = self.db.insert_withdrawal_if_funded(withdrawal).await?;
        match &outcome {
            WithdrawalOutcome::Recorded(w) => info!("💸️ User #{user_id} withdrew {} against {}", w.amount, w.order_number),
            WithdrawalOutcome::Rejected(reason) => info!("💸️ Withdrawal for user #{user_id} rejected: {reason:?}"),
        }
        Ok(outcome)
    }

    /// All withdrawals made by the user, newest first.
    pub async fn withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerApiError> {
        let withdrawals = self.db.fetch_withdrawals_for_user(user_id).await?;
        Ok(withdrawals)
    }
}
