use accrual_common::Subunits;
use serde::Serialize;

use crate::db_types::{AccrualRecord, Order, Withdrawal};

/// The result of an idempotent order insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOrderResult {
    Inserted(Order),
    /// An order with this number already exists. The stored order is returned unchanged, whoever owns it.
    AlreadyExists(Order),
}

/// The result of applying a status transition to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The status changed. `accrual` is the accrual record created by this transition, if any.
    Updated { order: Order, accrual: Option<AccrualRecord> },
    /// The stored status already matched the requested one. Nothing was written.
    Unchanged(Order),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rejection {
    InsufficientFunds { balance: Subunits, requested: Subunits },
    NonPositiveAmount,
}

/// The outcome of a withdrawal admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Admission {
    Admitted,
    Rejected(Rejection),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

/// The outcome of recording a withdrawal. Admission and insertion happen in the same transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawalOutcome {
    Recorded(Withdrawal),
    Rejected(Rejection),
}

/// Both sides of a user's ledger, read together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    pub accrued: Subunits,
    pub withdrawn: Subunits,
}

impl LedgerTotals {
    pub fn balance(&self) -> Subunits {
        self.accrued - self.withdrawn
    }
}

/// Admits a withdrawal of `amount` against `balance` iff the amount is positive and does not exceed the balance.
pub fn admit(balance: Subunits, amount: Subunits) -> Admission {
    if !amount.is_positive() {
        Admission::Rejected(Rejection::NonPositiveAmount)
    } else if amount > balance {
        Admission::Rejected(Rejection::InsufficientFunds { balance, requested: amount })
    } else {
        Admission::Admitted
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn admission_rules() {
        let balance = Subunits::from(10_000);
        assert_eq!(admit(balance, Subunits::from(10_000)), Admission::Admitted);
        assert_eq!(admit(balance, Subunits::from(1)), Admission::Admitted);
        assert_eq!(
            admit(balance, Subunits::from(15_000)),
            Admission::Rejected(Rejection::InsufficientFunds { balance, requested: Subunits::from(15_000) })
        );
        assert_eq!(admit(balance, Subunits::from(0)), Admission::Rejected(Rejection::NonPositiveAmount));
        assert_eq!(admit(balance, Subunits::from(-5)), Admission::Rejected(Rejection::NonPositiveAmount));
        assert!(!admit(Subunits::from(-100), Subunits::from(1)).is_admitted());
    }
}
