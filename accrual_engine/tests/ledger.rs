mod support;

use accrual_common::Subunits;
use accrual_engine::{
    db_types::{NewOrder, NewWithdrawal, OrderStatusType},
    traits::{Admission, InsertOrderResult, Rejection, WithdrawalOutcome},
    LedgerApi,
    LedgerApiError,
    LedgerError,
    LedgerManagement,
    OrderManagement,
    SqliteDatabase,
};
use support::prepare_env::{new_user, prepare_test_env};

/// Gives the user a settled order worth `amount` subunits.
async fn credit(db: &SqliteDatabase, user_id: i64, number: &str, amount: i64) {
    let InsertOrderResult::Inserted(order) = db.insert_order(NewOrder::new(number.into(), user_id)).await.unwrap() else {
        panic!("Order {number} should be new");
    };
    db.update_order_accrual_status(order.id, OrderStatusType::Settled, Some(Subunits::from(amount))).await.unwrap();
}

#[tokio::test]
async fn balance_is_accruals_minus_withdrawals() {
    let db = prepare_test_env().await;
    let alice = new_user(&db, "alice").await;
    let bob = new_user(&db, "bob").await;
    credit(&db, alice, "12345678903", 6000).await;
    credit(&db, alice, "79927398713", 4000).await;
    credit(&db, bob, "9278923470", 777).await;
    let api = LedgerApi::new(db.clone());
    assert_eq!(api.current_balance(alice).await.unwrap(), Subunits::from(10_000));
    assert_eq!(api.current_balance(bob).await.unwrap(), Subunits::from(777));

    let outcome = api.withdraw(NewWithdrawal::new(alice, "2377225624".into(), Subunits::from(2500))).await.unwrap();
    assert!(matches!(outcome, WithdrawalOutcome::Recorded(ref w) if w.amount == Subunits::from(2500)));
    assert_eq!(api.accrual_total(alice).await.unwrap(), Subunits::from(10_000));
    assert_eq!(api.withdrawal_total(alice).await.unwrap(), Subunits::from(2500));
    assert_eq!(api.current_balance(alice).await.unwrap(), Subunits::from(7500));
    let summary = api.balance_summary(alice).await.unwrap();
    assert_eq!(summary.current, Subunits::from(7500));
    assert_eq!(summary.withdrawn, Subunits::from(2500));
    let history = api.withdrawals_for_user(alice).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].order_number.as_str(), "2377225624");
    assert!(api.withdrawals_for_user(bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn withdrawals_cannot_exceed_the_balance() {
    let db = prepare_test_env().await;
    let alice = new_user(&db, "alice").await;
    credit(&db, alice, "12345678903", 10_000).await;
    let api = LedgerApi::new(db);

    let check = api.admit_withdrawal(alice, Subunits::from(15_000)).await.unwrap();
    assert_eq!(
        check,
        Admission::Rejected(Rejection::InsufficientFunds {
            balance: Subunits::from(10_000),
            requested: Subunits::from(15_000)
        })
    );
    let outcome = api.withdraw(NewWithdrawal::new(alice, "2377225624".into(), Subunits::from(15_000))).await.unwrap();
    assert!(matches!(outcome, WithdrawalOutcome::Rejected(Rejection::InsufficientFunds { .. })));
    assert_eq!(api.current_balance(alice).await.unwrap(), Subunits::from(10_000));

    assert!(api.admit_withdrawal(alice, Subunits::from(10_000)).await.unwrap().is_admitted());
    let outcome = api.withdraw(NewWithdrawal::new(alice, "2377225624".into(), Subunits::from(10_000))).await.unwrap();
    assert!(matches!(outcome, WithdrawalOutcome::Recorded(_)));
    assert_eq!(api.current_balance(alice).await.unwrap(), Subunits::zero());
}

#[tokio::test]
async fn withdrawals_are_validated() {
    let db = prepare_test_env().await;
    let alice = new_user(&db, "alice").await;
    credit(&db, alice, "12345678903", 100).await;
    let api = LedgerApi::new(db);
    let err = api.withdraw(NewWithdrawal::new(alice, "1234".into(), Subunits::from(10))).await.unwrap_err();
    assert!(matches!(err, LedgerApiError::InvalidOrderNumber(_)));
    let outcome = api.withdraw(NewWithdrawal::new(alice, "2377225624".into(), Subunits::zero())).await.unwrap();
    assert_eq!(outcome, WithdrawalOutcome::Rejected(Rejection::NonPositiveAmount));
    let err = api.withdraw(NewWithdrawal::new(404, "2377225624".into(), Subunits::from(10))).await.unwrap_err();
    assert!(matches!(err, LedgerApiError::LedgerError(LedgerError::UserNotFound(404))));
}

#[tokio::test]
async fn concurrent_withdrawals_never_overdraw() {
    let db = prepare_test_env().await;
    let alice = new_user(&db, "alice").await;
    credit(&db, alice, "12345678903", 10_000).await;
    let mut handles = Vec::new();
    for _ in 0..8 {
        let api = LedgerApi::new(db.clone());
        handles.push(tokio::spawn(async move {
            api.withdraw(NewWithdrawal::new(alice, "2377225624".into(), Subunits::from(3000))).await
        }));
    }
    let mut recorded = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            WithdrawalOutcome::Recorded(_) => recorded += 1,
            WithdrawalOutcome::Rejected(reason) => {
                assert!(matches!(reason, Rejection::InsufficientFunds { .. }))
            },
        }
    }
    assert_eq!(recorded, 3);
    let api = LedgerApi::new(db);
    assert_eq!(api.current_balance(alice).await.unwrap(), Subunits::from(1000));
}

#[tokio::test]
async fn balance_summaries_agree_with_themselves_while_withdrawals_land() {
    let db = prepare_test_env().await;
    let alice = new_user(&db, "alice").await;
    credit(&db, alice, "12345678903", 10_000).await;
    let writer = LedgerApi::new(db.clone());
    let withdrawals = tokio::spawn(async move {
        for _ in 0..5 {
            writer.withdraw(NewWithdrawal::new(alice, "2377225624".into(), Subunits::from(1500))).await.unwrap();
        }
    });
    let api = LedgerApi::new(db.clone());
    for _ in 0..50 {
        let summary = api.balance_summary(alice).await.unwrap();
        assert_eq!(summary.current + summary.withdrawn, Subunits::from(10_000), "Inconsistent summary: {summary:?}");
        tokio::task::yield_now().await;
    }
    withdrawals.await.unwrap();

    let totals = db.fetch_ledger_totals(alice).await.unwrap();
    assert_eq!(totals.accrued, Subunits::from(10_000));
    assert_eq!(totals.withdrawn, Subunits::from(7500));
    let summary = api.balance_summary(alice).await.unwrap();
    assert_eq!(summary.current, Subunits::from(2500));
    assert_eq!(summary.withdrawn, Subunits::from(7500));
}
