use accrual_common::Subunits;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewWithdrawal, Withdrawal},
    traits::LedgerTotals,
};

/// Inserts a withdrawal without any balance check. Callers must hold the user's ledger lock; see
/// [`super::users::lock_user_ledger`].
pub(crate) async fn insert_withdrawal(
    withdrawal: NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, sqlx::Error> {
    let withdrawal = sqlx::query_as(
        r#"
            INSERT INTO withdrawals (order_number, amount, user_id, processed_at) VALUES ($1, $2, $3, $4)
            RETURNING *
        "#,
    )
    .bind(withdrawal.order_number.as_str())
    .bind(withdrawal.amount)
    .bind(withdrawal.user_id)
    .bind(withdrawal.processed_at)
    .fetch_one(conn)
    .await?;
    Ok(withdrawal)
}

pub(crate) async fn withdrawal_total_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Subunits, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM withdrawals WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    Ok(Subunits::from(total))
}

pub async fn fetch_withdrawals_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, sqlx::Error> {
    let withdrawals =
        sqlx::query_as("SELECT * FROM withdrawals WHERE user_id = $1 ORDER BY processed_at DESC, id DESC")
            .bind(user_id)
            .fetch_all(conn)
            .await?;
    Ok(withdrawals)
}

/// Accruals minus withdrawals for the user, in a single statement so both sums come from the same snapshot.
pub(crate) async fn current_balance(user_id: i64, conn: &mut SqliteConnection) -> Result<Subunits, sqlx::Error> {
    let balance: i64 = sqlx::query_scalar(
        r#"
            SELECT
                (SELECT COALESCE(SUM(accruals.amount), 0)
                   FROM accruals JOIN orders ON accruals.order_id = orders.id
                  WHERE orders.user_id = ?1)
              - (SELECT COALESCE(SUM(withdrawals.amount), 0)
                   FROM withdrawals
                  WHERE withdrawals.user_id = ?1)
        "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(Subunits::from(balance))
}

/// Both ledger totals for the user in one statement.
pub(crate) async fn ledger_totals(user_id: i64, conn: &mut SqliteConnection) -> Result<LedgerTotals, sqlx::Error> {
    let (accrued, withdrawn): (i64, i64) = sqlx::query_as(
        r#"
            SELECT
                (SELECT COALESCE(SUM(accruals.amount), 0)
                   FROM accruals JOIN orders ON accruals.order_id = orders.id
                  WHERE orders.user_id = ?1),
                (SELECT COALESCE(SUM(withdrawals.amount), 0)
                   FROM withdrawals
                  WHERE withdrawals.user_id = ?1)
        "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(LedgerTotals { accrued: Subunits::from(accrued), withdrawn: Subunits::from(withdrawn) })
}
