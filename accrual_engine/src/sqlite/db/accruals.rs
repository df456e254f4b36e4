use accrual_common::Subunits;
use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::AccrualRecord;

/// Inserts the accrual record for an order. The `order_id` column is unique, so a second insert for the same order is
/// ignored and `None` is returned.
pub(crate) async fn insert_accrual(
    order_id: i64,
    amount: Subunits,
    conn: &mut SqliteConnection,
) -> Result<Option<AccrualRecord>, sqlx::Error> {
    let record = sqlx::query_as(
        r#"
            INSERT INTO accruals (order_id, amount, created_at) VALUES ($1, $2, $3)
            ON CONFLICT (order_id) DO NOTHING
            RETURNING *
        "#,
    )
    .bind(order_id)
    .bind(amount)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?;
    Ok(record)
}

pub async fn fetch_accruals_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<AccrualRecord>, sqlx::Error> {
    let records =
        sqlx::query_as("SELECT * FROM accruals WHERE order_id = $1").bind(order_id).fetch_all(conn).await?;
    Ok(records)
}

pub(crate) async fn accrual_total_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Subunits, sqlx::Error> {
    let total: i64 = sqlx::query_scalar(
        r#"
            SELECT COALESCE(SUM(accruals.amount), 0)
            FROM accruals JOIN orders ON accruals.order_id = orders.id
            WHERE orders.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(Subunits::from(total))
}
