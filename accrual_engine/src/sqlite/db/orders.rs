use chrono::Utc;
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType},
    traits::{InsertOrderResult, OrderStoreError},
};

/// Orders are always read together with their (optional) accrual record.
const SELECT_ORDERS: &str = r#"
    SELECT
        orders.id AS id,
        orders.number AS number,
        orders.user_id AS user_id,
        orders.status AS status,
        accruals.amount AS accrual,
        orders.created_at AS created_at,
        orders.updated_at AS updated_at
    FROM orders LEFT JOIN accruals ON accruals.order_id = orders.id
"#;

/// Inserts the order into the database. If an order with the same number already exists, nothing is written and the
/// existing order is returned as [`InsertOrderResult::AlreadyExists`].
///
/// A new order for a user that does not exist fails with [`OrderStoreError::UserNotFound`].
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<InsertOrderResult, OrderStoreError> {
    let number = order.number.clone();
    let user_id = order.user_id;
    let inserted = insert_order(order, conn).await.map_err(|e| {
        let no_user = e.as_database_error().map(|db_err| db_err.is_foreign_key_violation()).unwrap_or(false);
        if no_user {
            OrderStoreError::UserNotFound(user_id)
        } else {
            OrderStoreError::from(e)
        }
    })?;
    let stored = fetch_order_by_number(&number, conn).await?.ok_or(sqlx::Error::RowNotFound)?;
    if inserted {
        debug!("📝️ Order [{}] inserted with id {}", stored.number, stored.id);
        Ok(InsertOrderResult::Inserted(stored))
    } else {
        trace!("📝️ Order [{}] already exists with id {}", stored.number, stored.id);
        Ok(InsertOrderResult::AlreadyExists(stored))
    }
}

/// Returns false if the order number was already taken. This is not atomic with respect to anything else. Embed it in
/// a transaction if you need to, and pass `&mut tx` as the connection argument.
async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            INSERT INTO orders (number, user_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (number) DO NOTHING
        "#,
    )
    .bind(order.number.as_str())
    .bind(order.user_id)
    .bind(OrderStatusType::Registered.as_str())
    .bind(order.created_at)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(&format!("{SELECT_ORDERS} WHERE orders.number = $1"))
        .bind(number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as(&format!("{SELECT_ORDERS} WHERE orders.id = $1")).bind(id).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches all orders in one of the given statuses, ordered by `created_at` in ascending order (ties broken by id).
pub async fn fetch_orders_with_status(
    statuses: &[OrderStatusType],
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    if statuses.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::<Sqlite>::new(SELECT_ORDERS);
    builder.push(" WHERE orders.status IN (");
    let mut list = builder.separated(", ");
    for status in statuses {
        list.push_bind(status.as_str());
    }
    list.push_unseparated(")");
    builder.push(" ORDER BY orders.created_at ASC, orders.id ASC");
    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📝️ {} orders with status in {statuses:?}", orders.len());
    Ok(orders)
}

/// Fetches all orders for the user, newest first.
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(&format!(
        "{SELECT_ORDERS} WHERE orders.user_id = $1 ORDER BY orders.created_at DESC, orders.id DESC"
    ))
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

/// Sets the status of a non-terminal order. Returns false if no non-terminal order with the given id exists, in which
/// case nothing was changed.
pub(crate) async fn update_order_status(
    id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let [registered, processing] = OrderStatusType::non_terminal();
    let result = sqlx::query(
        "UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 AND status IN ($4, $5)",
    )
    .bind(status.as_str())
    .bind(Utc::now())
    .bind(id)
    .bind(registered.as_str())
    .bind(processing.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
