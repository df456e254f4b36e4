use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, UserAccount},
    traits::OrderStoreError,
};

pub(crate) async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<UserAccount, OrderStoreError> {
    let login = user.login.clone();
    sqlx::query_as(
        "INSERT INTO users (login, password_hash, created_at) VALUES ($1, $2, $3) RETURNING id, login, created_at",
    )
    .bind(user.login)
    .bind(user.password_hash)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
    .map_err(|e| {
        let taken = e.as_database_error().map(|db_err| db_err.is_unique_violation()).unwrap_or(false);
        if taken {
            OrderStoreError::LoginTaken(login)
        } else {
            OrderStoreError::from(e)
        }
    })
}

pub async fn fetch_user_by_login(login: &str, conn: &mut SqliteConnection) -> Result<Option<UserAccount>, sqlx::Error> {
    let user = sqlx::query_as("SELECT id, login, created_at FROM users WHERE login = $1")
        .bind(login)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

/// Takes the user's ledger lock for the remainder of the enclosing transaction by writing to the user's control row.
///
/// In SQLite the write acquires the database write lock immediately, so a second withdrawal transaction blocks here
/// (up to the busy timeout) until the first one commits or rolls back. Returns false if the user does not exist.
pub(crate) async fn lock_user_ledger(user_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE users SET ledger_seq = ledger_seq + 1 WHERE id = $1").bind(user_id).execute(conn).await?;
    Ok(result.rows_affected() == 1)
}
