//! `SqliteDatabase` is the concrete storage backend for the accrual engine.
//!
//! It implements both [`OrderManagement`] and [`LedgerManagement`]. Every multi-statement mutation runs inside a single
//! transaction, so a failure part way through leaves storage exactly as it was.
use std::fmt::Debug;

use accrual_common::Subunits;
use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{accruals, new_pool, orders, users, withdrawals};
use crate::{
    db_types::{NewOrder, NewUser, NewWithdrawal, Order, OrderNumber, OrderStatusType, UserAccount, Withdrawal},
    traits::{
        admit,
        Admission,
        InsertOrderResult,
        LedgerError,
        LedgerManagement,
        LedgerTotals,
        OrderManagement,
        OrderStoreError,
        StatusUpdate,
        WithdrawalOutcome,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_unprocessed_orders(&self) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_with_status(&OrderStatusType::non_terminal(), &mut conn).await?;
        Ok(orders)
    }

    async fn update_order_accrual_status(
        &self,
        order_id: i64,
        status: OrderStatusType,
        accrual: Option<Subunits>,
    ) -> Result<StatusUpdate, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::fetch_order_by_id(order_id, &mut tx).await?.ok_or(OrderStoreError::OrderIdNotFound(order_id))?;
        if order.status == status {
            debug!("🗃️ Order {} already has status {status}. No action to take", order.number);
            return Ok(StatusUpdate::Unchanged(order));
        }
        if order.status.is_terminal() || !orders::update_order_status(order_id, status, &mut tx).await? {
            error!("🗃️ Order {} cannot be transitioned from {} to {status}.", order.number, order.status);
            return Err(OrderStoreError::IllegalTransition { id: order_id, from: order.status, to: status });
        }
        let accrual = match (status, accrual) {
            (OrderStatusType::Settled, Some(amount)) if amount.is_positive() => {
                let record = accruals::insert_accrual(order_id, amount, &mut tx).await?;
                if record.is_none() {
                    warn!("🗃️ Order {} already had an accrual record. The existing record is kept.", order.number);
                }
                record
            },
            _ => None,
        };
        let updated =
            orders::fetch_order_by_id(order_id, &mut tx).await?.ok_or(OrderStoreError::OrderIdNotFound(order_id))?;
        tx.commit().await?;
        debug!(
            "🗃️ Order {} moved from {} to {status}. Accrual: {}",
            order.number,
            order.status,
            accrual.as_ref().map(|a| a.amount.to_string()).unwrap_or_else(|| "none".into())
        );
        Ok(StatusUpdate::Updated { order: updated, accrual })
    }

    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::idempotent_insert(order, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn create_user(&self, user: NewUser) -> Result<UserAccount, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(user, &mut conn).await
    }

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<UserAccount>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_login(login, &mut conn).await?;
        Ok(user)
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn fetch_accrual_total(&self, user_id: i64) -> Result<Subunits, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let total = accruals::accrual_total_for_user(user_id, &mut conn).await?;
        Ok(total)
    }

    async fn fetch_withdrawal_total(&self, user_id: i64) -> Result<Subunits, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let total = withdrawals::withdrawal_total_for_user(user_id, &mut conn).await?;
        Ok(total)
    }

    async fn fetch_current_balance(&self, user_id: i64) -> Result<Subunits, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let balance = withdrawals::current_balance(user_id, &mut conn).await?;
        Ok(balance)
    }

    async fn fetch_ledger_totals(&self, user_id: i64) -> Result<LedgerTotals, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let totals = withdrawals::ledger_totals(user_id, &mut conn).await?;
        Ok(totals)
    }

    async fn insert_withdrawal_if_funded(&self, withdrawal: NewWithdrawal) -> Result<WithdrawalOutcome, LedgerError> {
        let user_id = withdrawal.user_id;
        let mut tx = self.pool.begin().await?;
        if !users::lock_user_ledger(user_id, &mut tx).await? {
            return Err(LedgerError::UserNotFound(user_id));
        }
        trace!("🗃️ Ledger lock acquired for user #{user_id}");
        let balance = withdrawals::current_balance(user_id, &mut tx).await?;
        match admit(balance, withdrawal.amount) {
            Admission::Admitted => {
                let withdrawal = withdrawals::insert_withdrawal(withdrawal, &mut tx).await?;
                tx.commit().await?;
                debug!(
                    "🗃️ Withdrawal #{} of {} recorded for user #{user_id} against {}. Balance was {balance}",
                    withdrawal.id, withdrawal.amount, withdrawal.order_number
                );
                Ok(WithdrawalOutcome::Recorded(withdrawal))
            },
            Admission::Rejected(reason) => {
                tx.rollback().await?;
                debug!("🗃️ Withdrawal of {} for user #{user_id} rejected: {reason:?}", withdrawal.amount);
                Ok(WithdrawalOutcome::Rejected(reason))
            },
        }
    }

    async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let withdrawals = withdrawals::fetch_withdrawals_for_user(user_id, &mut conn).await?;
        Ok(withdrawals)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, with a connection pool of at most `max_connections` connections.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. This is idempotent.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Closes the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
