use std::future::Future;

use accrual_common::Subunits;
use thiserror::Error;

use crate::{
    db_types::{NewOrder, NewUser, Order, OrderNumber, OrderStatusType, UserAccount},
    traits::data_objects::{InsertOrderResult, StatusUpdate},
};

/// The Order State Store.
///
/// Orders are created in `REGISTERED` status, are mutated only through [`update_order_accrual_status`] until they reach
/// a terminal status, and are never deleted.
///
/// [`update_order_accrual_status`]: OrderManagement::update_order_accrual_status
pub trait OrderManagement: Clone + Send + Sync {
    /// Fetches every order in a non-terminal status (`REGISTERED` or `PROCESSING`), oldest first.
    fn fetch_unprocessed_orders(&self) -> impl Future<Output = Result<Vec<Order>, OrderStoreError>> + Send;

    /// Applies a status transition to the order with internal id `order_id`, in a single atomic transaction:
    /// * If the stored status already equals `status`, nothing is written and [`StatusUpdate::Unchanged`] is
    ///   returned. Calling this twice with the same arguments is therefore safe.
    /// * If the stored status is terminal, the transition is refused.
    /// * Otherwise the status is updated, and if the new status is `SETTLED` and `accrual` is positive, exactly one
    ///   accrual record is inserted for the order.
    ///
    /// A failure at any point rolls the whole transition back, leaving the order in its previous status.
    fn update_order_accrual_status(
        &self,
        order_id: i64,
        status: OrderStatusType,
        accrual: Option<Subunits>,
    ) -> impl Future<Output = Result<StatusUpdate, OrderStoreError>> + Send;

    /// Stores a new order in `REGISTERED` status. If an order with the same number already exists, it is returned
    /// instead and nothing is written.
    fn insert_order(&self, order: NewOrder) -> impl Future<Output = Result<InsertOrderResult, OrderStoreError>> + Send;

    fn fetch_order_by_number(
        &self,
        number: &OrderNumber,
    ) -> impl Future<Output = Result<Option<Order>, OrderStoreError>> + Send;

    /// Fetches all orders owned by `user_id`, newest first.
    fn fetch_orders_for_user(&self, user_id: i64) -> impl Future<Output = Result<Vec<Order>, OrderStoreError>> + Send;

    fn create_user(&self, user: NewUser) -> impl Future<Output = Result<UserAccount, OrderStoreError>> + Send;

    fn fetch_user_by_login(
        &self,
        login: &str,
    ) -> impl Future<Output = Result<Option<UserAccount>, OrderStoreError>> + Send;
}

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("Order {id} cannot move from {from} to {to}")]
    IllegalTransition { id: i64, from: OrderStatusType, to: OrderStatusType },
    #[error("The user {0} does not exist")]
    UserNotFound(i64),
    #[error("A user with login {0} already exists")]
    LoginTaken(String),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}
