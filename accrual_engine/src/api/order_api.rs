//! Order submission and order history.
use std::fmt::Debug;

use accrual_common::luhn::is_valid_luhn;
use log::*;

use crate::{
    api::errors::OrderApiError,
    db_types::{NewOrder, NewUser, Order, OrderNumber, UserAccount},
    traits::{InsertOrderResult, OrderManagement},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOrderResult {
    /// A new order was created in `REGISTERED` status. The reconciliation worker will pick it up.
    Accepted(Order),
    /// This user has already submitted this order. Nothing changed.
    AlreadySubmitted(Order),
    /// The order number belongs to someone else.
    OwnedByAnotherUser,
}

pub struct OrderApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrderApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderApi ({:?})", self.db)
    }
}

impl<B> OrderApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Submits `number` on behalf of `user_id`. The number must pass the Luhn check.
    pub async fn submit_order(&self, number: OrderNumber, user_id: i64) -> Result<SubmitOrderResult, OrderApiError> {
        if !is_valid_luhn(number.as_str()) {
            debug!("📦️ Rejecting order {number} from user #{user_id}. It fails the Luhn check");
            return Err(OrderApiError::InvalidOrderNumber(number.0));
        }
        let result = match self.db.insert_order(NewOrder::new(number, user_id)).await? {
            InsertOrderResult::Inserted(order) => {
                info!("📦️ Order {} registered for user #{user_id}", order.number);
                SubmitOrderResult::Accepted(order)
            },
            InsertOrderResult::AlreadyExists(order) if order.user_id == user_id => {
                SubmitOrderResult::AlreadySubmitted(order)
            },
            InsertOrderResult::AlreadyExists(order) => {
                warn!("📦️ User #{user_id} tried to submit order {}, which belongs to another user", order.number);
                SubmitOrderResult::OwnedByAnotherUser
            },
        };
        Ok(result)
    }

    /// All orders belonging to `user_id`, newest first.
    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderApiError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        trace!("📦️ {} orders for user #{user_id}", orders.len());
        Ok(orders)
    }

    pub async fn order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderApiError> {
        let order = self.db.fetch_order_by_number(number).await?;
        Ok(order)
    }

    pub async fn register_user(&self, user: NewUser) -> Result<UserAccount, OrderApiError> {
        let account = self.db.create_user(user).await?;
        info!("📦️ User #{} ({}) registered", account.id, account.login);
        Ok(account)
    }

    pub async fn user_by_login(&self, login: &str) -> Result<Option<UserAccount>, OrderApiError> {
        let account = self.db.fetch_user_by_login(login).await?;
        Ok(account)
    }
}
