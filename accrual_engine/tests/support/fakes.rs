use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex},
};

use accrual_common::Subunits;
use accrual_engine::{
    db_types::{AccrualRecord, NewOrder, NewUser, Order, OrderNumber, OrderStatusType, UserAccount},
    traits::{InsertOrderResult, StatusUpdate},
    AccrualOutcome,
    AccrualSource,
    OrderManagement,
    OrderStoreError,
};
use chrono::{Duration, Utc};
use tokio::time::Instant;

/// An accrual authority that plays back scripted responses per order, and records when each lookup happened.
///
/// Once an order's script runs out, the last response is repeated. Orders with no script are `Unknown`.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    scripts: Arc<Mutex<HashMap<String, VecDeque<AccrualOutcome>>>>,
    calls: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl ScriptedSource {
    pub fn script(&self, number: &str, outcomes: Vec<AccrualOutcome>) {
        self.scripts.lock().unwrap().insert(number.to_string(), outcomes.into());
    }

    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_numbers(&self) -> Vec<String> {
        self.calls().into_iter().map(|(n, _)| n).collect()
    }
}

impl AccrualSource for ScriptedSource {
    async fn lookup(&self, number: &OrderNumber) -> AccrualOutcome {
        self.calls.lock().unwrap().push((number.as_str().to_string(), Instant::now()));
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(number.as_str()) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap_or(AccrualOutcome::Unknown),
            Some(script) => script.front().cloned().unwrap_or(AccrualOutcome::Unknown),
            None => AccrualOutcome::Unknown,
        }
    }
}

#[derive(Default)]
struct MemoryState {
    orders: Vec<Order>,
    accruals: Vec<AccrualRecord>,
    users: Vec<UserAccount>,
    failing_fetches: usize,
    failing_writes: HashSet<i64>,
}

/// An in-memory order store. Worker tests that run on a paused clock use this instead of SQLite, since the SQLite
/// driver does its I/O on a separate thread that the paused clock does not know about.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Adds a `REGISTERED` order. Each order is created one second after the previous one.
    pub fn add_order(&self, number: &str, user_id: i64) -> Order {
        let mut state = self.state.lock().unwrap();
        let id = state.orders.len() as i64 + 1;
        let created_at = Utc::now() - Duration::hours(1) + Duration::seconds(id);
        let order = Order {
            id,
            number: number.into(),
            user_id,
            status: OrderStatusType::Registered,
            accrual: None,
            created_at,
            updated_at: created_at,
        };
        state.orders.push(order.clone());
        order
    }

    pub fn order(&self, number: &str) -> Option<Order> {
        self.state.lock().unwrap().orders.iter().find(|o| o.number.as_str() == number).cloned()
    }

    pub fn accruals(&self) -> Vec<AccrualRecord> {
        self.state.lock().unwrap().accruals.clone()
    }

    /// The next `count` calls to `fetch_unprocessed_orders` fail with a database error.
    pub fn fail_next_fetches(&self, count: usize) {
        self.state.lock().unwrap().failing_fetches = count;
    }

    /// Every status write for `order_id` fails with a database error.
    pub fn fail_writes_for(&self, order_id: i64) {
        self.state.lock().unwrap().failing_writes.insert(order_id);
    }
}

impl OrderManagement for MemoryStore {
    async fn fetch_unprocessed_orders(&self) -> Result<Vec<Order>, OrderStoreError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_fetches > 0 {
            state.failing_fetches -= 1;
            return Err(OrderStoreError::DatabaseError("database is locked".into()));
        }
        let mut orders = state.orders.iter().filter(|o| !o.status.is_terminal()).cloned().collect::<Vec<_>>();
        orders.sort_by_key(|o| (o.created_at, o.id));
        Ok(orders)
    }

    async fn update_order_accrual_status(
        &self,
        order_id: i64,
        status: OrderStatusType,
        accrual: Option<Subunits>,
    ) -> Result<StatusUpdate, OrderStoreError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_writes.contains(&order_id) {
            return Err(OrderStoreError::DatabaseError("disk I/O error".into()));
        }
        let next_accrual_id = state.accruals.len() as i64 + 1;
        let order =
            state.orders.iter_mut().find(|o| o.id == order_id).ok_or(OrderStoreError::OrderIdNotFound(order_id))?;
        if order.status == status {
            return Ok(StatusUpdate::Unchanged(order.clone()));
        }
        if order.status.is_terminal() {
            return Err(OrderStoreError::IllegalTransition { id: order_id, from: order.status, to: status });
        }
        order.status = status;
        order.updated_at = Utc::now();
        let record = match accrual {
            Some(amount) if status == OrderStatusType::Settled && amount.is_positive() => {
                order.accrual = Some(amount);
                Some(AccrualRecord { id: next_accrual_id, order_id, amount, created_at: Utc::now() })
            },
            _ => None,
        };
        let order = order.clone();
        if let Some(record) = &record {
            state.accruals.push(record.clone());
        }
        Ok(StatusUpdate::Updated { order, accrual: record })
    }

    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderStoreError> {
        if let Some(existing) = self.order(order.number.as_str()) {
            return Ok(InsertOrderResult::AlreadyExists(existing));
        }
        Ok(InsertOrderResult::Inserted(self.add_order(order.number.as_str(), order.user_id)))
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderStoreError> {
        Ok(self.order(number.as_str()))
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderStoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.orders.iter().filter(|o| o.user_id == user_id).rev().cloned().collect())
    }

    async fn create_user(&self, user: NewUser) -> Result<UserAccount, OrderStoreError> {
        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|u| u.login == user.login) {
            return Err(OrderStoreError::LoginTaken(user.login));
        }
        let account = UserAccount { id: state.users.len() as i64 + 1, login: user.login, created_at: Utc::now() };
        state.users.push(account.clone());
        Ok(account)
    }

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<UserAccount>, OrderStoreError> {
        Ok(self.state.lock().unwrap().users.iter().find(|u| u.login == login).cloned())
    }
}
