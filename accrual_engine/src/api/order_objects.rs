use accrual_common::Subunits;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::db_types::{Order, OrderNumber, OrderStatusType, Withdrawal};

/// Serializes an amount as a JSON decimal number, e.g. `10.5` for 1050 subunits.
pub fn as_decimal_float<S>(amount: &Subunits, serializer: S) -> Result<S::Ok, S::Error>
where S: Serializer {
    rust_decimal::serde::float::serialize(&amount.to_decimal(), serializer)
}

pub fn as_optional_decimal_float<S>(amount: &Option<Subunits>, serializer: S) -> Result<S::Ok, S::Error>
where S: Serializer {
    rust_decimal::serde::float_option::serialize(&amount.map(|a| a.to_decimal()), serializer)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceSummary {
    #[serde(serialize_with = "as_decimal_float")]
    pub current: Subunits,
    #[serde(serialize_with = "as_decimal_float")]
    pub withdrawn: Subunits,
}

/// An order as its owner sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserOrder {
    pub number: OrderNumber,
    pub status: OrderStatusType,
    #[serde(serialize_with = "as_optional_decimal_float", skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Subunits>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for UserOrder {
    fn from(order: Order) -> Self {
        Self { number: order.number, status: order.status, accrual: order.accrual, uploaded_at: order.created_at }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawalView {
    pub order: OrderNumber,
    #[serde(serialize_with = "as_decimal_float")]
    pub sum: Subunits,
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalView {
    fn from(w: Withdrawal) -> Self {
        Self { order: w.order_number, sum: w.amount, processed_at: w.processed_at }
    }
}
