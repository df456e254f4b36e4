use std::{fmt::Display, str::FromStr};

use accrual_common::Subunits;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------      OrderNumber      ---------------------------------------------------------
/// The externally visible order number. A string of decimal digits that is unique across all users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl FromStr for OrderNumber {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().to_string()))
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been submitted, but the accrual authority has not seen it yet.
    Registered,
    /// The accrual authority has acknowledged the order but not finalized it.
    Processing,
    /// Terminal. The accrual amount is final and has been recorded.
    Settled,
    /// Terminal. The accrual authority rejected the order. No accrual is recorded.
    Rejected,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled | Self::Rejected)
    }

    /// The statuses the reconciliation worker keeps polling.
    pub fn non_terminal() -> [OrderStatusType; 2] {
        [Self::Registered, Self::Processing]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "REGISTERED",
            Self::Processing => "PROCESSING",
            Self::Settled => "SETTLED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REGISTERED" => Ok(Self::Registered),
            "PROCESSING" => Ok(Self::Processing),
            "SETTLED" => Ok(Self::Settled),
            "REJECTED" => Ok(Self::Rejected),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub number: OrderNumber,
    pub user_id: i64,
    pub status: OrderStatusType,
    /// The accrued amount. Only present once the order has settled with a positive accrual.
    pub accrual: Option<Subunits>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub number: OrderNumber,
    /// The user submitting the order. Only this user will ever own it.
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(number: OrderNumber, user_id: i64) -> Self {
        Self { number, user_id, created_at: Utc::now() }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

//--------------------------------------   AccrualRecord    ---------------------------------------------------------
/// One-to-one with a settled order. Created exactly once and never modified.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AccrualRecord {
    pub id: i64,
    pub order_id: i64,
    pub amount: Subunits,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     Withdrawal     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Withdrawal {
    pub id: i64,
    /// The loyalty-redemption reference this withdrawal is spent against.
    pub order_number: OrderNumber,
    pub amount: Subunits,
    pub user_id: i64,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub order_number: OrderNumber,
    pub amount: Subunits,
    pub user_id: i64,
    pub processed_at: DateTime<Utc>,
}

impl NewWithdrawal {
    pub fn new(user_id: i64, order_number: OrderNumber, amount: Subunits) -> Self {
        Self { order_number, amount, user_id, processed_at: Utc::now() }
    }
}

//--------------------------------------     UserAccount     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserAccount {
    pub id: i64,
    pub login: String,
    pub created_at: DateTime<Utc>,
}

/// Registration and password hashing happen elsewhere; storage only keeps the resulting hash.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn new<S: Into<String>>(login: S, password_hash: S) -> Self {
        Self { login: login.into(), password_hash: password_hash.into() }
    }
}
