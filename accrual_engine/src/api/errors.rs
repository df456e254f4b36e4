use thiserror::Error;

use crate::traits::{LedgerError, OrderStoreError};

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("{0} is not a valid order number")]
    InvalidOrderNumber(String),
    #[error("Order store error: {0}")]
    StoreError(#[from] OrderStoreError),
}

#[derive(Debug, Clone, Error)]
pub enum LedgerApiError {
    #[error("{0} is not a valid order number")]
    InvalidOrderNumber(String),
    #[error("Ledger error: {0}")]
    LedgerError(#[from] LedgerError),
}
