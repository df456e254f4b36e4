//! # Accrual Source Client
//!
//! The accrual authority is an external HTTP service that decides how much loyalty currency an order earns. This
//! module wraps it behind the [`AccrualSource`] trait so that the reconciliation worker can be driven by either the
//! real [`AccrualClient`] or a scripted fake in tests.
//!
//! A lookup never fails in the `Result` sense. Every response the authority can give, including transport problems, is
//! one of the [`AccrualOutcome`] variants, and the caller is forced to handle all of them.
use std::{future::Future, time::Duration};

use accrual_common::Subunits;
use thiserror::Error;

use crate::db_types::{OrderNumber, OrderStatusType};

mod client;
mod data_objects;

pub use client::{AccrualClient, AccrualClientConfig, DEFAULT_RETRY_AFTER};
pub use data_objects::{AccrualResponse, RemoteStatus};

pub trait AccrualSource: Clone + Send + Sync {
    /// Asks the authority about a single order. Exactly one external request is issued per call.
    fn lookup(&self, number: &OrderNumber) -> impl Future<Output = AccrualOutcome> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualOutcome {
    /// The authority knows the order. `accrual` is only ever present when `status` is `Settled`.
    Found { status: OrderStatusType, accrual: Option<Subunits> },
    /// The authority has no record of the order yet.
    Unknown,
    /// The authority asked us to back off for `retry_after` before sending any further request.
    RateLimited { retry_after: Duration },
    TransportFailure(AccrualClientError),
}

impl AccrualOutcome {
    pub fn found(status: OrderStatusType, accrual: Option<Subunits>) -> Self {
        Self::Found { status, accrual }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccrualClientError {
    #[error("Could not initialize the accrual client. {0}")]
    Initialization(String),
    #[error("Request to the accrual authority failed. {0}")]
    RequestFailed(String),
    #[error("The accrual authority responded with an unexpected HTTP status: {0}")]
    UnexpectedStatus(u16),
    #[error("Could not decode the accrual authority response. {0}")]
    InvalidResponse(String),
    #[error("The accrual authority reported an unknown order status: {0}")]
    UnknownStatus(String),
    #[error("The accrual authority reported an invalid accrual amount: {0}")]
    InvalidAccrual(String),
}
