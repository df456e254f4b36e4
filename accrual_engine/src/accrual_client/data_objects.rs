use std::str::FromStr;

use accrual_common::Subunits;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    accrual_client::{AccrualClientError, AccrualOutcome},
    db_types::OrderStatusType,
};

/// The order statuses used by the accrual authority. These are not the same as the local statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RemoteStatus {
    Registered,
    Processing,
    Invalid,
    Processed,
}

impl From<RemoteStatus> for OrderStatusType {
    fn from(status: RemoteStatus) -> Self {
        match status {
            RemoteStatus::Registered => OrderStatusType::Registered,
            RemoteStatus::Processing => OrderStatusType::Processing,
            RemoteStatus::Invalid => OrderStatusType::Rejected,
            RemoteStatus::Processed => OrderStatusType::Settled,
        }
    }
}

impl FromStr for RemoteStatus {
    type Err = AccrualClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REGISTERED" => Ok(Self::Registered),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            s => Err(AccrualClientError::UnknownStatus(s.to_string())),
        }
    }
}

/// The body of a `200 OK` response from `GET /api/orders/{number}`.
///
/// `status` is kept as a raw string so that an unrecognised status is reported as such, rather than as a generic JSON
/// error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccrualResponse {
    pub order: String,
    pub status: String,
    #[serde(default)]
    pub accrual: Option<Decimal>,
}

impl TryFrom<AccrualResponse> for AccrualOutcome {
    type Error = AccrualClientError;

    fn try_from(response: AccrualResponse) -> Result<Self, Self::Error> {
        let status = response.status.parse::<RemoteStatus>()?;
        let accrual = match (status, response.accrual) {
            (RemoteStatus::Processed, Some(amount)) if amount < Decimal::ZERO => {
                return Err(AccrualClientError::InvalidAccrual(amount.to_string()));
            },
            (RemoteStatus::Processed, Some(amount)) => Some(
                Subunits::from_decimal(amount).map_err(|e| AccrualClientError::InvalidAccrual(e.to_string()))?,
            ),
            _ => None,
        };
        Ok(AccrualOutcome::found(status.into(), accrual))
    }
}
