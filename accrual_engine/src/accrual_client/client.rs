use std::time::Duration;

use log::*;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};

use crate::{
    accrual_client::{AccrualClientError, AccrualOutcome, AccrualResponse, AccrualSource},
    db_types::OrderNumber,
};

/// The back-off applied when the authority rate-limits us without a usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct AccrualClientConfig {
    /// Base URL of the accrual authority, e.g. `http://localhost:8080`.
    pub base_url: String,
    pub default_retry_after: Duration,
    /// There is no timeout on a lookup unless one is set here.
    pub request_timeout: Option<Duration>,
}

impl AccrualClientConfig {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self { base_url: base_url.into(), default_retry_after: DEFAULT_RETRY_AFTER, request_timeout: None }
    }
}

/// [`AccrualSource`] backed by the accrual authority's HTTP API.
#[derive(Debug, Clone)]
pub struct AccrualClient {
    config: AccrualClientConfig,
    client: Client,
}

impl AccrualClient {
    pub fn new(config: AccrualClientConfig) -> Result<Self, AccrualClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| AccrualClientError::Initialization(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn url(&self, number: &OrderNumber) -> String {
        format!("{}/api/orders/{}", self.config.base_url.trim_end_matches('/'), number.as_str())
    }

    pub fn config(&self) -> &AccrualClientConfig {
        &self.config
    }

    async fn fetch(&self, number: &OrderNumber) -> Result<AccrualOutcome, AccrualClientError> {
        let url = self.url(number);
        trace!("🌐️ GET {url}");
        let response =
            self.client.get(url).send().await.map_err(|e| AccrualClientError::RequestFailed(e.to_string()))?;
        match response.status() {
            StatusCode::OK => {
                let body = response
                    .json::<AccrualResponse>()
                    .await
                    .map_err(|e| AccrualClientError::InvalidResponse(e.to_string()))?;
                trace!("🌐️ Accrual response for {number}: {body:?}");
                AccrualOutcome::try_from(body)
            },
            StatusCode::NO_CONTENT => Ok(AccrualOutcome::Unknown),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(self.config.default_retry_after);
                Ok(AccrualOutcome::RateLimited { retry_after })
            },
            status => Err(AccrualClientError::UnexpectedStatus(status.as_u16())),
        }
    }
}

impl AccrualSource for AccrualClient {
    async fn lookup(&self, number: &OrderNumber) -> AccrualOutcome {
        match self.fetch(number).await {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!("🌐️ Accrual lookup for {number} failed. {e}");
                AccrualOutcome::TransportFailure(e)
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builds_lookup_urls() {
        let client = AccrualClient::new(AccrualClientConfig::new("http://localhost:8080/")).unwrap();
        assert_eq!(client.url(&"12345678903".into()), "http://localhost:8080/api/orders/12345678903");
        assert_eq!(client.config().default_retry_after, DEFAULT_RETRY_AFTER);
        assert!(client.config().request_timeout.is_none());
    }
}
