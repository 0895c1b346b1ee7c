//! HTTP access to the sensor hub: one snapshot read and two caregiver writes.
//!
//! Every call is a single attempt with the transport's default timeout. There is
//! no retry and no de-duplication; two concurrent dispatches reach the server
//! twice.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::protocol::{ActionRequest, CustomMessageRequest, DispatchResponse, SensorSnapshot};
use tracing::debug;
use url::Url;

use crate::{config::ClientConfig, error::GatewayError};

pub const DATA_ROUTE: &str = "data";
pub const ACTION_ROUTE: &str = "action";
pub const CUSTOM_MESSAGE_ROUTE: &str = "custom-message";

/// Server verdict on a well-formed dispatch exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Accepted,
    Rejected,
}

impl DispatchOutcome {
    fn from_flag(success: bool) -> Self {
        if success {
            DispatchOutcome::Accepted
        } else {
            DispatchOutcome::Rejected
        }
    }
}

#[async_trait]
pub trait RemoteDataGateway: Send + Sync {
    async fn fetch_sensor_snapshot(&self) -> Result<SensorSnapshot, GatewayError>;
    async fn dispatch_action(&self, action: &str) -> Result<DispatchOutcome, GatewayError>;
    async fn dispatch_custom_message(&self, text: &str)
        -> Result<DispatchOutcome, GatewayError>;
}

pub struct HttpGateway {
    http: Client,
    config: Arc<ClientConfig>,
}

impl HttpGateway {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(http: Client, config: Arc<ClientConfig>) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, route: &str) -> Result<Url, GatewayError> {
        self.config
            .endpoint(route)
            .map_err(|source| GatewayError::InvalidUrl {
                route: route.to_string(),
                source,
            })
    }

    async fn post_dispatch<B: serde::Serialize + Sync>(
        &self,
        route: &str,
        body: &B,
    ) -> Result<DispatchOutcome, GatewayError> {
        let url = self.endpoint(route)?;
        let res = self
            .http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|source| transport_error(&url, source))?;

        // The hub reports validation failures as 4xx with a `{success: false}`
        // body; that is a rejection, not a transport fault.
        let status = res.status();
        if !(status.is_success() || status.is_client_error()) {
            return Err(GatewayError::Status {
                endpoint: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body: DispatchResponse = decode_json(&url, res).await?;
        debug!(endpoint = %url, success = body.success, "dispatch answered");
        Ok(DispatchOutcome::from_flag(body.success))
    }
}

#[async_trait]
impl RemoteDataGateway for HttpGateway {
    async fn fetch_sensor_snapshot(&self) -> Result<SensorSnapshot, GatewayError> {
        let url = self.endpoint(DATA_ROUTE)?;
        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| transport_error(&url, source))?;

        let status = res.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                endpoint: url.to_string(),
                status: status.as_u16(),
            });
        }

        decode_json(&url, res).await
    }

    async fn dispatch_action(&self, action: &str) -> Result<DispatchOutcome, GatewayError> {
        self.post_dispatch(
            ACTION_ROUTE,
            &ActionRequest {
                action: action.to_string(),
            },
        )
        .await
    }

    async fn dispatch_custom_message(
        &self,
        text: &str,
    ) -> Result<DispatchOutcome, GatewayError> {
        self.post_dispatch(
            CUSTOM_MESSAGE_ROUTE,
            &CustomMessageRequest {
                message: text.to_string(),
            },
        )
        .await
    }
}

pub(crate) fn transport_error(url: &Url, source: reqwest::Error) -> GatewayError {
    GatewayError::Transport {
        endpoint: url.to_string(),
        source,
    }
}

pub(crate) async fn decode_json<T: DeserializeOwned>(
    url: &Url,
    res: Response,
) -> Result<T, GatewayError> {
    let bytes = res
        .bytes()
        .await
        .map_err(|source| transport_error(url, source))?;
    serde_json::from_slice(&bytes).map_err(|err| GatewayError::Decode {
        endpoint: url.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
