//! HTTP client for the order service

use super::adapter::normalize_interpretation;
use super::types::{ConfirmBody, InterpretBody, InterpretRequest};
use super::{ServiceConfig, ServiceError};
use crate::runtime::{OrderConfirmer, OrderInterpreter};
use crate::state_machine::{ConfirmDecision, Interpretation};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;

/// Talks to the interpret and confirm endpoints. One request per call, no
/// retries.
#[derive(Debug, Clone)]
pub struct HttpOrderService {
    client: Client,
    interpret_url: String,
    confirm_url: String,
}

impl HttpOrderService {
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            interpret_url: config.interpret_url(),
            confirm_url: config.confirm_url(),
        })
    }

    async fn ensure_success(response: Response) -> Result<Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ServiceError::status(status.as_u16(), &body))
    }
}

#[async_trait]
impl OrderInterpreter for HttpOrderService {
    async fn interpret(&self, request: &InterpretRequest) -> Result<Interpretation, ServiceError> {
        let response = self
            .client
            .post(&self.interpret_url)
            .json(&InterpretBody::from_request(request))
            .send()
            .await?;

        let value: Value = Self::ensure_success(response).await?.json().await?;
        Ok(normalize_interpretation(&value, &request.catalog))
    }
}

#[async_trait]
impl OrderConfirmer for HttpOrderService {
    async fn confirm(&self, order_id: &str, decision: ConfirmDecision) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(&self.confirm_url)
            .json(&ConfirmBody::new(order_id, decision))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}
