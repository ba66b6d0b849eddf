//! Order service integration
//!
//! The external service interprets free-text orders and records the
//! customer's confirmation. This module owns the HTTP client, the wire
//! types and the adapter that normalizes interpret responses.

mod adapter;
mod client;
mod error;
mod types;

pub use client::HttpOrderService;
#[allow(unused_imports)] // ServiceErrorKind is matched on in tests
pub use error::{ServiceError, ServiceErrorKind};
pub use types::InterpretRequest;

use crate::runtime::{OrderConfirmer, OrderInterpreter};
use crate::state_machine::{ConfirmDecision, Interpretation};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;

const DEFAULT_INTERPRET_PATH: &str = "/webhook/interpret-order";
const DEFAULT_CONFIRM_PATH: &str = "/webhook/confirm-order";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Where the order service lives and how long to wait for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub interpret_path: String,
    pub confirm_path: String,
    pub timeout: Duration,
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            interpret_path: DEFAULT_INTERPRET_PATH.to_string(),
            confirm_path: DEFAULT_CONFIRM_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("ORDER_SERVICE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("ORDER_SERVICE_URL"))?;

        let mut config = Self::new(base_url.trim());
        if let Some(path) = lookup("ORDER_INTERPRET_PATH") {
            config.interpret_path = path;
        }
        if let Some(path) = lookup("ORDER_CONFIRM_PATH") {
            config.confirm_path = path;
        }
        if let Some(secs) = lookup("ORDER_SERVICE_TIMEOUT_SECS") {
            let parsed = secs
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(ConfigError::Invalid {
                    name: "ORDER_SERVICE_TIMEOUT_SECS",
                    value: secs.clone(),
                })?;
            config.timeout = Duration::from_secs(parsed);
        }
        Ok(config)
    }

    pub fn interpret_url(&self) -> String {
        join_url(&self.base_url, &self.interpret_path)
    }

    pub fn confirm_url(&self) -> String {
        join_url(&self.base_url, &self.confirm_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Logging wrapper for order service clients
pub struct LoggingService<T> {
    inner: T,
}

impl<T> LoggingService<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: OrderInterpreter> OrderInterpreter for LoggingService<T> {
    async fn interpret(&self, request: &InterpretRequest) -> Result<Interpretation, ServiceError> {
        let start = Instant::now();
        let result = self.inner.interpret(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(Interpretation::Accepted(order)) => {
                tracing::info!(
                    duration_ms = %duration.as_millis(),
                    lines = order.line_items.len(),
                    total = order.total,
                    order_id = ?order.external_order_id,
                    "Order interpreted"
                );
            }
            Ok(Interpretation::Rejected { reason }) => {
                tracing::info!(
                    duration_ms = %duration.as_millis(),
                    reason = %reason,
                    "Order rejected by interpreter"
                );
            }
            Err(e) => {
                tracing::error!(
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Interpret request failed"
                );
            }
        }

        result
    }
}

#[async_trait]
impl<T: OrderConfirmer> OrderConfirmer for LoggingService<T> {
    async fn confirm(&self, order_id: &str, decision: ConfirmDecision) -> Result<(), ServiceError> {
        let start = Instant::now();
        let result = self.inner.confirm(order_id, decision).await;
        let duration = start.elapsed();

        match &result {
            Ok(()) => tracing::info!(
                duration_ms = %duration.as_millis(),
                order_id,
                decision = decision.as_str(),
                "Confirmation acknowledged"
            ),
            Err(e) => tracing::warn!(
                duration_ms = %duration.as_millis(),
                order_id,
                decision = decision.as_str(),
                kind = e.kind.as_str(),
                error = %e.message,
                "Confirm request failed"
            ),
        }

        result
    }
}
