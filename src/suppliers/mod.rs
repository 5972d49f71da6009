//! Outbound integrations.
//!
//! Push delivery goes through Firebase Cloud Messaging and domain events
//! through a Kafka REST proxy. Both sit behind traits so services can be
//! tested with mocks and run with the logging fallbacks when the upstream is
//! not configured.

pub mod firebase;
pub mod kafka;

pub use firebase::{FcmPushSupplier, ServiceAccountKey};
pub use kafka::KafkaRestPublisher;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupplierError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Upstream rejected the request: {0}")]
    Rejected(String),
    #[error("Invalid credentials: {0}")]
    Credentials(String),
    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A single push addressed to one device token
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered,
    /// The token is no longer registered; the device should be forgotten
    InvalidToken,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushSupplier: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<PushOutcome, SupplierError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), SupplierError>;
}

/// Used when Firebase is not configured
#[derive(Debug, Clone, Default)]
pub struct LogPushSupplier;

#[async_trait]
impl PushSupplier for LogPushSupplier {
    async fn send(&self, message: &PushMessage) -> Result<PushOutcome, SupplierError> {
        tracing::info!(
            title = %message.title,
            data_keys = message.data.len(),
            "push delivery disabled, notification not sent"
        );
        Ok(PushOutcome::Delivered)
    }
}

/// Used when no Kafka REST proxy is configured
#[derive(Debug, Clone, Default)]
pub struct LogEventPublisher;

#[async_trait]
impl EventPublisher for LogEventPublisher {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        _value: serde_json::Value,
    ) -> Result<(), SupplierError> {
        tracing::info!(topic, key, "event publishing disabled, event dropped");
        Ok(())
    }
}
