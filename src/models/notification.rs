use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use std::collections::HashMap;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A customer's FCM registration
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Device {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub fcm_token: String,
    pub platform: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DevicePlatform {
    Android,
    Ios,
    Web,
}

impl DevicePlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            DevicePlatform::Android => "android",
            DevicePlatform::Ios => "ios",
            DevicePlatform::Web => "web",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterDeviceRequest {
    #[validate(length(min = 1, max = 4096))]
    pub fcm_token: String,
    pub platform: DevicePlatform,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub read_at: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub customer_id: Uuid,
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
}

/// FCM caps a message at 4 KB; the rest is left for keys added on dispatch.
pub const MAX_PUSH_PAYLOAD_BYTES: usize = 4000;

const RESERVED_DATA_KEYS: [&str; 3] = ["from", "message_type", "notification"];

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_push_payload_size"))]
pub struct SendNotificationRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub body: String,
    /// FCM only carries string values in the data payload
    #[serde(default)]
    #[validate(custom(function = "validate_push_data_keys"))]
    pub data: HashMap<String, String>,
}

fn validate_push_data_keys(data: &HashMap<String, String>) -> Result<(), ValidationError> {
    let reserved = data.keys().any(|key| {
        RESERVED_DATA_KEYS.contains(&key.as_str())
            || key.starts_with("google")
            || key.starts_with("gcm")
    });
    if reserved {
        return Err(ValidationError::new("reserved_data_key"));
    }
    Ok(())
}

fn validate_push_payload_size(request: &SendNotificationRequest) -> Result<(), ValidationError> {
    let size = request.title.len()
        + request.body.len()
        + request
            .data
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum::<usize>();
    if size > MAX_PUSH_PAYLOAD_BYTES {
        return Err(ValidationError::new("payload_too_large"));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Outcome of fanning a notification out to the customer's devices
#[derive(Debug, Serialize)]
pub struct NotificationDispatch {
    pub notification: Notification,
    pub delivered: usize,
    pub failed: usize,
    pub pruned: usize,
}
