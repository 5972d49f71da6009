//! Firebase Cloud Messaging (HTTP v1) client.
//!
//! Authenticates with a service-account key: a short-lived RS256 assertion is
//! exchanged for an OAuth2 access token, which is cached and reused until
//! shortly before it expires.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{PushMessage, PushOutcome, PushSupplier, SupplierError};
use crate::config::FirebaseConfig;

const FCM_BASE_URL: &str = "https://fcm.googleapis.com";
const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Refresh the access token this long before Google expires it
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The fields of a Google service-account JSON file we need
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: Option<String>,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, SupplierError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SupplierError::Credentials(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| SupplierError::Credentials(format!("malformed service account: {e}")))
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

pub struct FcmPushSupplier {
    project_id: String,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    base_url: String,
    http_client: Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl FcmPushSupplier {
    pub fn new(project_id: impl Into<String>, key: ServiceAccountKey) -> Result<Self, SupplierError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| SupplierError::Credentials(format!("invalid private key: {e}")))?;

        Ok(Self {
            project_id: project_id.into(),
            key,
            encoding_key,
            base_url: FCM_BASE_URL.to_string(),
            http_client: Client::new(),
            cached_token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn from_config(config: &FirebaseConfig) -> Result<Self, SupplierError> {
        let key = ServiceAccountKey::from_file(&config.credentials_path)?;
        if let Some(key_project) = key.project_id.as_deref() {
            if key_project != config.project_id {
                warn!(
                    configured = %config.project_id,
                    key_project,
                    "service account belongs to a different Firebase project"
                );
            }
        }
        Self::new(config.project_id.clone(), key)
    }

    /// Point the client at another FCM host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn access_token(&self) -> Result<String, SupplierError> {
        {
            let cache = self.cached_token.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Utc::now() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let mut cache = self.cached_token.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(cached) = cache.as_ref() {
            if cached.expires_at > Utc::now() {
                return Ok(cached.access_token.clone());
            }
        }

        let fresh = self.fetch_access_token().await?;
        let access_token = fresh.access_token.clone();
        *cache = Some(fresh);
        Ok(access_token)
    }

    async fn fetch_access_token(&self) -> Result<CachedToken, SupplierError> {
        info!("requesting FCM access token");

        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: FCM_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)?;

        let response = self
            .http_client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupplierError::Credentials(format!(
                "token exchange returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = (token.expires_in - EXPIRY_MARGIN_SECS).max(0);

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(lifetime),
        })
    }

    async fn invalidate_token(&self) {
        *self.cached_token.write().await = None;
    }
}

/// FCM reports stale registrations with an `UNREGISTERED` error code and
/// malformed ones as a field violation on `message.token`. Every other
/// `INVALID_ARGUMENT` concerns the payload and says nothing about the device.
fn is_invalid_token(status: StatusCode, body: &Value) -> bool {
    if status != StatusCode::NOT_FOUND && status != StatusCode::BAD_REQUEST {
        return false;
    }

    let Some(details) = body["error"]["details"].as_array() else {
        return false;
    };

    details.iter().any(|detail| {
        detail["errorCode"].as_str() == Some("UNREGISTERED")
            || detail["fieldViolations"]
                .as_array()
                .map(|violations| {
                    violations
                        .iter()
                        .any(|v| v["field"].as_str() == Some("message.token"))
                })
                .unwrap_or(false)
    })
}

#[async_trait]
impl PushSupplier for FcmPushSupplier {
    async fn send(&self, message: &PushMessage) -> Result<PushOutcome, SupplierError> {
        let access_token = self.access_token().await?;
        let url = format!(
            "{}/v1/projects/{}/messages:send",
            self.base_url, self.project_id
        );
        let payload = json!({
            "message": {
                "token": message.token,
                "notification": {
                    "title": message.title,
                    "body": message.body,
                },
                "data": message.data,
            }
        });

        let response = self
            .http_client
            .post(url)
            .bearer_auth(access_token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!("push delivered");
            return Ok(PushOutcome::Delivered);
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        if is_invalid_token(status, &body) {
            debug!(%status, "device token rejected by FCM");
            return Ok(PushOutcome::InvalidToken);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
        }

        Err(SupplierError::Rejected(format!("FCM returned {status}: {body}")))
    }
}
