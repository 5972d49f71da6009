use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_INVITE_TOPIC: &str = "customer-invites";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: String,
    pub jwt_secret: String,
    pub login_rate_limit: RateLimitSettings,
    pub firebase: Option<FirebaseConfig>,
    pub kafka: Option<KafkaConfig>,
}

/// Firebase Cloud Messaging settings. Push delivery is disabled when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    pub project_id: String,
    /// Path to the service-account JSON downloaded from the Firebase console
    pub credentials_path: PathBuf,
}

/// Kafka REST proxy settings. Invite events are only logged when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaConfig {
    pub rest_proxy_url: String,
    pub invite_topic: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub max_requests: usize,
    pub window: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid port number")?;
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string());

        let defaults = RateLimitSettings::default();
        let login_rate_limit = RateLimitSettings {
            max_requests: env::var("LOGIN_RATE_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_requests),
            window: env::var("LOGIN_RATE_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.window),
        };

        let config = AppConfig {
            host,
            port,
            environment,
            log_level,
            jwt_secret,
            login_rate_limit,
            firebase: FirebaseConfig::from_env(),
            kafka: KafkaConfig::from_env(),
        };

        if config.is_production() && config.jwt_secret.starts_with("your-secret-key") {
            anyhow::bail!("JWT_SECRET must be set in production");
        }

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FirebaseConfig {
    fn from_env() -> Option<Self> {
        let project_id = env::var("FIREBASE_PROJECT_ID").ok()?;
        let credentials_path = env::var("FIREBASE_CREDENTIALS").ok()?;
        Some(Self {
            project_id,
            credentials_path: PathBuf::from(credentials_path),
        })
    }
}

impl KafkaConfig {
    fn from_env() -> Option<Self> {
        let rest_proxy_url = env::var("KAFKA_REST_PROXY_URL").ok()?;
        Some(Self {
            rest_proxy_url: rest_proxy_url.trim_end_matches('/').to_string(),
            invite_topic: env::var("KAFKA_INVITE_TOPIC")
                .unwrap_or_else(|_| DEFAULT_INVITE_TOPIC.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "HOST",
        "PORT",
        "ENVIRONMENT",
        "JWT_SECRET",
        "LOGIN_RATE_LIMIT",
        "LOGIN_RATE_WINDOW_SECS",
        "FIREBASE_PROJECT_ID",
        "FIREBASE_CREDENTIALS",
        "KAFKA_REST_PROXY_URL",
        "KAFKA_INVITE_TOPIC",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = AppConfig::from_env().unwrap();

        assert_eq!(config.server_address(), "0.0.0.0:3000");
        assert!(config.is_development());
        assert_eq!(config.login_rate_limit, RateLimitSettings::default());
        assert!(config.firebase.is_none());
        assert!(config.kafka.is_none());
    }

    #[test]
    #[serial]
    fn test_suppliers_from_env() {
        clear_env();
        env::set_var("FIREBASE_PROJECT_ID", "coach-hub-dev");
        env::set_var("FIREBASE_CREDENTIALS", "/etc/coach-hub/firebase.json");
        env::set_var("KAFKA_REST_PROXY_URL", "http://kafka-rest:8082/");

        let config = AppConfig::from_env().unwrap();
        clear_env();

        let firebase = config.firebase.unwrap();
        assert_eq!(firebase.project_id, "coach-hub-dev");
        assert_eq!(firebase.credentials_path, PathBuf::from("/etc/coach-hub/firebase.json"));

        let kafka = config.kafka.unwrap();
        assert_eq!(kafka.rest_proxy_url, "http://kafka-rest:8082");
        assert_eq!(kafka.invite_topic, "customer-invites");
    }

    #[test]
    #[serial]
    fn test_production_requires_secret() {
        clear_env();
        env::set_var("ENVIRONMENT", "production");
        assert!(AppConfig::from_env().is_err());

        env::set_var("JWT_SECRET", "a-real-secret");
        let config = AppConfig::from_env();
        clear_env();
        assert!(config.unwrap().is_production());
    }

    #[test]
    #[serial]
    fn test_invalid_port() {
        clear_env();
        env::set_var("PORT", "not-a-port");
        let result = AppConfig::from_env();
        clear_env();
        assert!(result.is_err());
    }
}
