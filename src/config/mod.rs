// Configuration loaded from environment variables

pub mod app;
pub mod database;

pub use app::{AppConfig, FirebaseConfig, KafkaConfig, RateLimitSettings, DEFAULT_INVITE_TOPIC};
pub use database::{run_migrations, DatabaseConfig};
