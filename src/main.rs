use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use coach_hub::api::routes::{create_routes, AppState, Repositories};
use coach_hub::config::{run_migrations, AppConfig, DatabaseConfig};
use coach_hub::suppliers::{
    EventPublisher, FcmPushSupplier, KafkaRestPublisher, LogEventPublisher, LogPushSupplier,
    PushSupplier,
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn push_supplier(config: &AppConfig) -> anyhow::Result<Arc<dyn PushSupplier>> {
    match &config.firebase {
        Some(firebase) => {
            let supplier = FcmPushSupplier::from_config(firebase)
                .context("failed to load Firebase service account")?;
            info!(project_id = %firebase.project_id, "push notifications via FCM");
            Ok(Arc::new(supplier))
        }
        None => {
            warn!("FIREBASE_PROJECT_ID not set, push notifications are only logged");
            Ok(Arc::new(LogPushSupplier))
        }
    }
}

fn event_publisher(config: &AppConfig) -> Arc<dyn EventPublisher> {
    match &config.kafka {
        Some(kafka) => {
            info!(proxy = %kafka.rest_proxy_url, topic = %kafka.invite_topic, "invite events via Kafka REST proxy");
            Arc::new(KafkaRestPublisher::from_config(kafka))
        }
        None => {
            warn!("KAFKA_REST_PROXY_URL not set, invite events are only logged");
            Arc::new(LogEventPublisher)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let db_config = DatabaseConfig::from_env()?;
    let pool = db_config
        .create_pool()
        .await
        .context("failed to connect to the database")?;
    run_migrations(&pool).await.context("failed to run migrations")?;

    let state = AppState::new(
        Repositories::postgres(pool),
        &config,
        push_supplier(&config)?,
        event_publisher(&config),
    );
    let app = create_routes(state);

    let address = config.server_address();
    let listener = TcpListener::bind(&address).await?;
    info!(environment = %config.environment, "Coach Hub server starting on http://{}", address);
    info!("Health check available at http://{}/health", address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
