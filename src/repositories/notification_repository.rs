use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{NotificationRepository, RepoResult};
use crate::models::{Device, NewNotification, Notification};

const DEVICE_COLUMNS: &str = "id, customer_id, fcm_token, platform, created, modified";
const NOTIFICATION_COLUMNS: &str = "id, customer_id, title, body, data, read_at, created";

#[derive(Debug, Clone)]
pub struct PgNotificationRepository {
    db: PgPool,
}

impl PgNotificationRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn upsert_device(
        &self,
        customer_id: Uuid,
        fcm_token: &str,
        platform: &str,
    ) -> RepoResult<Device> {
        let now = Utc::now();
        sqlx::query_as::<_, Device>(&format!(
            "INSERT INTO devices (id, customer_id, fcm_token, platform, created, modified)
             VALUES ($1, $2, $3, $4, $5, $5)
             ON CONFLICT (fcm_token) DO UPDATE
             SET customer_id = EXCLUDED.customer_id,
                 platform = EXCLUDED.platform,
                 modified = EXCLUDED.modified,
                 deleted = NULL
             RETURNING {DEVICE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(customer_id)
        .bind(fcm_token)
        .bind(platform)
        .bind(now)
        .fetch_one(&self.db)
        .await
    }

    async fn delete_device(&self, customer_id: Uuid, fcm_token: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM devices WHERE customer_id = $1 AND fcm_token = $2")
            .bind(customer_id)
            .bind(fcm_token)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_device_by_token(&self, fcm_token: &str) -> RepoResult<()> {
        sqlx::query("DELETE FROM devices WHERE fcm_token = $1")
            .bind(fcm_token)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn list_devices(&self, customer_id: Uuid) -> RepoResult<Vec<Device>> {
        sqlx::query_as::<_, Device>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices
             WHERE customer_id = $1 AND deleted IS NULL
             ORDER BY modified DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.db)
        .await
    }

    async fn create_notification(&self, notification: NewNotification) -> RepoResult<Notification> {
        let now = Utc::now();
        sqlx::query_as::<_, Notification>(&format!(
            "INSERT INTO notifications (id, customer_id, title, body, data, created, modified)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(notification.customer_id)
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(Json(&notification.data))
        .bind(now)
        .fetch_one(&self.db)
        .await
    }

    async fn list_notifications(
        &self,
        customer_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE customer_id = $1 AND deleted IS NULL AND (NOT $2 OR read_at IS NULL)
             ORDER BY created DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(customer_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
    }

    async fn mark_read(&self, customer_id: Uuid, id: Uuid) -> RepoResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>(&format!(
            "UPDATE notifications
             SET read_at = COALESCE(read_at, NOW()), modified = NOW()
             WHERE id = $1 AND customer_id = $2 AND deleted IS NULL
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(id)
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await
    }
}
