use std::sync::Arc;

use futures::future::join_all;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    Device, NewNotification, Notification, NotificationDispatch, NotificationQuery,
    PaginationQuery, RegisterDeviceRequest, SendNotificationRequest,
};
use crate::repositories::{CustomerRepository, NotificationRepository};
use crate::suppliers::{PushMessage, PushOutcome, PushSupplier};

/// Device registry, notification history and push fan-out
#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
    customers: Arc<dyn CustomerRepository>,
    push: Arc<dyn PushSupplier>,
}

impl NotificationService {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        customers: Arc<dyn CustomerRepository>,
        push: Arc<dyn PushSupplier>,
    ) -> Self {
        Self {
            notifications,
            customers,
            push,
        }
    }

    pub async fn register_device(
        &self,
        customer_id: Uuid,
        request: RegisterDeviceRequest,
    ) -> AppResult<Device> {
        request.validate()?;

        let device = self
            .notifications
            .upsert_device(customer_id, request.fcm_token.trim(), request.platform.as_str())
            .await?;

        tracing::debug!(%customer_id, platform = %device.platform, "device registered");
        Ok(device)
    }

    pub async fn unregister_device(&self, customer_id: Uuid, fcm_token: &str) -> AppResult<()> {
        if !self.notifications.delete_device(customer_id, fcm_token).await? {
            return Err(AppError::NotFound("Device"));
        }
        Ok(())
    }

    /// A coach messaging one of their customers
    pub async fn send_to_customer(
        &self,
        coach_id: Uuid,
        customer_id: Uuid,
        request: SendNotificationRequest,
    ) -> AppResult<NotificationDispatch> {
        request.validate()?;

        self.customers
            .find_for_coach(coach_id, customer_id)
            .await?
            .ok_or(AppError::NotFound("Customer"))?;

        self.notify(NewNotification {
            customer_id,
            title: request.title,
            body: request.body,
            data: request.data,
        })
        .await
    }

    /// Persist the notification, then push it to every registered device.
    ///
    /// Delivery problems never fail the call: tokens FCM no longer knows are
    /// pruned and other failures are only counted.
    pub async fn notify(&self, notification: NewNotification) -> AppResult<NotificationDispatch> {
        let customer_id = notification.customer_id;
        let mut data = notification.data.clone();
        let stored = self.notifications.create_notification(notification).await?;
        data.insert("notification_id".to_string(), stored.id.to_string());

        let devices = self.notifications.list_devices(customer_id).await?;
        let sends = devices.into_iter().map(|device| {
            let message = PushMessage {
                token: device.fcm_token,
                title: stored.title.clone(),
                body: stored.body.clone(),
                data: data.clone(),
            };
            let push = Arc::clone(&self.push);
            async move {
                let outcome = push.send(&message).await;
                (message.token, outcome)
            }
        });

        let mut delivered = 0;
        let mut failed = 0;
        let mut pruned = 0;

        for (token, outcome) in join_all(sends).await {
            match outcome {
                Ok(PushOutcome::Delivered) => delivered += 1,
                Ok(PushOutcome::InvalidToken) => {
                    match self.notifications.delete_device_by_token(&token).await {
                        Ok(()) => pruned += 1,
                        Err(err) => {
                            tracing::warn!(%customer_id, error = %err, "failed to prune device")
                        }
                    }
                }
                Err(err) => {
                    failed += 1;
                    tracing::warn!(%customer_id, error = %err, "push delivery failed");
                }
            }
        }

        tracing::info!(
            %customer_id,
            notification_id = %stored.id,
            delivered,
            failed,
            pruned,
            "notification dispatched"
        );

        Ok(NotificationDispatch {
            notification: stored,
            delivered,
            failed,
            pruned,
        })
    }

    pub async fn list(&self, customer_id: Uuid, query: NotificationQuery) -> AppResult<Vec<Notification>> {
        let page = PaginationQuery {
            limit: query.limit,
            offset: query.offset,
        };

        Ok(self
            .notifications
            .list_notifications(customer_id, query.unread_only, page.get_limit(), page.get_offset())
            .await?)
    }

    pub async fn mark_read(&self, customer_id: Uuid, notification_id: Uuid) -> AppResult<Notification> {
        self.notifications
            .mark_read(customer_id, notification_id)
            .await?
            .ok_or(AppError::NotFound("Notification"))
    }
}
