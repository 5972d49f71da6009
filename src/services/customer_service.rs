use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::auth::password::{generate_invite_token, token_digest};
use crate::auth::AuthError;
use crate::error::{AppError, AppResult};
use crate::models::{
    Coach, CreateCustomerRequest, Customer, CustomerInviteEvent, CustomerResponse, NewCustomer,
    PaginationQuery, UpdateCustomerRequest,
};
use crate::repositories::{CoachRepository, CustomerRepository};
use crate::suppliers::{EventPublisher, SupplierError};

pub const INVITE_VALIDITY_DAYS: i64 = 7;

#[derive(Clone)]
pub struct CustomerService {
    customers: Arc<dyn CustomerRepository>,
    coaches: Arc<dyn CoachRepository>,
    events: Arc<dyn EventPublisher>,
    invite_topic: String,
}

impl CustomerService {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        coaches: Arc<dyn CoachRepository>,
        events: Arc<dyn EventPublisher>,
        invite_topic: impl Into<String>,
    ) -> Self {
        Self {
            customers,
            coaches,
            events,
            invite_topic: invite_topic.into(),
        }
    }

    pub async fn list(
        &self,
        coach_id: Uuid,
        pagination: PaginationQuery,
    ) -> AppResult<Vec<CustomerResponse>> {
        let customers = self
            .customers
            .list_for_coach(coach_id, pagination.get_limit(), pagination.get_offset())
            .await?;

        Ok(customers.into_iter().map(CustomerResponse::from).collect())
    }

    /// Create the customer and send them an invite.
    ///
    /// The invite is best effort here: a failed publish is logged and the coach
    /// can re-send it later.
    pub async fn create(
        &self,
        coach_id: Uuid,
        request: CreateCustomerRequest,
    ) -> AppResult<CustomerResponse> {
        request.validate()?;
        self.ensure_email_available(&request.email, None).await?;

        let coach = self.find_coach(coach_id).await?;
        let invite_token = generate_invite_token();
        let invite_expires_at = Utc::now() + Duration::days(INVITE_VALIDITY_DAYS);

        let customer = self
            .customers
            .create(NewCustomer {
                coach_id,
                email: request.email.trim().to_string(),
                first_name: request.first_name,
                last_name: request.last_name,
                phone: request.phone,
                birthday: request.birthday,
                invite_token_hash: token_digest(&invite_token),
                invite_expires_at,
            })
            .await?;

        tracing::info!(%coach_id, customer_id = %customer.id, "customer created");

        if let Err(err) = self.publish_invite(&coach, &customer, invite_token).await {
            tracing::warn!(customer_id = %customer.id, error = %err, "invite event not published");
        }

        Ok(customer.into())
    }

    pub async fn get(&self, coach_id: Uuid, customer_id: Uuid) -> AppResult<CustomerResponse> {
        Ok(self.find_owned(coach_id, customer_id).await?.into())
    }

    pub async fn update(
        &self,
        coach_id: Uuid,
        customer_id: Uuid,
        request: UpdateCustomerRequest,
    ) -> AppResult<CustomerResponse> {
        request.validate()?;
        self.find_owned(coach_id, customer_id).await?;

        if let Some(email) = request.email.as_deref() {
            self.ensure_email_available(email, Some(customer_id)).await?;
        }

        let customer = self
            .customers
            .update(customer_id, request)
            .await?
            .ok_or(AppError::NotFound("Customer"))?;

        Ok(customer.into())
    }

    pub async fn delete(&self, coach_id: Uuid, customer_id: Uuid) -> AppResult<()> {
        self.find_owned(coach_id, customer_id).await?;

        if !self.customers.soft_delete(customer_id).await? {
            return Err(AppError::NotFound("Customer"));
        }

        tracing::info!(%coach_id, %customer_id, "customer deleted");
        Ok(())
    }

    /// Issue a fresh invite token; the previous one stops working
    pub async fn resend_invite(&self, coach_id: Uuid, customer_id: Uuid) -> AppResult<()> {
        let customer = self.find_owned(coach_id, customer_id).await?;
        if customer.has_accepted_invite() {
            return Err(AppError::Validation(
                "Customer has already accepted the invite".to_string(),
            ));
        }

        let coach = self.find_coach(coach_id).await?;
        let invite_token = generate_invite_token();
        let expires_at = Utc::now() + Duration::days(INVITE_VALIDITY_DAYS);

        self.customers
            .set_invite(customer_id, &token_digest(&invite_token), expires_at)
            .await?;

        let customer = Customer {
            invite_expires_at: Some(expires_at),
            ..customer
        };
        self.publish_invite(&coach, &customer, invite_token).await?;

        Ok(())
    }

    /// Profile of the authenticated customer
    pub async fn get_own_profile(&self, customer_id: Uuid) -> AppResult<CustomerResponse> {
        let customer = self
            .customers
            .find_by_id(customer_id)
            .await?
            .ok_or(AppError::NotFound("Customer"))?;

        Ok(customer.into())
    }

    async fn find_owned(&self, coach_id: Uuid, customer_id: Uuid) -> AppResult<Customer> {
        self.customers
            .find_for_coach(coach_id, customer_id)
            .await?
            .ok_or(AppError::NotFound("Customer"))
    }

    async fn find_coach(&self, coach_id: Uuid) -> AppResult<Coach> {
        self.coaches
            .find_by_id(coach_id)
            .await?
            .ok_or(AppError::NotFound("Coach"))
    }

    async fn ensure_email_available(&self, email: &str, owner: Option<Uuid>) -> AppResult<()> {
        match self.customers.find_by_email(email).await? {
            Some(existing) if Some(existing.id) != owner => Err(AuthError::UsernameIsTaken.into()),
            _ => Ok(()),
        }
    }

    async fn publish_invite(
        &self,
        coach: &Coach,
        customer: &Customer,
        invite_token: String,
    ) -> Result<(), SupplierError> {
        let event = CustomerInviteEvent {
            customer_id: customer.id,
            coach_id: coach.id,
            coach_name: coach.full_name(),
            email: customer.email.clone(),
            first_name: customer.first_name.clone(),
            invite_token,
            expires_at: customer
                .invite_expires_at
                .unwrap_or_else(|| Utc::now() + Duration::days(INVITE_VALIDITY_DAYS)),
        };

        self.events
            .publish(
                &self.invite_topic,
                &customer.id.to_string(),
                serde_json::to_value(&event)?,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MockCoachRepository, MockCustomerRepository};
    use crate::suppliers::MockEventPublisher;
    use assert_matches::assert_matches;

    fn coach(id: Uuid) -> Coach {
        Coach {
            id,
            email: "coach@example.com".to_string(),
            password_hash: "hash".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Coach".to_string(),
            created: Utc::now(),
            modified: Utc::now(),
            deleted: None,
        }
    }

    fn customer_from(new: &NewCustomer) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            coach_id: new.coach_id,
            email: new.email.clone(),
            password_hash: None,
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            phone: new.phone.clone(),
            birthday: new.birthday,
            invite_token_hash: Some(new.invite_token_hash.clone()),
            invite_expires_at: Some(new.invite_expires_at),
            created: Utc::now(),
            modified: Utc::now(),
            deleted: None,
        }
    }

    fn request() -> CreateCustomerRequest {
        CreateCustomerRequest {
            email: "client@example.com".to_string(),
            first_name: "Max".to_string(),
            last_name: "Client".to_string(),
            phone: None,
            birthday: None,
        }
    }

    fn coaches_returning(coach_id: Uuid) -> MockCoachRepository {
        let mut coaches = MockCoachRepository::new();
        coaches
            .expect_find_by_id()
            .returning(move |_| Ok(Some(coach(coach_id))));
        coaches
    }

    #[tokio::test]
    async fn test_create_publishes_invite_with_matching_digest() {
        let coach_id = Uuid::new_v4();
        let stored_digest = Arc::new(std::sync::Mutex::new(String::new()));

        let mut customers = MockCustomerRepository::new();
        customers.expect_find_by_email().returning(|_| Ok(None));
        let digest_slot = stored_digest.clone();
        customers.expect_create().returning(move |new| {
            *digest_slot.lock().unwrap() = new.invite_token_hash.clone();
            Ok(customer_from(&new))
        });

        let mut events = MockEventPublisher::new();
        let digest_slot = stored_digest.clone();
        events
            .expect_publish()
            .withf(move |topic, _, value| {
                let token = value["invite_token"].as_str().unwrap_or_default();
                topic == "customer-invites"
                    && value["coach_name"] == "Ada Coach"
                    && token_digest(token) == *digest_slot.lock().unwrap()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = CustomerService::new(
            Arc::new(customers),
            Arc::new(coaches_returning(coach_id)),
            Arc::new(events),
            "customer-invites",
        );

        let created = service.create(coach_id, request()).await.unwrap();
        assert_eq!(created.coach_id, coach_id);
        assert!(!created.invite_accepted);
    }

    #[tokio::test]
    async fn test_create_survives_publish_failure() {
        let coach_id = Uuid::new_v4();
        let mut customers = MockCustomerRepository::new();
        customers.expect_find_by_email().returning(|_| Ok(None));
        customers
            .expect_create()
            .returning(|new| Ok(customer_from(&new)));

        let mut events = MockEventPublisher::new();
        events
            .expect_publish()
            .returning(|_, _, _| Err(SupplierError::Rejected("proxy down".into())));

        let service = CustomerService::new(
            Arc::new(customers),
            Arc::new(coaches_returning(coach_id)),
            Arc::new(events),
            "customer-invites",
        );

        assert!(service.create(coach_id, request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let mut customers = MockCustomerRepository::new();
        customers.expect_find_by_email().returning(|email| {
            let new = NewCustomer {
                coach_id: Uuid::new_v4(),
                email: email.to_string(),
                first_name: "Other".to_string(),
                last_name: "Person".to_string(),
                phone: None,
                birthday: None,
                invite_token_hash: String::new(),
                invite_expires_at: Utc::now(),
            };
            Ok(Some(customer_from(&new)))
        });
        customers.expect_create().never();

        let service = CustomerService::new(
            Arc::new(customers),
            Arc::new(MockCoachRepository::new()),
            Arc::new(MockEventPublisher::new()),
            "customer-invites",
        );

        assert_matches!(
            service.create(Uuid::new_v4(), request()).await,
            Err(AppError::Auth(AuthError::UsernameIsTaken))
        );
    }

    #[tokio::test]
    async fn test_other_coaches_customer_is_not_found() {
        let mut customers = MockCustomerRepository::new();
        customers.expect_find_for_coach().returning(|_, _| Ok(None));
        customers.expect_soft_delete().never();

        let service = CustomerService::new(
            Arc::new(customers),
            Arc::new(MockCoachRepository::new()),
            Arc::new(MockEventPublisher::new()),
            "customer-invites",
        );

        assert_matches!(
            service.delete(Uuid::new_v4(), Uuid::new_v4()).await,
            Err(AppError::NotFound("Customer"))
        );
    }

    #[tokio::test]
    async fn test_resend_invite_for_active_customer_is_rejected() {
        let mut customers = MockCustomerRepository::new();
        customers.expect_find_for_coach().returning(|coach_id, _| {
            let new = NewCustomer {
                coach_id,
                email: "client@example.com".to_string(),
                first_name: "Max".to_string(),
                last_name: "Client".to_string(),
                phone: None,
                birthday: None,
                invite_token_hash: String::new(),
                invite_expires_at: Utc::now(),
            };
            let mut customer = customer_from(&new);
            customer.password_hash = Some("hash".to_string());
            Ok(Some(customer))
        });
        customers.expect_set_invite().never();

        let service = CustomerService::new(
            Arc::new(customers),
            Arc::new(MockCoachRepository::new()),
            Arc::new(MockEventPublisher::new()),
            "customer-invites",
        );

        assert_matches!(
            service.resend_invite(Uuid::new_v4(), Uuid::new_v4()).await,
            Err(AppError::Validation(_))
        );
    }

    #[tokio::test]
    async fn test_resend_invite_surfaces_publish_errors() {
        let coach_id = Uuid::new_v4();
        let mut customers = MockCustomerRepository::new();
        customers.expect_find_for_coach().returning(|coach_id, _| {
            let new = NewCustomer {
                coach_id,
                email: "client@example.com".to_string(),
                first_name: "Max".to_string(),
                last_name: "Client".to_string(),
                phone: None,
                birthday: None,
                invite_token_hash: "old".to_string(),
                invite_expires_at: Utc::now(),
            };
            Ok(Some(customer_from(&new)))
        });
        customers
            .expect_set_invite()
            .withf(|_, digest, _| digest != "old")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut events = MockEventPublisher::new();
        events
            .expect_publish()
            .returning(|_, _, _| Err(SupplierError::Rejected("proxy down".into())));

        let service = CustomerService::new(
            Arc::new(customers),
            Arc::new(coaches_returning(coach_id)),
            Arc::new(events),
            "customer-invites",
        );

        assert_matches!(
            service.resend_invite(coach_id, Uuid::new_v4()).await,
            Err(AppError::Supplier(_))
        );
    }
}
