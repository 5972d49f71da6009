use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub invite_token_hash: Option<String>,
    pub invite_expires_at: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub deleted: Option<DateTime<Utc>>,
}

impl Customer {
    /// A customer can log in only after setting a password through the invite
    pub fn has_accepted_invite(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn invite_is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.invite_token_hash.is_some()
            && self.invite_expires_at.map_or(false, |expires_at| expires_at > now)
    }
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub coach_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub invite_token_hash: String,
    pub invite_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 3, max = 32))]
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(min = 3, max = 32))]
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub invite_accepted: bool,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            invite_accepted: customer.has_accepted_invite(),
            id: customer.id,
            coach_id: customer.coach_id,
            email: customer.email,
            first_name: customer.first_name,
            last_name: customer.last_name,
            phone: customer.phone,
            birthday: customer.birthday,
            created: customer.created,
            modified: customer.modified,
        }
    }
}

/// Payload published on the invite topic; the consumer emails the link
#[derive(Debug, Clone, Serialize)]
pub struct CustomerInviteEvent {
    pub customer_id: Uuid,
    pub coach_id: Uuid,
    pub coach_name: String,
    pub email: String,
    pub first_name: String,
    pub invite_token: String,
    pub expires_at: DateTime<Utc>,
}
