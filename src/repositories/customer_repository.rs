use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CustomerRepository, RepoResult};
use crate::models::{Customer, NewCustomer, UpdateCustomerRequest};

const CUSTOMER_COLUMNS: &str = "id, coach_id, email, password_hash, first_name, last_name, phone, \
     birthday, invite_token_hash, invite_expires_at, created, modified, deleted";

#[derive(Debug, Clone)]
pub struct PgCustomerRepository {
    db: PgPool,
}

impl PgCustomerRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn create(&self, customer: NewCustomer) -> RepoResult<Customer> {
        let now = Utc::now();
        sqlx::query_as::<_, Customer>(&format!(
            "INSERT INTO customers (id, coach_id, email, first_name, last_name, phone, birthday,
                                    invite_token_hash, invite_expires_at, created, modified)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(customer.coach_id)
        .bind(&customer.email)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.phone)
        .bind(customer.birthday)
        .bind(&customer.invite_token_hash)
        .bind(customer.invite_expires_at)
        .bind(now)
        .fetch_one(&self.db)
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Customer>> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1 AND deleted IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
    }

    async fn find_for_coach(&self, coach_id: Uuid, id: Uuid) -> RepoResult<Option<Customer>> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers
             WHERE id = $1 AND coach_id = $2 AND deleted IS NULL"
        ))
        .bind(id)
        .bind(coach_id)
        .fetch_optional(&self.db)
        .await
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Customer>> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers
             WHERE LOWER(email) = LOWER($1) AND deleted IS NULL"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
    }

    async fn find_by_invite_digest(&self, digest: &str) -> RepoResult<Option<Customer>> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers
             WHERE invite_token_hash = $1 AND deleted IS NULL"
        ))
        .bind(digest)
        .fetch_optional(&self.db)
        .await
    }

    async fn list_for_coach(
        &self,
        coach_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Customer>> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers
             WHERE coach_id = $1 AND deleted IS NULL
             ORDER BY last_name ASC, first_name ASC
             LIMIT $2 OFFSET $3"
        ))
        .bind(coach_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
    }

    async fn update(&self, id: Uuid, update: UpdateCustomerRequest) -> RepoResult<Option<Customer>> {
        sqlx::query_as::<_, Customer>(&format!(
            "UPDATE customers
             SET email = COALESCE($2, email),
                 first_name = COALESCE($3, first_name),
                 last_name = COALESCE($4, last_name),
                 phone = COALESCE($5, phone),
                 birthday = COALESCE($6, birthday),
                 modified = $7
             WHERE id = $1 AND deleted IS NULL
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(id)
        .bind(update.email)
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.phone)
        .bind(update.birthday)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await
    }

    async fn set_invite(&self, id: Uuid, digest: &str, expires_at: DateTime<Utc>) -> RepoResult<()> {
        sqlx::query(
            "UPDATE customers
             SET invite_token_hash = $2, invite_expires_at = $3, modified = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(digest)
        .bind(expires_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn accept_invite(&self, id: Uuid, password_hash: &str) -> RepoResult<()> {
        sqlx::query(
            "UPDATE customers
             SET password_hash = $2, invite_token_hash = NULL, invite_expires_at = NULL,
                 modified = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> RepoResult<()> {
        sqlx::query("UPDATE customers SET password_hash = $2, modified = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE customers SET deleted = NOW(), modified = NOW()
             WHERE id = $1 AND deleted IS NULL",
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
