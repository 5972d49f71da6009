use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CoachRepository, RepoResult};
use crate::models::{Coach, NewCoach, UpdateCoachProfileRequest};

const COACH_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, created, modified, deleted";

#[derive(Debug, Clone)]
pub struct PgCoachRepository {
    db: PgPool,
}

impl PgCoachRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CoachRepository for PgCoachRepository {
    async fn create(&self, coach: NewCoach) -> RepoResult<Coach> {
        let now = Utc::now();
        sqlx::query_as::<_, Coach>(&format!(
            "INSERT INTO coaches (id, email, password_hash, first_name, last_name, created, modified)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {COACH_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&coach.email)
        .bind(&coach.password_hash)
        .bind(&coach.first_name)
        .bind(&coach.last_name)
        .bind(now)
        .fetch_one(&self.db)
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Coach>> {
        sqlx::query_as::<_, Coach>(&format!(
            "SELECT {COACH_COLUMNS} FROM coaches WHERE id = $1 AND deleted IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Coach>> {
        sqlx::query_as::<_, Coach>(&format!(
            "SELECT {COACH_COLUMNS} FROM coaches WHERE LOWER(email) = LOWER($1) AND deleted IS NULL"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: UpdateCoachProfileRequest,
    ) -> RepoResult<Option<Coach>> {
        sqlx::query_as::<_, Coach>(&format!(
            "UPDATE coaches
             SET email = COALESCE($2, email),
                 first_name = COALESCE($3, first_name),
                 last_name = COALESCE($4, last_name),
                 modified = $5
             WHERE id = $1 AND deleted IS NULL
             RETURNING {COACH_COLUMNS}"
        ))
        .bind(id)
        .bind(update.email)
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> RepoResult<()> {
        sqlx::query("UPDATE coaches SET password_hash = $2, modified = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
