use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{RepoResult, SessionRepository};

#[derive(Debug, Clone)]
pub struct PgSessionRepository {
    db: PgPool,
}

impl PgSessionRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn store_refresh_token(
        &self,
        user_id: Uuid,
        token_digest: &str,
        expires_at: DateTime<Utc>,
    ) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(token_digest)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn consume_refresh_token(&self, user_id: Uuid, token_digest: &str) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = true
             WHERE user_id = $1 AND token_hash = $2 AND expires_at > NOW() AND NOT revoked",
        )
        .bind(user_id)
        .bind(token_digest)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_user_refresh_tokens(&self, user_id: Uuid) -> RepoResult<()> {
        sqlx::query("UPDATE refresh_tokens SET revoked = true WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn blacklist_token(&self, jti: &str, expires_at: DateTime<Utc>) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO token_blacklist (jti, expires_at) VALUES ($1, $2)
             ON CONFLICT (jti) DO NOTHING",
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn is_token_blacklisted(&self, jti: &str) -> RepoResult<bool> {
        let result =
            sqlx::query("SELECT 1 FROM token_blacklist WHERE jti = $1 AND expires_at > NOW()")
                .bind(jti)
                .fetch_optional(&self.db)
                .await?;

        Ok(result.is_some())
    }
}
