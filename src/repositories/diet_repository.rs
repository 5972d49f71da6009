use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{DietRepository, RepoResult};
use crate::models::{Diet, NewDiet, UpdateDietRequest};

pub(crate) const DIET_COLUMNS: &str =
    "id, coach_id, name, calories, proteins, fats, carbs, notes, created, modified";

#[derive(Debug, Clone)]
pub struct PgDietRepository {
    db: PgPool,
}

impl PgDietRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DietRepository for PgDietRepository {
    async fn create(&self, diet: NewDiet) -> RepoResult<Diet> {
        let now = Utc::now();
        sqlx::query_as::<_, Diet>(&format!(
            "INSERT INTO diets (id, coach_id, name, calories, proteins, fats, carbs, notes, created, modified)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
             RETURNING {DIET_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(diet.coach_id)
        .bind(&diet.name)
        .bind(diet.macros.calories)
        .bind(diet.macros.proteins)
        .bind(diet.macros.fats)
        .bind(diet.macros.carbs)
        .bind(&diet.notes)
        .bind(now)
        .fetch_one(&self.db)
        .await
    }

    async fn find_for_coach(&self, coach_id: Uuid, id: Uuid) -> RepoResult<Option<Diet>> {
        sqlx::query_as::<_, Diet>(&format!(
            "SELECT {DIET_COLUMNS} FROM diets WHERE id = $1 AND coach_id = $2 AND deleted IS NULL"
        ))
        .bind(id)
        .bind(coach_id)
        .fetch_optional(&self.db)
        .await
    }

    async fn list_for_coach(&self, coach_id: Uuid) -> RepoResult<Vec<Diet>> {
        sqlx::query_as::<_, Diet>(&format!(
            "SELECT {DIET_COLUMNS} FROM diets WHERE coach_id = $1 AND deleted IS NULL ORDER BY name ASC"
        ))
        .bind(coach_id)
        .fetch_all(&self.db)
        .await
    }

    async fn update(&self, id: Uuid, update: UpdateDietRequest) -> RepoResult<Option<Diet>> {
        sqlx::query_as::<_, Diet>(&format!(
            "UPDATE diets
             SET name = COALESCE($2, name),
                 calories = COALESCE($3, calories),
                 proteins = COALESCE($4, proteins),
                 fats = COALESCE($5, fats),
                 carbs = COALESCE($6, carbs),
                 notes = COALESCE($7, notes),
                 modified = $8
             WHERE id = $1 AND deleted IS NULL
             RETURNING {DIET_COLUMNS}"
        ))
        .bind(id)
        .bind(update.name)
        .bind(update.calories)
        .bind(update.proteins)
        .bind(update.fats)
        .bind(update.carbs)
        .bind(update.notes)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await
    }

    async fn soft_delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE diets SET deleted = NOW(), modified = NOW() WHERE id = $1 AND deleted IS NULL",
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_owned_ids(&self, coach_id: Uuid, ids: Vec<Uuid>) -> RepoResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM diets WHERE id = ANY($1) AND coach_id = $2 AND deleted IS NULL",
        )
        .bind(ids)
        .bind(coach_id)
        .fetch_all(&self.db)
        .await
    }
}
