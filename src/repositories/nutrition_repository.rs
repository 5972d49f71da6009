use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{NutritionRepository, RepoResult};
use crate::models::{MealLog, NewMealLog};

const MEAL_LOG_COLUMNS: &str = "id, customer_id, date, name, calories, proteins, fats, carbs, created";

#[derive(Debug, Clone)]
pub struct PgNutritionRepository {
    db: PgPool,
}

impl PgNutritionRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NutritionRepository for PgNutritionRepository {
    async fn create(&self, entry: NewMealLog) -> RepoResult<MealLog> {
        let now = Utc::now();
        sqlx::query_as::<_, MealLog>(&format!(
            "INSERT INTO meal_logs (id, customer_id, date, name, calories, proteins, fats, carbs, created, modified)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
             RETURNING {MEAL_LOG_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(entry.customer_id)
        .bind(entry.date)
        .bind(&entry.name)
        .bind(entry.macros.calories)
        .bind(entry.macros.proteins)
        .bind(entry.macros.fats)
        .bind(entry.macros.carbs)
        .bind(now)
        .fetch_one(&self.db)
        .await
    }

    async fn list_for_day(&self, customer_id: Uuid, date: NaiveDate) -> RepoResult<Vec<MealLog>> {
        sqlx::query_as::<_, MealLog>(&format!(
            "SELECT {MEAL_LOG_COLUMNS} FROM meal_logs
             WHERE customer_id = $1 AND date = $2 AND deleted IS NULL
             ORDER BY created ASC"
        ))
        .bind(customer_id)
        .bind(date)
        .fetch_all(&self.db)
        .await
    }

    async fn soft_delete(&self, customer_id: Uuid, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE meal_logs SET deleted = NOW(), modified = NOW()
             WHERE id = $1 AND customer_id = $2 AND deleted IS NULL",
        )
        .bind(id)
        .bind(customer_id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
