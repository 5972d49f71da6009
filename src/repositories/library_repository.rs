use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{LibraryRepository, RepoResult};
use crate::models::{
    Exercise, ExerciseQuery, MuscleGroup, NewExercise, UpdateExerciseRequest,
};

const EXERCISE_SELECT: &str = "SELECT e.id, e.coach_id, e.muscle_group_id, mg.name AS muscle_group, \
     e.name, e.description, e.created, e.modified";

#[derive(Debug, Clone)]
pub struct PgLibraryRepository {
    db: PgPool,
}

impl PgLibraryRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// `ILIKE` pattern matching `search` anywhere, with its wildcards taken literally
fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl LibraryRepository for PgLibraryRepository {
    async fn list_muscle_groups(&self) -> RepoResult<Vec<MuscleGroup>> {
        sqlx::query_as::<_, MuscleGroup>(
            "SELECT id, name FROM muscle_groups WHERE deleted IS NULL ORDER BY name ASC",
        )
        .fetch_all(&self.db)
        .await
    }

    async fn muscle_group_exists(&self, id: Uuid) -> RepoResult<bool> {
        let row = sqlx::query("SELECT 1 FROM muscle_groups WHERE id = $1 AND deleted IS NULL")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.is_some())
    }

    async fn list_exercises(&self, coach_id: Uuid, query: ExerciseQuery) -> RepoResult<Vec<Exercise>> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(contains_pattern);

        sqlx::query_as::<_, Exercise>(&format!(
            "{EXERCISE_SELECT}
             FROM exercises e
             JOIN muscle_groups mg ON mg.id = e.muscle_group_id
             WHERE e.deleted IS NULL
               AND (e.coach_id IS NULL OR e.coach_id = $1)
               AND ($2::uuid IS NULL OR e.muscle_group_id = $2)
               AND ($3::text IS NULL OR e.name ILIKE $3 ESCAPE '\\')
             ORDER BY mg.name ASC, e.name ASC"
        ))
        .bind(coach_id)
        .bind(query.muscle_group_id)
        .bind(search)
        .fetch_all(&self.db)
        .await
    }

    async fn find_exercise(&self, id: Uuid) -> RepoResult<Option<Exercise>> {
        sqlx::query_as::<_, Exercise>(&format!(
            "{EXERCISE_SELECT}
             FROM exercises e
             JOIN muscle_groups mg ON mg.id = e.muscle_group_id
             WHERE e.id = $1 AND e.deleted IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
    }

    async fn find_visible_exercise_ids(&self, coach_id: Uuid, ids: Vec<Uuid>) -> RepoResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM exercises
             WHERE id = ANY($1) AND deleted IS NULL AND (coach_id IS NULL OR coach_id = $2)",
        )
        .bind(ids)
        .bind(coach_id)
        .fetch_all(&self.db)
        .await
    }

    async fn create_exercise(&self, exercise: NewExercise) -> RepoResult<Exercise> {
        let now = Utc::now();
        sqlx::query_as::<_, Exercise>(&format!(
            "WITH e AS (
                 INSERT INTO exercises (id, coach_id, muscle_group_id, name, description, created, modified)
                 VALUES ($1, $2, $3, $4, $5, $6, $6)
                 RETURNING *
             )
             {EXERCISE_SELECT}
             FROM e
             JOIN muscle_groups mg ON mg.id = e.muscle_group_id"
        ))
        .bind(Uuid::new_v4())
        .bind(exercise.coach_id)
        .bind(exercise.muscle_group_id)
        .bind(&exercise.name)
        .bind(&exercise.description)
        .bind(now)
        .fetch_one(&self.db)
        .await
    }

    async fn update_exercise(
        &self,
        id: Uuid,
        update: UpdateExerciseRequest,
    ) -> RepoResult<Option<Exercise>> {
        sqlx::query_as::<_, Exercise>(&format!(
            "WITH e AS (
                 UPDATE exercises
                 SET name = COALESCE($2, name),
                     muscle_group_id = COALESCE($3, muscle_group_id),
                     description = COALESCE($4, description),
                     modified = $5
                 WHERE id = $1 AND deleted IS NULL
                 RETURNING *
             )
             {EXERCISE_SELECT}
             FROM e
             JOIN muscle_groups mg ON mg.id = e.muscle_group_id"
        ))
        .bind(id)
        .bind(update.name)
        .bind(update.muscle_group_id)
        .bind(update.description)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await
    }

    async fn soft_delete_exercise(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE exercises SET deleted = NOW(), modified = NOW()
             WHERE id = $1 AND deleted IS NULL",
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
