use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{RepoResult, TrainingPlanRepository};
use crate::models::{
    Diet, NewTrainingPlan, TrainingExerciseRow, TrainingPlan, TrainingPlanDetail, TrainingRow,
};

const PLAN_COLUMNS: &str = "id, customer_id, start_date, end_date, notes, created, modified";

#[derive(Debug, Clone)]
pub struct PgTrainingPlanRepository {
    db: PgPool,
}

impl PgTrainingPlanRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Insert trainings, their exercises and the diet links of `plan_id`
async fn insert_contents(
    conn: &mut PgConnection,
    plan_id: Uuid,
    plan: &NewTrainingPlan,
) -> RepoResult<()> {
    let now = Utc::now();

    for training in &plan.trainings {
        let training_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO trainings (id, training_plan_id, name, ordering, created, modified)
             VALUES ($1, $2, $3, $4, $5, $5)",
        )
        .bind(training_id)
        .bind(plan_id)
        .bind(&training.name)
        .bind(training.ordering)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        for exercise in &training.exercises {
            sqlx::query(
                "INSERT INTO exercises_on_training
                     (id, training_id, exercise_id, sets, superset_id, ordering, created, modified)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $7)",
            )
            .bind(Uuid::new_v4())
            .bind(training_id)
            .bind(exercise.exercise_id)
            .bind(&exercise.sets)
            .bind(exercise.superset_id)
            .bind(exercise.ordering)
            .bind(now)
            .execute(&mut *conn)
            .await?;
        }
    }

    for diet_id in &plan.diet_ids {
        sqlx::query(
            "INSERT INTO diets_on_training_plan (id, diet_id, training_plan_id, created, modified)
             VALUES ($1, $2, $3, $4, $4)
             ON CONFLICT (diet_id, training_plan_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(diet_id)
        .bind(plan_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

#[async_trait]
impl TrainingPlanRepository for PgTrainingPlanRepository {
    async fn create(&self, plan: NewTrainingPlan) -> RepoResult<TrainingPlanDetail> {
        let plan_id = Uuid::new_v4();
        let now = Utc::now();

        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.db.begin().await?;

        sqlx::query(
            "INSERT INTO training_plans (id, customer_id, start_date, end_date, notes, created, modified)
             VALUES ($1, $2, $3, $4, $5, $6, $6)",
        )
        .bind(plan_id)
        .bind(plan.customer_id)
        .bind(plan.start_date)
        .bind(plan.end_date)
        .bind(&plan.notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        insert_contents(&mut tx, plan_id, &plan).await?;
        tx.commit().await?;

        tracing::debug!(%plan_id, trainings = plan.trainings.len(), "training plan stored");

        self.find_detail(plan_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    async fn replace(&self, id: Uuid, plan: NewTrainingPlan) -> RepoResult<Option<TrainingPlanDetail>> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            "UPDATE training_plans
             SET start_date = $2, end_date = $3, notes = $4, modified = $5
             WHERE id = $1 AND deleted IS NULL",
        )
        .bind(id)
        .bind(plan.start_date)
        .bind(plan.end_date)
        .bind(&plan.notes)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        // exercises_on_training rows go with their trainings (ON DELETE CASCADE)
        sqlx::query("DELETE FROM trainings WHERE training_plan_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM diets_on_training_plan WHERE training_plan_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_contents(&mut tx, id, &plan).await?;
        tx.commit().await?;

        self.find_detail(id).await
    }

    async fn find_detail(&self, id: Uuid) -> RepoResult<Option<TrainingPlanDetail>> {
        let Some(plan) = sqlx::query_as::<_, TrainingPlan>(&format!(
            "SELECT {PLAN_COLUMNS} FROM training_plans WHERE id = $1 AND deleted IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        else {
            return Ok(None);
        };

        let trainings = sqlx::query_as::<_, TrainingRow>(
            "SELECT id, training_plan_id, name, ordering FROM trainings
             WHERE training_plan_id = $1 AND deleted IS NULL
             ORDER BY ordering ASC",
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        let exercises = sqlx::query_as::<_, TrainingExerciseRow>(
            "SELECT eot.training_id, eot.exercise_id, e.name, mg.name AS muscle_group,
                    eot.sets, eot.superset_id, eot.ordering
             FROM exercises_on_training eot
             JOIN trainings t ON t.id = eot.training_id
             JOIN exercises e ON e.id = eot.exercise_id
             JOIN muscle_groups mg ON mg.id = e.muscle_group_id
             WHERE t.training_plan_id = $1 AND t.deleted IS NULL AND eot.deleted IS NULL
             ORDER BY eot.ordering ASC",
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        let diets = sqlx::query_as::<_, Diet>(
            "SELECT d.id, d.coach_id, d.name, d.calories, d.proteins, d.fats, d.carbs, d.notes,
                    d.created, d.modified
             FROM diets d
             JOIN diets_on_training_plan dtp ON dtp.diet_id = d.id
             WHERE dtp.training_plan_id = $1 AND dtp.deleted IS NULL
             ORDER BY d.name ASC",
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(Some(TrainingPlanDetail::assemble(plan, trainings, exercises, diets)))
    }

    async fn list_for_customer(&self, customer_id: Uuid) -> RepoResult<Vec<TrainingPlan>> {
        sqlx::query_as::<_, TrainingPlan>(&format!(
            "SELECT {PLAN_COLUMNS} FROM training_plans
             WHERE customer_id = $1 AND deleted IS NULL
             ORDER BY start_date DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.db)
        .await
    }

    async fn find_active_for_date(
        &self,
        customer_id: Uuid,
        date: NaiveDate,
    ) -> RepoResult<Option<TrainingPlanDetail>> {
        let plan_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM training_plans
             WHERE customer_id = $1 AND deleted IS NULL AND start_date <= $2 AND end_date >= $2
             ORDER BY created DESC
             LIMIT 1",
        )
        .bind(customer_id)
        .bind(date)
        .fetch_optional(&self.db)
        .await?;

        match plan_id {
            Some(plan_id) => self.find_detail(plan_id).await,
            None => Ok(None),
        }
    }

    async fn soft_delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE training_plans SET deleted = NOW(), modified = NOW()
             WHERE id = $1 AND deleted IS NULL",
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
