use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::Diet;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TrainingPlan {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TrainingRow {
    pub id: Uuid,
    pub training_plan_id: Uuid,
    pub name: String,
    pub ordering: i32,
}

/// One row of `exercises_on_training` joined with its catalog exercise
#[derive(Debug, Clone, FromRow)]
pub struct TrainingExerciseRow {
    pub training_id: Uuid,
    pub exercise_id: Uuid,
    pub name: String,
    pub muscle_group: String,
    pub sets: String,
    pub superset_id: Option<Uuid>,
    pub ordering: i32,
}

/// Body of create and update: the whole plan is always sent
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TrainingPlanRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(length(max = 4000))]
    pub notes: Option<String>,
    #[validate(nested)]
    #[serde(default)]
    pub trainings: Vec<TrainingInput>,
    #[serde(default)]
    pub diets: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TrainingInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(nested)]
    #[serde(default)]
    pub exercises: Vec<ExerciseInput>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExerciseInput {
    /// Catalog exercise id
    pub id: Uuid,
    #[validate(length(min = 1, max = 50))]
    pub sets: String,
    /// Exercises of the same training performed back-to-back with this one
    #[serde(default)]
    pub supersets: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTrainingPlan {
    pub customer_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
    pub trainings: Vec<NewTraining>,
    pub diet_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTraining {
    pub name: String,
    pub ordering: i32,
    pub exercises: Vec<NewTrainingExercise>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTrainingExercise {
    pub exercise_id: Uuid,
    pub sets: String,
    pub superset_id: Option<Uuid>,
    pub ordering: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingPlanDetail {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub trainings: Vec<TrainingDetail>,
    pub diets: Vec<Diet>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingDetail {
    pub id: Uuid,
    pub name: String,
    pub ordering: i32,
    pub exercises: Vec<TrainingExerciseDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingExerciseDetail {
    pub exercise_id: Uuid,
    pub name: String,
    pub muscle_group: String,
    pub sets: String,
    pub superset_id: Option<Uuid>,
    pub ordering: i32,
}

impl TrainingPlanDetail {
    /// Assemble a plan from its flat rows; rows may arrive in any order
    pub fn assemble(
        plan: TrainingPlan,
        trainings: Vec<TrainingRow>,
        exercises: Vec<TrainingExerciseRow>,
        diets: Vec<Diet>,
    ) -> Self {
        let mut trainings: Vec<TrainingDetail> = trainings
            .into_iter()
            .filter(|t| t.training_plan_id == plan.id)
            .map(|t| TrainingDetail {
                id: t.id,
                name: t.name,
                ordering: t.ordering,
                exercises: Vec::new(),
            })
            .collect();
        trainings.sort_by_key(|t| t.ordering);

        for row in exercises {
            if let Some(training) = trainings.iter_mut().find(|t| t.id == row.training_id) {
                training.exercises.push(TrainingExerciseDetail {
                    exercise_id: row.exercise_id,
                    name: row.name,
                    muscle_group: row.muscle_group,
                    sets: row.sets,
                    superset_id: row.superset_id,
                    ordering: row.ordering,
                });
            }
        }
        for training in &mut trainings {
            training.exercises.sort_by_key(|e| e.ordering);
        }

        Self {
            id: plan.id,
            customer_id: plan.customer_id,
            start_date: plan.start_date,
            end_date: plan.end_date,
            notes: plan.notes,
            created: plan.created,
            modified: plan.modified,
            trainings,
            diets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> TrainingPlan {
        TrainingPlan {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            notes: None,
            created: Utc::now(),
            modified: Utc::now(),
        }
    }

    fn exercise_row(training_id: Uuid, name: &str, ordering: i32) -> TrainingExerciseRow {
        TrainingExerciseRow {
            training_id,
            exercise_id: Uuid::new_v4(),
            name: name.to_string(),
            muscle_group: "Chest".to_string(),
            sets: "3x10".to_string(),
            superset_id: None,
            ordering,
        }
    }

    #[test]
    fn test_assemble_orders_trainings_and_exercises() {
        let plan = plan();
        let day_a = TrainingRow {
            id: Uuid::new_v4(),
            training_plan_id: plan.id,
            name: "Day A".to_string(),
            ordering: 0,
        };
        let day_b = TrainingRow {
            id: Uuid::new_v4(),
            training_plan_id: plan.id,
            name: "Day B".to_string(),
            ordering: 1,
        };

        let exercises = vec![
            exercise_row(day_a.id, "Push-Up", 1),
            exercise_row(day_b.id, "Back Squat", 0),
            exercise_row(day_a.id, "Bench Press", 0),
        ];

        let detail = TrainingPlanDetail::assemble(plan, vec![day_b, day_a], exercises, vec![]);

        let names: Vec<_> = detail.trainings.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Day A", "Day B"]);

        let day_a_exercises: Vec<_> = detail.trainings[0]
            .exercises
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(day_a_exercises, vec!["Bench Press", "Push-Up"]);
        assert_eq!(detail.trainings[1].exercises.len(), 1);
    }
}
