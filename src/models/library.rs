use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MuscleGroup {
    pub id: Uuid,
    pub name: String,
}

/// Catalog exercise. `coach_id` is `None` for the shared catalog.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Exercise {
    pub id: Uuid,
    pub coach_id: Option<Uuid>,
    pub muscle_group_id: Uuid,
    pub muscle_group: String,
    pub name: String,
    pub description: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Exercise {
    pub fn is_shared(&self) -> bool {
        self.coach_id.is_none()
    }

    pub fn is_owned_by(&self, coach_id: Uuid) -> bool {
        self.coach_id == Some(coach_id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExerciseQuery {
    pub muscle_group_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateExerciseRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub muscle_group_id: Uuid,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateExerciseRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub muscle_group_id: Option<Uuid>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewExercise {
    pub coach_id: Uuid,
    pub muscle_group_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}
