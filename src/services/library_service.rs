use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    CreateExerciseRequest, Exercise, ExerciseQuery, MuscleGroup, NewExercise,
    UpdateExerciseRequest,
};
use crate::repositories::LibraryRepository;

/// Muscle groups and the exercise catalog.
///
/// Exercises without a coach are shared by everyone and read-only; coaches
/// manage their own additions.
#[derive(Clone)]
pub struct LibraryService {
    library: Arc<dyn LibraryRepository>,
}

impl LibraryService {
    pub fn new(library: Arc<dyn LibraryRepository>) -> Self {
        Self { library }
    }

    pub async fn muscle_groups(&self) -> AppResult<Vec<MuscleGroup>> {
        Ok(self.library.list_muscle_groups().await?)
    }

    pub async fn list_exercises(&self, coach_id: Uuid, query: ExerciseQuery) -> AppResult<Vec<Exercise>> {
        Ok(self.library.list_exercises(coach_id, query).await?)
    }

    pub async fn create_exercise(
        &self,
        coach_id: Uuid,
        request: CreateExerciseRequest,
    ) -> AppResult<Exercise> {
        request.validate()?;
        self.ensure_muscle_group(request.muscle_group_id).await?;

        let exercise = self
            .library
            .create_exercise(NewExercise {
                coach_id,
                muscle_group_id: request.muscle_group_id,
                name: request.name.trim().to_string(),
                description: request.description,
            })
            .await?;

        tracing::debug!(%coach_id, exercise_id = %exercise.id, "exercise created");
        Ok(exercise)
    }

    pub async fn update_exercise(
        &self,
        coach_id: Uuid,
        exercise_id: Uuid,
        request: UpdateExerciseRequest,
    ) -> AppResult<Exercise> {
        request.validate()?;
        self.find_editable(coach_id, exercise_id).await?;

        if let Some(muscle_group_id) = request.muscle_group_id {
            self.ensure_muscle_group(muscle_group_id).await?;
        }

        self.library
            .update_exercise(exercise_id, request)
            .await?
            .ok_or(AppError::NotFound("Exercise"))
    }

    pub async fn delete_exercise(&self, coach_id: Uuid, exercise_id: Uuid) -> AppResult<()> {
        self.find_editable(coach_id, exercise_id).await?;

        if !self.library.soft_delete_exercise(exercise_id).await? {
            return Err(AppError::NotFound("Exercise"));
        }
        Ok(())
    }

    async fn find_editable(&self, coach_id: Uuid, exercise_id: Uuid) -> AppResult<Exercise> {
        let exercise = self
            .library
            .find_exercise(exercise_id)
            .await?
            .ok_or(AppError::NotFound("Exercise"))?;

        if exercise.is_shared() {
            return Err(AppError::Forbidden(
                "Shared catalog exercises cannot be modified".to_string(),
            ));
        }
        if !exercise.is_owned_by(coach_id) {
            return Err(AppError::NotFound("Exercise"));
        }

        Ok(exercise)
    }

    async fn ensure_muscle_group(&self, muscle_group_id: Uuid) -> AppResult<()> {
        if !self.library.muscle_group_exists(muscle_group_id).await? {
            return Err(AppError::Validation(format!(
                "Unknown muscle group {muscle_group_id}"
            )));
        }
        Ok(())
    }
}
