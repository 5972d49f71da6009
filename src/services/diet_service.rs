use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{CreateDietRequest, Diet, Macros, NewDiet, UpdateDietRequest};
use crate::repositories::DietRepository;

#[derive(Clone)]
pub struct DietService {
    diets: Arc<dyn DietRepository>,
}

impl DietService {
    pub fn new(diets: Arc<dyn DietRepository>) -> Self {
        Self { diets }
    }

    pub async fn list(&self, coach_id: Uuid) -> AppResult<Vec<Diet>> {
        Ok(self.diets.list_for_coach(coach_id).await?)
    }

    pub async fn create(&self, coach_id: Uuid, request: CreateDietRequest) -> AppResult<Diet> {
        request.validate()?;

        let diet = self
            .diets
            .create(NewDiet {
                coach_id,
                name: request.name.trim().to_string(),
                macros: Macros {
                    calories: request.calories,
                    proteins: request.proteins,
                    fats: request.fats,
                    carbs: request.carbs,
                },
                notes: request.notes,
            })
            .await?;

        Ok(diet)
    }

    pub async fn get(&self, coach_id: Uuid, diet_id: Uuid) -> AppResult<Diet> {
        self.diets
            .find_for_coach(coach_id, diet_id)
            .await?
            .ok_or(AppError::NotFound("Diet"))
    }

    pub async fn update(
        &self,
        coach_id: Uuid,
        diet_id: Uuid,
        request: UpdateDietRequest,
    ) -> AppResult<Diet> {
        request.validate()?;
        self.get(coach_id, diet_id).await?;

        self.diets
            .update(diet_id, request)
            .await?
            .ok_or(AppError::NotFound("Diet"))
    }

    /// Plans keep referencing a deleted diet
    pub async fn delete(&self, coach_id: Uuid, diet_id: Uuid) -> AppResult<()> {
        self.get(coach_id, diet_id).await?;

        if !self.diets.soft_delete(diet_id).await? {
            return Err(AppError::NotFound("Diet"));
        }
        Ok(())
    }
}
