use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    CreateMealLogRequest, DailyNutritionSummary, Diet, DietProgress, Macros, MealLog, NewMealLog,
};
use crate::repositories::{CustomerRepository, NutritionRepository, TrainingPlanRepository};

#[derive(Clone)]
pub struct NutritionService {
    nutrition: Arc<dyn NutritionRepository>,
    plans: Arc<dyn TrainingPlanRepository>,
    customers: Arc<dyn CustomerRepository>,
}

/// Totals for the day and, per diet, what is left of its targets
pub fn summarize(date: NaiveDate, entries: Vec<MealLog>, diets: &[Diet]) -> DailyNutritionSummary {
    let consumed: Macros = entries.iter().map(MealLog::macros).sum();

    let targets = diets
        .iter()
        .map(|diet| DietProgress {
            diet_id: diet.id,
            diet_name: diet.name.clone(),
            target: diet.macros(),
            remaining: diet.macros() - consumed,
        })
        .collect();

    DailyNutritionSummary {
        date,
        consumed,
        entries,
        targets,
    }
}

impl NutritionService {
    pub fn new(
        nutrition: Arc<dyn NutritionRepository>,
        plans: Arc<dyn TrainingPlanRepository>,
        customers: Arc<dyn CustomerRepository>,
    ) -> Self {
        Self {
            nutrition,
            plans,
            customers,
        }
    }

    pub async fn log_meal(&self, customer_id: Uuid, request: CreateMealLogRequest) -> AppResult<MealLog> {
        request.validate()?;

        let entry = self
            .nutrition
            .create(NewMealLog {
                customer_id,
                date: request.date.unwrap_or_else(|| Utc::now().date_naive()),
                name: request.name.trim().to_string(),
                macros: Macros {
                    calories: request.calories,
                    proteins: request.proteins,
                    fats: request.fats,
                    carbs: request.carbs,
                },
            })
            .await?;

        Ok(entry)
    }

    pub async fn list_day(&self, customer_id: Uuid, date: Option<NaiveDate>) -> AppResult<Vec<MealLog>> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        Ok(self.nutrition.list_for_day(customer_id, date).await?)
    }

    pub async fn delete_entry(&self, customer_id: Uuid, entry_id: Uuid) -> AppResult<()> {
        if !self.nutrition.soft_delete(customer_id, entry_id).await? {
            return Err(AppError::NotFound("Meal log entry"));
        }
        Ok(())
    }

    pub async fn summary(
        &self,
        customer_id: Uuid,
        date: Option<NaiveDate>,
    ) -> AppResult<DailyNutritionSummary> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let entries = self.nutrition.list_for_day(customer_id, date).await?;
        let diets = self
            .plans
            .find_active_for_date(customer_id, date)
            .await?
            .map(|plan| plan.diets)
            .unwrap_or_default();

        Ok(summarize(date, entries, &diets))
    }

    /// Summary of one of the coach's customers
    pub async fn summary_for_coach(
        &self,
        coach_id: Uuid,
        customer_id: Uuid,
        date: Option<NaiveDate>,
    ) -> AppResult<DailyNutritionSummary> {
        self.customers
            .find_for_coach(coach_id, customer_id)
            .await?
            .ok_or(AppError::NotFound("Customer"))?;

        self.summary(customer_id, date).await
    }
}
