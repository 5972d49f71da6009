use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::Macros;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MealLog {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub date: NaiveDate,
    pub name: String,
    pub calories: f64,
    pub proteins: f64,
    pub fats: f64,
    pub carbs: f64,
    pub created: DateTime<Utc>,
}

impl MealLog {
    pub fn macros(&self) -> Macros {
        Macros {
            calories: self.calories,
            proteins: self.proteins,
            fats: self.fats,
            carbs: self.carbs,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMealLogRequest {
    /// Defaults to today (UTC)
    pub date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 0.0))]
    pub calories: f64,
    #[validate(range(min = 0.0))]
    pub proteins: f64,
    #[validate(range(min = 0.0))]
    pub fats: f64,
    #[validate(range(min = 0.0))]
    pub carbs: f64,
}

#[derive(Debug, Clone)]
pub struct NewMealLog {
    pub customer_id: Uuid,
    pub date: NaiveDate,
    pub name: String,
    pub macros: Macros,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct NutritionDayQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct DailyNutritionSummary {
    pub date: NaiveDate,
    pub consumed: Macros,
    pub entries: Vec<MealLog>,
    /// One entry per diet attached to the plan active on `date`
    pub targets: Vec<DietProgress>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DietProgress {
    pub diet_id: Uuid,
    pub diet_name: String,
    pub target: Macros,
    pub remaining: Macros,
}
