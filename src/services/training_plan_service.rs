use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use super::superset::build_training;
use super::NotificationService;
use crate::error::{AppError, AppResult};
use crate::models::{
    NewNotification, NewTrainingPlan, TrainingPlan, TrainingPlanDetail, TrainingPlanRequest,
};
use crate::repositories::{
    CustomerRepository, DietRepository, LibraryRepository, TrainingPlanRepository,
};

#[derive(Clone)]
pub struct TrainingPlanService {
    plans: Arc<dyn TrainingPlanRepository>,
    customers: Arc<dyn CustomerRepository>,
    library: Arc<dyn LibraryRepository>,
    diets: Arc<dyn DietRepository>,
    notifications: NotificationService,
}

fn unique<I: IntoIterator<Item = Uuid>>(ids: I) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

impl TrainingPlanService {
    pub fn new(
        plans: Arc<dyn TrainingPlanRepository>,
        customers: Arc<dyn CustomerRepository>,
        library: Arc<dyn LibraryRepository>,
        diets: Arc<dyn DietRepository>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            plans,
            customers,
            library,
            diets,
            notifications,
        }
    }

    pub async fn create(
        &self,
        coach_id: Uuid,
        customer_id: Uuid,
        request: TrainingPlanRequest,
    ) -> AppResult<TrainingPlanDetail> {
        self.ensure_customer(coach_id, customer_id).await?;
        let plan = self.build_plan(coach_id, customer_id, request).await?;

        let detail = self.plans.create(plan).await?;
        tracing::info!(%coach_id, %customer_id, plan_id = %detail.id, "training plan created");

        self.announce(&detail).await;
        Ok(detail)
    }

    pub async fn list_for_customer(
        &self,
        coach_id: Uuid,
        customer_id: Uuid,
    ) -> AppResult<Vec<TrainingPlan>> {
        self.ensure_customer(coach_id, customer_id).await?;
        Ok(self.plans.list_for_customer(customer_id).await?)
    }

    pub async fn get(&self, coach_id: Uuid, plan_id: Uuid) -> AppResult<TrainingPlanDetail> {
        let detail = self
            .plans
            .find_detail(plan_id)
            .await?
            .ok_or(AppError::NotFound("Training plan"))?;

        // Plans of someone else's customer are invisible.
        if self
            .customers
            .find_for_coach(coach_id, detail.customer_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("Training plan"));
        }

        Ok(detail)
    }

    /// Replace dates, notes, trainings and diets of an existing plan
    pub async fn update(
        &self,
        coach_id: Uuid,
        plan_id: Uuid,
        request: TrainingPlanRequest,
    ) -> AppResult<TrainingPlanDetail> {
        let current = self.get(coach_id, plan_id).await?;
        let plan = self.build_plan(coach_id, current.customer_id, request).await?;

        self.plans
            .replace(plan_id, plan)
            .await?
            .ok_or(AppError::NotFound("Training plan"))
    }

    pub async fn delete(&self, coach_id: Uuid, plan_id: Uuid) -> AppResult<()> {
        self.get(coach_id, plan_id).await?;

        if !self.plans.soft_delete(plan_id).await? {
            return Err(AppError::NotFound("Training plan"));
        }
        Ok(())
    }

    pub async fn list_own(&self, customer_id: Uuid) -> AppResult<Vec<TrainingPlan>> {
        Ok(self.plans.list_for_customer(customer_id).await?)
    }

    pub async fn get_own(&self, customer_id: Uuid, plan_id: Uuid) -> AppResult<TrainingPlanDetail> {
        self.plans
            .find_detail(plan_id)
            .await?
            .filter(|detail| detail.customer_id == customer_id)
            .ok_or(AppError::NotFound("Training plan"))
    }

    async fn ensure_customer(&self, coach_id: Uuid, customer_id: Uuid) -> AppResult<()> {
        self.customers
            .find_for_coach(coach_id, customer_id)
            .await?
            .ok_or(AppError::NotFound("Customer"))?;
        Ok(())
    }

    /// Validate the request against the catalog and the coach's diets and
    /// compute ordering and superset ids
    async fn build_plan(
        &self,
        coach_id: Uuid,
        customer_id: Uuid,
        request: TrainingPlanRequest,
    ) -> AppResult<NewTrainingPlan> {
        request.validate()?;

        if request.start_date > request.end_date {
            return Err(AppError::Validation(
                "start_date must not be after end_date".to_string(),
            ));
        }

        let exercise_ids = unique(
            request
                .trainings
                .iter()
                .flat_map(|training| training.exercises.iter().map(|exercise| exercise.id)),
        );
        if !exercise_ids.is_empty() {
            let visible: HashSet<Uuid> = self
                .library
                .find_visible_exercise_ids(coach_id, exercise_ids.clone())
                .await?
                .into_iter()
                .collect();
            if let Some(unknown) = exercise_ids.iter().find(|id| !visible.contains(id)) {
                return Err(AppError::Validation(format!("Unknown exercise {unknown}")));
            }
        }

        let diet_ids = unique(request.diets.iter().copied());
        if !diet_ids.is_empty() {
            let owned: HashSet<Uuid> = self
                .diets
                .find_owned_ids(coach_id, diet_ids.clone())
                .await?
                .into_iter()
                .collect();
            if let Some(unknown) = diet_ids.iter().find(|id| !owned.contains(id)) {
                return Err(AppError::Validation(format!("Unknown diet {unknown}")));
            }
        }

        let trainings = request
            .trainings
            .iter()
            .enumerate()
            .map(|(ordering, training)| build_training(ordering, training))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(NewTrainingPlan {
            customer_id,
            start_date: request.start_date,
            end_date: request.end_date,
            notes: request.notes,
            trainings,
            diet_ids,
        })
    }

    /// Tell the customer about the new plan; failures are only logged
    async fn announce(&self, detail: &TrainingPlanDetail) {
        let notification = NewNotification {
            customer_id: detail.customer_id,
            title: "New training plan".to_string(),
            body: format!(
                "Your coach prepared a plan from {} to {}",
                detail.start_date, detail.end_date
            ),
            data: HashMap::from([
                ("kind".to_string(), "training_plan".to_string()),
                ("training_plan_id".to_string(), detail.id.to_string()),
            ]),
        };

        if let Err(err) = self.notifications.notify(notification).await {
            tracing::warn!(plan_id = %detail.id, error = %err, "training plan notification failed");
        }
    }
}
