//! Persistence seams.
//!
//! Services only talk to these traits; the Postgres implementations live in
//! the submodules and are wired together in `api::routes::AppState`.

pub mod coach_repository;
pub mod customer_repository;
pub mod diet_repository;
pub mod library_repository;
pub mod notification_repository;
pub mod nutrition_repository;
pub mod session_repository;
pub mod training_plan_repository;

pub use coach_repository::PgCoachRepository;
pub use customer_repository::PgCustomerRepository;
pub use diet_repository::PgDietRepository;
pub use library_repository::PgLibraryRepository;
pub use notification_repository::PgNotificationRepository;
pub use nutrition_repository::PgNutritionRepository;
pub use session_repository::PgSessionRepository;
pub use training_plan_repository::PgTrainingPlanRepository;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{
    Coach, Customer, Device, Diet, Exercise, ExerciseQuery, MealLog, MuscleGroup, NewCoach,
    NewCustomer, NewDiet, NewExercise, NewMealLog, NewNotification, NewTrainingPlan, Notification,
    TrainingPlan, TrainingPlanDetail, UpdateCoachProfileRequest, UpdateCustomerRequest,
    UpdateDietRequest, UpdateExerciseRequest,
};

pub type RepoResult<T> = Result<T, sqlx::Error>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CoachRepository: Send + Sync {
    async fn create(&self, coach: NewCoach) -> RepoResult<Coach>;
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Coach>>;
    /// Case-insensitive lookup among active coaches
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Coach>>;
    async fn update_profile(
        &self,
        id: Uuid,
        update: UpdateCoachProfileRequest,
    ) -> RepoResult<Option<Coach>>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> RepoResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn create(&self, customer: NewCustomer) -> RepoResult<Customer>;
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Customer>>;
    /// Active customer `id` if and only if it belongs to `coach_id`
    async fn find_for_coach(&self, coach_id: Uuid, id: Uuid) -> RepoResult<Option<Customer>>;
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Customer>>;
    async fn find_by_invite_digest(&self, digest: &str) -> RepoResult<Option<Customer>>;
    async fn list_for_coach(&self, coach_id: Uuid, limit: i64, offset: i64)
        -> RepoResult<Vec<Customer>>;
    async fn update(&self, id: Uuid, update: UpdateCustomerRequest) -> RepoResult<Option<Customer>>;
    async fn set_invite(&self, id: Uuid, digest: &str, expires_at: DateTime<Utc>) -> RepoResult<()>;
    /// Store the password and burn the invite
    async fn accept_invite(&self, id: Uuid, password_hash: &str) -> RepoResult<()>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> RepoResult<()>;
    async fn soft_delete(&self, id: Uuid) -> RepoResult<bool>;
}

/// Refresh token registry and access token blacklist
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn store_refresh_token(
        &self,
        user_id: Uuid,
        token_digest: &str,
        expires_at: DateTime<Utc>,
    ) -> RepoResult<()>;
    /// Revoke a live refresh token; false when it was unknown, expired or already used
    async fn consume_refresh_token(&self, user_id: Uuid, token_digest: &str) -> RepoResult<bool>;
    async fn revoke_user_refresh_tokens(&self, user_id: Uuid) -> RepoResult<()>;
    async fn blacklist_token(&self, jti: &str, expires_at: DateTime<Utc>) -> RepoResult<()>;
    async fn is_token_blacklisted(&self, jti: &str) -> RepoResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LibraryRepository: Send + Sync {
    async fn list_muscle_groups(&self) -> RepoResult<Vec<MuscleGroup>>;
    async fn muscle_group_exists(&self, id: Uuid) -> RepoResult<bool>;
    /// Shared catalog plus the coach's own exercises
    async fn list_exercises(&self, coach_id: Uuid, query: ExerciseQuery) -> RepoResult<Vec<Exercise>>;
    async fn find_exercise(&self, id: Uuid) -> RepoResult<Option<Exercise>>;
    /// Subset of `ids` the coach may put into a plan
    async fn find_visible_exercise_ids(&self, coach_id: Uuid, ids: Vec<Uuid>) -> RepoResult<Vec<Uuid>>;
    async fn create_exercise(&self, exercise: NewExercise) -> RepoResult<Exercise>;
    async fn update_exercise(
        &self,
        id: Uuid,
        update: UpdateExerciseRequest,
    ) -> RepoResult<Option<Exercise>>;
    async fn soft_delete_exercise(&self, id: Uuid) -> RepoResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DietRepository: Send + Sync {
    async fn create(&self, diet: NewDiet) -> RepoResult<Diet>;
    async fn find_for_coach(&self, coach_id: Uuid, id: Uuid) -> RepoResult<Option<Diet>>;
    async fn list_for_coach(&self, coach_id: Uuid) -> RepoResult<Vec<Diet>>;
    async fn update(&self, id: Uuid, update: UpdateDietRequest) -> RepoResult<Option<Diet>>;
    async fn soft_delete(&self, id: Uuid) -> RepoResult<bool>;
    /// Subset of `ids` owned by the coach
    async fn find_owned_ids(&self, coach_id: Uuid, ids: Vec<Uuid>) -> RepoResult<Vec<Uuid>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrainingPlanRepository: Send + Sync {
    /// Insert plan, trainings, exercises and diet links in one transaction
    async fn create(&self, plan: NewTrainingPlan) -> RepoResult<TrainingPlanDetail>;
    /// Replace dates, notes and all nested content in one transaction
    async fn replace(&self, id: Uuid, plan: NewTrainingPlan) -> RepoResult<Option<TrainingPlanDetail>>;
    async fn find_detail(&self, id: Uuid) -> RepoResult<Option<TrainingPlanDetail>>;
    async fn list_for_customer(&self, customer_id: Uuid) -> RepoResult<Vec<TrainingPlan>>;
    /// Most recently created plan whose date range contains `date`
    async fn find_active_for_date(
        &self,
        customer_id: Uuid,
        date: NaiveDate,
    ) -> RepoResult<Option<TrainingPlanDetail>>;
    async fn soft_delete(&self, id: Uuid) -> RepoResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NutritionRepository: Send + Sync {
    async fn create(&self, entry: NewMealLog) -> RepoResult<MealLog>;
    async fn list_for_day(&self, customer_id: Uuid, date: NaiveDate) -> RepoResult<Vec<MealLog>>;
    async fn soft_delete(&self, customer_id: Uuid, id: Uuid) -> RepoResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// A token moves to the latest customer that registers it
    async fn upsert_device(&self, customer_id: Uuid, fcm_token: &str, platform: &str)
        -> RepoResult<Device>;
    async fn delete_device(&self, customer_id: Uuid, fcm_token: &str) -> RepoResult<bool>;
    async fn delete_device_by_token(&self, fcm_token: &str) -> RepoResult<()>;
    async fn list_devices(&self, customer_id: Uuid) -> RepoResult<Vec<Device>>;
    async fn create_notification(&self, notification: NewNotification) -> RepoResult<Notification>;
    async fn list_notifications(
        &self,
        customer_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Notification>>;
    async fn mark_read(&self, customer_id: Uuid, id: Uuid) -> RepoResult<Option<Notification>>;
}
