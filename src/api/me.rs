use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, post},
    Extension, Router,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use super::routes::AppState;
use super::JsonBody;
use crate::auth::{jwt_auth_middleware, require_customer, UserSession};
use crate::error::AppResult;
use crate::models::{
    CreateMealLogRequest, CustomerResponse, DailyNutritionSummary, Device, MealLog,
    Notification, NotificationQuery, NutritionDayQuery, RegisterDeviceRequest, TrainingPlan,
    TrainingPlanDetail,
};

/// Everything a signed-in customer can see or do about themselves
pub fn me_routes(state: &AppState) -> Router {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/training-plans", get(list_training_plans))
        .route("/training-plans/:id", get(get_training_plan))
        .route("/devices", post(register_device))
        .route("/devices/:token", delete(unregister_device))
        .route("/notifications", get(list_notifications))
        .route("/notifications/:id/read", post(mark_notification_read))
        .route("/nutrition", get(list_meals).post(log_meal))
        .route("/nutrition/summary", get(nutrition_summary))
        .route("/nutrition/:id", delete(delete_meal))
        .route_layer(middleware::from_fn(require_customer))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state.clone())
}

#[tracing::instrument(skip(state, session), fields(customer_id = %session.user_id))]
async fn get_profile(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<CustomerResponse>> {
    Ok(Json(
        state
            .customer_service
            .get_own_profile(session.user_id)
            .await?,
    ))
}

#[tracing::instrument(skip(state, session), fields(customer_id = %session.user_id))]
async fn list_training_plans(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<Vec<TrainingPlan>>> {
    Ok(Json(
        state
            .training_plan_service
            .list_own(session.user_id)
            .await?,
    ))
}

#[tracing::instrument(skip(state, session), fields(customer_id = %session.user_id))]
async fn get_training_plan(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(plan_id): Path<Uuid>,
) -> AppResult<Json<TrainingPlanDetail>> {
    Ok(Json(
        state
            .training_plan_service
            .get_own(session.user_id, plan_id)
            .await?,
    ))
}

/// Register or re-assign an FCM token to the caller
#[tracing::instrument(skip(state, session, request), fields(customer_id = %session.user_id))]
async fn register_device(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    WithRejection(Json(request), _): JsonBody<RegisterDeviceRequest>,
) -> AppResult<(StatusCode, Json<Device>)> {
    let device = state
        .notification_service
        .register_device(session.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(device)))
}

#[tracing::instrument(skip(state, session, token), fields(customer_id = %session.user_id))]
async fn unregister_device(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(token): Path<String>,
) -> AppResult<StatusCode> {
    state
        .notification_service
        .unregister_device(session.user_id, &token)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state, session), fields(customer_id = %session.user_id))]
async fn list_notifications(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    Ok(Json(
        state
            .notification_service
            .list(session.user_id, query)
            .await?,
    ))
}

#[tracing::instrument(skip(state, session), fields(customer_id = %session.user_id))]
async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(notification_id): Path<Uuid>,
) -> AppResult<Json<Notification>> {
    Ok(Json(
        state
            .notification_service
            .mark_read(session.user_id, notification_id)
            .await?,
    ))
}

#[tracing::instrument(skip(state, session), fields(customer_id = %session.user_id))]
async fn list_meals(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<NutritionDayQuery>,
) -> AppResult<Json<Vec<MealLog>>> {
    Ok(Json(
        state
            .nutrition_service
            .list_day(session.user_id, query.date)
            .await?,
    ))
}

#[tracing::instrument(skip(state, session, request), fields(customer_id = %session.user_id))]
async fn log_meal(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    WithRejection(Json(request), _): JsonBody<CreateMealLogRequest>,
) -> AppResult<(StatusCode, Json<MealLog>)> {
    let entry = state
        .nutrition_service
        .log_meal(session.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[tracing::instrument(skip(state, session), fields(customer_id = %session.user_id))]
async fn delete_meal(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state
        .nutrition_service
        .delete_entry(session.user_id, entry_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state, session), fields(customer_id = %session.user_id))]
async fn nutrition_summary(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<NutritionDayQuery>,
) -> AppResult<Json<DailyNutritionSummary>> {
    Ok(Json(
        state
            .nutrition_service
            .summary(session.user_id, query.date)
            .await?,
    ))
}
