use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use super::routes::AppState;
use super::JsonBody;
use crate::auth::{jwt_auth_middleware, require_coach, MessageResponse, UserSession};
use crate::error::AppResult;
use crate::models::{
    CreateCustomerRequest, CustomerResponse, DailyNutritionSummary, NotificationDispatch,
    NutritionDayQuery, PaginationQuery, SendNotificationRequest, TrainingPlan,
    TrainingPlanDetail, TrainingPlanRequest, UpdateCustomerRequest,
};

/// A coach's customers and everything hanging off them
pub fn customer_routes(state: &AppState) -> Router {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/:id/invite", post(resend_invite))
        .route(
            "/:id/training-plans",
            get(list_training_plans).post(create_training_plan),
        )
        .route("/:id/notifications", post(send_notification))
        .route("/:id/nutrition", get(nutrition_summary))
        .route_layer(middleware::from_fn(require_coach))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state.clone())
}

#[tracing::instrument(skip(state, session), fields(coach_id = %session.user_id))]
async fn list_customers(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Query(pagination): Query<PaginationQuery>,
) -> AppResult<Json<Vec<CustomerResponse>>> {
    Ok(Json(
        state
            .customer_service
            .list(session.user_id, pagination)
            .await?,
    ))
}

/// Create a customer; the invite goes out through the event bus
#[tracing::instrument(skip(state, session, request), fields(coach_id = %session.user_id))]
async fn create_customer(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    WithRejection(Json(request), _): JsonBody<CreateCustomerRequest>,
) -> AppResult<(StatusCode, Json<CustomerResponse>)> {
    let customer = state
        .customer_service
        .create(session.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

#[tracing::instrument(skip(state, session), fields(coach_id = %session.user_id))]
async fn get_customer(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<CustomerResponse>> {
    Ok(Json(
        state
            .customer_service
            .get(session.user_id, customer_id)
            .await?,
    ))
}

#[tracing::instrument(skip(state, session, request), fields(coach_id = %session.user_id))]
async fn update_customer(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(customer_id): Path<Uuid>,
    WithRejection(Json(request), _): JsonBody<UpdateCustomerRequest>,
) -> AppResult<Json<CustomerResponse>> {
    Ok(Json(
        state
            .customer_service
            .update(session.user_id, customer_id, request)
            .await?,
    ))
}

#[tracing::instrument(skip(state, session), fields(coach_id = %session.user_id))]
async fn delete_customer(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state
        .customer_service
        .delete(session.user_id, customer_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state, session), fields(coach_id = %session.user_id))]
async fn resend_invite(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state
        .customer_service
        .resend_invite(session.user_id, customer_id)
        .await?;
    Ok(Json(MessageResponse::new("Invite sent")))
}

#[tracing::instrument(skip(state, session), fields(coach_id = %session.user_id))]
async fn list_training_plans(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<Vec<TrainingPlan>>> {
    Ok(Json(
        state
            .training_plan_service
            .list_for_customer(session.user_id, customer_id)
            .await?,
    ))
}

#[tracing::instrument(skip(state, session, request), fields(coach_id = %session.user_id))]
async fn create_training_plan(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(customer_id): Path<Uuid>,
    WithRejection(Json(request), _): JsonBody<TrainingPlanRequest>,
) -> AppResult<(StatusCode, Json<TrainingPlanDetail>)> {
    let plan = state
        .training_plan_service
        .create(session.user_id, customer_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

#[tracing::instrument(skip(state, session, request), fields(coach_id = %session.user_id))]
async fn send_notification(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(customer_id): Path<Uuid>,
    WithRejection(Json(request), _): JsonBody<SendNotificationRequest>,
) -> AppResult<(StatusCode, Json<NotificationDispatch>)> {
    let dispatch = state
        .notification_service
        .send_to_customer(session.user_id, customer_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(dispatch)))
}

#[tracing::instrument(skip(state, session), fields(coach_id = %session.user_id))]
async fn nutrition_summary(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(customer_id): Path<Uuid>,
    Query(query): Query<NutritionDayQuery>,
) -> AppResult<Json<DailyNutritionSummary>> {
    Ok(Json(
        state
            .nutrition_service
            .summary_for_coach(session.user_id, customer_id, query.date)
            .await?,
    ))
}
