use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Extension, Router,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use super::routes::AppState;
use super::JsonBody;
use crate::auth::{jwt_auth_middleware, require_coach, UserSession};
use crate::error::AppResult;
use crate::models::{CreateDietRequest, Diet, UpdateDietRequest};
use crate::services::DietService;

/// Coach-owned diet templates
pub fn diet_routes(state: &AppState) -> Router {
    Router::new()
        .route("/", get(list_diets).post(create_diet))
        .route("/:id", get(get_diet).put(update_diet).delete(delete_diet))
        .route_layer(middleware::from_fn(require_coach))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state.diet_service.clone())
}

#[tracing::instrument(skip(diet_service, session), fields(coach_id = %session.user_id))]
async fn list_diets(
    State(diet_service): State<DietService>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<Vec<Diet>>> {
    Ok(Json(diet_service.list(session.user_id).await?))
}

#[tracing::instrument(skip(diet_service, session, request), fields(coach_id = %session.user_id))]
async fn create_diet(
    State(diet_service): State<DietService>,
    Extension(session): Extension<UserSession>,
    WithRejection(Json(request), _): JsonBody<CreateDietRequest>,
) -> AppResult<(StatusCode, Json<Diet>)> {
    let diet = diet_service.create(session.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(diet)))
}

#[tracing::instrument(skip(diet_service, session), fields(coach_id = %session.user_id))]
async fn get_diet(
    State(diet_service): State<DietService>,
    Extension(session): Extension<UserSession>,
    Path(diet_id): Path<Uuid>,
) -> AppResult<Json<Diet>> {
    Ok(Json(diet_service.get(session.user_id, diet_id).await?))
}

#[tracing::instrument(skip(diet_service, session, request), fields(coach_id = %session.user_id))]
async fn update_diet(
    State(diet_service): State<DietService>,
    Extension(session): Extension<UserSession>,
    Path(diet_id): Path<Uuid>,
    WithRejection(Json(request), _): JsonBody<UpdateDietRequest>,
) -> AppResult<Json<Diet>> {
    Ok(Json(diet_service.update(session.user_id, diet_id, request).await?))
}

#[tracing::instrument(skip(diet_service, session), fields(coach_id = %session.user_id))]
async fn delete_diet(
    State(diet_service): State<DietService>,
    Extension(session): Extension<UserSession>,
    Path(diet_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    diet_service.delete(session.user_id, diet_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
