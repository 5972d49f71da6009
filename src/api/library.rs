use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, put},
    Extension, Router,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use super::routes::AppState;
use super::JsonBody;
use crate::auth::{jwt_auth_middleware, require_coach, UserSession};
use crate::error::AppResult;
use crate::models::{
    CreateExerciseRequest, Exercise, ExerciseQuery, MuscleGroup, UpdateExerciseRequest,
};
use crate::services::LibraryService;

/// Muscle groups and the exercise catalog: shared entries plus the coach's own
pub fn library_routes(state: &AppState) -> Router {
    Router::new()
        .route("/muscle-groups", get(list_muscle_groups))
        .route("/exercises", get(list_exercises).post(create_exercise))
        .route("/exercises/:id", put(update_exercise).delete(delete_exercise))
        .route_layer(middleware::from_fn(require_coach))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state.library_service.clone())
}

#[tracing::instrument(skip(library_service))]
async fn list_muscle_groups(
    State(library_service): State<LibraryService>,
) -> AppResult<Json<Vec<MuscleGroup>>> {
    Ok(Json(library_service.muscle_groups().await?))
}

#[tracing::instrument(skip(library_service, session), fields(coach_id = %session.user_id))]
async fn list_exercises(
    State(library_service): State<LibraryService>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<ExerciseQuery>,
) -> AppResult<Json<Vec<Exercise>>> {
    Ok(Json(library_service.list_exercises(session.user_id, query).await?))
}

#[tracing::instrument(skip(library_service, session, request), fields(coach_id = %session.user_id))]
async fn create_exercise(
    State(library_service): State<LibraryService>,
    Extension(session): Extension<UserSession>,
    WithRejection(Json(request), _): JsonBody<CreateExerciseRequest>,
) -> AppResult<(StatusCode, Json<Exercise>)> {
    let exercise = library_service.create_exercise(session.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

#[tracing::instrument(skip(library_service, session, request), fields(coach_id = %session.user_id))]
async fn update_exercise(
    State(library_service): State<LibraryService>,
    Extension(session): Extension<UserSession>,
    Path(exercise_id): Path<Uuid>,
    WithRejection(Json(request), _): JsonBody<UpdateExerciseRequest>,
) -> AppResult<Json<Exercise>> {
    Ok(Json(
        library_service
            .update_exercise(session.user_id, exercise_id, request)
            .await?,
    ))
}

#[tracing::instrument(skip(library_service, session), fields(coach_id = %session.user_id))]
async fn delete_exercise(
    State(library_service): State<LibraryService>,
    Extension(session): Extension<UserSession>,
    Path(exercise_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    library_service.delete_exercise(session.user_id, exercise_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
