use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::get,
    Extension, Router,
};
use axum_extra::extract::WithRejection;

use super::routes::AppState;
use super::JsonBody;
use crate::auth::{jwt_auth_middleware, require_coach, UserSession};
use crate::error::AppResult;
use crate::models::{CoachProfile, UpdateCoachProfileRequest};
use crate::services::CoachService;

/// The signed-in coach's own account
pub fn coach_routes(state: &AppState) -> Router {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route_layer(middleware::from_fn(require_coach))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state.coach_service.clone())
}

#[tracing::instrument(skip(coach_service, session), fields(coach_id = %session.user_id))]
async fn get_profile(
    State(coach_service): State<CoachService>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<CoachProfile>> {
    Ok(Json(coach_service.get_profile(session.user_id).await?))
}

#[tracing::instrument(skip(coach_service, session, request), fields(coach_id = %session.user_id))]
async fn update_profile(
    State(coach_service): State<CoachService>,
    Extension(session): Extension<UserSession>,
    WithRejection(Json(request), _): JsonBody<UpdateCoachProfileRequest>,
) -> AppResult<Json<CoachProfile>> {
    Ok(Json(coach_service.update_profile(session.user_id, request).await?))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{body_json, coach, request, token_for, TestApp};
    use crate::auth::UserRole;
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_coach_reads_own_profile() {
        let coach_id = Uuid::new_v4();
        let mut test_app = TestApp::new();
        test_app
            .coaches
            .expect_find_by_id()
            .returning(|id| Ok(Some(coach(id))));
        let app = test_app.router();
        let token = token_for(coach_id, UserRole::Coach);

        let response = app
            .oneshot(request(Method::GET, "/api/coach/profile", Some(&token), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], coach_id.to_string());
        assert_eq!(body["first_name"], "Ada");
    }

    #[tokio::test]
    async fn test_customers_cannot_use_coach_routes() {
        let app = TestApp::new().router();
        let token = token_for(Uuid::new_v4(), UserRole::Customer);

        let response = app
            .oneshot(request(Method::GET, "/api/coach/profile", Some(&token), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let app = TestApp::new().router();

        let response = app
            .oneshot(request(Method::GET, "/api/coach/profile", Some("not-a-jwt"), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
