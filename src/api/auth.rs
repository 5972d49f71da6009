use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::post,
    Extension, Router,
};
use axum_extra::extract::WithRejection;
use validator::Validate;

use super::routes::AppState;
use super::JsonBody;
use crate::auth::{
    jwt_auth_middleware, rate_limit_middleware, AcceptInviteRequest, AuthResponse, AuthService,
    ChangePasswordRequest, CoachSignupRequest, LoginRequest, MessageResponse,
    RefreshTokenRequest, TokenResponse, UserSession,
};
use crate::error::AppResult;

/// Authentication routes
pub fn auth_routes(state: &AppState) -> Router {
    let auth_service = state.auth_service.clone();

    let credentials = Router::new()
        .route("/coach/signup", post(coach_signup))
        .route("/coach/login", post(coach_login))
        .route("/customer/login", post(customer_login))
        .route("/customer/accept-invite", post(accept_invite))
        .route_layer(middleware::from_fn_with_state(
            state.login_rate_limiter.clone(),
            rate_limit_middleware,
        ));

    let session = Router::new()
        .route("/logout", post(logout))
        .route("/change-password", post(change_password))
        .route_layer(middleware::from_fn_with_state(
            auth_service.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .route("/refresh", post(refresh_token))
        .merge(credentials)
        .merge(session)
        .with_state(auth_service)
}

/// Register a new coach account
#[tracing::instrument(skip(auth_service, request))]
async fn coach_signup(
    State(auth_service): State<AuthService>,
    WithRejection(Json(request), _): JsonBody<CoachSignupRequest>,
) -> AppResult<Json<AuthResponse>> {
    request.validate()?;
    Ok(Json(auth_service.signup_coach(request).await?))
}

#[tracing::instrument(skip(auth_service, request))]
async fn coach_login(
    State(auth_service): State<AuthService>,
    WithRejection(Json(request), _): JsonBody<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    request.validate()?;
    Ok(Json(auth_service.login_coach(request).await?))
}

#[tracing::instrument(skip(auth_service, request))]
async fn customer_login(
    State(auth_service): State<AuthService>,
    WithRejection(Json(request), _): JsonBody<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    request.validate()?;
    Ok(Json(auth_service.login_customer(request).await?))
}

/// Set the first password from an invite link and sign the customer in
#[tracing::instrument(skip(auth_service, request))]
async fn accept_invite(
    State(auth_service): State<AuthService>,
    WithRejection(Json(request), _): JsonBody<AcceptInviteRequest>,
) -> AppResult<Json<AuthResponse>> {
    request.validate()?;
    Ok(Json(auth_service.accept_invite(request).await?))
}

#[tracing::instrument(skip(auth_service, request))]
async fn refresh_token(
    State(auth_service): State<AuthService>,
    WithRejection(Json(request), _): JsonBody<RefreshTokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    Ok(Json(auth_service.refresh_token(request).await?))
}

#[tracing::instrument(skip(auth_service, session), fields(user_id = %session.user_id))]
async fn logout(
    State(auth_service): State<AuthService>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<MessageResponse>> {
    Ok(Json(auth_service.logout(&session).await?))
}

#[tracing::instrument(skip(auth_service, session, request), fields(user_id = %session.user_id))]
async fn change_password(
    State(auth_service): State<AuthService>,
    Extension(session): Extension<UserSession>,
    WithRejection(Json(request), _): JsonBody<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    Ok(Json(auth_service.change_password(&session, request).await?))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{body_json, request, token_for, TestApp};
    use crate::auth::UserRole;
    use crate::config::RateLimitSettings;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use std::time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_signup_rejects_malformed_email_before_touching_storage() {
        let app = TestApp::new().router();

        let response = app
            .oneshot(request(
                Method::POST,
                "/api/auth/coach/signup",
                None,
                Some(json!({
                    "email": "not-an-email",
                    "password": "Str0ng!Passw0rd",
                    "first_name": "Ada",
                    "last_name": "Trainer"
                })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Validation failed");
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_validation_error() {
        let app = TestApp::new().router();

        let response = app
            .oneshot(request(
                Method::POST,
                "/api/auth/coach/login",
                None,
                Some(json!({ "email": "coach@example.com" })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Validation failed");
    }

    #[tokio::test]
    async fn test_unknown_coach_login_is_not_found() {
        let mut test_app = TestApp::new();
        test_app.coaches.expect_find_by_email().returning(|_| Ok(None));
        let app = test_app.router();

        let response = app
            .oneshot(request(
                Method::POST,
                "/api/auth/coach/login",
                None,
                Some(json!({ "email": "coach@example.com", "password": "whatever" })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_credential_endpoints_are_rate_limited() {
        let mut test_app = TestApp::new();
        test_app.rate_limit = RateLimitSettings {
            max_requests: 1,
            window: Duration::from_secs(60),
        };
        test_app.customers.expect_find_by_email().returning(|_| Ok(None));
        let app = test_app.router();

        let login = || {
            request(
                Method::POST,
                "/api/auth/customer/login",
                None,
                Some(json!({ "email": "client@example.com", "password": "whatever" })),
            )
        };

        let first = app.clone().oneshot(login()).await.unwrap();
        assert_eq!(first.status(), StatusCode::NOT_FOUND);

        let second = app.clone().oneshot(login()).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_logout_requires_a_token() {
        let app = TestApp::new().router();

        let response = app
            .oneshot(request(Method::POST, "/api/auth/logout", None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_blacklists_the_access_token() {
        let mut test_app = TestApp::new();
        test_app.sessions.expect_blacklist_token().times(1).returning(|_, _| Ok(()));
        test_app
            .sessions
            .expect_revoke_user_refresh_tokens()
            .times(1)
            .returning(|_| Ok(()));
        let app = test_app.router();
        let token = token_for(Uuid::new_v4(), UserRole::Customer);

        let response = app
            .oneshot(request(Method::POST, "/api/auth/logout", Some(&token), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
