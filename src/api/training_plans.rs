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
use crate::models::{TrainingPlanDetail, TrainingPlanRequest};
use crate::services::TrainingPlanService;

/// Plans addressed directly by id; creation lives under the customer
pub fn training_plan_routes(state: &AppState) -> Router {
    Router::new()
        .route("/:id", get(get_plan).put(update_plan).delete(delete_plan))
        .route_layer(middleware::from_fn(require_coach))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state.training_plan_service.clone())
}

#[tracing::instrument(skip(plans, session), fields(coach_id = %session.user_id))]
async fn get_plan(
    State(plans): State<TrainingPlanService>,
    Extension(session): Extension<UserSession>,
    Path(plan_id): Path<Uuid>,
) -> AppResult<Json<TrainingPlanDetail>> {
    Ok(Json(plans.get(session.user_id, plan_id).await?))
}

/// Full replacement of the plan's trainings and diets
#[tracing::instrument(skip(plans, session, request), fields(coach_id = %session.user_id))]
async fn update_plan(
    State(plans): State<TrainingPlanService>,
    Extension(session): Extension<UserSession>,
    Path(plan_id): Path<Uuid>,
    WithRejection(Json(request), _): JsonBody<TrainingPlanRequest>,
) -> AppResult<Json<TrainingPlanDetail>> {
    Ok(Json(plans.update(session.user_id, plan_id, request).await?))
}

#[tracing::instrument(skip(plans, session), fields(coach_id = %session.user_id))]
async fn delete_plan(
    State(plans): State<TrainingPlanService>,
    Extension(session): Extension<UserSession>,
    Path(plan_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    plans.delete(session.user_id, plan_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{body_json, customer, request, token_for, TestApp};
    use crate::auth::UserRole;
    use crate::models::TrainingPlanDetail;
    use axum::http::{Method, StatusCode};
    use chrono::{NaiveDate, Utc};
    use serde_json::json;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn plan(id: Uuid, customer_id: Uuid) -> TrainingPlanDetail {
        let now = Utc::now();
        TrainingPlanDetail {
            id,
            customer_id,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            notes: None,
            created: now,
            modified: now,
            trainings: Vec::new(),
            diets: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_coach_reads_plan_of_own_customer() {
        let customer_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let mut test_app = TestApp::new();
        test_app
            .plans
            .expect_find_detail()
            .returning(move |id| Ok(Some(plan(id, customer_id))));
        test_app
            .customers
            .expect_find_for_coach()
            .returning(|coach_id, id| Ok(Some(customer(id, coach_id))));
        let app = test_app.router();
        let token = token_for(Uuid::new_v4(), UserRole::Coach);

        let response = app
            .oneshot(request(
                Method::GET,
                &format!("/api/training-plans/{plan_id}"),
                Some(&token),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], plan_id.to_string());
        assert_eq!(body["start_date"], "2024-03-01");
    }

    #[tokio::test]
    async fn test_plan_of_foreign_customer_is_hidden() {
        let mut test_app = TestApp::new();
        test_app
            .plans
            .expect_find_detail()
            .returning(|id| Ok(Some(plan(id, Uuid::new_v4()))));
        test_app.customers.expect_find_for_coach().returning(|_, _| Ok(None));
        test_app.plans.expect_soft_delete().never();
        let app = test_app.router();
        let token = token_for(Uuid::new_v4(), UserRole::Coach);

        let response = app
            .oneshot(request(
                Method::DELETE,
                &format!("/api/training-plans/{}", Uuid::new_v4()),
                Some(&token),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_inverted_dates_are_rejected() {
        let customer_id = Uuid::new_v4();
        let mut test_app = TestApp::new();
        test_app
            .plans
            .expect_find_detail()
            .returning(move |id| Ok(Some(plan(id, customer_id))));
        test_app
            .customers
            .expect_find_for_coach()
            .returning(|coach_id, id| Ok(Some(customer(id, coach_id))));
        test_app.plans.expect_replace().never();
        let app = test_app.router();
        let token = token_for(Uuid::new_v4(), UserRole::Coach);

        let response = app
            .oneshot(request(
                Method::PUT,
                &format!("/api/training-plans/{}", Uuid::new_v4()),
                Some(&token),
                Some(json!({
                    "start_date": "2024-04-01",
                    "end_date": "2024-03-01",
                    "trainings": []
                })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
