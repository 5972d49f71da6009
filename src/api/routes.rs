use std::sync::Arc;

use axum::{routing::get, Router};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use super::auth::auth_routes;
use super::coach::coach_routes;
use super::customers::customer_routes;
use super::diets::diet_routes;
use super::health::health_check;
use super::library::library_routes;
use super::me::me_routes;
use super::training_plans::training_plan_routes;
use crate::auth::{cors_layer, frame_options_layer, security_headers_layer, AuthService, RateLimiter};
use crate::config::{AppConfig, DEFAULT_INVITE_TOPIC};
use crate::repositories::{
    CoachRepository, CustomerRepository, DietRepository, LibraryRepository,
    NotificationRepository, NutritionRepository, PgCoachRepository, PgCustomerRepository,
    PgDietRepository, PgLibraryRepository, PgNotificationRepository, PgNutritionRepository,
    PgSessionRepository, PgTrainingPlanRepository, SessionRepository, TrainingPlanRepository,
};
use crate::services::{
    CoachService, CustomerService, DietService, LibraryService, NotificationService,
    NutritionService, TrainingPlanService,
};
use crate::suppliers::{EventPublisher, PushSupplier};

/// Every persistence seam the services are built from
#[derive(Clone)]
pub struct Repositories {
    pub coaches: Arc<dyn CoachRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub library: Arc<dyn LibraryRepository>,
    pub diets: Arc<dyn DietRepository>,
    pub plans: Arc<dyn TrainingPlanRepository>,
    pub nutrition: Arc<dyn NutritionRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    pub fn postgres(db: PgPool) -> Self {
        Self {
            coaches: Arc::new(PgCoachRepository::new(db.clone())),
            customers: Arc::new(PgCustomerRepository::new(db.clone())),
            sessions: Arc::new(PgSessionRepository::new(db.clone())),
            library: Arc::new(PgLibraryRepository::new(db.clone())),
            diets: Arc::new(PgDietRepository::new(db.clone())),
            plans: Arc::new(PgTrainingPlanRepository::new(db.clone())),
            nutrition: Arc::new(PgNutritionRepository::new(db.clone())),
            notifications: Arc::new(PgNotificationRepository::new(db)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub coach_service: CoachService,
    pub customer_service: CustomerService,
    pub library_service: LibraryService,
    pub diet_service: DietService,
    pub training_plan_service: TrainingPlanService,
    pub nutrition_service: NutritionService,
    pub notification_service: NotificationService,
    pub login_rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        config: &AppConfig,
        push: Arc<dyn PushSupplier>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        let invite_topic = config
            .kafka
            .as_ref()
            .map(|kafka| kafka.invite_topic.clone())
            .unwrap_or_else(|| DEFAULT_INVITE_TOPIC.to_string());

        let notification_service = NotificationService::new(
            repos.notifications.clone(),
            repos.customers.clone(),
            push,
        );

        Self {
            auth_service: AuthService::new(
                &config.jwt_secret,
                repos.coaches.clone(),
                repos.customers.clone(),
                repos.sessions.clone(),
            ),
            coach_service: CoachService::new(repos.coaches.clone()),
            customer_service: CustomerService::new(
                repos.customers.clone(),
                repos.coaches.clone(),
                events,
                invite_topic,
            ),
            library_service: LibraryService::new(repos.library.clone()),
            diet_service: DietService::new(repos.diets.clone()),
            training_plan_service: TrainingPlanService::new(
                repos.plans.clone(),
                repos.customers.clone(),
                repos.library.clone(),
                repos.diets.clone(),
                notification_service.clone(),
            ),
            nutrition_service: NutritionService::new(
                repos.nutrition.clone(),
                repos.plans.clone(),
                repos.customers.clone(),
            ),
            notification_service,
            login_rate_limiter: RateLimiter::from_settings(config.login_rate_limit),
        }
    }
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes(&state))
        .nest("/api/coach", coach_routes(&state))
        .nest("/api/customers", customer_routes(&state))
        .nest("/api/training-plans", training_plan_routes(&state))
        .nest("/api/library", library_routes(&state))
        .nest("/api/diets", diet_routes(&state))
        .nest("/api/me", me_routes(&state))
        .layer(security_headers_layer())
        .layer(frame_options_layer())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{body_json, TestApp};
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_is_public() {
        let app = TestApp::new().router();

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "coach-hub");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = TestApp::new().router();

        let response = app
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
