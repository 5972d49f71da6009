//! Router harness: the full app wired to mock repositories.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::routes::{create_routes, AppState, Repositories};
use crate::auth::{JwtService, UserRole};
use crate::config::{AppConfig, RateLimitSettings};
use crate::models::{Coach, Customer};
use crate::repositories::{
    MockCoachRepository, MockCustomerRepository, MockDietRepository, MockLibraryRepository,
    MockNotificationRepository, MockNutritionRepository, MockSessionRepository,
    MockTrainingPlanRepository,
};
use crate::suppliers::{LogEventPublisher, LogPushSupplier};

pub const TEST_SECRET: &str = "router-test-secret";

pub struct TestApp {
    pub coaches: MockCoachRepository,
    pub customers: MockCustomerRepository,
    pub sessions: MockSessionRepository,
    pub library: MockLibraryRepository,
    pub diets: MockDietRepository,
    pub plans: MockTrainingPlanRepository,
    pub nutrition: MockNutritionRepository,
    pub notifications: MockNotificationRepository,
    pub rate_limit: RateLimitSettings,
}

impl TestApp {
    /// Mocks with no expectations except a clean token blacklist
    pub fn new() -> Self {
        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_is_token_blacklisted()
            .returning(|_| Ok(false));

        Self {
            coaches: MockCoachRepository::new(),
            customers: MockCustomerRepository::new(),
            sessions,
            library: MockLibraryRepository::new(),
            diets: MockDietRepository::new(),
            plans: MockTrainingPlanRepository::new(),
            nutrition: MockNutritionRepository::new(),
            notifications: MockNotificationRepository::new(),
            rate_limit: RateLimitSettings::default(),
        }
    }

    pub fn router(self) -> Router {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            log_level: "debug".to_string(),
            jwt_secret: TEST_SECRET.to_string(),
            login_rate_limit: self.rate_limit,
            firebase: None,
            kafka: None,
        };

        let repos = Repositories {
            coaches: Arc::new(self.coaches),
            customers: Arc::new(self.customers),
            sessions: Arc::new(self.sessions),
            library: Arc::new(self.library),
            diets: Arc::new(self.diets),
            plans: Arc::new(self.plans),
            nutrition: Arc::new(self.nutrition),
            notifications: Arc::new(self.notifications),
        };

        create_routes(AppState::new(
            repos,
            &config,
            Arc::new(LogPushSupplier),
            Arc::new(LogEventPublisher),
        ))
    }
}

pub fn token_for(user_id: Uuid, role: UserRole) -> String {
    JwtService::new(TEST_SECRET)
        .create_access_token(user_id, "someone@example.com", role)
        .unwrap()
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn coach(id: Uuid) -> Coach {
    let now = Utc::now();
    Coach {
        id,
        email: "coach@example.com".to_string(),
        password_hash: "$2b$04$placeholder".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Trainer".to_string(),
        created: now,
        modified: now,
        deleted: None,
    }
}

pub fn customer(id: Uuid, coach_id: Uuid) -> Customer {
    let now = Utc::now();
    Customer {
        id,
        coach_id,
        email: "client@example.com".to_string(),
        password_hash: Some("$2b$04$placeholder".to_string()),
        first_name: "Sam".to_string(),
        last_name: "Lifter".to_string(),
        phone: None,
        birthday: None,
        invite_token_hash: None,
        invite_expires_at: None,
        created: now,
        modified: now,
        deleted: None,
    }
}
