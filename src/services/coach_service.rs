use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthError;
use crate::error::{AppError, AppResult};
use crate::models::{CoachProfile, UpdateCoachProfileRequest};
use crate::repositories::CoachRepository;

#[derive(Clone)]
pub struct CoachService {
    coaches: Arc<dyn CoachRepository>,
}

impl CoachService {
    pub fn new(coaches: Arc<dyn CoachRepository>) -> Self {
        Self { coaches }
    }

    pub async fn get_profile(&self, coach_id: Uuid) -> AppResult<CoachProfile> {
        let coach = self
            .coaches
            .find_by_id(coach_id)
            .await?
            .ok_or(AppError::NotFound("Coach"))?;

        Ok(coach.into())
    }

    pub async fn update_profile(
        &self,
        coach_id: Uuid,
        request: UpdateCoachProfileRequest,
    ) -> AppResult<CoachProfile> {
        request.validate()?;

        if let Some(email) = request.email.as_deref() {
            if let Some(existing) = self.coaches.find_by_email(email).await? {
                if existing.id != coach_id {
                    return Err(AuthError::UsernameIsTaken.into());
                }
            }
        }

        let coach = self
            .coaches
            .update_profile(coach_id, request)
            .await?
            .ok_or(AppError::NotFound("Coach"))?;

        Ok(coach.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coach;
    use crate::repositories::MockCoachRepository;
    use assert_matches::assert_matches;
    use chrono::Utc;

    fn coach(id: Uuid, email: &str) -> Coach {
        Coach {
            id,
            email: email.to_string(),
            password_hash: "hash".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Coach".to_string(),
            created: Utc::now(),
            modified: Utc::now(),
            deleted: None,
        }
    }

    #[tokio::test]
    async fn test_email_of_another_coach_is_rejected() {
        let me = Uuid::new_v4();
        let mut coaches = MockCoachRepository::new();
        coaches
            .expect_find_by_email()
            .returning(|email| Ok(Some(coach(Uuid::new_v4(), email))));
        coaches.expect_update_profile().never();

        let service = CoachService::new(Arc::new(coaches));
        let result = service
            .update_profile(
                me,
                UpdateCoachProfileRequest {
                    email: Some("taken@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert_matches!(result, Err(AppError::Auth(AuthError::UsernameIsTaken)));
    }

    #[tokio::test]
    async fn test_keeping_own_email_is_fine() {
        let me = Uuid::new_v4();
        let mut coaches = MockCoachRepository::new();
        coaches
            .expect_find_by_email()
            .returning(move |email| Ok(Some(coach(me, email))));
        coaches
            .expect_update_profile()
            .returning(move |id, update| {
                let mut updated = coach(id, "coach@example.com");
                updated.first_name = update.first_name.unwrap_or(updated.first_name);
                Ok(Some(updated))
            });

        let service = CoachService::new(Arc::new(coaches));
        let profile = service
            .update_profile(
                me,
                UpdateCoachProfileRequest {
                    email: Some("coach@example.com".to_string()),
                    first_name: Some("Grace".to_string()),
                    last_name: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.id, me);
        assert_eq!(profile.first_name, "Grace");
    }

    #[tokio::test]
    async fn test_missing_coach() {
        let mut coaches = MockCoachRepository::new();
        coaches.expect_find_by_id().returning(|_| Ok(None));

        let service = CoachService::new(Arc::new(coaches));
        assert_matches!(
            service.get_profile(Uuid::new_v4()).await,
            Err(AppError::NotFound("Coach"))
        );
    }
}
