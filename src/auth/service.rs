use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::password::{hash_password, token_digest, verify_password};
use crate::auth::{
    AcceptInviteRequest, AuthError, AuthResponse, ChangePasswordRequest, CoachSignupRequest,
    JwtService, LoginRequest, MessageResponse, RefreshTokenRequest, TokenKind, TokenResponse,
    UserInfo, UserRole, UserSession,
};
use crate::models::NewCoach;
use crate::repositories::{CoachRepository, CustomerRepository, SessionRepository};

/// Sign-up, login and session lifecycle for coaches and customers
#[derive(Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    coaches: Arc<dyn CoachRepository>,
    customers: Arc<dyn CustomerRepository>,
    sessions: Arc<dyn SessionRepository>,
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// bcrypt is CPU bound; keep it off the async workers
async fn hash_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Internal(e.into()))?
        .map_err(AuthError::from)
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::Internal(e.into()))?
        .map_err(AuthError::from)
}

impl AuthService {
    pub fn new(
        jwt_secret: &str,
        coaches: Arc<dyn CoachRepository>,
        customers: Arc<dyn CustomerRepository>,
        sessions: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            jwt_service: JwtService::new(jwt_secret),
            coaches,
            customers,
            sessions,
        }
    }

    /// Register a new coach
    pub async fn signup_coach(&self, request: CoachSignupRequest) -> Result<AuthResponse, AuthError> {
        if self.coaches.find_by_email(&request.email).await?.is_some() {
            return Err(AuthError::UsernameIsTaken);
        }

        let password_hash = hash_blocking(request.password).await?;
        let coach = self
            .coaches
            .create(NewCoach {
                email: request.email.trim().to_string(),
                password_hash,
                first_name: request.first_name,
                last_name: request.last_name,
            })
            .await
            .map_err(|err| {
                // lost a race against a concurrent signup
                if is_unique_violation(&err) {
                    AuthError::UsernameIsTaken
                } else {
                    AuthError::Database(err)
                }
            })?;

        tracing::info!(coach_id = %coach.id, "coach signed up");

        self.issue_tokens(UserInfo {
            id: coach.id,
            email: coach.email,
            role: UserRole::Coach,
            first_name: coach.first_name,
            last_name: coach.last_name,
            created: coach.created,
        })
        .await
    }

    pub async fn login_coach(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let coach = self
            .coaches
            .find_by_email(&request.email)
            .await?
            .ok_or(AuthError::UserDoesNotExist)?;

        if !verify_blocking(request.password, coach.password_hash.clone()).await? {
            return Err(AuthError::NotValidCredentials);
        }

        self.issue_tokens(UserInfo {
            id: coach.id,
            email: coach.email,
            role: UserRole::Coach,
            first_name: coach.first_name,
            last_name: coach.last_name,
            created: coach.created,
        })
        .await
    }

    pub async fn login_customer(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let customer = self
            .customers
            .find_by_email(&request.email)
            .await?
            .ok_or(AuthError::UserDoesNotExist)?;

        let password_hash = customer
            .password_hash
            .clone()
            .ok_or(AuthError::InviteNotAccepted)?;

        if !verify_blocking(request.password, password_hash).await? {
            return Err(AuthError::NotValidCredentials);
        }

        self.issue_tokens(UserInfo {
            id: customer.id,
            email: customer.email,
            role: UserRole::Customer,
            first_name: customer.first_name,
            last_name: customer.last_name,
            created: customer.created,
        })
        .await
    }

    /// Set the customer's first password from an invite token and log them in
    pub async fn accept_invite(&self, request: AcceptInviteRequest) -> Result<AuthResponse, AuthError> {
        let customer = self
            .customers
            .find_by_invite_digest(&token_digest(&request.token))
            .await?
            .ok_or(AuthError::InvalidInvite)?;

        if !customer.invite_is_valid_at(Utc::now()) {
            return Err(AuthError::InvalidInvite);
        }

        let password_hash = hash_blocking(request.password).await?;
        self.customers.accept_invite(customer.id, &password_hash).await?;

        tracing::info!(customer_id = %customer.id, "customer accepted invite");

        self.issue_tokens(UserInfo {
            id: customer.id,
            email: customer.email,
            role: UserRole::Customer,
            first_name: customer.first_name,
            last_name: customer.last_name,
            created: customer.created,
        })
        .await
    }

    /// Exchange a refresh token for a new pair; the old refresh token is spent
    pub async fn refresh_token(&self, request: RefreshTokenRequest) -> Result<TokenResponse, AuthError> {
        let claims = self
            .jwt_service
            .validate_kind(&request.refresh_token, TokenKind::Refresh)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        if !self
            .sessions
            .consume_refresh_token(user_id, &token_digest(&request.refresh_token))
            .await?
        {
            tracing::warn!(%user_id, "refresh token reused or revoked");
            return Err(AuthError::InvalidToken);
        }

        let (access_token, refresh_token) =
            self.issue_token_pair(user_id, &claims.email, claims.role).await?;

        Ok(TokenResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_expires_in_seconds(),
        })
    }

    /// Blacklist the access token and revoke every refresh token of the user
    pub async fn logout(&self, session: &UserSession) -> Result<MessageResponse, AuthError> {
        let expires_at = timestamp_to_datetime(session.exp)?;
        self.sessions.blacklist_token(&session.jti, expires_at).await?;
        self.sessions.revoke_user_refresh_tokens(session.user_id).await?;

        Ok(MessageResponse::new("Successfully logged out"))
    }

    pub async fn change_password(
        &self,
        session: &UserSession,
        request: ChangePasswordRequest,
    ) -> Result<MessageResponse, AuthError> {
        let current_hash = match session.role {
            UserRole::Coach => self
                .coaches
                .find_by_id(session.user_id)
                .await?
                .map(|coach| coach.password_hash),
            UserRole::Customer => self
                .customers
                .find_by_id(session.user_id)
                .await?
                .and_then(|customer| customer.password_hash),
        }
        .ok_or(AuthError::UserDoesNotExist)?;

        if !verify_blocking(request.current_password, current_hash).await? {
            return Err(AuthError::NotValidCredentials);
        }

        let new_hash = hash_blocking(request.new_password).await?;
        match session.role {
            UserRole::Coach => self.coaches.update_password(session.user_id, &new_hash).await?,
            UserRole::Customer => {
                self.customers
                    .update_password(session.user_id, &new_hash)
                    .await?
            }
        }

        // Other devices have to log in again.
        self.sessions.revoke_user_refresh_tokens(session.user_id).await?;

        Ok(MessageResponse::new("Password changed"))
    }

    /// Validate user session from token
    pub async fn validate_session(&self, token: &str) -> Result<UserSession, AuthError> {
        let session = self.jwt_service.extract_user_session(token)?;

        if self.sessions.is_token_blacklisted(&session.jti).await? {
            return Err(AuthError::InvalidToken);
        }

        Ok(session)
    }

    /// Mint an access/refresh pair and register the refresh token
    async fn issue_token_pair(
        &self,
        user_id: Uuid,
        email: &str,
        role: UserRole,
    ) -> Result<(String, String), AuthError> {
        let (access_token, refresh_token) =
            self.jwt_service.create_token_pair(user_id, email, role)?;

        let refresh_claims = self.jwt_service.validate_token(&refresh_token)?;
        self.sessions
            .store_refresh_token(
                user_id,
                &token_digest(&refresh_token),
                timestamp_to_datetime(refresh_claims.exp)?,
            )
            .await?;

        Ok((access_token, refresh_token))
    }

    async fn issue_tokens(&self, user: UserInfo) -> Result<AuthResponse, AuthError> {
        let (access_token, refresh_token) =
            self.issue_token_pair(user.id, &user.email, user.role).await?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_expires_in_seconds(),
            user,
        })
    }
}

fn timestamp_to_datetime(exp: usize) -> Result<DateTime<Utc>, AuthError> {
    DateTime::from_timestamp(exp as i64, 0).ok_or(AuthError::InvalidToken)
}
