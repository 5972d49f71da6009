//! Authentication for coaches and customers: JWT sessions, password
//! handling, invite acceptance and the HTTP middleware guarding the API.

pub mod errors;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;

pub use errors::AuthError;
pub use jwt::{extract_bearer_token, JwtService};
pub use middleware::{
    cors_layer, frame_options_layer, jwt_auth_middleware, rate_limit_middleware, require_coach,
    require_customer, security_headers_layer, RateLimiter,
};
pub use models::*;
pub use service::AuthService;
