// API routes and handlers

pub mod auth;
pub mod coach;
pub mod customers;
pub mod diets;
pub mod health;
pub mod library;
pub mod me;
pub mod routes;
pub mod training_plans;

#[cfg(test)]
pub(crate) mod test_support;

use axum::Json;
use axum_extra::extract::WithRejection;

use crate::error::AppError;

/// JSON request body whose parse failures render like every other API error
pub type JsonBody<T> = WithRejection<Json<T>, AppError>;
