//! Coaching backend: coaches manage customers, training plans and diets;
//! customers follow their plans, log meals and receive push notifications.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;
pub mod suppliers;
