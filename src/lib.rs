//! Campus access service library.
//! Role-based access control, time-bounded permission grants, and the
//! account validation workflow behind an educational platform API.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
