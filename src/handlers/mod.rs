pub mod auth;
pub mod health;
pub mod permission;
pub mod user;
pub mod validation;
