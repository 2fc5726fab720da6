//! Domain models and request/response DTOs

pub mod role;
pub mod user;
pub mod validation;
