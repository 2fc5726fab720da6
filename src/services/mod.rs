pub mod auth_service;
pub mod grant_service;
pub mod validation_service;

pub use auth_service::AuthService;
pub use grant_service::GrantService;
pub use validation_service::ValidationService;
