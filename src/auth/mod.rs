pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{AccessClaims, JwtService, RefreshClaims, TokenPair};
pub use middleware::{
    jwt_auth_middleware, optional_auth_middleware, require_administrator, require_role,
    AuthContext,
};
pub use password::PasswordHasher;
