//! Bearer-token authentication against an OpenID provider's JWKS.

pub mod jwks;
pub mod jwt;
pub mod middleware;

pub use jwks::{JwksKeySource, KeySource, StaticKeySource};
pub use jwt::{AuthError, Claims, JwtVerifier};
pub use middleware::{AuthUser, extract_bearer_token, optional_auth_middleware};
