//! Admin authentication
//!
//! - Email/password admins with bcrypt hashes
//! - JWT access tokens carrying a `jti`
//! - Server-side sessions keyed by `jti`, revoked on signout

mod jwt;
mod model;
mod password;
mod service;

pub use jwt::{generate_access_token, verify_token, Claims, JwtError};
pub use model::*;
pub use password::{hash_password, verify_password};
pub use service::{AuthError, AuthService};
