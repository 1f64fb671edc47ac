//! Authentication for the marketplace HTTP API.
//!
//! A request is authenticated in two steps: a [`TokenValidator`] turns the bearer
//! token into [`Claims`], then a [`SubjectResolver`] turns the claimed subject into
//! a [`SecurityContext`](marketplace_security::SecurityContext) carrying the
//! subject's memberships.

pub mod claims;
pub mod errors;
pub mod traits;
pub mod validator;

#[cfg(feature = "axum-ext")]
pub mod axum_ext;

pub use claims::Claims;
pub use errors::AuthError;
pub use traits::{SubjectResolver, TokenValidator};
pub use validator::{HmacJwtValidator, JwtSettings};

#[cfg(feature = "axum-ext")]
pub use axum_ext::{AuthState, Authz, require_auth};
