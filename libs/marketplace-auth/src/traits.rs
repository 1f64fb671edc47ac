use async_trait::async_trait;
use marketplace_security::SecurityContext;
use uuid::Uuid;

use crate::{claims::Claims, errors::AuthError};

/// Verifies a bearer token and returns its claims.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<Claims, AuthError>;
}

/// Loads the memberships of an authenticated subject.
///
/// Implementations return [`AuthError::UnknownSubject`] for users that do not
/// exist and [`AuthError::InactiveUser`] for deactivated ones.
#[async_trait]
pub trait SubjectResolver: Send + Sync {
    async fn resolve(&self, subject_id: Uuid) -> Result<SecurityContext, AuthError>;
}
