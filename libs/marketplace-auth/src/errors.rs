use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required: missing bearer token")]
    Unauthenticated,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Unknown subject")]
    UnknownSubject,

    #[error("Inactive user")]
    InactiveUser,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> http::StatusCode {
        match self {
            Self::Unauthenticated | Self::InvalidToken(_) | Self::TokenExpired | Self::UnknownSubject => {
                http::StatusCode::UNAUTHORIZED
            }
            Self::InactiveUser => http::StatusCode::FORBIDDEN,
            Self::Internal(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "auth.missing_token",
            Self::InvalidToken(_) => "auth.invalid_token",
            Self::TokenExpired => "auth.token_expired",
            Self::UnknownSubject => "auth.unknown_subject",
            Self::InactiveUser => "auth.inactive_user",
            Self::Internal(_) => "auth.internal",
        }
    }

    /// Problem body for this error. Internal details are not echoed to the client.
    pub fn to_problem(&self) -> marketplace_errors::Problem {
        let status = self.status();
        let (title, detail) = match self {
            Self::Internal(_) => ("Internal Server Error", "authentication backend failure".to_owned()),
            Self::InactiveUser => ("Forbidden", self.to_string()),
            _ => ("Unauthorized", self.to_string()),
        };
        marketplace_errors::Problem::new(status, title, detail).with_code(self.code())
    }
}

#[cfg(feature = "axum-ext")]
impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        if let Self::Internal(msg) = &self {
            tracing::error!(error = %msg, "authentication failed internally");
        }
        let mut response = self.to_problem().into_response();
        if self.status() == http::StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                http::header::WWW_AUTHENTICATE,
                http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_user_is_forbidden_not_unauthenticated() {
        assert_eq!(AuthError::InactiveUser.status(), http::StatusCode::FORBIDDEN);
        assert_eq!(AuthError::TokenExpired.status(), http::StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::UnknownSubject.status(), http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn internal_detail_is_hidden() {
        let p = AuthError::Internal("db pool exhausted".to_owned()).to_problem();
        assert!(!p.detail.contains("pool"));
        assert_eq!(p.code, "auth.internal");
    }
}
