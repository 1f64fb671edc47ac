use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Registered claims the marketplace reads from an access token.
///
/// `sub` is the user id. Tokens are minted by the external identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl Claims {
    /// Claims for `sub` issued now and valid for `ttl`.
    #[must_use]
    pub fn for_subject(sub: Uuid, ttl: Duration) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            sub,
            exp: (now + ttl).unix_timestamp(),
            iat: now.unix_timestamp(),
            iss: None,
        }
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }
}
