use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::{ExposeSecret, SecretString};

use crate::{claims::Claims, errors::AuthError, traits::TokenValidator};

/// Inputs for [`HmacJwtValidator`].
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: SecretString,
    /// Expected `iss`; any issuer is accepted when unset.
    pub issuer: Option<String>,
    pub leeway_secs: u64,
}

/// HS256 validator for tokens signed with a shared secret.
pub struct HmacJwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl HmacJwtValidator {
    #[must_use]
    pub fn new(settings: &JwtSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = settings.leeway_secs;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(iss) = &settings.issuer {
            validation.set_issuer(&[iss.as_str()]);
        }
        Self {
            key: DecodingKey::from_secret(settings.secret.expose_secret().as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl TokenValidator for HmacJwtValidator {
    async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }
}
