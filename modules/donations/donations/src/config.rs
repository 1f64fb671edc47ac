use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Module settings (`donations:` section of the server config).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DonationsConfig {
    /// ISO 4217 code used for payouts and for donations that do not name one.
    pub default_currency: String,
    /// Prefix of document URLs and tenant logo links.
    pub external_base_url: String,
    /// Microsite theme color when the tenant has none.
    pub default_primary_color: String,
    pub max_upload_bytes: usize,
}

impl Default for DonationsConfig {
    fn default() -> Self {
        Self {
            default_currency: "INR".to_owned(),
            external_base_url: "https://example.com".to_owned(),
            default_primary_color: "#2563eb".to_owned(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    /// No external calls; webhook signatures are not checked.
    #[default]
    Test,
    Razorpay,
}

/// Payment gateway settings (`payments:` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaymentsConfig {
    pub provider: PaymentProvider,
    pub key_id: Option<String>,
    #[serde(with = "redacted")]
    pub key_secret: Option<SecretString>,
    /// Falls back to `key_secret`.
    #[serde(with = "redacted")]
    pub webhook_secret: Option<SecretString>,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            provider: PaymentProvider::Test,
            key_id: None,
            key_secret: None,
            webhook_secret: None,
            api_base_url: "https://api.razorpay.com".to_owned(),
            request_timeout_secs: 15,
        }
    }
}

/// Serde adapter for optional secrets: reads plain strings (empty means unset),
/// writes `***` so printed configs never leak them.
pub mod redacted {
    use secrecy::SecretString;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)] // serde `with` passes the field by reference
    pub fn serialize<S: Serializer>(value: &Option<SecretString>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(_) => serializer.serialize_some("***"),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<SecretString>, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?
            .filter(|s| !s.is_empty())
            .map(SecretString::from))
    }
}
