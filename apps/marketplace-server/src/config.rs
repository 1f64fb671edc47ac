//! Layered server configuration.
//!
//! Sources, lowest precedence first: compiled defaults, the YAML file passed with
//! `--config`, `MARKETPLACE__*` environment variables, CLI overrides.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use donations::config::redacted;
use donations::{DonationsConfig, PaymentProvider, PaymentsConfig};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use marketplace_auth::JwtSettings;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "MARKETPLACE__";

const MEMORY_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    pub donations: DonationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub request_timeout_secs: u64,
    /// `*` allows any origin; empty disables CORS.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            request_timeout_secs: 30,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://marketplace.db?mode=rwc".to_owned(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `donations=debug,info`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    #[serde(with = "redacted")]
    pub jwt_secret: Option<SecretString>,
    pub issuer: Option<String>,
    pub leeway_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            issuer: None,
            leeway_secs: 30,
        }
    }
}

/// Values taken from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub verbose: u8,
    pub mock: bool,
}

impl AppConfig {
    /// Merge defaults, the optional YAML file and the environment.
    ///
    /// # Errors
    /// Fails when a source cannot be parsed or a value has the wrong shape.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::figment(path)
            .extract()
            .context("failed to load configuration")
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn apply_cli_overrides(&mut self, cli: CliOverrides) {
        if let Some(port) = cli.port {
            self.server.bind_addr.set_port(port);
        }
        match cli.verbose {
            0 => {}
            1 => "debug".clone_into(&mut self.logging.level),
            _ => "trace".clone_into(&mut self.logging.level),
        }
        if cli.mock {
            MEMORY_DATABASE_URL.clone_into(&mut self.database.url);
            // Every pooled connection to `sqlite::memory:` opens its own database.
            self.database.max_connections = 1;
            self.payments.provider = PaymentProvider::Test;
        }
    }

    /// # Errors
    /// Describes the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        self.jwt_settings()?;
        let currency = &self.donations.default_currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            bail!("donations.default_currency must be a 3-letter ISO 4217 code, got '{currency}'");
        }
        if self.database.max_connections == 0 {
            bail!("database.max_connections must be at least 1");
        }
        if self.server.request_timeout_secs == 0 {
            bail!("server.request_timeout_secs must be at least 1");
        }
        if self.payments.provider == PaymentProvider::Razorpay
            && (self.payments.key_id.is_none() || self.payments.key_secret.is_none())
        {
            bail!("payments.key_id and payments.key_secret are required for the razorpay provider");
        }
        Ok(())
    }

    /// # Errors
    /// Fails when `auth.jwt_secret` is unset or empty.
    pub fn jwt_settings(&self) -> Result<JwtSettings> {
        let Some(secret) = self.auth.jwt_secret.clone() else {
            bail!("auth.jwt_secret must be set (e.g. {ENV_PREFIX}AUTH__JWT_SECRET)");
        };
        Ok(JwtSettings {
            secret,
            issuer: self.auth.issuer.clone(),
            leeway_secs: self.auth.leeway_secs,
        })
    }

    #[must_use]
    pub fn is_in_memory_db(&self) -> bool {
        self.database.url == MEMORY_DATABASE_URL
    }

    /// YAML rendering with secrets masked.
    ///
    /// # Errors
    /// Fails if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self).map_err(|e| anyhow::anyhow!("failed to render configuration: {e}"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults_need_a_jwt_secret() {
        let cfg = AppConfig::default();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("auth.jwt_secret"));
    }

    #[test]
    fn yaml_then_env_then_cli() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marketplace.yaml");
        std::fs::write(
            &path,
            "server:\n  bind_addr: \"0.0.0.0:9000\"\nauth:\n  jwt_secret: from-file\ndonations:\n  default_currency: USD\n",
        )
        .unwrap();

        temp_env::with_vars(
            [
                ("MARKETPLACE__AUTH__JWT_SECRET", Some("from-env")),
                ("MARKETPLACE__LOGGING__FORMAT", Some("json")),
            ],
            || {
                let mut cfg = AppConfig::load(Some(&path)).unwrap();
                cfg.apply_cli_overrides(CliOverrides {
                    port: Some(9100),
                    verbose: 1,
                    mock: false,
                });

                assert_eq!(cfg.server.bind_addr.port(), 9100);
                assert!(cfg.server.bind_addr.ip().is_unspecified());
                assert_eq!(cfg.donations.default_currency, "USD");
                assert_eq!(cfg.logging.format, LogFormat::Json);
                assert_eq!(cfg.logging.level, "debug");
                let jwt = cfg.jwt_settings().unwrap();
                assert_eq!(jwt.secret.expose_secret(), "from-env");
            },
        );
    }

    #[test]
    fn mock_switches_to_memory_and_test_payments() {
        let mut cfg = AppConfig::default();
        cfg.payments.provider = PaymentProvider::Razorpay;
        cfg.apply_cli_overrides(CliOverrides {
            mock: true,
            ..CliOverrides::default()
        });
        assert!(cfg.is_in_memory_db());
        assert_eq!(cfg.database.max_connections, 1);
        assert_eq!(cfg.payments.provider, PaymentProvider::Test);
    }

    #[test]
    fn yaml_output_masks_secrets() {
        let mut cfg = AppConfig::default();
        cfg.auth.jwt_secret = Some(SecretString::from("super-secret-value"));
        let yaml = cfg.to_yaml().unwrap();
        assert!(!yaml.contains("super-secret-value"));
        assert!(yaml.contains("***"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo.yaml");
        std::fs::write(&path, "server:\n  bind_adress: \"0.0.0.0:9000\"\n").unwrap();
        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn razorpay_requires_credentials() {
        let mut cfg = AppConfig::default();
        cfg.auth.jwt_secret = Some(SecretString::from("s"));
        cfg.payments.provider = PaymentProvider::Razorpay;
        assert!(cfg.validate().is_err());
        cfg.payments.key_id = Some("rzp_test_1".to_owned());
        cfg.payments.key_secret = Some(SecretString::from("k"));
        cfg.validate().unwrap();
    }
}
