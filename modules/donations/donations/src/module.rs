//! Composition root: wires storage, the payment gateway and authentication
//! into the services and the REST router.

use std::sync::Arc;

use axum::Router;
use marketplace_auth::{AuthState, HmacJwtValidator, JwtSettings, TokenValidator};
use sea_orm::{DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

use crate::api::rest::routes::register_routes;
use crate::config::{DonationsConfig, PaymentsConfig};
use crate::domain::ports::PaymentGateway;
use crate::domain::service::Services;
use crate::infra::identity::DbSubjectResolver;
use crate::infra::payments::build_gateway;
use crate::infra::storage::Migrator;

pub struct DonationsModule {
    services: Arc<Services>,
    auth: AuthState,
    max_upload_bytes: usize,
}

impl DonationsModule {
    /// Assemble the module from already-built adapters.
    pub fn new(
        db: DatabaseConnection,
        gateway: Arc<dyn PaymentGateway>,
        validator: Arc<dyn TokenValidator>,
        config: DonationsConfig,
    ) -> Self {
        let resolver = Arc::new(DbSubjectResolver::new(db.clone()));
        let max_upload_bytes = config.max_upload_bytes;
        tracing::info!(
            gateway = gateway.name(),
            currency = %config.default_currency,
            "donations module initialized"
        );
        Self {
            services: Arc::new(Services::new(db, gateway, config)),
            auth: AuthState::new(validator, resolver),
            max_upload_bytes,
        }
    }

    /// Assemble the module from configuration: HS256 tokens and the configured
    /// payment provider.
    ///
    /// # Errors
    /// Fails when the payment provider is misconfigured.
    pub fn from_config(
        db: DatabaseConnection,
        jwt: &JwtSettings,
        payments: &PaymentsConfig,
        config: DonationsConfig,
    ) -> anyhow::Result<Self> {
        let gateway = build_gateway(payments)?;
        let validator = Arc::new(HmacJwtValidator::new(jwt));
        Ok(Self::new(db, gateway, validator, config))
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    /// Propagates the database error of the failing migration.
    pub async fn migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
        Migrator::up(db, None).await?;
        tracing::info!("donations schema is up to date");
        Ok(())
    }

    pub fn services(&self) -> Arc<Services> {
        Arc::clone(&self.services)
    }

    /// Mount the module's routes onto `router`.
    pub fn register_rest(&self, router: Router) -> Router {
        register_routes(router, self.services(), self.auth.clone(), self.max_upload_bytes)
    }
}
