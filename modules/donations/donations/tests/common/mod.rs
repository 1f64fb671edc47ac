#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)] // each test binary uses a subset

//! Shared fixtures: an in-memory SQLite database with the demo dataset, and
//! security contexts resolved the same way the auth middleware resolves them.

use std::sync::Arc;

use async_trait::async_trait;
use donations::DonationsModule;
use donations::config::DonationsConfig;
use donations::domain::ports::{GatewayError, GatewayOrder, OrderRequest, PaymentGateway, WebhookRejection};
use donations::domain::service::Services;
use donations::infra::identity::DbSubjectResolver;
use donations::infra::payments::TestModeGateway;
use donations::infra::storage::entity::user;
use donations::infra::storage::seed::{SeedReport, seed_demo};
use donations_sdk::{CauseStatus, CauseType, NewCause, NewMembership, NewVendor};
use marketplace_auth::SubjectResolver;
use marketplace_security::{Role, SecurityContext};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use time::OffsetDateTime;
use uuid::Uuid;

pub const BASE_URL: &str = "https://files.test";

pub async fn connect() -> DatabaseConnection {
    // One connection: every pooled connection would otherwise get its own empty database.
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await.expect("connect sqlite");
    DonationsModule::migrate(&db).await.expect("migrate");
    db
}

pub fn config() -> DonationsConfig {
    DonationsConfig {
        external_base_url: BASE_URL.to_owned(),
        ..DonationsConfig::default()
    }
}

/// Gateway that is always down.
pub struct FailingGateway;

#[async_trait]
impl PaymentGateway for FailingGateway {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn create_order(&self, _request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        Err(GatewayError::Transport("connection refused".to_owned()))
    }

    fn verify_webhook(&self, _body: &[u8], _signature: Option<&str>) -> Result<(), WebhookRejection> {
        Ok(())
    }
}

/// A second tenant with its own admin, vendor and live cause.
pub struct CareWorks {
    pub tenant_id: Uuid,
    pub admin: SecurityContext,
    pub vendor_id: Uuid,
    pub vendor: SecurityContext,
    pub cause_id: Uuid,
}

pub struct TestEnv {
    pub db: DatabaseConnection,
    pub services: Arc<Services>,
    pub seed: SeedReport,
    resolver: DbSubjectResolver,
}

impl TestEnv {
    pub async fn new() -> Self {
        Self::with_gateway(Arc::new(TestModeGateway)).await
    }

    pub async fn with_gateway(gateway: Arc<dyn PaymentGateway>) -> Self {
        let db = connect().await;
        let seed = seed_demo(&db, BASE_URL).await.expect("seed demo data");
        let services = Arc::new(Services::new(db.clone(), gateway, config()));
        Self {
            resolver: DbSubjectResolver::new(db.clone()),
            db,
            services,
            seed,
        }
    }

    /// Id of the seeded user holding `role` in hope-trust.
    pub fn user(&self, role: Role) -> Uuid {
        self.seed
            .users
            .iter()
            .find(|u| u.role == role)
            .map(|u| u.id)
            .expect("seeded role")
    }

    pub fn tenant(&self, slug: &str) -> Uuid {
        self.seed
            .tenants
            .iter()
            .find(|(s, _)| s == slug)
            .map(|(_, id)| *id)
            .expect("seeded tenant")
    }

    pub fn hope(&self) -> Uuid {
        self.tenant("hope-trust")
    }

    pub async fn ctx_of(&self, user_id: Uuid) -> SecurityContext {
        self.resolver.resolve(user_id).await.expect("resolve subject")
    }

    pub async fn ctx(&self, role: Role) -> SecurityContext {
        self.ctx_of(self.user(role)).await
    }

    pub async fn add_user(&self, email: &str) -> Uuid {
        let ts = OffsetDateTime::now_utc();
        user::ActiveModel {
            id: Set(Uuid::now_v7()),
            email: Set(email.to_owned()),
            password_hash: Set("!".to_owned()),
            first_name: Set(None),
            last_name: Set(None),
            phone: Set(None),
            is_active: Set(true),
            created_at: Set(ts),
            updated_at: Set(ts),
        }
        .insert(&self.db)
        .await
        .expect("insert user")
        .id
    }

    /// Create a user and grant it `role` in `tenant_id` as the platform admin.
    pub async fn add_member(&self, email: &str, tenant_id: Uuid, role: Role, vendor_id: Option<Uuid>) -> SecurityContext {
        let user_id = self.add_user(email).await;
        let admin = self.ctx(Role::PlatformAdmin).await;
        self.services
            .identity
            .grant_membership(
                &admin,
                NewMembership {
                    user_id,
                    tenant_id,
                    role,
                    vendor_id,
                },
            )
            .await
            .expect("grant membership");
        self.ctx_of(user_id).await
    }

    pub async fn care_works(&self) -> CareWorks {
        let tenant_id = self.tenant("care-works");
        let admin = self
            .add_member("ngo.care.admin@example.com", tenant_id, Role::NgoAdmin, None)
            .await;
        let vendor = self
            .services
            .vendors
            .create(
                &admin,
                NewVendor {
                    tenant_id,
                    name: "Beta Traders".to_owned(),
                    gstin: None,
                    bank_details: None,
                    kyc_status: None,
                },
            )
            .await
            .expect("create vendor");
        let vendor_ctx = self
            .add_member("vendor.beta@example.com", tenant_id, Role::Vendor, Some(vendor.id))
            .await;
        let category = self.services.catalog.list_categories().await.expect("categories")[0].id;
        let cause = self
            .services
            .catalog
            .create_cause(
                &admin,
                NewCause {
                    tenant_id,
                    category_id: category,
                    title: "School Kits".to_owned(),
                    description: None,
                    goal_amount: Decimal::new(1_000_000, 2),
                    cause_type: CauseType::Vendor,
                    policy_flags: None,
                },
            )
            .await
            .expect("create cause");
        self.services
            .catalog
            .set_cause_status(&admin, cause.id, CauseStatus::Live)
            .await
            .expect("publish cause");
        CareWorks {
            tenant_id,
            admin,
            vendor_id: vendor.id,
            vendor: vendor_ctx,
            cause_id: cause.id,
        }
    }
}
