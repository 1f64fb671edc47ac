//! Domain services of the donations module.
//!
//! Services talk to sea-orm entities directly. Every "check status, mutate,
//! create dependent row" sequence is a compare-and-swap inside one transaction.

use std::sync::Arc;

use marketplace_security::{ResourceRef, Role, SecurityContext};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::config::DonationsConfig;
use crate::domain::error::DomainError;
use crate::domain::ports::PaymentGateway;
use crate::infra::storage::entity::cause;

mod audit;
mod catalog;
mod donations;
mod identity;
mod invoices;
mod payouts;
mod receipts;
mod tenants;
mod vendors;

pub use audit::AuditService;
pub use catalog::{CatalogService, CauseFilter};
pub use donations::{DonationService, WebhookOutcome};
pub use identity::{IdentityService, Me};
pub use invoices::InvoiceService;
pub use payouts::PayoutService;
pub use receipts::ReceiptService;
pub use tenants::TenantService;
pub use vendors::VendorService;

/// All services of the module, shared by the REST layer.
pub struct Services {
    pub identity: IdentityService,
    pub tenants: TenantService,
    pub catalog: CatalogService,
    pub donations: DonationService,
    pub vendors: VendorService,
    pub invoices: InvoiceService,
    pub receipts: ReceiptService,
    pub payouts: PayoutService,
    pub audit: AuditService,
}

impl Services {
    pub fn new(db: DatabaseConnection, gateway: Arc<dyn PaymentGateway>, config: DonationsConfig) -> Self {
        let config = Arc::new(config);
        Self {
            identity: IdentityService::new(db.clone()),
            tenants: TenantService::new(db.clone(), config.clone()),
            catalog: CatalogService::new(db.clone()),
            donations: DonationService::new(db.clone(), gateway, config.clone()),
            vendors: VendorService::new(db.clone()),
            invoices: InvoiceService::new(db.clone(), config.clone()),
            receipts: ReceiptService::new(db.clone(), config),
            payouts: PayoutService::new(db.clone()),
            audit: AuditService::new(db),
        }
    }
}

pub(crate) fn now() -> time::OffsetDateTime {
    time::OffsetDateTime::now_utc()
}

/// Like [`SecurityContext::authorize`], with a caller-facing message.
pub(crate) fn authorize(
    ctx: &SecurityContext,
    resource: &ResourceRef,
    allowed: &[Role],
    message: &str,
) -> Result<(), DomainError> {
    ctx.authorize(resource, allowed)
        .map_err(|_| DomainError::forbidden(message))
}

pub(crate) fn require_platform_admin(ctx: &SecurityContext, message: &str) -> Result<(), DomainError> {
    if ctx.is_platform_admin() {
        Ok(())
    } else {
        Err(DomainError::forbidden(message))
    }
}

pub(crate) async fn load_cause<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<cause::Model, DomainError> {
    cause::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| DomainError::not_found("Cause"))
}

/// 10^13, the exclusive upper bound of a `DECIMAL(15,2)` amount.
const MAX_AMOUNT: Decimal = Decimal::from_parts(1_316_134_912, 2_328, 0, false, 0);

/// A positive money amount with at most two decimal places that fits the
/// `DECIMAL(15,2)` columns.
pub(crate) fn require_money(field: &'static str, amount: Decimal) -> Result<(), DomainError> {
    if amount <= Decimal::ZERO {
        return Err(DomainError::validation(field, "must be greater than zero"));
    }
    if amount >= MAX_AMOUNT {
        return Err(DomainError::validation(field, "out of range"));
    }
    if amount.normalize().scale() > 2 {
        return Err(DomainError::validation(field, "must have at most two decimal places"));
    }
    Ok(())
}

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(())
}

/// Three upper-case ASCII letters; `None` resolves to `default`.
pub(crate) fn resolve_currency(requested: Option<&str>, default: &str) -> Result<String, DomainError> {
    let currency = requested.map_or(default, str::trim);
    if currency.len() == 3 && currency.bytes().all(|b| b.is_ascii_uppercase()) {
        Ok(currency.to_owned())
    } else {
        Err(DomainError::validation("currency", "must be a 3-letter ISO 4217 code"))
    }
}

/// Major units to minor units (x100), rounded half away from zero.
pub(crate) fn to_minor_units(amount: Decimal) -> Result<i64, DomainError> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(|| DomainError::validation("amount", "out of range"))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| DomainError::validation("amount", "out of range"))
}
