//! Donation lifecycle: `INIT -> CAPTURED | FAILED`.

use std::sync::Arc;

use donations_sdk::{Donation, DonationInit, DonationReceipt, DonationRequest, DonationStatus, User};
use marketplace_security::{Role, SecurityContext};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde_json::{Value, json};
use uuid::Uuid;

use super::{load_cause, now, require_money, resolve_currency, to_minor_units};
use crate::config::DonationsConfig;
use crate::domain::error::DomainError;
use crate::domain::ports::{OrderRequest, PaymentGateway};
use crate::infra::storage::audit::{self, AuditRecord};
use crate::infra::storage::entity::{cause, donation, user};
use crate::infra::storage::mapper::try_collect;
use crate::infra::storage::scope::build_scope_condition;

const CAPTURED_EVENT: &str = "payment.captured";
const FAILED_EVENT: &str = "payment.failed";

/// Roles that see every donation of their tenant.
const TENANT_READERS: &[Role] = &[Role::NgoAdmin, Role::NgoStaff, Role::PlatformAdmin];

/// What a webhook delivery did. Every variant is a success for the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Captured { donation_id: Uuid },
    Failed { donation_id: Uuid },
    /// The donation already left `INIT`; redelivery.
    Duplicate { donation_id: Uuid },
    UnknownOrder { order_id: String },
    Ignored { event: String },
}

impl WebhookOutcome {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Captured { .. } => "captured",
            Self::Failed { .. } => "failed",
            Self::Duplicate { .. } => "duplicate",
            Self::UnknownOrder { .. } => "unknown_order",
            Self::Ignored { .. } => "ignored",
        }
    }
}

/// The fields of a gateway event this module reads.
#[derive(Debug)]
struct PaymentEvent {
    event: String,
    order_id: Option<String>,
    payment_id: Option<String>,
}

impl PaymentEvent {
    fn parse(raw: &Value) -> Result<Self, DomainError> {
        let event = raw
            .get("event")
            .and_then(Value::as_str)
            .ok_or_else(|| DomainError::bad_request("Missing event"))?
            .to_owned();
        let payment = raw
            .pointer("/payload/payment/entity")
            .or_else(|| raw.pointer("/payload/payment"));
        let field = |name: &str| {
            payment
                .and_then(|p| p.get(name))
                .and_then(Value::as_str)
                .map(str::to_owned)
        };
        Ok(Self {
            order_id: field("order_id"),
            payment_id: field("id"),
            event,
        })
    }
}

pub struct DonationService {
    db: DatabaseConnection,
    gateway: Arc<dyn PaymentGateway>,
    config: Arc<DonationsConfig>,
}

impl DonationService {
    pub fn new(db: DatabaseConnection, gateway: Arc<dyn PaymentGateway>, config: Arc<DonationsConfig>) -> Self {
        Self { db, gateway, config }
    }

    /// Open a donation and its gateway order.
    ///
    /// A gateway failure marks the donation `FAILED` before the error is returned.
    #[tracing::instrument(skip(self, ctx, req), fields(cause_id = %req.cause_id, donor = %ctx.subject_id()))]
    pub async fn init(&self, ctx: &SecurityContext, req: DonationRequest) -> Result<DonationInit, DomainError> {
        require_money("amount", req.amount)?;
        let currency = resolve_currency(req.currency.as_deref(), &self.config.default_currency)?;
        let amount_minor = to_minor_units(req.amount)?;

        let not_live = || DomainError::not_found_with("Cause", "Cause not found or not live");
        let cause = load_cause(&self.db, req.cause_id).await.map_err(|e| match e {
            DomainError::NotFound { .. } => not_live(),
            other => other,
        })?;
        let live = cause
            .status
            .parse::<donations_sdk::CauseStatus>()
            .is_ok_and(donations_sdk::CauseStatus::accepts_donations);
        if !live {
            return Err(not_live());
        }

        let donation_id = Uuid::now_v7();
        let ts = now();
        let txn = self.db.begin().await?;
        donation::ActiveModel {
            id: Set(donation_id),
            cause_id: Set(cause.id),
            tenant_id: Set(cause.tenant_id),
            donor_user_id: Set(ctx.subject_id()),
            amount: Set(req.amount),
            currency: Set(currency.clone()),
            pg_order_id: Set(None),
            pg_payment_id: Set(None),
            pg_signature: Set(None),
            status: Set(DonationStatus::Init.as_str().to_owned()),
            audit_json: Set(None),
            created_at: Set(ts),
            updated_at: Set(ts),
        }
        .insert(&txn)
        .await?;
        audit::append(
            &txn,
            AuditRecord::new(Some(ctx.subject_id()), "donation", donation_id, "init")
                .after(json!({ "cause_id": cause.id, "amount": req.amount, "currency": currency })),
        )
        .await?;
        txn.commit().await?;

        let order = self
            .gateway
            .create_order(&OrderRequest {
                donation_id,
                amount_minor,
                currency: currency.clone(),
            })
            .await;
        let order = match order {
            Ok(order) => order,
            Err(e) => {
                tracing::error!(donation_id = %donation_id, gateway = self.gateway.name(), error = %e, "order creation failed");
                self.mark_init_failed(donation_id, &e.to_string()).await?;
                return Err(DomainError::gateway(e.to_string()));
            }
        };

        donation::Entity::update_many()
            .col_expr(donation::Column::PgOrderId, Expr::value(order.order_id.clone()))
            .col_expr(donation::Column::UpdatedAt, Expr::value(now()))
            .filter(donation::Column::Id.eq(donation_id))
            .exec(&self.db)
            .await?;

        tracing::info!(donation_id = %donation_id, order_id = %order.order_id, "donation initialized");
        Ok(DonationInit {
            donation_id,
            order_id: order.order_id,
            amount_minor,
            currency,
            key_id: order.key_id,
        })
    }

    async fn mark_init_failed(&self, donation_id: Uuid, reason: &str) -> Result<(), DomainError> {
        donation::Entity::update_many()
            .col_expr(donation::Column::Status, Expr::value(DonationStatus::Failed.as_str()))
            .col_expr(donation::Column::AuditJson, Expr::value(json!({ "gateway_error": reason })))
            .col_expr(donation::Column::UpdatedAt, Expr::value(now()))
            .filter(donation::Column::Id.eq(donation_id))
            .filter(donation::Column::Status.eq(DonationStatus::Init.as_str()))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Apply a gateway event. Unknown orders, redeliveries and unrelated events
    /// are no-ops; only a bad signature or an unreadable body is an error.
    #[tracing::instrument(skip_all, fields(gateway = self.gateway.name()))]
    pub async fn handle_webhook(&self, body: &[u8], signature: Option<&str>) -> Result<WebhookOutcome, DomainError> {
        self.gateway
            .verify_webhook(body, signature)
            .map_err(|e| DomainError::bad_request(e.to_string()))?;
        let raw: Value =
            serde_json::from_slice(body).map_err(|_| DomainError::bad_request("Invalid JSON payload"))?;
        let event = PaymentEvent::parse(&raw)?;

        let target = match event.event.as_str() {
            CAPTURED_EVENT => DonationStatus::Captured,
            FAILED_EVENT => DonationStatus::Failed,
            _ => {
                tracing::debug!(event = %event.event, "ignoring webhook event");
                return Ok(WebhookOutcome::Ignored { event: event.event });
            }
        };
        let Some(order_id) = event.order_id else {
            tracing::warn!(event = %event.event, "webhook without order id");
            return Ok(WebhookOutcome::Ignored { event: event.event });
        };

        let outcome = self
            .settle(&order_id, target, event.payment_id, signature, raw)
            .await?;
        tracing::info!(order_id = %order_id, outcome = outcome.as_str(), "webhook processed");
        Ok(outcome)
    }

    /// `INIT -> target` keyed by order id. A capture credits the cause in the
    /// same transaction.
    async fn settle(
        &self,
        order_id: &str,
        target: DonationStatus,
        payment_id: Option<String>,
        signature: Option<&str>,
        raw: Value,
    ) -> Result<WebhookOutcome, DomainError> {
        let txn = self.db.begin().await?;
        let Some(row) = donation::Entity::find()
            .filter(donation::Column::PgOrderId.eq(order_id))
            .one(&txn)
            .await?
        else {
            return Ok(WebhookOutcome::UnknownOrder {
                order_id: order_id.to_owned(),
            });
        };

        let ts = now();
        let mut update = donation::Entity::update_many()
            .col_expr(donation::Column::Status, Expr::value(target.as_str()))
            .col_expr(donation::Column::PgPaymentId, Expr::value(payment_id))
            .col_expr(donation::Column::AuditJson, Expr::value(raw))
            .col_expr(donation::Column::UpdatedAt, Expr::value(ts));
        if target == DonationStatus::Captured {
            update = update.col_expr(donation::Column::PgSignature, Expr::value(signature.map(str::to_owned)));
        }
        let result = update
            .filter(donation::Column::Id.eq(row.id))
            .filter(donation::Column::Status.eq(DonationStatus::Init.as_str()))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Ok(WebhookOutcome::Duplicate { donation_id: row.id });
        }

        if target == DonationStatus::Captured {
            cause::Entity::update_many()
                .col_expr(cause::Column::RaisedAmount, Expr::col(cause::Column::RaisedAmount).add(row.amount))
                .col_expr(cause::Column::UpdatedAt, Expr::value(ts))
                .filter(cause::Column::Id.eq(row.cause_id))
                .exec(&txn)
                .await?;
        }
        audit::append(
            &txn,
            AuditRecord::new(None, "donation", row.id, "webhook")
                .before(json!({ "status": row.status }))
                .after(json!({ "status": target.as_str(), "amount": row.amount })),
        )
        .await?;
        txn.commit().await?;

        Ok(if target == DonationStatus::Captured {
            WebhookOutcome::Captured { donation_id: row.id }
        } else {
            WebhookOutcome::Failed { donation_id: row.id }
        })
    }

    /// Receipt for the caller's own captured donation. Someone else's donation is
    /// reported as missing.
    pub async fn receipt(&self, ctx: &SecurityContext, donation_id: Uuid) -> Result<DonationReceipt, DomainError> {
        let row = donation::Entity::find_by_id(donation_id)
            .one(&self.db)
            .await?
            .filter(|d| d.donor_user_id == ctx.subject_id())
            .ok_or_else(|| DomainError::not_found("Donation"))?;
        let donation = Donation::try_from(row)?;
        if donation.status != DonationStatus::Captured {
            return Err(DomainError::bad_request("Donation not completed"));
        }
        let cause = load_cause(&self.db, donation.cause_id).await?;
        let donor: User = user::Entity::find_by_id(donation.donor_user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))?
            .into();

        Ok(DonationReceipt {
            donation_id: donation.id,
            amount: donation.amount,
            currency: donation.currency,
            cause_title: cause.title,
            donor_name: donor.display_name(),
            donor_email: donor.email,
            created_at: donation.created_at,
            payment_id: donation.pg_payment_id,
        })
    }

    pub async fn list_mine(&self, ctx: &SecurityContext) -> Result<Vec<Donation>, DomainError> {
        let rows = donation::Entity::find()
            .filter(donation::Column::DonorUserId.eq(ctx.subject_id()))
            .order_by_desc(donation::Column::CreatedAt)
            .all(&self.db)
            .await?;
        try_collect(rows)
    }

    /// Donations received by the caller's tenants; every tenant for a platform admin.
    pub async fn list_for_tenants(
        &self,
        ctx: &SecurityContext,
        status: Option<DonationStatus>,
    ) -> Result<Vec<Donation>, DomainError> {
        let scope = ctx.scope_for(TENANT_READERS);
        if scope.is_empty() {
            return Err(DomainError::forbidden("Only NGO members can list tenant donations"));
        }
        let mut query = donation::Entity::find().filter(build_scope_condition::<donation::Entity>(&scope));
        if let Some(status) = status {
            query = query.filter(donation::Column::Status.eq(status.as_str()));
        }
        let rows = query
            .order_by_desc(donation::Column::CreatedAt)
            .all(&self.db)
            .await?;
        try_collect(rows)
    }
}
