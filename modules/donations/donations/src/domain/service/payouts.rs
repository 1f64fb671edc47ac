//! Payout ledger. Rows are created only by invoice and receipt approval.

use donations_sdk::{InvoiceStatus, Payout, PayoutSource, PayoutStatus, PayoutStatusUpdate, PayoutTarget, ReceiptStatus};
use marketplace_security::{ResourceRef, Role, SecurityContext};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use super::{authorize, now, require_platform_admin};
use crate::domain::error::DomainError;
use crate::infra::storage::audit::{self, AuditRecord};
use crate::infra::storage::entity::{ngo_receipt, payout, vendor_invoice};
use crate::infra::storage::mapper::try_collect;
use crate::infra::storage::scope::build_scope_condition;

const LEDGER_READERS: &[Role] = &[Role::NgoAdmin, Role::PlatformAdmin];

fn readers_of(target: PayoutTarget) -> &'static [Role] {
    match target {
        PayoutTarget::Vendor(_) => &[Role::Vendor, Role::NgoAdmin, Role::PlatformAdmin],
        PayoutTarget::Ngo(_) => LEDGER_READERS,
    }
}

fn resource_of(payout: &Payout) -> ResourceRef {
    let resource = ResourceRef::tenant(payout.tenant_id);
    match payout.target {
        PayoutTarget::Vendor(vendor_id) => resource.with_vendor(vendor_id),
        PayoutTarget::Ngo(_) => resource,
    }
}

/// Insert a `QUEUED` payout. The unique `(source_type, source_id)` index turns a
/// second payout for the same approval into a conflict.
pub async fn create_queued_payout<C: ConnectionTrait>(
    conn: &C,
    target: PayoutTarget,
    source: PayoutSource,
    tenant_id: Uuid,
    amount: Decimal,
    currency: &str,
) -> Result<Payout, DomainError> {
    let ts = now();
    let row = payout::ActiveModel {
        id: Set(Uuid::now_v7()),
        to_type: Set(target.kind().to_owned()),
        to_id: Set(target.id()),
        tenant_id: Set(tenant_id),
        source_type: Set(source.kind().to_owned()),
        source_id: Set(source.id()),
        amount: Set(amount),
        currency: Set(currency.to_owned()),
        pg_payout_id: Set(None),
        status: Set(PayoutStatus::Queued.as_str().to_owned()),
        created_at: Set(ts),
        updated_at: Set(ts),
    }
    .insert(conn)
    .await
    .map_err(|e: DbErr| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => DomainError::conflict("A payout already exists for this approval"),
        _ => DomainError::from(e),
    })?;
    Payout::try_from(row)
}

pub struct PayoutService {
    db: DatabaseConnection,
}

impl PayoutService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load(&self, id: Uuid) -> Result<Payout, DomainError> {
        payout::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("Payout"))
            .and_then(Payout::try_from)
    }

    /// Vendor payouts are readable by the vendor itself and by its tenant's
    /// NGO admins; NGO payouts only by NGO and platform admins.
    pub async fn get(&self, ctx: &SecurityContext, payout_id: Uuid) -> Result<Payout, DomainError> {
        let payout = self.load(payout_id).await?;
        authorize(
            ctx,
            &resource_of(&payout),
            readers_of(payout.target),
            "Not authorized to view this payout",
        )?;
        Ok(payout)
    }

    pub async fn list(&self, ctx: &SecurityContext, status: Option<PayoutStatus>) -> Result<Vec<Payout>, DomainError> {
        let scope = ctx.scope_for(LEDGER_READERS);
        if scope.is_empty() {
            return Err(DomainError::forbidden("Only NGO or platform admins can list payouts"));
        }
        let mut query = payout::Entity::find().filter(build_scope_condition::<payout::Entity>(&scope));
        if let Some(status) = status {
            query = query.filter(payout::Column::Status.eq(status.as_str()));
        }
        let rows = query.order_by_desc(payout::Column::CreatedAt).all(&self.db).await?;
        try_collect(rows)
    }

    /// Disbursement callback. `PROCESSED` also marks the source invoice or
    /// receipt `PAID`.
    #[tracing::instrument(skip(self, ctx, update), fields(status = %update.status))]
    pub async fn update_status(
        &self,
        ctx: &SecurityContext,
        payout_id: Uuid,
        update: PayoutStatusUpdate,
    ) -> Result<Payout, DomainError> {
        require_platform_admin(ctx, "Only platform admins can update payouts")?;
        let current = self.load(payout_id).await?;
        if !current.status.can_transition_to(update.status) {
            return Err(DomainError::conflict(format!(
                "Cannot move payout from {} to {}",
                current.status, update.status
            )));
        }

        let ts = now();
        let txn = self.db.begin().await?;
        let mut query = payout::Entity::update_many()
            .col_expr(payout::Column::Status, Expr::value(update.status.as_str()))
            .col_expr(payout::Column::UpdatedAt, Expr::value(ts));
        if let Some(pg_payout_id) = &update.pg_payout_id {
            query = query.col_expr(payout::Column::PgPayoutId, Expr::value(pg_payout_id.clone()));
        }
        let result = query
            .filter(payout::Column::Id.eq(payout_id))
            .filter(payout::Column::Status.eq(current.status.as_str()))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(DomainError::conflict("Payout status changed concurrently"));
        }
        if update.status == PayoutStatus::Processed {
            mark_source_paid(&txn, current.source, ts).await?;
        }
        audit::append(
            &txn,
            AuditRecord::new(Some(ctx.subject_id()), "payout", payout_id, "status")
                .before(json!({ "status": current.status.as_str() }))
                .after(json!({ "status": update.status.as_str(), "pg_payout_id": update.pg_payout_id })),
        )
        .await?;
        txn.commit().await?;

        tracing::info!(payout_id = %payout_id, from = %current.status, to = %update.status, "payout status changed");
        Ok(Payout {
            status: update.status,
            pg_payout_id: update.pg_payout_id.or(current.pg_payout_id),
            updated_at: ts,
            ..current
        })
    }
}

async fn mark_source_paid<C: ConnectionTrait>(
    conn: &C,
    source: PayoutSource,
    ts: time::OffsetDateTime,
) -> Result<(), DomainError> {
    let rows = match source {
        PayoutSource::VendorInvoice(id) => {
            vendor_invoice::Entity::update_many()
                .col_expr(vendor_invoice::Column::Status, Expr::value(InvoiceStatus::Paid.as_str()))
                .col_expr(vendor_invoice::Column::UpdatedAt, Expr::value(ts))
                .filter(vendor_invoice::Column::Id.eq(id))
                .filter(vendor_invoice::Column::Status.eq(InvoiceStatus::NgoApproved.as_str()))
                .exec(conn)
                .await?
                .rows_affected
        }
        PayoutSource::NgoReceipt(id) => {
            ngo_receipt::Entity::update_many()
                .col_expr(ngo_receipt::Column::Status, Expr::value(ReceiptStatus::Paid.as_str()))
                .col_expr(ngo_receipt::Column::UpdatedAt, Expr::value(ts))
                .filter(ngo_receipt::Column::Id.eq(id))
                .filter(ngo_receipt::Column::Status.eq(ReceiptStatus::AdminApproved.as_str()))
                .exec(conn)
                .await?
                .rows_affected
        }
    };
    if rows == 0 {
        tracing::warn!(source = source.kind(), source_id = %source.id(), "payout source was not awaiting payment");
    }
    Ok(())
}
