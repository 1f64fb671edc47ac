//! Vendor invoices: `SUBMITTED -> NGO_APPROVED | REJECTED`, then `PAID` once the
//! payout is processed.

use std::sync::Arc;

use donations_sdk::{
    ApprovalOutcome, DocumentPurpose, InvoiceStatus, NewVendorInvoice, PayoutSource, PayoutTarget, VendorInvoice,
};
use marketplace_security::{ResourceRef, Role, SecurityContext};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use super::payouts::create_queued_payout;
use super::{authorize, load_cause, now, require_money, require_non_empty};
use crate::config::DonationsConfig;
use crate::domain::error::DomainError;
use crate::infra::storage::audit::{self, AuditRecord};
use crate::infra::storage::documents::record_uploads;
use crate::infra::storage::entity::{vendor, vendor_invoice};
use crate::infra::storage::mapper::try_collect;
use crate::infra::storage::scope::build_scope_condition;

const REVIEWERS: &[Role] = &[Role::NgoAdmin, Role::PlatformAdmin];

pub struct InvoiceService {
    db: DatabaseConnection,
    config: Arc<DonationsConfig>,
}

impl InvoiceService {
    pub fn new(db: DatabaseConnection, config: Arc<DonationsConfig>) -> Self {
        Self { db, config }
    }

    async fn load(&self, id: Uuid) -> Result<vendor_invoice::Model, DomainError> {
        vendor_invoice::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("Invoice"))
    }

    #[tracing::instrument(skip(self, ctx, new), fields(cause_id = %new.cause_id, vendor_id = %new.vendor_id))]
    pub async fn submit(&self, ctx: &SecurityContext, new: NewVendorInvoice) -> Result<VendorInvoice, DomainError> {
        require_non_empty("number", &new.number)?;
        require_money("amount", new.amount)?;
        let cause = load_cause(&self.db, new.cause_id).await?;
        let vendor = vendor::Entity::find_by_id(new.vendor_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("Vendor"))?;
        if vendor.tenant_id != cause.tenant_id {
            return Err(DomainError::validation("vendor_id", "vendor does not belong to the cause's tenant"));
        }
        authorize(
            ctx,
            &ResourceRef::tenant(vendor.tenant_id).with_vendor(vendor.id),
            &[Role::Vendor],
            "Only vendors can submit invoices",
        )?;

        let ts = now();
        let txn = self.db.begin().await?;
        let files = record_uploads(
            &txn,
            &new.files,
            ctx.subject_id(),
            DocumentPurpose::VendorInvoice,
            &self.config.external_base_url,
        )
        .await?;
        let row = vendor_invoice::ActiveModel {
            id: Set(Uuid::now_v7()),
            cause_id: Set(cause.id),
            vendor_id: Set(vendor.id),
            tenant_id: Set(vendor.tenant_id),
            number: Set(new.number.trim().to_owned()),
            amount: Set(new.amount),
            currency: Set(self.config.default_currency.clone()),
            files: Set(serde_json::to_value(&files)?),
            status: Set(InvoiceStatus::Submitted.as_str().to_owned()),
            created_at: Set(ts),
            updated_at: Set(ts),
        }
        .insert(&txn)
        .await?;
        audit::append(
            &txn,
            AuditRecord::new(Some(ctx.subject_id()), "vendor_invoice", row.id, "submit").after(json!({
                "number": row.number,
                "amount": row.amount,
                "files": files.len(),
            })),
        )
        .await?;
        txn.commit().await?;

        tracing::info!(invoice_id = %row.id, files = files.len(), "invoice submitted");
        VendorInvoice::try_from(row)
    }

    /// Approve and queue exactly one vendor payout. A second approval is a conflict.
    #[tracing::instrument(skip(self, ctx), fields(actor = %ctx.subject_id()))]
    pub async fn approve(
        &self,
        ctx: &SecurityContext,
        invoice_id: Uuid,
    ) -> Result<ApprovalOutcome<InvoiceStatus>, DomainError> {
        let invoice = self.load(invoice_id).await?;
        authorize(
            ctx,
            &ResourceRef::tenant(invoice.tenant_id),
            REVIEWERS,
            "Only NGO admins can approve invoices",
        )?;

        let txn = self.db.begin().await?;
        let result = vendor_invoice::Entity::update_many()
            .col_expr(vendor_invoice::Column::Status, Expr::value(InvoiceStatus::NgoApproved.as_str()))
            .col_expr(vendor_invoice::Column::UpdatedAt, Expr::value(now()))
            .filter(vendor_invoice::Column::Id.eq(invoice_id))
            .filter(vendor_invoice::Column::Status.eq(InvoiceStatus::Submitted.as_str()))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(DomainError::conflict("Invoice is not awaiting approval"));
        }
        let payout = create_queued_payout(
            &txn,
            PayoutTarget::Vendor(invoice.vendor_id),
            PayoutSource::VendorInvoice(invoice_id),
            invoice.tenant_id,
            invoice.amount,
            &invoice.currency,
        )
        .await?;
        audit::append(
            &txn,
            AuditRecord::new(Some(ctx.subject_id()), "vendor_invoice", invoice_id, "approve")
                .before(json!({ "status": invoice.status }))
                .after(json!({ "status": InvoiceStatus::NgoApproved.as_str(), "payout_id": payout.id })),
        )
        .await?;
        txn.commit().await?;

        tracing::info!(invoice_id = %invoice_id, payout_id = %payout.id, "invoice approved");
        Ok(ApprovalOutcome {
            id: invoice_id,
            status: InvoiceStatus::NgoApproved,
            payout,
        })
    }

    pub async fn reject(
        &self,
        ctx: &SecurityContext,
        invoice_id: Uuid,
        reason: Option<String>,
    ) -> Result<VendorInvoice, DomainError> {
        let invoice = self.load(invoice_id).await?;
        authorize(
            ctx,
            &ResourceRef::tenant(invoice.tenant_id),
            REVIEWERS,
            "Only NGO admins can reject invoices",
        )?;

        let ts = now();
        let txn = self.db.begin().await?;
        let result = vendor_invoice::Entity::update_many()
            .col_expr(vendor_invoice::Column::Status, Expr::value(InvoiceStatus::Rejected.as_str()))
            .col_expr(vendor_invoice::Column::UpdatedAt, Expr::value(ts))
            .filter(vendor_invoice::Column::Id.eq(invoice_id))
            .filter(vendor_invoice::Column::Status.eq(InvoiceStatus::Submitted.as_str()))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(DomainError::conflict("Invoice is not awaiting approval"));
        }
        audit::append(
            &txn,
            AuditRecord::new(Some(ctx.subject_id()), "vendor_invoice", invoice_id, "reject")
                .before(json!({ "status": invoice.status }))
                .after(json!({ "status": InvoiceStatus::Rejected.as_str(), "reason": reason })),
        )
        .await?;
        txn.commit().await?;

        tracing::info!(invoice_id = %invoice_id, "invoice rejected");
        let mut rejected = VendorInvoice::try_from(invoice)?;
        rejected.status = InvoiceStatus::Rejected;
        rejected.updated_at = ts;
        Ok(rejected)
    }

    /// Readable by any member of the invoice's tenant; vendor users only for
    /// their own vendor.
    pub async fn get(&self, ctx: &SecurityContext, invoice_id: Uuid) -> Result<VendorInvoice, DomainError> {
        let invoice = self.load(invoice_id).await?;
        authorize(
            ctx,
            &ResourceRef::tenant(invoice.tenant_id).with_vendor(invoice.vendor_id),
            &Role::ALL,
            "Not authorized to view this invoice",
        )?;
        VendorInvoice::try_from(invoice)
    }

    pub async fn list(
        &self,
        ctx: &SecurityContext,
        status: Option<InvoiceStatus>,
    ) -> Result<Vec<VendorInvoice>, DomainError> {
        let scope = ctx.scope_for(&Role::ALL);
        let mut query = vendor_invoice::Entity::find().filter(build_scope_condition::<vendor_invoice::Entity>(&scope));
        if let Some(status) = status {
            query = query.filter(vendor_invoice::Column::Status.eq(status.as_str()));
        }
        let rows = query
            .order_by_desc(vendor_invoice::Column::CreatedAt)
            .all(&self.db)
            .await?;
        try_collect(rows)
    }
}
