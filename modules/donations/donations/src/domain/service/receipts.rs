//! NGO reimbursement receipts: `SUBMITTED -> ADMIN_APPROVED | REJECTED`, then
//! `PAID` once the payout is processed.

use std::sync::Arc;

use donations_sdk::{
    ApprovalOutcome, DocumentPurpose, NewNgoReceipt, NgoReceipt, PayoutSource, PayoutTarget, ReceiptStatus,
};
use marketplace_security::{ResourceRef, Role, SecurityContext};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use super::payouts::create_queued_payout;
use super::{authorize, load_cause, now, require_money};
use crate::config::DonationsConfig;
use crate::domain::error::DomainError;
use crate::infra::storage::audit::{self, AuditRecord};
use crate::infra::storage::documents::record_uploads;
use crate::infra::storage::entity::ngo_receipt;
use crate::infra::storage::mapper::try_collect;
use crate::infra::storage::scope::build_scope_condition;

pub struct ReceiptService {
    db: DatabaseConnection,
    config: Arc<DonationsConfig>,
}

impl ReceiptService {
    pub fn new(db: DatabaseConnection, config: Arc<DonationsConfig>) -> Self {
        Self { db, config }
    }

    async fn load(&self, id: Uuid) -> Result<ngo_receipt::Model, DomainError> {
        ngo_receipt::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("Receipt"))
    }

    #[tracing::instrument(skip(self, ctx, new), fields(cause_id = %new.cause_id))]
    pub async fn submit(&self, ctx: &SecurityContext, new: NewNgoReceipt) -> Result<NgoReceipt, DomainError> {
        require_money("amount", new.amount)?;
        let cause = load_cause(&self.db, new.cause_id).await?;
        authorize(
            ctx,
            &ResourceRef::tenant(cause.tenant_id),
            &[Role::NgoAdmin],
            "Only NGO admins can submit receipts",
        )?;

        let ts = now();
        let txn = self.db.begin().await?;
        let files = record_uploads(
            &txn,
            &new.files,
            ctx.subject_id(),
            DocumentPurpose::NgoReceipt,
            &self.config.external_base_url,
        )
        .await?;
        let row = ngo_receipt::ActiveModel {
            id: Set(Uuid::now_v7()),
            cause_id: Set(cause.id),
            tenant_id: Set(cause.tenant_id),
            amount: Set(new.amount),
            currency: Set(self.config.default_currency.clone()),
            files: Set(serde_json::to_value(&files)?),
            note: Set(new.note),
            status: Set(ReceiptStatus::Submitted.as_str().to_owned()),
            created_at: Set(ts),
            updated_at: Set(ts),
        }
        .insert(&txn)
        .await?;
        audit::append(
            &txn,
            AuditRecord::new(Some(ctx.subject_id()), "ngo_receipt", row.id, "submit")
                .after(json!({ "amount": row.amount, "files": files.len() })),
        )
        .await?;
        txn.commit().await?;

        tracing::info!(receipt_id = %row.id, files = files.len(), "receipt submitted");
        NgoReceipt::try_from(row)
    }

    /// Approve and queue exactly one NGO payout. A second approval is a conflict.
    #[tracing::instrument(skip(self, ctx), fields(actor = %ctx.subject_id()))]
    pub async fn approve(
        &self,
        ctx: &SecurityContext,
        receipt_id: Uuid,
    ) -> Result<ApprovalOutcome<ReceiptStatus>, DomainError> {
        let receipt = self.load(receipt_id).await?;
        authorize(
            ctx,
            &ResourceRef::tenant(receipt.tenant_id),
            &[Role::PlatformAdmin],
            "Only platform admins can approve receipts",
        )?;

        let txn = self.db.begin().await?;
        let result = ngo_receipt::Entity::update_many()
            .col_expr(ngo_receipt::Column::Status, Expr::value(ReceiptStatus::AdminApproved.as_str()))
            .col_expr(ngo_receipt::Column::UpdatedAt, Expr::value(now()))
            .filter(ngo_receipt::Column::Id.eq(receipt_id))
            .filter(ngo_receipt::Column::Status.eq(ReceiptStatus::Submitted.as_str()))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(DomainError::conflict("Receipt is not awaiting approval"));
        }
        let payout = create_queued_payout(
            &txn,
            PayoutTarget::Ngo(receipt.tenant_id),
            PayoutSource::NgoReceipt(receipt_id),
            receipt.tenant_id,
            receipt.amount,
            &receipt.currency,
        )
        .await?;
        audit::append(
            &txn,
            AuditRecord::new(Some(ctx.subject_id()), "ngo_receipt", receipt_id, "approve")
                .before(json!({ "status": receipt.status }))
                .after(json!({ "status": ReceiptStatus::AdminApproved.as_str(), "payout_id": payout.id })),
        )
        .await?;
        txn.commit().await?;

        tracing::info!(receipt_id = %receipt_id, payout_id = %payout.id, "receipt approved");
        Ok(ApprovalOutcome {
            id: receipt_id,
            status: ReceiptStatus::AdminApproved,
            payout,
        })
    }

    pub async fn reject(
        &self,
        ctx: &SecurityContext,
        receipt_id: Uuid,
        reason: Option<String>,
    ) -> Result<NgoReceipt, DomainError> {
        let receipt = self.load(receipt_id).await?;
        authorize(
            ctx,
            &ResourceRef::tenant(receipt.tenant_id),
            &[Role::PlatformAdmin],
            "Only platform admins can reject receipts",
        )?;

        let ts = now();
        let txn = self.db.begin().await?;
        let result = ngo_receipt::Entity::update_many()
            .col_expr(ngo_receipt::Column::Status, Expr::value(ReceiptStatus::Rejected.as_str()))
            .col_expr(ngo_receipt::Column::UpdatedAt, Expr::value(ts))
            .filter(ngo_receipt::Column::Id.eq(receipt_id))
            .filter(ngo_receipt::Column::Status.eq(ReceiptStatus::Submitted.as_str()))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(DomainError::conflict("Receipt is not awaiting approval"));
        }
        audit::append(
            &txn,
            AuditRecord::new(Some(ctx.subject_id()), "ngo_receipt", receipt_id, "reject")
                .before(json!({ "status": receipt.status }))
                .after(json!({ "status": ReceiptStatus::Rejected.as_str(), "reason": reason })),
        )
        .await?;
        txn.commit().await?;

        let mut rejected = NgoReceipt::try_from(receipt)?;
        rejected.status = ReceiptStatus::Rejected;
        rejected.updated_at = ts;
        Ok(rejected)
    }

    pub async fn get(&self, ctx: &SecurityContext, receipt_id: Uuid) -> Result<NgoReceipt, DomainError> {
        let receipt = self.load(receipt_id).await?;
        authorize(
            ctx,
            &ResourceRef::tenant(receipt.tenant_id),
            &Role::ALL,
            "Not authorized to view this receipt",
        )?;
        NgoReceipt::try_from(receipt)
    }

    pub async fn list(&self, ctx: &SecurityContext, status: Option<ReceiptStatus>) -> Result<Vec<NgoReceipt>, DomainError> {
        let scope = ctx.scope_for(&Role::ALL);
        let mut query = ngo_receipt::Entity::find().filter(build_scope_condition::<ngo_receipt::Entity>(&scope));
        if let Some(status) = status {
            query = query.filter(ngo_receipt::Column::Status.eq(status.as_str()));
        }
        let rows = query.order_by_desc(ngo_receipt::Column::CreatedAt).all(&self.db).await?;
        try_collect(rows)
    }
}
