use donations_sdk::{KycStatus, NewVendor, Vendor, VendorLink};
use marketplace_security::{ResourceRef, Role, SecurityContext};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde_json::{Value, json};
use uuid::Uuid;

use super::{authorize, load_cause, now, require_non_empty};
use crate::domain::error::DomainError;
use crate::infra::storage::audit::{self, AuditRecord};
use crate::infra::storage::entity::{tenant, vendor, vendor_link};
use crate::infra::storage::mapper::try_collect;
use crate::infra::storage::scope::build_scope_condition;

const VENDOR_READERS: &[Role] = &[Role::PlatformAdmin, Role::NgoAdmin, Role::NgoStaff, Role::Vendor];

pub struct VendorService {
    db: DatabaseConnection,
}

impl VendorService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self, ctx, new), fields(tenant_id = %new.tenant_id))]
    pub async fn create(&self, ctx: &SecurityContext, new: NewVendor) -> Result<Vendor, DomainError> {
        authorize(
            ctx,
            &ResourceRef::tenant(new.tenant_id),
            &[Role::NgoAdmin],
            "Only NGO admins can register vendors",
        )?;
        require_non_empty("name", &new.name)?;
        if tenant::Entity::find_by_id(new.tenant_id).one(&self.db).await?.is_none() {
            return Err(DomainError::not_found("Tenant"));
        }

        let ts = now();
        let txn = self.db.begin().await?;
        let row = vendor::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(new.tenant_id),
            name: Set(new.name),
            gstin: Set(new.gstin),
            bank_json: Set(new.bank_details),
            kyc_status: Set(new.kyc_status.unwrap_or(KycStatus::Pending).as_str().to_owned()),
            created_at: Set(ts),
            updated_at: Set(ts),
        }
        .insert(&txn)
        .await?;
        audit::append(
            &txn,
            AuditRecord::new(Some(ctx.subject_id()), "vendor", row.id, "create")
                .after(json!({ "name": row.name, "kyc_status": row.kyc_status })),
        )
        .await?;
        txn.commit().await?;

        tracing::info!(vendor_id = %row.id, "vendor registered");
        Vendor::try_from(row)
    }

    /// Vendors visible to the caller: its tenants' vendors, or only its own
    /// vendor for a vendor user.
    pub async fn list(&self, ctx: &SecurityContext) -> Result<Vec<Vendor>, DomainError> {
        let scope = ctx.scope_for(VENDOR_READERS);
        let rows = vendor::Entity::find()
            .filter(build_scope_condition::<vendor::Entity>(&scope))
            .order_by_asc(vendor::Column::Name)
            .all(&self.db)
            .await?;
        try_collect(rows)
    }

    pub async fn link_to_cause(
        &self,
        ctx: &SecurityContext,
        cause_id: Uuid,
        vendor_id: Uuid,
        terms: Option<Value>,
    ) -> Result<VendorLink, DomainError> {
        let cause = load_cause(&self.db, cause_id).await?;
        authorize(
            ctx,
            &ResourceRef::tenant(cause.tenant_id),
            &[Role::NgoAdmin],
            "Only the cause's NGO admins can link vendors",
        )?;
        let vendor = vendor::Entity::find_by_id(vendor_id).one(&self.db).await?;
        if vendor.is_none_or(|v| v.tenant_id != cause.tenant_id) {
            return Err(DomainError::validation("vendor_id", "vendor does not belong to the cause's tenant"));
        }

        let txn = self.db.begin().await?;
        let linked = vendor_link::Entity::find()
            .filter(vendor_link::Column::CauseId.eq(cause_id))
            .filter(vendor_link::Column::VendorId.eq(vendor_id))
            .count(&txn)
            .await?;
        if linked > 0 {
            return Err(DomainError::conflict("Vendor is already linked to this cause"));
        }
        let row = vendor_link::ActiveModel {
            id: Set(Uuid::now_v7()),
            cause_id: Set(cause_id),
            vendor_id: Set(vendor_id),
            terms_json: Set(terms),
            created_at: Set(now()),
        }
        .insert(&txn)
        .await?;
        audit::append(
            &txn,
            AuditRecord::new(Some(ctx.subject_id()), "vendor_link", row.id, "create")
                .after(json!({ "cause_id": cause_id, "vendor_id": vendor_id })),
        )
        .await?;
        txn.commit().await?;
        Ok(row.into())
    }
}
