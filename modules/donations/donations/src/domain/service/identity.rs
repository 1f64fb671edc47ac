use donations_sdk::{Membership, NewMembership, User};
use marketplace_security::{ResourceRef, Role, SecurityContext};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use super::{authorize, now};
use crate::domain::error::DomainError;
use crate::infra::storage::audit::{self, AuditRecord};
use crate::infra::storage::entity::{membership, tenant, user, vendor};
use crate::infra::storage::mapper::try_collect;

/// Roles an NGO admin may hand out inside its own tenant.
const NGO_ADMIN_GRANTABLE: &[Role] = &[Role::NgoStaff, Role::Vendor, Role::Donor];

/// The caller as stored: profile plus every membership.
#[derive(Debug, Clone)]
pub struct Me {
    pub user: User,
    pub memberships: Vec<Membership>,
}

pub struct IdentityService {
    db: DatabaseConnection,
}

impl IdentityService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn me(&self, ctx: &SecurityContext) -> Result<Me, DomainError> {
        let user = user::Entity::find_by_id(ctx.subject_id())
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))?;
        let rows = membership::Entity::find()
            .filter(membership::Column::UserId.eq(ctx.subject_id()))
            .order_by_asc(membership::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(Me {
            user: user.into(),
            memberships: try_collect(rows)?,
        })
    }

    #[tracing::instrument(skip(self, ctx), fields(actor = %ctx.subject_id()))]
    pub async fn grant_membership(
        &self,
        ctx: &SecurityContext,
        new: NewMembership,
    ) -> Result<Membership, DomainError> {
        if !ctx.is_platform_admin() {
            authorize(
                ctx,
                &ResourceRef::tenant(new.tenant_id),
                &[Role::NgoAdmin],
                "Only platform or NGO admins can grant memberships",
            )?;
            if !NGO_ADMIN_GRANTABLE.contains(&new.role) {
                return Err(DomainError::forbidden(format!(
                    "NGO admins cannot grant the {} role",
                    new.role
                )));
            }
        }

        if user::Entity::find_by_id(new.user_id).one(&self.db).await?.is_none() {
            return Err(DomainError::not_found("User"));
        }
        if tenant::Entity::find_by_id(new.tenant_id).one(&self.db).await?.is_none() {
            return Err(DomainError::not_found("Tenant"));
        }
        match (new.role, new.vendor_id) {
            (Role::Vendor, Some(vendor_id)) => {
                let vendor = vendor::Entity::find_by_id(vendor_id).one(&self.db).await?;
                if vendor.is_none_or(|v| v.tenant_id != new.tenant_id) {
                    return Err(DomainError::validation("vendor_id", "vendor does not belong to the tenant"));
                }
            }
            (Role::Vendor, None) => {
                return Err(DomainError::validation("vendor_id", "required for the VENDOR role"));
            }
            (_, Some(_)) => {
                return Err(DomainError::validation("vendor_id", "only allowed for the VENDOR role"));
            }
            (_, None) => {}
        }

        let txn = self.db.begin().await?;
        let existing = membership::Entity::find()
            .filter(membership::Column::UserId.eq(new.user_id))
            .filter(membership::Column::TenantId.eq(new.tenant_id))
            .filter(membership::Column::Role.eq(new.role.as_str()))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(DomainError::conflict("Membership already exists"));
        }
        let row = membership::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(new.user_id),
            tenant_id: Set(new.tenant_id),
            role: Set(new.role.as_str().to_owned()),
            vendor_id: Set(new.vendor_id),
            created_at: Set(now()),
        }
        .insert(&txn)
        .await?;
        audit::append(
            &txn,
            AuditRecord::new(Some(ctx.subject_id()), "membership", row.id, "grant").after(json!({
                "user_id": new.user_id,
                "tenant_id": new.tenant_id,
                "role": new.role.as_str(),
                "vendor_id": new.vendor_id,
            })),
        )
        .await?;
        txn.commit().await?;

        tracing::info!(membership_id = %row.id, role = %new.role, "membership granted");
        Membership::try_from(row)
    }
}
