//! Database-backed [`SubjectResolver`].

use async_trait::async_trait;
use marketplace_auth::{AuthError, SubjectResolver};
use marketplace_security::{MembershipGrant, Role, SecurityContext};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::infra::storage::entity::{membership, user};

/// Resolves a token subject to the user's memberships.
pub struct DbSubjectResolver {
    db: DatabaseConnection,
}

impl DbSubjectResolver {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn grant_of(row: membership::Model) -> Option<MembershipGrant> {
    let role = match row.role.parse::<Role>() {
        Ok(role) => role,
        Err(e) => {
            tracing::warn!(membership_id = %row.id, error = %e, "skipping membership with unknown role");
            return None;
        }
    };
    if role == Role::Vendor && row.vendor_id.is_none() {
        tracing::warn!(membership_id = %row.id, "skipping VENDOR membership without a vendor binding");
        return None;
    }
    Some(MembershipGrant {
        tenant_id: row.tenant_id,
        role,
        vendor_id: row.vendor_id,
    })
}

#[async_trait]
impl SubjectResolver for DbSubjectResolver {
    async fn resolve(&self, subject_id: Uuid) -> Result<SecurityContext, AuthError> {
        let user = user::Entity::find_by_id(subject_id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::UnknownSubject)?;
        if !user.is_active {
            return Err(AuthError::InactiveUser);
        }
        let memberships = membership::Entity::find()
            .filter(membership::Column::UserId.eq(subject_id))
            .all(&self.db)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(SecurityContext::builder()
            .subject_id(subject_id)
            .grants(memberships.into_iter().filter_map(grant_of))
            .build())
    }
}
