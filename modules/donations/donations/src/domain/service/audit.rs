use donations_sdk::AuditEntry;
use marketplace_security::SecurityContext;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use super::require_platform_admin;
use crate::domain::error::DomainError;
use crate::infra::storage::entity::audit_log;

const MAX_ENTRIES: u64 = 500;

pub struct AuditService {
    db: DatabaseConnection,
}

impl AuditService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Newest first, at most 500 rows.
    pub async fn list(
        &self,
        ctx: &SecurityContext,
        entity: Option<&str>,
        entity_id: Option<Uuid>,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        require_platform_admin(ctx, "Only platform admins can read the audit log")?;
        let mut query = audit_log::Entity::find();
        if let Some(entity) = entity {
            query = query.filter(audit_log::Column::Entity.eq(entity));
        }
        if let Some(entity_id) = entity_id {
            query = query.filter(audit_log::Column::EntityId.eq(entity_id));
        }
        let rows = query
            .order_by_desc(audit_log::Column::Ts)
            .order_by_desc(audit_log::Column::Id)
            .limit(MAX_ENTRIES)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(AuditEntry::from).collect())
    }
}
