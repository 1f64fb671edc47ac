//! Append-only audit trail.

use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use super::entity::audit_log;
use crate::domain::error::DomainError;

/// One audit row. Written on the same connection (usually a transaction) as
/// the mutation it describes.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub actor_id: Option<Uuid>,
    pub entity: &'static str,
    pub entity_id: Uuid,
    pub action: &'static str,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

impl AuditRecord {
    pub fn new(actor_id: Option<Uuid>, entity: &'static str, entity_id: Uuid, action: &'static str) -> Self {
        Self {
            actor_id,
            entity,
            entity_id,
            action,
            before: None,
            after: None,
        }
    }

    #[must_use]
    pub fn before(mut self, value: Value) -> Self {
        self.before = Some(value);
        self
    }

    #[must_use]
    pub fn after(mut self, value: Value) -> Self {
        self.after = Some(value);
        self
    }
}

pub async fn append<C: ConnectionTrait>(conn: &C, record: AuditRecord) -> Result<(), DomainError> {
    audit_log::ActiveModel {
        id: Set(Uuid::now_v7()),
        actor_id: Set(record.actor_id),
        entity: Set(record.entity.to_owned()),
        entity_id: Set(record.entity_id),
        action: Set(record.action.to_owned()),
        before_json: Set(record.before),
        after_json: Set(record.after),
        ts: Set(OffsetDateTime::now_utc()),
    }
    .insert(conn)
    .await?;
    Ok(())
}
