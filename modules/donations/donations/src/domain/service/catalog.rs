use donations_sdk::{Category, Cause, CauseStatus, NewCategory, NewCause, SiteMode};
use marketplace_security::{ResourceRef, Role, SecurityContext};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use super::{authorize, load_cause, now, require_money, require_non_empty, require_platform_admin};
use crate::domain::error::DomainError;
use crate::infra::storage::audit::{self, AuditRecord};
use crate::infra::storage::entity::{category, cause, tenant};
use crate::infra::storage::mapper::try_collect;

/// Public cause listing filter.
#[derive(Debug, Clone, Default)]
pub struct CauseFilter {
    pub tenant_slug: Option<String>,
    /// Defaults to `LIVE`. `DRAFT` matches nothing.
    pub status: Option<CauseStatus>,
}

pub struct CatalogService {
    db: DatabaseConnection,
}

impl CatalogService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// List causes for the public site. On a microsite without an explicit
    /// tenant the list is limited to the microsite's tenant. Drafts are never listed.
    pub async fn list_public_causes(&self, filter: CauseFilter, site: &SiteMode) -> Result<Vec<Cause>, DomainError> {
        let status = filter.status.unwrap_or(CauseStatus::Live);
        if status == CauseStatus::Draft {
            return Ok(Vec::new());
        }
        let tenant_id = match (&filter.tenant_slug, site.tenant()) {
            (Some(slug), _) => {
                let found = tenant::Entity::find()
                    .filter(tenant::Column::Slug.eq(slug.as_str()))
                    .one(&self.db)
                    .await?;
                match found {
                    Some(t) => Some(t.id),
                    None => return Ok(Vec::new()),
                }
            }
            (None, Some(t)) => Some(t.id),
            (None, None) => None,
        };

        let mut query = cause::Entity::find().filter(cause::Column::Status.eq(status.as_str()));
        if let Some(tenant_id) = tenant_id {
            query = query.filter(cause::Column::TenantId.eq(tenant_id));
        }
        let rows = query.order_by_desc(cause::Column::CreatedAt).all(&self.db).await?;
        try_collect(rows)
    }

    /// Drafts are not public.
    pub async fn get_public_cause(&self, id: Uuid) -> Result<Cause, DomainError> {
        let row = load_cause(&self.db, id).await?;
        let cause = Cause::try_from(row)?;
        if cause.status == CauseStatus::Draft {
            return Err(DomainError::not_found("Cause"));
        }
        Ok(cause)
    }

    #[tracing::instrument(skip(self, ctx, new), fields(tenant_id = %new.tenant_id))]
    pub async fn create_cause(&self, ctx: &SecurityContext, new: NewCause) -> Result<Cause, DomainError> {
        authorize(
            ctx,
            &ResourceRef::tenant(new.tenant_id),
            &[Role::NgoAdmin],
            "Only NGO admins can create causes",
        )?;
        require_non_empty("title", &new.title)?;
        require_money("goal_amount", new.goal_amount)?;
        if category::Entity::find_by_id(new.category_id).one(&self.db).await?.is_none() {
            return Err(DomainError::validation("category_id", "unknown category"));
        }

        let ts = now();
        let txn = self.db.begin().await?;
        let row = cause::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(new.tenant_id),
            category_id: Set(new.category_id),
            title: Set(new.title),
            description: Set(new.description),
            goal_amount: Set(new.goal_amount),
            raised_amount: Set(Decimal::ZERO),
            cause_type: Set(new.cause_type.as_str().to_owned()),
            status: Set(CauseStatus::Draft.as_str().to_owned()),
            policy_flags: Set(new.policy_flags),
            created_at: Set(ts),
            updated_at: Set(ts),
        }
        .insert(&txn)
        .await?;
        audit::append(
            &txn,
            AuditRecord::new(Some(ctx.subject_id()), "cause", row.id, "create").after(json!({
                "title": row.title,
                "goal_amount": row.goal_amount,
                "status": row.status,
            })),
        )
        .await?;
        txn.commit().await?;

        tracing::info!(cause_id = %row.id, "cause created");
        Cause::try_from(row)
    }

    #[tracing::instrument(skip(self, ctx), fields(actor = %ctx.subject_id()))]
    pub async fn set_cause_status(
        &self,
        ctx: &SecurityContext,
        cause_id: Uuid,
        next: CauseStatus,
    ) -> Result<Cause, DomainError> {
        let current = Cause::try_from(load_cause(&self.db, cause_id).await?)?;
        authorize(
            ctx,
            &ResourceRef::tenant(current.tenant_id),
            &[Role::NgoAdmin, Role::PlatformAdmin],
            "Only the cause's NGO admins can change its status",
        )?;
        if !current.status.can_transition_to(next) {
            return Err(DomainError::conflict(format!(
                "Cannot move cause from {} to {next}",
                current.status
            )));
        }

        let ts = now();
        let txn = self.db.begin().await?;
        let result = cause::Entity::update_many()
            .col_expr(cause::Column::Status, Expr::value(next.as_str()))
            .col_expr(cause::Column::UpdatedAt, Expr::value(ts))
            .filter(cause::Column::Id.eq(cause_id))
            .filter(cause::Column::Status.eq(current.status.as_str()))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(DomainError::conflict("Cause status changed concurrently"));
        }
        audit::append(
            &txn,
            AuditRecord::new(Some(ctx.subject_id()), "cause", cause_id, "status")
                .before(json!({ "status": current.status.as_str() }))
                .after(json!({ "status": next.as_str() })),
        )
        .await?;
        txn.commit().await?;

        tracing::info!(cause_id = %cause_id, from = %current.status, to = %next, "cause status changed");
        Ok(Cause {
            status: next,
            updated_at: ts,
            ..current
        })
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        let rows = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    pub async fn create_category(&self, ctx: &SecurityContext, new: NewCategory) -> Result<Category, DomainError> {
        require_platform_admin(ctx, "Only platform admins can create categories")?;
        require_non_empty("name", &new.name)?;

        let txn = self.db.begin().await?;
        let taken = category::Entity::find()
            .filter(category::Column::Name.eq(new.name.as_str()))
            .count(&txn)
            .await?;
        if taken > 0 {
            return Err(DomainError::conflict(format!("Category '{}' already exists", new.name)));
        }
        let row = category::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(new.name),
            description: Set(new.description),
            created_at: Set(now()),
        }
        .insert(&txn)
        .await?;
        audit::append(
            &txn,
            AuditRecord::new(Some(ctx.subject_id()), "category", row.id, "create").after(json!({ "name": row.name })),
        )
        .await?;
        txn.commit().await?;
        Ok(row.into())
    }
}
