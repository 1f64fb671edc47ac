use std::sync::Arc;

use donations_sdk::{DomainStatus, NewDomain, NewTenant, SiteMode, Tenant, TenantDomain, TenantPolicy, Theme};
use marketplace_security::{ResourceRef, Role, SecurityContext};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use super::{authorize, now, require_non_empty, require_platform_admin};
use crate::config::DonationsConfig;
use crate::domain::error::DomainError;
use crate::infra::storage::audit::{self, AuditRecord};
use crate::infra::storage::entity::{tenant, tenant_domain, tenant_policy};

const DEFAULT_NGO_MANAGED_CAP_PERCENT: i32 = 10;

/// Lower-case the host and drop any port. `[v6]:port` keeps the brackets.
pub fn normalize_host(raw: &str) -> String {
    let host = raw.trim().to_ascii_lowercase();
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => host[..=end].to_owned(),
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.bytes().all(|b| b.is_ascii_digit()) => {
            name.to_owned()
        }
        _ => host,
    }
}

fn valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

pub struct TenantService {
    db: DatabaseConnection,
    config: Arc<DonationsConfig>,
}

impl TenantService {
    pub fn new(db: DatabaseConnection, config: Arc<DonationsConfig>) -> Self {
        Self { db, config }
    }

    /// Map a request host to its serving mode. Never fails: anything but exactly
    /// one LIVE domain falls back to marketplace mode.
    pub async fn resolve_host(&self, raw_host: &str) -> SiteMode {
        let host = normalize_host(raw_host);
        if host.is_empty() {
            return SiteMode::Marketplace;
        }
        match self.lookup_live_tenant(&host).await {
            Ok(Some(tenant)) => {
                let theme = self.theme_for(&tenant);
                SiteMode::Microsite {
                    tenant: Box::new(tenant),
                    theme,
                }
            }
            Ok(None) => SiteMode::Marketplace,
            Err(e) => {
                tracing::warn!(host = %host, error = %e, "tenant lookup failed; serving marketplace");
                SiteMode::Marketplace
            }
        }
    }

    async fn lookup_live_tenant(&self, host: &str) -> Result<Option<Tenant>, DomainError> {
        let domains = tenant_domain::Entity::find()
            .filter(tenant_domain::Column::Host.eq(host))
            .filter(tenant_domain::Column::Status.eq(DomainStatus::Live.as_str()))
            .all(&self.db)
            .await?;
        let [domain] = domains.as_slice() else {
            if domains.len() > 1 {
                tracing::warn!(host = %host, matches = domains.len(), "ambiguous LIVE domain; serving marketplace");
            }
            return Ok(None);
        };
        let tenant = tenant::Entity::find_by_id(domain.tenant_id).one(&self.db).await?;
        Ok(tenant.map(Tenant::from))
    }

    fn theme_for(&self, tenant: &Tenant) -> Theme {
        Theme {
            primary_color: tenant
                .primary_color
                .clone()
                .unwrap_or_else(|| self.config.default_primary_color.clone()),
            logo_url: tenant.logo_url.clone(),
            brand_name: tenant.name.clone(),
            website_url: tenant.website_url.clone(),
        }
    }

    /// Public NGO directory, by name.
    pub async fn list_public(&self) -> Result<Vec<Tenant>, DomainError> {
        let rows = tenant::Entity::find()
            .order_by_asc(tenant::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Tenant::from).collect())
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Tenant, DomainError> {
        tenant::Entity::find()
            .filter(tenant::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .map(Tenant::from)
            .ok_or_else(|| DomainError::not_found("Tenant"))
    }

    #[tracing::instrument(skip(self, ctx, new), fields(slug = %new.slug))]
    pub async fn create_tenant(&self, ctx: &SecurityContext, new: NewTenant) -> Result<Tenant, DomainError> {
        require_platform_admin(ctx, "Only platform admins can create tenants")?;
        require_non_empty("name", &new.name)?;
        if !valid_slug(&new.slug) {
            return Err(DomainError::validation("slug", "must be lowercase letters, digits and dashes"));
        }

        let txn = self.db.begin().await?;
        let taken = tenant::Entity::find()
            .filter(tenant::Column::Slug.eq(&new.slug))
            .count(&txn)
            .await?;
        if taken > 0 {
            return Err(DomainError::conflict(format!("Slug '{}' is already taken", new.slug)));
        }
        let ts = now();
        let row = tenant::ActiveModel {
            id: Set(Uuid::now_v7()),
            slug: Set(new.slug),
            name: Set(new.name),
            description: Set(new.description),
            logo_url: Set(new.logo_url),
            website_url: Set(new.website_url),
            contact_email: Set(new.contact_email),
            contact_phone: Set(new.contact_phone),
            address: Set(new.address),
            primary_color: Set(new.primary_color),
            created_at: Set(ts),
            updated_at: Set(ts),
        }
        .insert(&txn)
        .await?;
        tenant_policy::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(row.id),
            allow_ngo_managed: Set(false),
            ngo_managed_monthly_cap_percent: Set(DEFAULT_NGO_MANAGED_CAP_PERCENT),
            created_at: Set(ts),
            updated_at: Set(ts),
        }
        .insert(&txn)
        .await?;
        audit::append(
            &txn,
            AuditRecord::new(Some(ctx.subject_id()), "tenant", row.id, "create")
                .after(json!({ "slug": row.slug, "name": row.name })),
        )
        .await?;
        txn.commit().await?;

        tracing::info!(tenant_id = %row.id, "tenant created");
        Ok(row.into())
    }

    pub async fn add_domain(
        &self,
        ctx: &SecurityContext,
        tenant_id: Uuid,
        new: NewDomain,
    ) -> Result<TenantDomain, DomainError> {
        authorize(
            ctx,
            &ResourceRef::tenant(tenant_id),
            &[Role::PlatformAdmin, Role::NgoAdmin],
            "Only the tenant's NGO admins can add domains",
        )?;
        let host = normalize_host(&new.host);
        require_non_empty("host", &host)?;
        if tenant::Entity::find_by_id(tenant_id).one(&self.db).await?.is_none() {
            return Err(DomainError::not_found("Tenant"));
        }

        let txn = self.db.begin().await?;
        let duplicate = tenant_domain::Entity::find()
            .filter(tenant_domain::Column::TenantId.eq(tenant_id))
            .filter(tenant_domain::Column::Host.eq(&host))
            .count(&txn)
            .await?;
        if duplicate > 0 {
            return Err(DomainError::conflict(format!("Domain '{host}' is already registered")));
        }
        let row = tenant_domain::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(tenant_id),
            host: Set(host),
            status: Set(DomainStatus::PendingDns.as_str().to_owned()),
            is_primary: Set(new.is_primary),
            created_at: Set(now()),
        }
        .insert(&txn)
        .await?;
        audit::append(
            &txn,
            AuditRecord::new(Some(ctx.subject_id()), "tenant_domain", row.id, "create")
                .after(json!({ "host": row.host, "status": row.status })),
        )
        .await?;
        txn.commit().await?;
        TenantDomain::try_from(row)
    }

    /// Change a domain's status. A host may have at most one LIVE domain.
    #[tracing::instrument(skip(self, ctx), fields(actor = %ctx.subject_id()))]
    pub async fn set_domain_status(
        &self,
        ctx: &SecurityContext,
        domain_id: Uuid,
        status: DomainStatus,
    ) -> Result<TenantDomain, DomainError> {
        require_platform_admin(ctx, "Only platform admins can change domain status")?;

        let txn = self.db.begin().await?;
        let current = tenant_domain::Entity::find_by_id(domain_id)
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::not_found("Domain"))?;
        if status == DomainStatus::Live {
            let clash = tenant_domain::Entity::find()
                .filter(tenant_domain::Column::Host.eq(&current.host))
                .filter(tenant_domain::Column::Status.eq(DomainStatus::Live.as_str()))
                .filter(tenant_domain::Column::Id.ne(domain_id))
                .count(&txn)
                .await?;
            if clash > 0 {
                return Err(DomainError::conflict(format!(
                    "Host '{}' is already live for another domain",
                    current.host
                )));
            }
        }
        let result = tenant_domain::Entity::update_many()
            .col_expr(tenant_domain::Column::Status, Expr::value(status.as_str()))
            .filter(tenant_domain::Column::Id.eq(domain_id))
            .filter(tenant_domain::Column::Status.eq(current.status.as_str()))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(DomainError::conflict("Domain status changed concurrently"));
        }
        audit::append(
            &txn,
            AuditRecord::new(Some(ctx.subject_id()), "tenant_domain", domain_id, "status")
                .before(json!({ "status": current.status }))
                .after(json!({ "status": status.as_str() })),
        )
        .await?;
        txn.commit().await?;

        tracing::info!(domain_id = %domain_id, host = %current.host, status = %status, "domain status changed");
        let mut domain = TenantDomain::try_from(current)?;
        domain.status = status;
        Ok(domain)
    }

    /// Stored policy; nothing enforces it yet.
    pub async fn get_policy(&self, ctx: &SecurityContext, tenant_id: Uuid) -> Result<TenantPolicy, DomainError> {
        authorize(
            ctx,
            &ResourceRef::tenant(tenant_id),
            &[Role::NgoAdmin, Role::PlatformAdmin],
            "Only the tenant's NGO admins can read its policy",
        )?;
        tenant_policy::Entity::find()
            .filter(tenant_policy::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await?
            .map(TenantPolicy::from)
            .ok_or_else(|| DomainError::not_found("TenantPolicy"))
    }
}
