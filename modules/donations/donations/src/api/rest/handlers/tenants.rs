use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::{Extension, Json};
use donations_sdk::{NewDomain, NewTenant};
use marketplace_auth::Authz;
use uuid::Uuid;

use crate::api::rest::dto::{
    CreateDomainRequest, CreateTenantRequest, DomainDto, DomainStatusRequest, HostQuery, PolicyDto, SiteDto, TenantDto,
};
use crate::api::rest::error::ApiResult;
use crate::domain::service::Services;

pub async fn list_public_tenants(Extension(svc): Extension<Arc<Services>>) -> ApiResult<Json<Vec<TenantDto>>> {
    let tenants = svc.tenants.list_public().await?;
    Ok(Json(tenants.into_iter().map(Into::into).collect()))
}

/// Resolve an arbitrary host the way the site middleware would.
pub async fn site_by_host(Extension(svc): Extension<Arc<Services>>, Query(q): Query<HostQuery>) -> Json<SiteDto> {
    Json(svc.tenants.resolve_host(&q.host).await.into())
}

pub async fn tenant_by_slug(
    Extension(svc): Extension<Arc<Services>>,
    Path(slug): Path<String>,
) -> ApiResult<Json<TenantDto>> {
    let tenant = svc.tenants.get_by_slug(&slug).await?;
    Ok(Json(tenant.into()))
}

pub async fn create_tenant(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Json(req): Json<CreateTenantRequest>,
) -> ApiResult<(StatusCode, Json<TenantDto>)> {
    let new = NewTenant {
        name: req.name,
        slug: req.slug,
        description: req.description,
        logo_url: req.logo_url,
        website_url: req.website_url,
        contact_email: req.contact_email,
        contact_phone: req.contact_phone,
        address: req.address,
        primary_color: req.primary_color,
    };
    let tenant = svc.tenants.create_tenant(&ctx, new).await?;
    Ok((StatusCode::CREATED, Json(tenant.into())))
}

pub async fn add_domain(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Path(tenant_id): Path<Uuid>,
    Json(req): Json<CreateDomainRequest>,
) -> ApiResult<(StatusCode, Json<DomainDto>)> {
    let domain = svc
        .tenants
        .add_domain(
            &ctx,
            tenant_id,
            NewDomain {
                host: req.host,
                is_primary: req.is_primary,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(domain.into())))
}

pub async fn set_domain_status(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Path(domain_id): Path<Uuid>,
    Json(req): Json<DomainStatusRequest>,
) -> ApiResult<Json<DomainDto>> {
    let domain = svc.tenants.set_domain_status(&ctx, domain_id, req.status).await?;
    Ok(Json(domain.into()))
}

pub async fn get_policy(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Path(tenant_id): Path<Uuid>,
) -> ApiResult<Json<PolicyDto>> {
    let policy = svc.tenants.get_policy(&ctx, tenant_id).await?;
    Ok(Json(policy.into()))
}
