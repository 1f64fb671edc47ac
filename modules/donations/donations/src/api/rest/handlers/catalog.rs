use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::{Extension, Json};
use donations_sdk::{CauseType, NewCategory, NewCause, SiteMode};
use marketplace_auth::Authz;
use uuid::Uuid;

use crate::api::rest::dto::{
    CategoryDto, CauseDto, CauseQuery, CauseStatusRequest, CreateCategoryRequest, CreateCauseRequest,
};
use crate::api::rest::error::ApiResult;
use crate::domain::service::{CauseFilter, Services};

pub async fn list_public_causes(
    Extension(svc): Extension<Arc<Services>>,
    Extension(site): Extension<SiteMode>,
    Query(q): Query<CauseQuery>,
) -> ApiResult<Json<Vec<CauseDto>>> {
    let filter = CauseFilter {
        tenant_slug: q.tenant,
        status: q.status,
    };
    let causes = svc.catalog.list_public_causes(filter, &site).await?;
    Ok(Json(causes.into_iter().map(Into::into).collect()))
}

pub async fn get_public_cause(
    Extension(svc): Extension<Arc<Services>>,
    Path(cause_id): Path<Uuid>,
) -> ApiResult<Json<CauseDto>> {
    let cause = svc.catalog.get_public_cause(cause_id).await?;
    Ok(Json(cause.into()))
}

pub async fn list_categories(Extension(svc): Extension<Arc<Services>>) -> ApiResult<Json<Vec<CategoryDto>>> {
    let categories = svc.catalog.list_categories().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

pub async fn create_category(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<CategoryDto>)> {
    let category = svc
        .catalog
        .create_category(
            &ctx,
            NewCategory {
                name: req.name,
                description: req.description,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

pub async fn create_cause(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Json(req): Json<CreateCauseRequest>,
) -> ApiResult<(StatusCode, Json<CauseDto>)> {
    let new = NewCause {
        tenant_id: req.tenant_id,
        category_id: req.category_id,
        title: req.title,
        description: req.description,
        goal_amount: req.goal_amount,
        cause_type: req.cause_type.unwrap_or(CauseType::Vendor),
        policy_flags: req.policy_flags,
    };
    let cause = svc.catalog.create_cause(&ctx, new).await?;
    Ok((StatusCode::CREATED, Json(cause.into())))
}

pub async fn set_cause_status(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Path(cause_id): Path<Uuid>,
    Json(req): Json<CauseStatusRequest>,
) -> ApiResult<Json<CauseDto>> {
    let cause = svc.catalog.set_cause_status(&ctx, cause_id, req.status).await?;
    Ok(Json(cause.into()))
}
