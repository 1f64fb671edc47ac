use std::sync::Arc;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::{Extension, Json};
use donations_sdk::NewVendor;
use marketplace_auth::Authz;
use uuid::Uuid;

use crate::api::rest::dto::{CreateVendorRequest, LinkVendorRequest, VendorDto, VendorLinkDto};
use crate::api::rest::error::ApiResult;
use crate::domain::service::Services;

pub async fn create_vendor(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Json(req): Json<CreateVendorRequest>,
) -> ApiResult<(StatusCode, Json<VendorDto>)> {
    let new = NewVendor {
        tenant_id: req.tenant_id,
        name: req.name,
        gstin: req.gstin,
        bank_details: req.bank_details,
        kyc_status: req.kyc_status,
    };
    let vendor = svc.vendors.create(&ctx, new).await?;
    Ok((StatusCode::CREATED, Json(vendor.into())))
}

pub async fn list_vendors(Authz(ctx): Authz, Extension(svc): Extension<Arc<Services>>) -> ApiResult<Json<Vec<VendorDto>>> {
    let vendors = svc.vendors.list(&ctx).await?;
    Ok(Json(vendors.into_iter().map(Into::into).collect()))
}

pub async fn link_vendor(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Path(cause_id): Path<Uuid>,
    Json(req): Json<LinkVendorRequest>,
) -> ApiResult<(StatusCode, Json<VendorLinkDto>)> {
    let link = svc.vendors.link_to_cause(&ctx, cause_id, req.vendor_id, req.terms).await?;
    Ok((StatusCode::CREATED, Json(link.into())))
}
