use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query};
use axum::http::HeaderMap;
use axum::{Extension, Json};
use donations_sdk::{DonationRequest, DonationStatus};
use marketplace_auth::Authz;
use uuid::Uuid;

use crate::api::rest::dto::{
    DonationDto, DonationInitDto, DonationReceiptDto, InitDonationRequest, StatusQuery, WebhookAck,
};
use crate::api::rest::error::ApiResult;
use crate::domain::service::Services;

pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

pub async fn init_donation(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Json(req): Json<InitDonationRequest>,
) -> ApiResult<Json<DonationInitDto>> {
    let init = svc
        .donations
        .init(
            &ctx,
            DonationRequest {
                cause_id: req.cause_id,
                amount: req.amount,
                currency: req.currency,
            },
        )
        .await?;
    Ok(Json(init.into()))
}

/// Gateway callback. The raw body is needed for the signature check.
pub async fn payment_webhook(
    Extension(svc): Extension<Arc<Services>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    svc.donations.handle_webhook(&body, signature).await?;
    Ok(Json(WebhookAck::success()))
}

pub async fn donation_receipt(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Path(donation_id): Path<Uuid>,
) -> ApiResult<Json<DonationReceiptDto>> {
    let receipt = svc.donations.receipt(&ctx, donation_id).await?;
    Ok(Json(receipt.into()))
}

pub async fn list_my_donations(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
) -> ApiResult<Json<Vec<DonationDto>>> {
    let donations = svc.donations.list_mine(&ctx).await?;
    Ok(Json(donations.into_iter().map(Into::into).collect()))
}

pub async fn list_tenant_donations(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Query(q): Query<StatusQuery<DonationStatus>>,
) -> ApiResult<Json<Vec<DonationDto>>> {
    let donations = svc.donations.list_for_tenants(&ctx, q.status).await?;
    Ok(Json(donations.into_iter().map(Into::into).collect()))
}
