use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::{Extension, Json};
use donations_sdk::{PayoutStatus, PayoutStatusUpdate};
use marketplace_auth::Authz;
use uuid::Uuid;

use crate::api::rest::dto::{PayoutDto, PayoutStatusRequest, StatusQuery};
use crate::api::rest::error::ApiResult;
use crate::domain::service::Services;

pub async fn get_payout(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Path(payout_id): Path<Uuid>,
) -> ApiResult<Json<PayoutDto>> {
    let payout = svc.payouts.get(&ctx, payout_id).await?;
    Ok(Json(payout.into()))
}

pub async fn list_payouts(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Query(q): Query<StatusQuery<PayoutStatus>>,
) -> ApiResult<Json<Vec<PayoutDto>>> {
    let payouts = svc.payouts.list(&ctx, q.status).await?;
    Ok(Json(payouts.into_iter().map(Into::into).collect()))
}

pub async fn update_payout_status(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Path(payout_id): Path<Uuid>,
    Json(req): Json<PayoutStatusRequest>,
) -> ApiResult<Json<PayoutDto>> {
    let update = PayoutStatusUpdate {
        status: req.status,
        pg_payout_id: req.pg_payout_id,
    };
    let payout = svc.payouts.update_status(&ctx, payout_id, update).await?;
    Ok(Json(payout.into()))
}
