use std::sync::Arc;

use axum::extract::{Multipart, Path, Query};
use axum::{Extension, Json};
use donations_sdk::{NewNgoReceipt, ReceiptStatus};
use marketplace_auth::Authz;
use uuid::Uuid;

use super::SubmissionForm;
use crate::api::rest::dto::{ReceiptApprovalDto, ReceiptDto, RejectRequest, StatusQuery};
use crate::api::rest::error::ApiResult;
use crate::domain::service::Services;

/// Multipart fields: `cause_id`, `amount`, optional `note`, `files`.
pub async fn submit_receipt(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    multipart: Multipart,
) -> ApiResult<Json<ReceiptDto>> {
    let form = SubmissionForm::read(multipart).await?;
    let new = NewNgoReceipt {
        cause_id: form.uuid("cause_id")?,
        amount: form.decimal("amount")?,
        note: form.text("note").map(str::to_owned),
        files: form.files,
    };
    let receipt = svc.receipts.submit(&ctx, new).await?;
    Ok(Json(receipt.into()))
}

pub async fn approve_receipt(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Path(receipt_id): Path<Uuid>,
) -> ApiResult<Json<ReceiptApprovalDto>> {
    let outcome = svc.receipts.approve(&ctx, receipt_id).await?;
    Ok(Json(outcome.into()))
}

pub async fn reject_receipt(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Path(receipt_id): Path<Uuid>,
    body: Option<Json<RejectRequest>>,
) -> ApiResult<Json<ReceiptDto>> {
    let reason = body.and_then(|Json(r)| r.reason);
    let receipt = svc.receipts.reject(&ctx, receipt_id, reason).await?;
    Ok(Json(receipt.into()))
}

pub async fn get_receipt(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Path(receipt_id): Path<Uuid>,
) -> ApiResult<Json<ReceiptDto>> {
    let receipt = svc.receipts.get(&ctx, receipt_id).await?;
    Ok(Json(receipt.into()))
}

pub async fn list_receipts(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Query(q): Query<StatusQuery<ReceiptStatus>>,
) -> ApiResult<Json<Vec<ReceiptDto>>> {
    let receipts = svc.receipts.list(&ctx, q.status).await?;
    Ok(Json(receipts.into_iter().map(Into::into).collect()))
}
