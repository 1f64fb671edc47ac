use std::sync::Arc;

use axum::extract::{Multipart, Path, Query};
use axum::{Extension, Json};
use donations_sdk::{InvoiceStatus, NewVendorInvoice};
use marketplace_auth::Authz;
use uuid::Uuid;

use super::SubmissionForm;
use crate::api::rest::dto::{InvoiceApprovalDto, InvoiceDto, RejectRequest, StatusQuery};
use crate::api::rest::error::ApiResult;
use crate::domain::service::Services;

/// Multipart fields: `cause_id`, `vendor_id`, `number`, `amount`, `files`.
pub async fn submit_invoice(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    multipart: Multipart,
) -> ApiResult<Json<InvoiceDto>> {
    let form = SubmissionForm::read(multipart).await?;
    let new = NewVendorInvoice {
        cause_id: form.uuid("cause_id")?,
        vendor_id: form.uuid("vendor_id")?,
        number: form.required("number")?.to_owned(),
        amount: form.decimal("amount")?,
        files: form.files,
    };
    let invoice = svc.invoices.submit(&ctx, new).await?;
    Ok(Json(invoice.into()))
}

pub async fn approve_invoice(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Path(invoice_id): Path<Uuid>,
) -> ApiResult<Json<InvoiceApprovalDto>> {
    let outcome = svc.invoices.approve(&ctx, invoice_id).await?;
    Ok(Json(outcome.into()))
}

pub async fn reject_invoice(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Path(invoice_id): Path<Uuid>,
    body: Option<Json<RejectRequest>>,
) -> ApiResult<Json<InvoiceDto>> {
    let reason = body.and_then(|Json(r)| r.reason);
    let invoice = svc.invoices.reject(&ctx, invoice_id, reason).await?;
    Ok(Json(invoice.into()))
}

pub async fn get_invoice(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Path(invoice_id): Path<Uuid>,
) -> ApiResult<Json<InvoiceDto>> {
    let invoice = svc.invoices.get(&ctx, invoice_id).await?;
    Ok(Json(invoice.into()))
}

pub async fn list_invoices(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Query(q): Query<StatusQuery<InvoiceStatus>>,
) -> ApiResult<Json<Vec<InvoiceDto>>> {
    let invoices = svc.invoices.list(&ctx, q.status).await?;
    Ok(Json(invoices.into_iter().map(Into::into).collect()))
}
