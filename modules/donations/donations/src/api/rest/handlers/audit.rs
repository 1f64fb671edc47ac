use std::sync::Arc;

use axum::extract::Query;
use axum::{Extension, Json};
use marketplace_auth::Authz;

use crate::api::rest::dto::{AuditEntryDto, AuditQuery};
use crate::api::rest::error::ApiResult;
use crate::domain::service::Services;

pub async fn list_audit(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Query(q): Query<AuditQuery>,
) -> ApiResult<Json<Vec<AuditEntryDto>>> {
    let entries = svc.audit.list(&ctx, q.entity.as_deref(), q.entity_id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
