use std::sync::Arc;

use axum::http::StatusCode;
use axum::{Extension, Json};
use donations_sdk::NewMembership;
use marketplace_auth::Authz;

use crate::api::rest::dto::{GrantMembershipRequest, MeDto, MembershipDto};
use crate::api::rest::error::ApiResult;
use crate::domain::service::Services;

pub async fn get_me(Authz(ctx): Authz, Extension(svc): Extension<Arc<Services>>) -> ApiResult<Json<MeDto>> {
    let me = svc.identity.me(&ctx).await?;
    Ok(Json(me.into()))
}

pub async fn grant_membership(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Services>>,
    Json(req): Json<GrantMembershipRequest>,
) -> ApiResult<(StatusCode, Json<MembershipDto>)> {
    let membership = svc
        .identity
        .grant_membership(
            &ctx,
            NewMembership {
                user_id: req.user_id,
                tenant_id: req.tenant_id,
                role: req.role,
                vendor_id: req.vendor_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(membership.into())))
}
