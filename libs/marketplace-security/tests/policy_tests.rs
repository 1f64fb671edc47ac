#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Tenant-qualified authorization behaviour of `SecurityContext`.

use marketplace_security::{ResourceRef, Role, SecurityContext};
use uuid::Uuid;

const NGO_APPROVERS: &[Role] = &[Role::NgoAdmin, Role::PlatformAdmin];
const ANY_MEMBER: &[Role] = &Role::ALL;

fn ids() -> (Uuid, Uuid) {
    (Uuid::new_v4(), Uuid::new_v4())
}

#[test]
fn role_is_resolved_per_tenant_not_first_membership() {
    let (hope, care) = ids();
    // Staff in one tenant, admin in another: the admin role must not leak.
    let ctx = SecurityContext::builder()
        .subject_id(Uuid::new_v4())
        .grant(hope, Role::NgoStaff)
        .grant(care, Role::NgoAdmin)
        .build();

    assert!(ctx.authorize(&ResourceRef::tenant(care), NGO_APPROVERS).is_ok());
    assert!(ctx.authorize(&ResourceRef::tenant(hope), NGO_APPROVERS).is_err());
    assert!(ctx.authorize(&ResourceRef::tenant(hope), ANY_MEMBER).is_ok());
}

#[test]
fn platform_admin_is_global_only_where_allowed() {
    let (home, other) = ids();
    let admin = SecurityContext::builder()
        .subject_id(Uuid::new_v4())
        .grant(home, Role::PlatformAdmin)
        .build();

    assert!(admin.authorize(&ResourceRef::tenant(other), &[Role::PlatformAdmin]).is_ok());
    // Endpoints restricted to NGO admins do not admit platform admins implicitly.
    assert!(admin.authorize(&ResourceRef::tenant(other), &[Role::NgoAdmin]).is_err());
    assert!(admin.scope_for(NGO_APPROVERS).is_unrestricted());
}

#[test]
fn vendor_sees_only_its_own_vendor_rows() {
    let (tenant, foreign_tenant) = ids();
    let own_vendor = Uuid::new_v4();
    let ctx = SecurityContext::builder()
        .subject_id(Uuid::new_v4())
        .vendor_grant(tenant, own_vendor)
        .build();

    let own = ResourceRef::tenant(tenant).with_vendor(own_vendor);
    let sibling = ResourceRef::tenant(tenant).with_vendor(Uuid::new_v4());
    let foreign = ResourceRef::tenant(foreign_tenant).with_vendor(Uuid::new_v4());

    assert!(ctx.authorize(&own, ANY_MEMBER).is_ok());
    assert!(ctx.authorize(&sibling, ANY_MEMBER).is_err());
    assert!(ctx.authorize(&foreign, ANY_MEMBER).is_err());
}

#[test]
fn vendor_has_no_access_to_ngo_payouts_of_other_tenants() {
    let (vendor_tenant, ngo_tenant) = ids();
    let ctx = SecurityContext::builder()
        .subject_id(Uuid::new_v4())
        .vendor_grant(vendor_tenant, Uuid::new_v4())
        .build();

    let err = ctx
        .authorize(&ResourceRef::tenant(ngo_tenant), NGO_APPROVERS)
        .unwrap_err();
    assert_eq!(err.required, NGO_APPROVERS.to_vec());
}

#[test]
fn donor_scope_is_narrowed_to_own_rows() {
    let (tenant, _) = ids();
    let donor = Uuid::new_v4();
    let ctx = SecurityContext::builder()
        .subject_id(donor)
        .grant(tenant, Role::Donor)
        .build();

    assert!(ctx.authorize(&ResourceRef::tenant(tenant).with_donor(donor), &[Role::Donor]).is_ok());
    assert!(
        ctx.authorize(&ResourceRef::tenant(tenant).with_donor(Uuid::new_v4()), &[Role::Donor])
            .is_err()
    );

    let scope = ctx.scope_for(&[Role::Donor]);
    assert_eq!(scope.clauses().len(), 1);
    assert_eq!(scope.clauses()[0].donor_id, Some(donor));
}

#[test]
fn context_serializes_grants_with_vendor_binding() {
    let (tenant, _) = ids();
    let vendor = Uuid::new_v4();
    let ctx = SecurityContext::builder()
        .subject_id(Uuid::new_v4())
        .vendor_grant(tenant, vendor)
        .build();

    let json = serde_json::to_value(&ctx).unwrap();
    assert_eq!(json["grants"][0]["role"], "VENDOR");
    assert_eq!(json["grants"][0]["vendor_id"], vendor.to_string());
}
