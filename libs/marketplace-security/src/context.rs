use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access_scope::{AccessScope, ResourceRef, ScopeClause};
use crate::role::Role;

/// A membership as seen by the authorization layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipGrant {
    pub tenant_id: Uuid,
    pub role: Role,
    /// Vendor a `VENDOR` grant acts for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<Uuid>,
}

/// Returned when no grant of the caller satisfies a check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("access denied: requires one of [{}]", .required.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(", "))]
pub struct AccessDenied {
    pub required: Vec<Role>,
}

/// Authenticated caller: a subject plus every membership it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContext {
    subject_id: Uuid,
    grants: Vec<MembershipGrant>,
}

impl SecurityContext {
    #[must_use]
    pub fn builder() -> SecurityContextBuilder {
        SecurityContextBuilder::default()
    }

    /// Context with a nil subject and no grants; fails every check.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn subject_id(&self) -> Uuid {
        self.subject_id
    }

    #[must_use]
    pub fn grants(&self) -> &[MembershipGrant] {
        &self.grants
    }

    #[must_use]
    pub fn is_platform_admin(&self) -> bool {
        self.grants.iter().any(|g| g.role == Role::PlatformAdmin)
    }

    /// Roles held in exactly `tenant_id`.
    pub fn roles_in(&self, tenant_id: Uuid) -> impl Iterator<Item = Role> + '_ {
        self.grants
            .iter()
            .filter(move |g| g.tenant_id == tenant_id)
            .map(|g| g.role)
    }

    #[must_use]
    pub fn has_role_in(&self, tenant_id: Uuid, role: Role) -> bool {
        self.roles_in(tenant_id).any(|r| r == role)
    }

    /// Build the visibility this caller gets when `allowed` roles may see a resource kind.
    ///
    /// A platform admin is unrestricted when `PLATFORM_ADMIN` is allowed. Every other
    /// grant contributes a clause for its own tenant; `VENDOR` grants are narrowed to
    /// their vendor and `DONOR` grants to the caller's own rows.
    #[must_use]
    pub fn scope_for(&self, allowed: &[Role]) -> AccessScope {
        if allowed.contains(&Role::PlatformAdmin) && self.is_platform_admin() {
            return AccessScope::unrestricted();
        }
        let clauses = self
            .grants
            .iter()
            .filter(|g| g.role != Role::PlatformAdmin && allowed.contains(&g.role))
            .filter_map(|g| match g.role {
                Role::Vendor => g.vendor_id.map(|vendor_id| ScopeClause {
                    tenant_id: g.tenant_id,
                    vendor_id: Some(vendor_id),
                    donor_id: None,
                }),
                Role::Donor => Some(ScopeClause {
                    tenant_id: g.tenant_id,
                    vendor_id: None,
                    donor_id: Some(self.subject_id),
                }),
                _ => Some(ScopeClause {
                    tenant_id: g.tenant_id,
                    vendor_id: None,
                    donor_id: None,
                }),
            })
            .collect();
        AccessScope::from_clauses(clauses)
    }

    /// Check access to a single resource.
    ///
    /// # Errors
    /// [`AccessDenied`] if no grant of the caller covers `resource` with one of `allowed`.
    pub fn authorize(&self, resource: &ResourceRef, allowed: &[Role]) -> Result<(), AccessDenied> {
        if self.scope_for(allowed).permits(resource) {
            Ok(())
        } else {
            Err(AccessDenied {
                required: allowed.to_vec(),
            })
        }
    }
}

#[derive(Debug, Default)]
pub struct SecurityContextBuilder {
    subject_id: Option<Uuid>,
    grants: Vec<MembershipGrant>,
}

impl SecurityContextBuilder {
    #[must_use]
    pub fn subject_id(mut self, subject_id: Uuid) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    #[must_use]
    pub fn grant(mut self, tenant_id: Uuid, role: Role) -> Self {
        self.grants.push(MembershipGrant {
            tenant_id,
            role,
            vendor_id: None,
        });
        self
    }

    #[must_use]
    pub fn vendor_grant(mut self, tenant_id: Uuid, vendor_id: Uuid) -> Self {
        self.grants.push(MembershipGrant {
            tenant_id,
            role: Role::Vendor,
            vendor_id: Some(vendor_id),
        });
        self
    }

    #[must_use]
    pub fn grants(mut self, grants: impl IntoIterator<Item = MembershipGrant>) -> Self {
        self.grants.extend(grants);
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityContext {
        SecurityContext {
            subject_id: self.subject_id.unwrap_or_default(),
            grants: self.grants,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn anonymous_has_no_access() {
        let ctx = SecurityContext::anonymous();
        assert_eq!(ctx.subject_id(), Uuid::nil());
        assert!(ctx.scope_for(&Role::ALL).is_empty());
    }

    #[test]
    fn unbound_vendor_grant_contributes_nothing() {
        let ctx = SecurityContext::builder()
            .subject_id(Uuid::from_u128(1))
            .grant(Uuid::from_u128(2), Role::Vendor)
            .build();
        assert!(ctx.scope_for(&[Role::Vendor]).is_empty());
    }

    #[test]
    fn denial_lists_required_roles() {
        let err = SecurityContext::anonymous()
            .authorize(&ResourceRef::tenant(Uuid::nil()), &[Role::NgoAdmin, Role::PlatformAdmin])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "access denied: requires one of [NGO_ADMIN, PLATFORM_ADMIN]"
        );
    }
}
