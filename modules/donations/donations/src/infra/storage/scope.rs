//! Turns an [`AccessScope`] into a sea-orm `Condition`.
//!
//! Every role-scoped list query filters through [`build_scope_condition`]; there
//! is no other place where tenant/vendor/donor visibility is translated to SQL.

use marketplace_security::{AccessScope, ScopeClause};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition, EntityTrait};

use super::entity::{donation, ngo_receipt, payout, vendor, vendor_invoice};

/// Ownership columns of a tenant-scoped entity.
///
/// An entity without a vendor (or donor) column is not narrowed by vendor
/// (or donor) bound clauses, matching how `ResourceRef` is checked.
pub trait ScopableEntity: EntityTrait {
    fn tenant_col() -> Self::Column;
    fn vendor_col() -> Option<Self::Column>;
    fn donor_col() -> Option<Self::Column>;
}

fn deny_all() -> Condition {
    Condition::all().add(Expr::value(false))
}

fn clause_condition<E>(clause: &ScopeClause) -> Condition
where
    E: ScopableEntity,
    E::Column: ColumnTrait,
{
    let mut cond = Condition::all().add(E::tenant_col().eq(clause.tenant_id));
    if let (Some(vendor_id), Some(col)) = (clause.vendor_id, E::vendor_col()) {
        cond = cond.add(col.eq(vendor_id));
    }
    if let (Some(donor_id), Some(col)) = (clause.donor_id, E::donor_col()) {
        cond = cond.add(col.eq(donor_id));
    }
    cond
}

/// Build the row filter for `scope`:
/// - unrestricted scope: no filter
/// - empty scope: `false`
/// - otherwise: OR over clauses, each `tenant = ? [AND vendor = ?] [AND donor = ?]`
pub fn build_scope_condition<E>(scope: &AccessScope) -> Condition
where
    E: ScopableEntity,
    E::Column: ColumnTrait,
{
    if scope.is_unrestricted() {
        return Condition::all();
    }
    if scope.is_empty() {
        return deny_all();
    }
    scope
        .clauses()
        .iter()
        .fold(Condition::any(), |acc, clause| acc.add(clause_condition::<E>(clause)))
}

macro_rules! scopable {
    ($module:ident, tenant = $tenant:ident, vendor = $vendor:expr, donor = $donor:expr) => {
        impl ScopableEntity for $module::Entity {
            fn tenant_col() -> Self::Column {
                $module::Column::$tenant
            }
            fn vendor_col() -> Option<Self::Column> {
                $vendor
            }
            fn donor_col() -> Option<Self::Column> {
                $donor
            }
        }
    };
}

scopable!(donation, tenant = TenantId, vendor = None, donor = Some(donation::Column::DonorUserId));
scopable!(vendor, tenant = TenantId, vendor = Some(vendor::Column::Id), donor = None);
scopable!(vendor_invoice, tenant = TenantId, vendor = Some(vendor_invoice::Column::VendorId), donor = None);
scopable!(ngo_receipt, tenant = TenantId, vendor = None, donor = None);
scopable!(payout, tenant = TenantId, vendor = None, donor = None);
