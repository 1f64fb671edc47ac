//! Entity rows to SDK models.
//!
//! Rows with enum columns go through `TryFrom`: an unknown stored value is a
//! data error, not something to paper over.

use donations_sdk::{
    AuditEntry, Category, Cause, Donation, FileRef, Membership, NgoReceipt, Payout, PayoutSource,
    PayoutTarget, Tenant, TenantDomain, TenantPolicy, User, Vendor, VendorInvoice, VendorLink,
};

use super::entity::{
    audit_log, category, cause, donation, membership, ngo_receipt, payout, tenant, tenant_domain,
    tenant_policy, user, vendor, vendor_invoice, vendor_link,
};
use crate::domain::error::DomainError;

impl From<tenant::Model> for Tenant {
    fn from(m: tenant::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
            description: m.description,
            logo_url: m.logo_url,
            website_url: m.website_url,
            contact_email: m.contact_email,
            contact_phone: m.contact_phone,
            address: m.address,
            primary_color: m.primary_color,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl TryFrom<tenant_domain::Model> for TenantDomain {
    type Error = DomainError;

    fn try_from(m: tenant_domain::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            tenant_id: m.tenant_id,
            host: m.host,
            status: m.status.parse()?,
            is_primary: m.is_primary,
            created_at: m.created_at,
        })
    }
}

impl From<tenant_policy::Model> for TenantPolicy {
    fn from(m: tenant_policy::Model) -> Self {
        Self {
            tenant_id: m.tenant_id,
            allow_ngo_managed: m.allow_ngo_managed,
            ngo_managed_monthly_cap_percent: m.ngo_managed_monthly_cap_percent,
        }
    }
}

impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            first_name: m.first_name,
            last_name: m.last_name,
            phone: m.phone,
            is_active: m.is_active,
            created_at: m.created_at,
        }
    }
}

impl TryFrom<membership::Model> for Membership {
    type Error = DomainError;

    fn try_from(m: membership::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            user_id: m.user_id,
            tenant_id: m.tenant_id,
            role: m.role.parse()?,
            vendor_id: m.vendor_id,
            created_at: m.created_at,
        })
    }
}

impl From<category::Model> for Category {
    fn from(m: category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
        }
    }
}

impl TryFrom<cause::Model> for Cause {
    type Error = DomainError;

    fn try_from(m: cause::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            tenant_id: m.tenant_id,
            category_id: m.category_id,
            title: m.title,
            description: m.description,
            goal_amount: m.goal_amount,
            raised_amount: m.raised_amount,
            cause_type: m.cause_type.parse()?,
            status: m.status.parse()?,
            policy_flags: m.policy_flags,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

impl TryFrom<donation::Model> for Donation {
    type Error = DomainError;

    fn try_from(m: donation::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            cause_id: m.cause_id,
            tenant_id: m.tenant_id,
            donor_user_id: m.donor_user_id,
            amount: m.amount,
            currency: m.currency,
            pg_order_id: m.pg_order_id,
            pg_payment_id: m.pg_payment_id,
            status: m.status.parse()?,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

impl TryFrom<vendor::Model> for Vendor {
    type Error = DomainError;

    fn try_from(m: vendor::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            tenant_id: m.tenant_id,
            name: m.name,
            gstin: m.gstin,
            bank_details: m.bank_json,
            kyc_status: m.kyc_status.parse()?,
            created_at: m.created_at,
        })
    }
}

impl From<vendor_link::Model> for VendorLink {
    fn from(m: vendor_link::Model) -> Self {
        Self {
            id: m.id,
            cause_id: m.cause_id,
            vendor_id: m.vendor_id,
            terms: m.terms_json,
            created_at: m.created_at,
        }
    }
}

fn file_refs(files: serde_json::Value) -> Result<Vec<FileRef>, DomainError> {
    Ok(serde_json::from_value(files)?)
}

impl TryFrom<vendor_invoice::Model> for VendorInvoice {
    type Error = DomainError;

    fn try_from(m: vendor_invoice::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            cause_id: m.cause_id,
            vendor_id: m.vendor_id,
            tenant_id: m.tenant_id,
            number: m.number,
            amount: m.amount,
            currency: m.currency,
            files: file_refs(m.files)?,
            status: m.status.parse()?,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

impl TryFrom<ngo_receipt::Model> for NgoReceipt {
    type Error = DomainError;

    fn try_from(m: ngo_receipt::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            cause_id: m.cause_id,
            tenant_id: m.tenant_id,
            amount: m.amount,
            currency: m.currency,
            files: file_refs(m.files)?,
            note: m.note,
            status: m.status.parse()?,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

impl TryFrom<payout::Model> for Payout {
    type Error = DomainError;

    fn try_from(m: payout::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            target: PayoutTarget::from_parts(&m.to_type, m.to_id)?,
            source: PayoutSource::from_parts(&m.source_type, m.source_id)?,
            tenant_id: m.tenant_id,
            amount: m.amount,
            currency: m.currency,
            pg_payout_id: m.pg_payout_id,
            status: m.status.parse()?,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

impl From<audit_log::Model> for AuditEntry {
    fn from(m: audit_log::Model) -> Self {
        Self {
            id: m.id,
            actor_id: m.actor_id,
            entity: m.entity,
            entity_id: m.entity_id,
            action: m.action,
            before: m.before_json,
            after: m.after_json,
            ts: m.ts,
        }
    }
}

/// Convert a batch of rows, failing on the first corrupt one.
pub fn try_collect<M, T>(rows: Vec<M>) -> Result<Vec<T>, DomainError>
where
    T: TryFrom<M, Error = DomainError>,
{
    rows.into_iter().map(T::try_from).collect()
}
