//! REST transport types.

use donations_sdk::{
    ApprovalOutcome, AuditEntry, Category, Cause, CauseStatus, CauseType, DomainStatus, Donation, DonationInit,
    DonationReceipt, DonationStatus, FileRef, InvoiceStatus, KycStatus, Membership, NgoReceipt, Payout,
    PayoutStatus, ReceiptStatus, SiteMode, Tenant, TenantDomain, TenantPolicy, Theme, User, Vendor, VendorInvoice,
    VendorLink,
};
use marketplace_security::Role;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::service::Me;

// --- identity ----------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            phone: u.phone,
            is_active: u.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Membership> for MembershipDto {
    fn from(m: Membership) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            tenant_id: m.tenant_id,
            role: m.role,
            vendor_id: m.vendor_id,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeDto {
    pub user: UserDto,
    pub memberships: Vec<MembershipDto>,
}

impl From<Me> for MeDto {
    fn from(me: Me) -> Self {
        Self {
            user: me.user.into(),
            memberships: me.memberships.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrantMembershipRequest {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: Role,
    #[serde(default)]
    pub vendor_id: Option<Uuid>,
}

// --- tenants -----------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantDto {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub primary_color: Option<String>,
}

impl From<Tenant> for TenantDto {
    fn from(t: Tenant) -> Self {
        Self {
            id: t.id,
            name: t.name,
            slug: t.slug,
            description: t.description,
            logo_url: t.logo_url,
            website_url: t.website_url,
            contact_email: t.contact_email,
            contact_phone: t.contact_phone,
            address: t.address,
            primary_color: t.primary_color,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeDto {
    pub primary_color: String,
    pub logo_url: Option<String>,
    pub brand_name: String,
    pub website_url: Option<String>,
}

impl From<Theme> for ThemeDto {
    fn from(t: Theme) -> Self {
        Self {
            primary_color: t.primary_color,
            logo_url: t.logo_url,
            brand_name: t.brand_name,
            website_url: t.website_url,
        }
    }
}

/// `{ mode, tenant?, theme? }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteDto {
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<TenantDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeDto>,
}

impl From<SiteMode> for SiteDto {
    fn from(site: SiteMode) -> Self {
        let mode = site.as_str().to_owned();
        match site {
            SiteMode::Marketplace => Self {
                mode,
                tenant: None,
                theme: None,
            },
            SiteMode::Microsite { tenant, theme } => Self {
                mode,
                tenant: Some((*tenant).into()),
                theme: Some(theme.into()),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTenantRequest {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainDto {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub host: String,
    pub status: DomainStatus,
    pub is_primary: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<TenantDomain> for DomainDto {
    fn from(d: TenantDomain) -> Self {
        Self {
            id: d.id,
            tenant_id: d.tenant_id,
            host: d.host,
            status: d.status,
            is_primary: d.is_primary,
            created_at: d.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDomainRequest {
    pub host: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomainStatusRequest {
    pub status: DomainStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostQuery {
    pub host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDto {
    pub tenant_id: Uuid,
    pub allow_ngo_managed: bool,
    pub ngo_managed_monthly_cap_percent: i32,
}

impl From<TenantPolicy> for PolicyDto {
    fn from(p: TenantPolicy) -> Self {
        Self {
            tenant_id: p.tenant_id,
            allow_ngo_managed: p.allow_ngo_managed,
            ngo_managed_monthly_cap_percent: p.ngo_managed_monthly_cap_percent,
        }
    }
}

// --- catalog -----------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl From<Category> for CategoryDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CauseDto {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub goal_amount: Decimal,
    pub raised_amount: Decimal,
    #[serde(rename = "type")]
    pub cause_type: CauseType,
    pub status: CauseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_flags: Option<Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Cause> for CauseDto {
    fn from(c: Cause) -> Self {
        Self {
            id: c.id,
            tenant_id: c.tenant_id,
            category_id: c.category_id,
            title: c.title,
            description: c.description,
            goal_amount: c.goal_amount,
            raised_amount: c.raised_amount,
            cause_type: c.cause_type,
            status: c.status,
            policy_flags: c.policy_flags,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCauseRequest {
    pub tenant_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub goal_amount: Decimal,
    /// Defaults to `VENDOR`.
    #[serde(default, rename = "type")]
    pub cause_type: Option<CauseType>,
    #[serde(default)]
    pub policy_flags: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CauseStatusRequest {
    pub status: CauseStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CauseQuery {
    pub tenant: Option<String>,
    pub status: Option<CauseStatus>,
}

// --- donations ---------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct InitDonationRequest {
    pub cause_id: Uuid,
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationInitDto {
    pub donation_id: Uuid,
    pub order_id: String,
    /// Minor units.
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
}

impl From<DonationInit> for DonationInitDto {
    fn from(d: DonationInit) -> Self {
        Self {
            donation_id: d.donation_id,
            order_id: d.order_id,
            amount: d.amount_minor,
            currency: d.currency,
            key_id: d.key_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: String,
}

impl WebhookAck {
    pub fn success() -> Self {
        Self {
            status: "success".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationDto {
    pub id: Uuid,
    pub cause_id: Uuid,
    pub tenant_id: Uuid,
    pub donor_user_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: DonationStatus,
    pub pg_order_id: Option<String>,
    pub pg_payment_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Donation> for DonationDto {
    fn from(d: Donation) -> Self {
        Self {
            id: d.id,
            cause_id: d.cause_id,
            tenant_id: d.tenant_id,
            donor_user_id: d.donor_user_id,
            amount: d.amount,
            currency: d.currency,
            status: d.status,
            pg_order_id: d.pg_order_id,
            pg_payment_id: d.pg_payment_id,
            created_at: d.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationReceiptDto {
    pub donation_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub cause_title: String,
    pub donor_name: String,
    pub donor_email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub payment_id: Option<String>,
}

impl From<DonationReceipt> for DonationReceiptDto {
    fn from(r: DonationReceipt) -> Self {
        Self {
            donation_id: r.donation_id,
            amount: r.amount,
            currency: r.currency,
            cause_title: r.cause_title,
            donor_name: r.donor_name,
            donor_email: r.donor_email,
            created_at: r.created_at,
            payment_id: r.payment_id,
        }
    }
}

// --- vendors -----------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorDto {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub gstin: Option<String>,
    pub kyc_status: KycStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Bank details are not echoed back.
impl From<Vendor> for VendorDto {
    fn from(v: Vendor) -> Self {
        Self {
            id: v.id,
            tenant_id: v.tenant_id,
            name: v.name,
            gstin: v.gstin,
            kyc_status: v.kyc_status,
            created_at: v.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateVendorRequest {
    pub tenant_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub gstin: Option<String>,
    #[serde(default)]
    pub bank_details: Option<Value>,
    #[serde(default)]
    pub kyc_status: Option<KycStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkVendorRequest {
    pub vendor_id: Uuid,
    #[serde(default)]
    pub terms: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorLinkDto {
    pub id: Uuid,
    pub cause_id: Uuid,
    pub vendor_id: Uuid,
    pub terms: Option<Value>,
}

impl From<VendorLink> for VendorLinkDto {
    fn from(l: VendorLink) -> Self {
        Self {
            id: l.id,
            cause_id: l.cause_id,
            vendor_id: l.vendor_id,
            terms: l.terms,
        }
    }
}

// --- invoices and receipts ---------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDto {
    pub id: Uuid,
    pub cause_id: Uuid,
    pub vendor_id: Uuid,
    pub tenant_id: Uuid,
    pub number: String,
    pub amount: Decimal,
    pub currency: String,
    pub files: Vec<FileRef>,
    pub status: InvoiceStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<VendorInvoice> for InvoiceDto {
    fn from(i: VendorInvoice) -> Self {
        Self {
            id: i.id,
            cause_id: i.cause_id,
            vendor_id: i.vendor_id,
            tenant_id: i.tenant_id,
            number: i.number,
            amount: i.amount,
            currency: i.currency,
            files: i.files,
            status: i.status,
            created_at: i.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceApprovalDto {
    pub invoice_id: Uuid,
    pub status: InvoiceStatus,
    pub payout_id: Uuid,
    pub payout_status: PayoutStatus,
}

impl From<ApprovalOutcome<InvoiceStatus>> for InvoiceApprovalDto {
    fn from(o: ApprovalOutcome<InvoiceStatus>) -> Self {
        Self {
            invoice_id: o.id,
            status: o.status,
            payout_id: o.payout.id,
            payout_status: o.payout.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptDto {
    pub id: Uuid,
    pub cause_id: Uuid,
    pub tenant_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub files: Vec<FileRef>,
    pub note: Option<String>,
    pub status: ReceiptStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<NgoReceipt> for ReceiptDto {
    fn from(r: NgoReceipt) -> Self {
        Self {
            id: r.id,
            cause_id: r.cause_id,
            tenant_id: r.tenant_id,
            amount: r.amount,
            currency: r.currency,
            files: r.files,
            note: r.note,
            status: r.status,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptApprovalDto {
    pub receipt_id: Uuid,
    pub status: ReceiptStatus,
    pub payout_id: Uuid,
    pub payout_status: PayoutStatus,
}

impl From<ApprovalOutcome<ReceiptStatus>> for ReceiptApprovalDto {
    fn from(o: ApprovalOutcome<ReceiptStatus>) -> Self {
        Self {
            receipt_id: o.id,
            status: o.status,
            payout_id: o.payout.id,
            payout_status: o.payout.status,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// `?status=` filter of the ledger lists.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusQuery<S> {
    pub status: Option<S>,
}

// --- payouts -----------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutDto {
    pub id: Uuid,
    pub to_type: String,
    pub to_id: Uuid,
    pub tenant_id: Uuid,
    pub source_type: String,
    pub source_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub pg_payout_id: Option<String>,
    pub status: PayoutStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Payout> for PayoutDto {
    fn from(p: Payout) -> Self {
        Self {
            id: p.id,
            to_type: p.target.kind().to_owned(),
            to_id: p.target.id(),
            tenant_id: p.tenant_id,
            source_type: p.source.kind().to_owned(),
            source_id: p.source.id(),
            amount: p.amount,
            currency: p.currency,
            pg_payout_id: p.pg_payout_id,
            status: p.status,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayoutStatusRequest {
    pub status: PayoutStatus,
    #[serde(default)]
    pub pg_payout_id: Option<String>,
}

// --- audit -------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub entity: Option<String>,
    pub entity_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntryDto {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub entity: String,
    pub entity_id: Uuid,
    pub action: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
}

impl From<AuditEntry> for AuditEntryDto {
    fn from(a: AuditEntry) -> Self {
        Self {
            id: a.id,
            actor_id: a.actor_id,
            entity: a.entity,
            entity_id: a.entity_id,
            action: a.action,
            before: a.before,
            after: a.after,
            ts: a.ts,
        }
    }
}
