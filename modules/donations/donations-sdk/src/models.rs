//! Public models for the donations module.
//!
//! Money is `Decimal` in major units; timestamps are UTC.

use marketplace_security::Role;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::payout::{PayoutSource, PayoutTarget};
use crate::status::{
    CauseStatus, CauseType, DomainStatus, DonationStatus, InvoiceStatus, KycStatus, PayoutStatus,
    ReceiptStatus,
};

// --- tenants -----------------------------------------------------------------

/// An NGO account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
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
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewTenant {
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantDomain {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub host: String,
    pub status: DomainStatus,
    pub is_primary: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDomain {
    pub host: String,
    pub is_primary: bool,
}

/// Stored per-tenant policy. Read-only to the approval paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantPolicy {
    pub tenant_id: Uuid,
    pub allow_ngo_managed: bool,
    pub ngo_managed_monthly_cap_percent: i32,
}

/// Branding used when a request arrives on a tenant's own domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub primary_color: String,
    pub logo_url: Option<String>,
    pub brand_name: String,
    pub website_url: Option<String>,
}

/// How the current request is being served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteMode {
    Marketplace,
    Microsite { tenant: Box<Tenant>, theme: Theme },
}

impl SiteMode {
    #[must_use]
    pub fn tenant(&self) -> Option<&Tenant> {
        match self {
            Self::Marketplace => None,
            Self::Microsite { tenant, .. } => Some(tenant),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Marketplace => "marketplace",
            Self::Microsite { .. } => "microsite",
        }
    }
}

// --- identity ----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

impl User {
    /// "First Last", skipping missing parts; falls back to the email.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() { self.email.clone() } else { name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: Role,
    pub vendor_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMembership {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: Role,
    pub vendor_id: Option<Uuid>,
}

// --- catalog -----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cause {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub goal_amount: Decimal,
    pub raised_amount: Decimal,
    pub cause_type: CauseType,
    pub status: CauseStatus,
    pub policy_flags: Option<Value>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCause {
    pub tenant_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub goal_amount: Decimal,
    pub cause_type: CauseType,
    pub policy_flags: Option<Value>,
}

// --- donations ---------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Donation {
    pub id: Uuid,
    pub cause_id: Uuid,
    pub tenant_id: Uuid,
    pub donor_user_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub pg_order_id: Option<String>,
    pub pg_payment_id: Option<String>,
    pub status: DonationStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationRequest {
    pub cause_id: Uuid,
    pub amount: Decimal,
    /// Defaults to the configured currency.
    pub currency: Option<String>,
}

/// What the client needs to open the gateway checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationInit {
    pub donation_id: Uuid,
    pub order_id: String,
    /// Amount in minor units (paise for INR).
    pub amount_minor: i64,
    pub currency: String,
    pub key_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationReceipt {
    pub donation_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub cause_title: String,
    pub donor_name: String,
    pub donor_email: String,
    pub created_at: OffsetDateTime,
    pub payment_id: Option<String>,
}

// --- vendors -----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vendor {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub gstin: Option<String>,
    pub bank_details: Option<Value>,
    pub kyc_status: KycStatus,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVendor {
    pub tenant_id: Uuid,
    pub name: String,
    pub gstin: Option<String>,
    pub bank_details: Option<Value>,
    pub kyc_status: Option<KycStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorLink {
    pub id: Uuid,
    pub cause_id: Uuid,
    pub vendor_id: Uuid,
    pub terms: Option<Value>,
    pub created_at: OffsetDateTime,
}

// --- invoices, receipts, documents -------------------------------------------

/// A file received with a submission, before it is recorded.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Vec<u8>,
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("filename", &self.filename)
            .field("content", &format_args!("{} bytes", self.content.len()))
            .finish()
    }
}

/// Reference to a recorded document, as stored on invoices and receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub document_id: Uuid,
    pub filename: String,
    pub url: String,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorInvoice {
    pub id: Uuid,
    pub cause_id: Uuid,
    pub vendor_id: Uuid,
    pub tenant_id: Uuid,
    pub number: String,
    pub amount: Decimal,
    pub currency: String,
    pub files: Vec<FileRef>,
    pub status: InvoiceStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVendorInvoice {
    pub cause_id: Uuid,
    pub vendor_id: Uuid,
    pub number: String,
    pub amount: Decimal,
    pub files: Vec<UploadedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NgoReceipt {
    pub id: Uuid,
    pub cause_id: Uuid,
    pub tenant_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub files: Vec<FileRef>,
    pub note: Option<String>,
    pub status: ReceiptStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNgoReceipt {
    pub cause_id: Uuid,
    pub amount: Decimal,
    pub note: Option<String>,
    pub files: Vec<UploadedFile>,
}

/// Result of approving an invoice or a receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalOutcome<S> {
    pub id: Uuid,
    pub status: S,
    pub payout: Payout,
}

// --- payouts -----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payout {
    pub id: Uuid,
    pub target: PayoutTarget,
    pub source: PayoutSource,
    /// Tenant the payout is accounted to: the vendor's tenant or the NGO itself.
    pub tenant_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub pg_payout_id: Option<String>,
    pub status: PayoutStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Disbursement callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutStatusUpdate {
    pub status: PayoutStatus,
    pub pg_payout_id: Option<String>,
}

// --- audit -------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub entity: String,
    pub entity_id: Uuid,
    pub action: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub ts: OffsetDateTime,
}
