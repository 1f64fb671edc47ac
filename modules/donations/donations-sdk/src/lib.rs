//! Donations SDK
//!
//! Transport-agnostic types shared by the donations module and its consumers:
//! - status enums with their stored string form and allowed transitions
//! - [`PayoutTarget`] / [`PayoutSource`], the typed replacement for `(type, id)` pairs
//! - entity models and creation inputs

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod models;
pub mod payout;
pub mod status;

pub use models::{
    ApprovalOutcome, AuditEntry, Category, Cause, Donation, DonationInit, DonationReceipt, DonationRequest,
    FileRef, Membership, NewCategory, NewCause, NewDomain, NewMembership, NewNgoReceipt,
    NewTenant, NewVendor, NewVendorInvoice, NgoReceipt, Payout, PayoutStatusUpdate,
    SiteMode, Tenant, TenantDomain, TenantPolicy, Theme, UploadedFile, User,
    Vendor, VendorInvoice, VendorLink,
};
pub use payout::{PayoutSource, PayoutTarget};
pub use status::{
    CauseStatus, CauseType, DocumentPurpose, DomainStatus, DonationStatus, InvoiceStatus,
    KycStatus, PayoutStatus, ReceiptStatus, UnknownVariant,
};
