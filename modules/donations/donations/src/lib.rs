//! Donations marketplace module.
//!
//! Tenants with their microsite domains, causes, donations settled by a payment
//! gateway webhook, vendor invoices, NGO receipts and the payout ledger, all behind
//! role-scoped authorization.
//!
//! Shared types live in `donations-sdk` and are re-exported here.
#![allow(clippy::must_use_candidate)] // Will add systematically in v2
#![allow(clippy::missing_errors_doc)] // Error cases are described on `DomainError`

pub use donations_sdk::{
    Cause, CauseStatus, Donation, DonationStatus, InvoiceStatus, Payout, PayoutSource, PayoutStatus, PayoutTarget,
    ReceiptStatus, SiteMode,
};

pub mod module;
pub use module::DonationsModule;

pub mod config;
pub use config::{DonationsConfig, PaymentProvider, PaymentsConfig};

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
