//! sea-orm entities. Enum-valued columns hold the SCREAMING_SNAKE_CASE name of
//! the corresponding SDK enum.

pub mod audit_log;
pub mod category;
pub mod cause;
pub mod document;
pub mod donation;
pub mod membership;
pub mod ngo_receipt;
pub mod payout;
pub mod tenant;
pub mod tenant_domain;
pub mod tenant_policy;
pub mod user;
pub mod vendor;
pub mod vendor_invoice;
pub mod vendor_link;
