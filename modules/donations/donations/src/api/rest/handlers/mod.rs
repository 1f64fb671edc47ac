pub mod audit;
pub mod catalog;
pub mod donations;
pub mod identity;
pub mod invoices;
pub mod payouts;
pub mod receipts;
pub mod tenants;
pub mod vendors;

mod form;

pub use form::SubmissionForm;
