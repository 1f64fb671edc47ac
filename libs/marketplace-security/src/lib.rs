#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Authorization building blocks.
//!
//! Every access decision in the marketplace goes through [`SecurityContext::authorize`]
//! (single resource) or [`SecurityContext::scope_for`] (list queries). Both evaluate
//! the same per-grant rules, so a row visible in a list is also readable by id.

pub mod access_scope;
pub mod context;
pub mod role;

pub use access_scope::{AccessScope, ResourceRef, ScopeClause};
pub use context::{AccessDenied, MembershipGrant, SecurityContext, SecurityContextBuilder};
pub use role::{Role, UnknownRole};
