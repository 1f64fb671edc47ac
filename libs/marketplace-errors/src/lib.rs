//! Error payloads shared by every HTTP-facing crate of the marketplace.
//!
//! - [`Problem`]: RFC 9457 Problem Details body
//! - [`ErrDef`]: a static catalog entry that renders into a `Problem`

pub mod catalog;
pub mod problem;

pub use catalog::ErrDef;
pub use problem::{APPLICATION_PROBLEM_JSON, FieldViolation, Problem};
