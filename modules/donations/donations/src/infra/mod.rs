pub mod identity;
pub mod payments;
pub mod storage;
