pub mod audit;
pub mod documents;
pub mod entity;
pub mod mapper;
pub mod migrations;
pub mod scope;
pub mod seed;

pub use migrations::Migrator;
